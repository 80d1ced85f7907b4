use super::{element_text, normalize_text, selector};
use crate::errors::{HarnessError, Result};
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Class of the placeholder row rendered when a list has nothing to show.
const EMPTY_ROW_CLASS: &str = "nothing-to-show";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    pub text: String,
    /// Inner HTML, kept so structured matchers can look inside the cell.
    pub html: String,
    /// Texts of the tag badges rendered in the cell, in order.
    pub tags: Vec<String>,
}

impl TableCell {
    /// Texts of the elements matching `css` inside this cell.
    pub fn select_text(&self, css: &str) -> Result<Vec<String>> {
        let fragment = Html::parse_fragment(&self.html);
        let sel = selector(css)?;
        Ok(fragment.select(&sel).map(|el| element_text(&el)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// An ordered capture of a rendered results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// What an expected cell has to look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellMatch {
    /// The whole cell text, whitespace-normalised.
    Text(String),
    /// The text of the element found by `selector` inside the cell.
    Selector { selector: String, text: String },
    /// The tag badges of the cell, in rendered order.
    Tags { tags: Vec<String> },
}

impl From<&str> for CellMatch {
    fn from(text: &str) -> Self {
        CellMatch::Text(text.to_string())
    }
}

impl From<String> for CellMatch {
    fn from(text: String) -> Self {
        CellMatch::Text(text)
    }
}

impl CellMatch {
    /// `Ok(None)` when the cell matches, otherwise the rendered value that did not.
    pub fn mismatch(&self, cell: &TableCell) -> Result<Option<String>> {
        match self {
            CellMatch::Text(expected) => Ok((normalize_text(expected) != cell.text)
                .then(|| cell.text.clone())),
            CellMatch::Selector { selector, text } => {
                let found = cell.select_text(selector)?;
                let expected = normalize_text(text);
                Ok((!found.iter().any(|t| *t == expected)).then(|| found.join(" | ")))
            }
            CellMatch::Tags { tags } => {
                Ok((*tags != cell.tags).then(|| cell.tags.join(", ")))
            }
        }
    }
}

/// Parsed "Displaying N of M found" footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub displayed: usize,
    pub found: usize,
}

impl TableStats {
    pub fn parse(text: &str) -> Option<Self> {
        static STATS: OnceLock<Regex> = OnceLock::new();
        let re = STATS.get_or_init(|| {
            Regex::new(r"Displaying\s+(\d+)\s+of\s+(\d+)\s+found").expect("static regex")
        });
        let caps = re.captures(text)?;
        Some(Self {
            displayed: caps[1].parse().ok()?,
            found: caps[2].parse().ok()?,
        })
    }
}

fn child_elements<'a>(parent: ElementRef<'a>, name: &str) -> Vec<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == name)
        .collect()
}

impl TableSnapshot {
    /// Parses the outer HTML of a `<table>` (or of a container holding one).
    ///
    /// Only the table's own sections are read; tables nested in cells stay
    /// part of their cell.
    pub fn parse(html: &str) -> Result<Self> {
        let fragment = Html::parse_fragment(html);
        let table = fragment
            .select(&selector("table")?)
            .next()
            .ok_or_else(|| HarnessError::ElementNotFound("table in captured HTML".to_string()))?;

        let mut header_rows = Vec::new();
        let mut body_rows = Vec::new();
        for section in table.children().filter_map(ElementRef::wrap) {
            match section.value().name() {
                "thead" => header_rows.extend(child_elements(section, "tr")),
                "tbody" => body_rows.extend(child_elements(section, "tr")),
                "tr" => body_rows.push(section),
                _ => {}
            }
        }

        // tables without <thead> carry their headers as the first <th> row
        if header_rows.is_empty() {
            if let Some(first) = body_rows.first() {
                if !child_elements(*first, "th").is_empty() {
                    header_rows.push(body_rows.remove(0));
                }
            }
        }

        let headers = header_rows
            .first()
            .map(|row| {
                child_elements(*row, "th")
                    .iter()
                    .map(element_text)
                    .collect()
            })
            .unwrap_or_default();

        let tag_sel = selector(".tag")?;
        let rows = body_rows
            .into_iter()
            .filter(|row| !row.value().classes().any(|c| c == EMPTY_ROW_CLASS))
            .map(|row| TableRow {
                cells: child_elements(row, "td")
                    .iter()
                    .map(|cell| TableCell {
                        text: element_text(cell),
                        html: cell.inner_html(),
                        tags: cell.select(&tag_sel).map(|t| element_text(&t)).collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| {
                HarnessError::assertion(
                    format!("Column \"{}\" in table headers", column),
                    column,
                    &self.headers,
                )
            })
    }

    pub fn cell<'a>(&'a self, row: &'a TableRow, column: &str) -> Result<&'a TableCell> {
        let index = self.column_index(column)?;
        row.cells.get(index).ok_or_else(|| {
            HarnessError::ElementNotFound(format!("cell {} (\"{}\") of table row", index, column))
        })
    }

    /// Cell texts of one column, top to bottom.
    pub fn column(&self, column: &str) -> Result<Vec<String>> {
        let index = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.cells.get(index).map(|c| c.text.clone()).unwrap_or_default())
            .collect())
    }

    pub fn find_row(&self, column: &str, text: &str) -> Result<Option<&TableRow>> {
        let index = self.column_index(column)?;
        let text = normalize_text(text);
        Ok(self
            .rows
            .iter()
            .find(|row| row.cells.get(index).map(|c| c.text == text).unwrap_or(false)))
    }

    /// Rows as header → text maps. Columns without a header are skipped.
    pub fn records(&self) -> Vec<BTreeMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row.cells.iter())
                    .filter(|(header, _)| !header.is_empty())
                    .map(|(header, cell)| (header.clone(), cell.text.clone()))
                    .collect()
            })
            .collect()
    }
}
