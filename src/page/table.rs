use crate::browser::WebSession;
use crate::core::BrowserTrait;
use crate::dom::{CellMatch, TableSnapshot, TableStats};
use crate::errors::{ensure_eq, HarnessError, Result};
use crate::locator::Locator;
use std::collections::BTreeMap;
use tracing::debug;

/// Column header → expected cell.
pub type ExpectedRow = BTreeMap<String, CellMatch>;

/// Builds an [`ExpectedRow`] from `(column, cell)` pairs.
pub fn expected_row<I, K, V>(cells: I) -> ExpectedRow
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<CellMatch>,
{
    cells
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A results table on the current page.
#[derive(Debug, Clone)]
pub struct TableElement {
    locator: Locator,
}

impl Default for TableElement {
    fn default() -> Self {
        Self::new(Locator::class("list-table"))
    }
}

impl TableElement {
    pub fn new(locator: Locator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub async fn snapshot<B: BrowserTrait>(&self, session: &WebSession<B>) -> Result<TableSnapshot> {
        session
            .wait_for_present(&self.locator, session.element_timeout())
            .await?;
        let table = TableSnapshot::parse(&session.html(&self.locator).await?)?;
        debug!(table = %self.locator, rows = table.len(), "table captured");
        Ok(table)
    }

    /// The "Displaying N of M found" footer, if the page renders one.
    pub async fn stats<B: BrowserTrait>(&self, session: &WebSession<B>) -> Result<Option<TableStats>> {
        let footer = Locator::class("table-stats");
        if !session.exists(&footer).await? {
            return Ok(None);
        }
        Ok(TableStats::parse(&session.text(&footer).await?))
    }

    pub async fn assert_data<B: BrowserTrait>(
        &self,
        session: &WebSession<B>,
        expected: &[ExpectedRow],
    ) -> Result<()> {
        check_table_data(&self.snapshot(session).await?, expected)
    }

    pub async fn assert_column<B: BrowserTrait>(
        &self,
        session: &WebSession<B>,
        column: &str,
        expected: &[&str],
    ) -> Result<()> {
        check_table_data_column(&self.snapshot(session).await?, column, expected)
    }

    pub async fn assert_column_unordered<B: BrowserTrait>(
        &self,
        session: &WebSession<B>,
        column: &str,
        expected: &[&str],
    ) -> Result<()> {
        check_table_data_column_unordered(&self.snapshot(session).await?, column, expected)
    }

    pub async fn assert_stats<B: BrowserTrait>(
        &self,
        session: &WebSession<B>,
        count: usize,
    ) -> Result<()> {
        let stats = self.stats(session).await?;
        ensure_eq(
            "Table stats",
            Some(TableStats {
                displayed: count,
                found: count,
            }),
            stats,
        )
    }
}

/// Compares rows in order. Each expected row lists only the columns it
/// cares about; every such column must exist in the table.
pub fn check_table_data(table: &TableSnapshot, expected: &[ExpectedRow]) -> Result<()> {
    ensure_eq("Table row count", expected.len(), table.len())?;

    for (index, (want, row)) in expected.iter().zip(table.rows.iter()).enumerate() {
        for (column, matcher) in want {
            let cell = table.cell(row, column)?;
            if let Some(actual) = matcher.mismatch(cell)? {
                return Err(HarnessError::assertion(
                    format!("Row {} column \"{}\"", index + 1, column),
                    matcher,
                    actual,
                ));
            }
        }
    }
    Ok(())
}

/// Compares one column against `expected` in rendered order. An empty list
/// means the table shows nothing.
pub fn check_table_data_column(table: &TableSnapshot, column: &str, expected: &[&str]) -> Result<()> {
    let expected: Vec<String> = expected.iter().map(|s| crate::dom::normalize_text(s)).collect();
    if table.is_empty() {
        return ensure_eq(format!("Column \"{}\"", column), expected, Vec::new());
    }
    ensure_eq(format!("Column \"{}\"", column), expected, table.column(column)?)
}

/// Like [`check_table_data_column`], ignoring row order.
pub fn check_table_data_column_unordered(
    table: &TableSnapshot,
    column: &str,
    expected: &[&str],
) -> Result<()> {
    let mut expected: Vec<String> = expected.iter().map(|s| crate::dom::normalize_text(s)).collect();
    let mut actual = if table.is_empty() {
        Vec::new()
    } else {
        table.column(column)?
    };
    expected.sort();
    actual.sort();
    ensure_eq(format!("Column \"{}\" (any order)", column), expected, actual)
}

pub async fn assert_table_data<B: BrowserTrait>(
    session: &WebSession<B>,
    expected: &[ExpectedRow],
) -> Result<()> {
    TableElement::default().assert_data(session, expected).await
}

pub async fn assert_table_data_column<B: BrowserTrait>(
    session: &WebSession<B>,
    column: &str,
    expected: &[&str],
) -> Result<()> {
    TableElement::default().assert_column(session, column, expected).await
}

pub async fn assert_table_data_column_unordered<B: BrowserTrait>(
    session: &WebSession<B>,
    column: &str,
    expected: &[&str],
) -> Result<()> {
    TableElement::default()
        .assert_column_unordered(session, column, expected)
        .await
}

pub async fn assert_table_stats<B: BrowserTrait>(session: &WebSession<B>, count: usize) -> Result<()> {
    TableElement::default().assert_stats(session, count).await
}
