use super::{element_text, normalize_text, selector};
use crate::errors::{HarnessError, Result};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Good,
    Bad,
    Warning,
}

impl MessageKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            MessageKind::Good => "msg-good",
            MessageKind::Bad => "msg-bad",
            MessageKind::Warning => "msg-warning",
        }
    }

    fn from_classes<'a>(mut classes: impl Iterator<Item = &'a str>) -> Option<Self> {
        classes.find_map(|class| match class {
            "msg-good" => Some(MessageKind::Good),
            "msg-bad" => Some(MessageKind::Bad),
            "msg-warning" => Some(MessageKind::Warning),
            _ => None,
        })
    }
}

/// The post-action notification: its state, headline and detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub kind: MessageKind,
    pub title: String,
    pub lines: Vec<String>,
}

pub(crate) const BANNER_CSS: &str = ".msg-good, .msg-bad, .msg-warning";

impl Banner {
    pub fn parse(html: &str) -> Result<Self> {
        let fragment = Html::parse_fragment(html);
        let banner = fragment
            .select(&selector(BANNER_CSS)?)
            .next()
            .ok_or_else(|| HarnessError::ElementNotFound("message banner in captured HTML".to_string()))?;

        let kind = MessageKind::from_classes(banner.value().classes()).ok_or_else(|| {
            HarnessError::ElementNotFound("message banner state class".to_string())
        })?;

        let lines: Vec<String> = banner
            .select(&selector(".msg-details li")?)
            .map(|li| element_text(&li))
            .filter(|line| !line.is_empty())
            .collect();

        Ok(Self {
            kind,
            title: Self::title_of(&banner)?,
            lines,
        })
    }

    fn title_of(banner: &ElementRef<'_>) -> Result<String> {
        if let Some(title) = banner.select(&selector(".msg-title")?).next() {
            return Ok(element_text(&title));
        }

        let first_span = banner
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "span");
        Ok(first_span.map(|span| element_text(&span)).unwrap_or_default())
    }

    pub fn is_good(&self) -> bool {
        self.kind == MessageKind::Good
    }

    pub fn is_bad(&self) -> bool {
        self.kind == MessageKind::Bad
    }

    pub fn has_line(&self, text: &str) -> bool {
        let text = normalize_text(text);
        self.lines.iter().any(|line| *line == text)
    }

    /// Expected lines missing from the banner, in the order they were given.
    pub fn missing_lines<'a>(&self, expected: &'a [String]) -> Vec<&'a str> {
        expected
            .iter()
            .filter(|line| !self.has_line(line))
            .map(String::as_str)
            .collect()
    }
}
