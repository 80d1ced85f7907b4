//! Parsing of rendered fragments (tables, message banners) captured from the page.

pub mod message;
pub mod table;

pub use message::{Banner, MessageKind};
pub use table::{CellMatch, TableCell, TableRow, TableSnapshot, TableStats};

use crate::errors::{HarnessError, Result};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

/// Collapses runs of whitespace (including non-breaking spaces) and trims.
pub fn normalize_text(text: &str) -> String {
    static WS: OnceLock<Regex> = OnceLock::new();
    let ws = WS.get_or_init(|| Regex::new(r"[\s\u{a0}]+").expect("static regex"));
    ws.replace_all(text, " ").trim().to_string()
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| HarnessError::InvalidLocator(format!("{}: {:?}", css, e)))
}

pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}
