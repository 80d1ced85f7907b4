//! Element locators in the prefixed form used by the data tables
//! (`id:hk_events_mode`, `button:Update`, `xpath://h4[text()="Trends"]`).
//!
//! A locator is serialized as JSON and resolved inside the page by the
//! runtime in [`crate::utils::javascript`].

use crate::errors::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Locator {
    Id(String),
    Name(String),
    Class(String),
    Css(String),
    Xpath(String),
    /// A `<button>` or submit input whose visible text equals the value.
    Button(String),
    /// An `<a>` whose visible text equals the value.
    Link(String),
    /// The form control a `<label>` with this text points at.
    Label(String),
    Within {
        parent: Box<Locator>,
        child: Box<Locator>,
    },
}

const PREFIXES: [&str; 8] = [
    "id", "name", "class", "css", "xpath", "button", "link", "label",
];

impl Locator {
    /// Parses `prefix:value`. Strings without a known prefix are CSS selectors.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(HarnessError::InvalidLocator("empty locator".to_string()));
        }

        match Self::parse_prefixed(input) {
            Some(locator) => locator,
            None => Ok(Locator::Css(input.to_string())),
        }
    }

    /// Like [`Locator::parse`], but returns `None` for strings without a
    /// known prefix instead of treating them as CSS. Form helpers use this to
    /// tell `id:hk_events_trigger` apart from a label such as `Name`.
    pub fn parse_prefixed(input: &str) -> Option<Result<Self>> {
        let (prefix, value) = input.split_once(':')?;
        if !PREFIXES.contains(&prefix) {
            return None;
        }
        if value.is_empty() {
            return Some(Err(HarnessError::InvalidLocator(format!(
                "'{}' has an empty value",
                input
            ))));
        }

        let value = value.to_string();
        Some(Ok(match prefix {
            "id" => Locator::Id(value),
            "name" => Locator::Name(value),
            "class" => Locator::Class(value),
            "css" => Locator::Css(value),
            "xpath" => Locator::Xpath(value),
            "button" => Locator::Button(value),
            "link" => Locator::Link(value),
            _ => Locator::Label(value),
        }))
    }

    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Locator::Name(value.into())
    }

    pub fn class(value: impl Into<String>) -> Self {
        Locator::Class(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::Xpath(value.into())
    }

    pub fn button(text: impl Into<String>) -> Self {
        Locator::Button(text.into())
    }

    pub fn link(text: impl Into<String>) -> Self {
        Locator::Link(text.into())
    }

    pub fn label(text: impl Into<String>) -> Self {
        Locator::Label(text.into())
    }

    /// Restricts this locator to descendants of `parent`.
    pub fn within(self, parent: Locator) -> Self {
        Locator::Within {
            parent: Box::new(parent),
            child: Box::new(self),
        }
    }

    /// The innermost locator, ignoring any scoping.
    pub fn leaf(&self) -> &Locator {
        match self {
            Locator::Within { child, .. } => child.leaf(),
            other => other,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id:{}", v),
            Locator::Name(v) => write!(f, "name:{}", v),
            Locator::Class(v) => write!(f, "class:{}", v),
            Locator::Css(v) => write!(f, "css:{}", v),
            Locator::Xpath(v) => write!(f, "xpath:{}", v),
            Locator::Button(v) => write!(f, "button:{}", v),
            Locator::Link(v) => write!(f, "link:{}", v),
            Locator::Label(v) => write!(f, "label:{}", v),
            Locator::Within { parent, child } => write!(f, "{} >> {}", parent, child),
        }
    }
}

impl std::str::FromStr for Locator {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        Locator::parse(s)
    }
}
