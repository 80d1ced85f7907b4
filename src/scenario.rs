//! Data-driven scenarios: literal input, an expected outcome classification
//! and what should be visible afterwards.

use crate::dom::{Banner, CellMatch, TableSnapshot};
use crate::errors::{HarnessError, Result};
use crate::page::message::MessageBanner;
use crate::page::table::{check_table_data, check_table_data_column};
use crate::types::{Fields, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    /// The banner a submit produces.
    Message {
        title: String,
        #[serde(default)]
        details: Vec<String>,
    },
    /// The full result table, in order.
    Rows(Vec<BTreeMap<String, CellMatch>>),
    /// One column of the result table, in order. Empty means no rows.
    Column { column: String, values: Vec<String> },
    #[default]
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    #[serde(default)]
    pub fields: Fields,
    pub outcome: Outcome,
    #[serde(default)]
    pub expected: Expected,
}

impl Scenario {
    /// Parses a JSON array of scenarios.
    pub fn load_all(json: &str) -> Result<Vec<Scenario>> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn check_banner(&self, banner: &Banner) -> Result<()> {
        let message = MessageBanner::from_banner(banner.clone());
        match &self.expected {
            Expected::Message { title, details } => message.check(self.outcome, title, details),
            _ => {
                let expected_good = self.outcome.expects_success();
                if expected_good != banner.is_good() {
                    return Err(HarnessError::assertion(
                        format!("Message state for \"{}\"", self.label),
                        self.outcome,
                        banner.kind,
                    ));
                }
                Ok(())
            }
        }
    }

    /// Checks a captured table against `Rows` or `Column` expectations.
    /// Other expectations say nothing about tables.
    pub fn check_table(&self, table: &TableSnapshot) -> Result<()> {
        match &self.expected {
            Expected::Rows(rows) => check_table_data(table, rows),
            Expected::Column { column, values } => {
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                check_table_data_column(table, column, &values)
            }
            _ => Ok(()),
        }
    }
}
