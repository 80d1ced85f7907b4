//! Tag filter rows and the rules the frontend applies when filtering by them.

use crate::browser::WebSession;
use crate::core::BrowserTrait;
use crate::errors::{HarnessError, Result};
use crate::locator::Locator;
use crate::types::FieldValue;
use crate::utils::ProbeCall;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How the conditions of a tag filter are combined.
///
/// `AndOr` is not a synonym for `And`: conditions on the same tag name are
/// OR-ed together first, and only the per-name groups are AND-ed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evaluation {
    #[default]
    #[serde(rename = "And/Or")]
    AndOr,
    And,
    Or,
}

impl Evaluation {
    pub fn label(&self) -> &'static str {
        match self {
            Evaluation::AndOr => "And/Or",
            Evaluation::And => "And",
            Evaluation::Or => "Or",
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Evaluation {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "And/Or" => Ok(Evaluation::AndOr),
            "And" => Ok(Evaluation::And),
            "Or" => Ok(Evaluation::Or),
            other => Err(HarnessError::OptionNotFound {
                field: "Type of calculation".to_string(),
                option: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagOperator {
    Exists,
    Equals,
    #[default]
    Contains,
    #[serde(rename = "Does not exist")]
    DoesNotExist,
    #[serde(rename = "Does not equal")]
    DoesNotEqual,
    #[serde(rename = "Does not contain")]
    DoesNotContain,
}

impl TagOperator {
    pub fn label(&self) -> &'static str {
        match self {
            TagOperator::Exists => "Exists",
            TagOperator::Equals => "Equals",
            TagOperator::Contains => "Contains",
            TagOperator::DoesNotExist => "Does not exist",
            TagOperator::DoesNotEqual => "Does not equal",
            TagOperator::DoesNotContain => "Does not contain",
        }
    }

    /// Exists and Does not exist ignore the value input.
    pub fn takes_value(&self) -> bool {
        !matches!(self, TagOperator::Exists | TagOperator::DoesNotExist)
    }

    fn is_negative(&self) -> bool {
        matches!(
            self,
            TagOperator::DoesNotExist | TagOperator::DoesNotEqual | TagOperator::DoesNotContain
        )
    }
}

impl FromStr for TagOperator {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_value(json!(s)).map_err(|_| HarnessError::OptionNotFound {
            field: "Tag operator".to_string(),
            option: s.to_string(),
        })
    }
}

/// One `(name, operator, value)` row of a tag filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCondition {
    pub name: String,
    #[serde(default)]
    pub operator: TagOperator,
    #[serde(default)]
    pub value: String,
}

impl TagCondition {
    pub fn new(name: impl Into<String>, operator: TagOperator, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn contains(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, TagOperator::Contains, value)
    }

    /// Whether a single entity tag satisfies a positive condition, or
    /// violates a negative one.
    fn hits(&self, tag: &str, value: &str) -> bool {
        if tag != self.name {
            return false;
        }
        match self.operator {
            TagOperator::Exists | TagOperator::DoesNotExist => true,
            TagOperator::Equals | TagOperator::DoesNotEqual => value == self.value,
            TagOperator::Contains | TagOperator::DoesNotContain => {
                value.to_lowercase().contains(&self.value.to_lowercase())
            }
        }
    }

    /// Whether the condition holds for an entity carrying `tags`.
    pub fn matches(&self, tags: &[(String, String)]) -> bool {
        let hit = tags.iter().any(|(tag, value)| self.hits(tag, value));
        if self.operator.is_negative() {
            !hit
        } else {
            hit
        }
    }
}

/// An evaluation mode together with its conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    #[serde(default)]
    pub evaluation: Evaluation,
    #[serde(default)]
    pub conditions: Vec<TagCondition>,
}

impl TagFilter {
    pub fn new(evaluation: Evaluation, conditions: Vec<TagCondition>) -> Self {
        Self {
            evaluation,
            conditions,
        }
    }

    /// Whether an entity with `tags` passes the filter. No conditions
    /// means no filtering.
    pub fn matches(&self, tags: &[(String, String)]) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        match self.evaluation {
            Evaluation::Or => self.groups().values().any(|group| group_matches(group, tags)),
            Evaluation::And => self.conditions.iter().all(|c| c.matches(tags)),
            Evaluation::AndOr => self.groups().values().all(|group| group_matches(group, tags)),
        }
    }

    fn groups(&self) -> BTreeMap<&str, Vec<&TagCondition>> {
        let mut groups: BTreeMap<&str, Vec<&TagCondition>> = BTreeMap::new();
        for condition in &self.conditions {
            groups.entry(condition.name.as_str()).or_default().push(condition);
        }
        groups
    }
}

/// Conditions sharing one tag name. Negative value conditions of a group
/// merge into a single "no such value" test, under `Or` as well.
fn group_matches(group: &[&TagCondition], tags: &[(String, String)]) -> bool {
    if let Some(exists) = group.iter().find(|c| c.operator == TagOperator::Exists) {
        return exists.matches(tags);
    }

    let positive = group.iter().any(|c| !c.operator.is_negative() && c.matches(tags));
    let absent = group
        .iter()
        .any(|c| c.operator == TagOperator::DoesNotExist && c.matches(tags));
    let value_negatives: Vec<&&TagCondition> = group
        .iter()
        .filter(|c| matches!(c.operator, TagOperator::DoesNotEqual | TagOperator::DoesNotContain))
        .collect();
    let negatives_hold =
        !value_negatives.is_empty() && value_negatives.iter().all(|c| c.matches(tags));

    positive || absent || negatives_hold
}

const ROW_XPATH: &str = ".//tr[contains(concat(' ', normalize-space(@class), ' '), ' form_row ')]";

/// The repeatable tag rows of a filter form, plus its evaluation selector.
#[derive(Debug, Clone)]
pub struct TagsTable {
    table: Locator,
    evaluation: Locator,
}

impl TagsTable {
    pub fn new(table: Locator, evaluation: Locator) -> Self {
        Self { table, evaluation }
    }

    /// The tag table of list filters (hosts, problems, templates).
    pub fn filter() -> Self {
        Self::new(Locator::id("filter-tags"), Locator::id("filter_evaltype"))
    }

    /// Every rendered condition row.
    pub fn rows(&self) -> Locator {
        Locator::xpath(ROW_XPATH).within(self.table.clone())
    }

    /// The `index`-th condition row, counted from zero.
    pub fn row(&self, index: usize) -> Locator {
        Locator::xpath(format!("({})[{}]", ROW_XPATH, index + 1)).within(self.table.clone())
    }

    fn remove_button(&self, index: usize) -> Locator {
        Locator::button("Remove").within(self.row(index))
    }

    fn name_input(&self, index: usize) -> Locator {
        Locator::css("input[name$=\"[tag]\"]").within(self.row(index))
    }

    fn operator_input(&self, index: usize) -> Locator {
        Locator::css("[name$=\"[operator]\"]").within(self.row(index))
    }

    fn value_input(&self, index: usize) -> Locator {
        Locator::css("input[name$=\"[value]\"]").within(self.row(index))
    }

    fn add_button(&self) -> Locator {
        Locator::button("Add").within(self.table.clone())
    }

    /// Selects the evaluation mode and fills one row per condition, adding
    /// rows as needed. Rows left over from an earlier filter are removed;
    /// the first row is always rendered and is blanked when there are no
    /// conditions.
    pub async fn set_tags<B: BrowserTrait>(
        &self,
        session: &WebSession<B>,
        evaluation: Evaluation,
        conditions: &[TagCondition],
    ) -> Result<()> {
        session
            .call(&ProbeCall::fill(&self.evaluation, json!(evaluation.label())))
            .await?;

        for (index, condition) in conditions.iter().enumerate() {
            let name = self.name_input(index);
            if !session.exists(&name).await? {
                session.click(&self.add_button()).await?;
                session.wait_for(&name).await?;
            }
            debug!(row = index, tag = %condition.name, operator = condition.operator.label(), "tag row");

            session
                .call(&ProbeCall::fill(&name, json!(condition.name)))
                .await?;
            session
                .call(&ProbeCall::fill(
                    &self.operator_input(index),
                    json!(condition.operator.label()),
                ))
                .await?;
            if condition.operator.takes_value() {
                session
                    .call(&ProbeCall::fill(&self.value_input(index), json!(condition.value)))
                    .await?;
            }
        }

        self.remove_rows_from(session, conditions.len().max(1)).await?;
        if conditions.is_empty() && session.exists(&self.name_input(0)).await? {
            self.clear_row(session, 0).await?;
        }
        Ok(())
    }

    async fn remove_rows_from<B: BrowserTrait>(&self, session: &WebSession<B>, keep: usize) -> Result<()> {
        loop {
            let rendered = session.count(&self.rows()).await?;
            if rendered <= keep {
                return Ok(());
            }
            debug!(row = rendered - 1, "remove stale tag row");
            session.click(&self.remove_button(rendered - 1)).await?;
            session.wait_for_count(&self.rows(), rendered - 1).await?;
        }
    }

    async fn clear_row<B: BrowserTrait>(&self, session: &WebSession<B>, index: usize) -> Result<()> {
        session
            .call(&ProbeCall::fill(&self.name_input(index), json!("")))
            .await?;
        session
            .call(&ProbeCall::fill(
                &self.operator_input(index),
                json!(TagOperator::default().label()),
            ))
            .await?;
        session
            .call(&ProbeCall::fill(&self.value_input(index), json!("")))
            .await?;
        Ok(())
    }

    /// Reads back every row that has a tag name.
    pub async fn conditions<B: BrowserTrait>(&self, session: &WebSession<B>) -> Result<Vec<TagCondition>> {
        let mut conditions = Vec::new();
        let mut index = 0;
        while session.exists(&self.name_input(index)).await? {
            let name = self.read_text(session, &self.name_input(index)).await?;
            if !name.is_empty() {
                let operator: TagOperator = self
                    .read_text(session, &self.operator_input(index))
                    .await?
                    .parse()?;
                let value = if operator.takes_value() {
                    self.read_text(session, &self.value_input(index)).await?
                } else {
                    String::new()
                };
                conditions.push(TagCondition::new(name, operator, value));
            }
            index += 1;
        }
        Ok(conditions)
    }

    pub async fn evaluation<B: BrowserTrait>(&self, session: &WebSession<B>) -> Result<Evaluation> {
        self.read_text(session, &self.evaluation).await?.parse()
    }

    async fn read_text<B: BrowserTrait>(&self, session: &WebSession<B>, locator: &Locator) -> Result<String> {
        let read = session.call(&ProbeCall::on("read", locator)).await?;
        match FieldValue::from_page(read.get("value").unwrap_or(&read)) {
            FieldValue::Text(text) => Ok(text),
            other => Err(HarnessError::JavaScriptFailed(format!(
                "{} read back as {} instead of text",
                locator, other
            ))),
        }
    }
}
