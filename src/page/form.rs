use crate::browser::WebSession;
use crate::core::BrowserTrait;
use crate::errors::{ensure_eq, HarnessError, Result};
use crate::locator::Locator;
use crate::page::message::MessageBanner;
use crate::types::{FieldValue, Fields};
use crate::utils::ProbeCall;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// One entry of a checkbox or radio group as the page reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub label: String,
    pub checked: bool,
}

/// Toggles needed to turn the `current` checked set into `desired`:
/// `(label, checked)` pairs in rendered order.
pub fn reconcile(field: &str, current: &[Choice], desired: &[String]) -> Result<Vec<(String, bool)>> {
    if let Some(unknown) = desired
        .iter()
        .find(|want| !current.iter().any(|c| &c.label == *want))
    {
        return Err(HarnessError::OptionNotFound {
            field: field.to_string(),
            option: unknown.clone(),
        });
    }

    Ok(current
        .iter()
        .filter_map(|choice| {
            let wanted = desired.contains(&choice.label);
            (wanted != choice.checked).then(|| (choice.label.clone(), wanted))
        })
        .collect())
}

/// Kind of control as classified by the page runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    Text,
    Checkbox,
    Radio,
    Select,
    RadioList,
    CheckboxList,
    Multiselect,
}

#[derive(Debug, Deserialize)]
struct ReadBack {
    kind: ControlKind,
    value: Value,
}

/// A form on the current page, with its label → locator table.
///
/// Keys passed to [`FormElement::fill`] are either labels from that table,
/// prefixed locators (`id:hk_events_trigger`), or the visible label text of
/// a control inside the form.
#[derive(Debug, Clone)]
pub struct FormElement {
    locator: Locator,
    fields: Vec<(String, Locator)>,
    submit: Locator,
}

impl FormElement {
    pub fn new(locator: Locator) -> Self {
        let submit = Locator::css("button[type=\"submit\"]").within(locator.clone());
        Self {
            locator,
            fields: Vec::new(),
            submit,
        }
    }

    pub fn with_field(mut self, label: impl Into<String>, locator: Locator) -> Self {
        self.fields.push((label.into(), locator));
        self
    }

    pub fn with_submit(mut self, locator: Locator) -> Self {
        self.submit = locator;
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(label, _)| label.as_str())
    }

    /// Resolves a field key without touching the page.
    pub fn field_locator(&self, key: &str) -> Result<Locator> {
        if let Some(locator) = Locator::parse_prefixed(key) {
            return locator;
        }
        if let Some((_, locator)) = self.fields.iter().find(|(label, _)| label == key) {
            return Ok(locator.clone());
        }
        Ok(Locator::label(key).within(self.locator.clone()))
    }

    /// Resolves a field key and makes sure the control is on the page.
    pub async fn field<B: BrowserTrait>(&self, session: &WebSession<B>, key: &str) -> Result<Locator> {
        let locator = self.field_locator(key)?;
        if session.count(&locator).await? == 0 {
            return Err(HarnessError::UnknownField(key.to_string()));
        }
        Ok(locator)
    }

    pub async fn wait_until_ready<B: BrowserTrait>(&self, session: &WebSession<B>) -> Result<()> {
        session.wait_for(&self.locator).await
    }

    async fn read_back<B: BrowserTrait>(session: &WebSession<B>, locator: &Locator) -> Result<ReadBack> {
        let value = session.call(&ProbeCall::on("read", locator)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sets every field in order.
    pub async fn fill<B: BrowserTrait>(&self, session: &WebSession<B>, fields: &Fields) -> Result<()> {
        for (key, value) in fields.iter() {
            self.fill_field(session, key, value).await?;
        }
        Ok(())
    }

    pub async fn fill_field<B: BrowserTrait>(
        &self,
        session: &WebSession<B>,
        key: &str,
        value: &FieldValue,
    ) -> Result<()> {
        let locator = self.field(session, key).await?;
        let current = Self::read_back(session, &locator).await?;
        debug!(field = key, kind = ?current.kind, value = %value, "fill");

        match (current.kind, value) {
            (ControlKind::CheckboxList, FieldValue::List(desired)) => {
                self.fill_checkbox_list(session, key, &locator, desired).await
            }
            (ControlKind::Multiselect, FieldValue::List(items)) => {
                self.fill_multiselect(session, &locator, items).await
            }
            (ControlKind::Multiselect, FieldValue::Text(item)) => {
                self.fill_multiselect(session, &locator, std::slice::from_ref(item))
                    .await
            }
            (_, value) => {
                session
                    .call(&ProbeCall::fill(&locator, value.to_json()))
                    .await?;
                Ok(())
            }
        }
    }

    async fn fill_checkbox_list<B: BrowserTrait>(
        &self,
        session: &WebSession<B>,
        key: &str,
        locator: &Locator,
        desired: &[String],
    ) -> Result<()> {
        let options = session.call(&ProbeCall::on("options", locator)).await?;
        let current: Vec<Choice> = serde_json::from_value(options)?;
        for (label, checked) in reconcile(key, &current, desired)? {
            session
                .call(&ProbeCall::toggle(locator, &label, checked))
                .await?;
        }
        Ok(())
    }

    /// Replaces the selection: removes every chosen item, then types each
    /// name and picks it from the suggestion list.
    async fn fill_multiselect<B: BrowserTrait>(
        &self,
        session: &WebSession<B>,
        locator: &Locator,
        items: &[String],
    ) -> Result<()> {
        let remove = Locator::css(".multiselect-list li .btn-icon").within(locator.clone());
        while session.exists(&remove).await? {
            session.click(&remove).await?;
        }

        let input = Locator::css("input:not([type=\"hidden\"])").within(locator.clone());
        for item in items {
            session
                .call(&ProbeCall::fill(&input, json!(item)))
                .await?;
            let suggestion = Locator::css(format!(
                "ul.multiselect-suggest li[data-label={}]",
                serde_json::to_string(item)?
            ));
            session.wait_for(&suggestion).await?;
            session.click(&suggestion).await?;
        }
        Ok(())
    }

    pub async fn read_field<B: BrowserTrait>(&self, session: &WebSession<B>, key: &str) -> Result<FieldValue> {
        let locator = self.field(session, key).await?;
        let read = Self::read_back(session, &locator).await?;
        Ok(FieldValue::from_page(&read.value))
    }

    /// Reads back the given keys, in order.
    pub async fn read<'a, B, I>(&self, session: &WebSession<B>, keys: I) -> Result<Fields>
    where
        B: BrowserTrait,
        I: IntoIterator<Item = &'a str>,
    {
        let mut values = Fields::new();
        for key in keys {
            values.insert(key, self.read_field(session, key).await?);
        }
        Ok(values)
    }

    /// Asserts each field currently shows the expected value. Lists compare
    /// as sets, since groups render in their own order.
    pub async fn check_values<B: BrowserTrait>(&self, session: &WebSession<B>, expected: &Fields) -> Result<()> {
        for (key, want) in expected.iter() {
            let actual = self.read_field(session, key).await?;
            match (want, actual) {
                (FieldValue::List(want), FieldValue::List(mut actual)) => {
                    let mut want = want.clone();
                    want.sort();
                    actual.sort();
                    ensure_eq(format!("Field \"{}\"", key), want, actual)?;
                }
                (want, actual) => ensure_eq(format!("Field \"{}\"", key), want.clone(), actual)?,
            }
        }
        Ok(())
    }

    /// Submits and waits for the resulting banner. Nothing about the outcome
    /// can be asserted before this returns.
    pub async fn submit<B: BrowserTrait>(&self, session: &WebSession<B>) -> Result<MessageBanner> {
        info!(form = %self.locator, "submit");
        session.click(&self.submit).await?;
        session.wait_until_ready().await?;
        MessageBanner::find(session).await
    }

    /// Submits a form whose outcome is not announced by a banner (filters,
    /// cancel buttons) and waits for the reloaded page.
    pub async fn submit_without_message<B: BrowserTrait>(&self, session: &WebSession<B>) -> Result<()> {
        info!(form = %self.locator, "submit without message");
        session.click_and_reload(&self.submit).await?;
        Ok(())
    }
}
