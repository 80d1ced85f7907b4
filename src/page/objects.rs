//! Page objects for the frontend pages the acceptance scenarios drive.
//!
//! Each one pins the page URL, the title and header it must render, and the
//! label → locator table of its form.

use crate::browser::WebSession;
use crate::core::BrowserTrait;
use crate::errors::Result;
use crate::locator::Locator;
use crate::page::form::FormElement;
use crate::page::message::MessageBanner;
use crate::page::table::TableElement;
use crate::page::tags::{Evaluation, TagCondition, TagsTable};
use crate::types::Fields;
use tracing::info;

pub trait PageObject {
    const PATH: &'static str;
    const TITLE: &'static str;
    const HEADER: &'static str;

    fn form() -> FormElement;
}

/// Opens the page, checks where we landed and waits for the form.
pub async fn open_page<P: PageObject, B: BrowserTrait>(session: &WebSession<B>) -> Result<FormElement> {
    session.open(P::PATH).await?;
    session.check_title(P::TITLE).await?;
    session.check_header(P::HEADER).await?;

    let form = P::form();
    form.wait_until_ready(session).await?;
    info!(page = P::PATH, "page ready");
    Ok(form)
}

pub struct HousekeepingPage;

impl HousekeepingPage {
    /// Rows the housekeeping form persists to.
    pub const CONFIG_SQL: &'static str = "SELECT * FROM config ORDER BY configid";

    pub fn trigger_period_field() -> Locator {
        Locator::id("hk_events_trigger")
    }

    pub fn events_mode_field() -> Locator {
        Locator::id("hk_events_mode")
    }

    /// Fills the form and presses Update.
    pub async fn update<B: BrowserTrait>(session: &WebSession<B>, fields: &Fields) -> Result<MessageBanner> {
        let form = open_page::<Self, B>(session).await?;
        form.fill(session, fields).await?;
        form.submit(session).await
    }
}

impl PageObject for HousekeepingPage {
    const PATH: &'static str = "zabbix.php?action=housekeeping.edit";
    const TITLE: &'static str = "Configuration of housekeeping";
    const HEADER: &'static str = "Housekeeping";

    fn form() -> FormElement {
        FormElement::new(Locator::id("housekeeping-form"))
            .with_field("Enable internal housekeeping", Self::events_mode_field())
            .with_field("Trigger data storage period", Self::trigger_period_field())
            .with_field("Internal data storage period", Locator::id("hk_events_internal"))
            .with_field("Network discovery data storage period", Locator::id("hk_events_discovery"))
            .with_field("Autoregistration data storage period", Locator::id("hk_events_autoreg"))
            .with_field("Service data storage period", Locator::id("hk_services"))
            .with_field("User session data storage period", Locator::id("hk_sessions"))
            .with_field("History data storage period", Locator::id("hk_history"))
            .with_field("Trends data storage period", Locator::id("hk_trends"))
            .with_submit(Locator::button("Update").within(Locator::id("housekeeping-form")))
    }
}

pub struct MediaTypePage;

impl MediaTypePage {
    pub const MEDIA_TYPE_SQL: &'static str = "SELECT * FROM media_type ORDER BY mediatypeid";

    pub fn type_field() -> Locator {
        Locator::id("type")
    }

    pub fn connection_security_field() -> Locator {
        Locator::id("smtp_security")
    }

    pub fn authentication_field() -> Locator {
        Locator::id("smtp_authentication")
    }

    /// The create form with only name and type set.
    pub async fn start_create<B: BrowserTrait>(
        session: &WebSession<B>,
        name: &str,
        media_type: &str,
    ) -> Result<FormElement> {
        let form = open_page::<Self, B>(session).await?;
        form.fill(session, &Fields::new().set("Name", name).set("Type", media_type))
            .await?;
        Ok(form)
    }
}

impl PageObject for MediaTypePage {
    const PATH: &'static str = "zabbix.php?action=mediatype.edit";
    const TITLE: &'static str = "Configuration of media types";
    const HEADER: &'static str = "Media types";

    fn form() -> FormElement {
        FormElement::new(Locator::id("media-type-form"))
            .with_field("Name", Locator::id("name"))
            .with_field("Type", Self::type_field())
            .with_field("SMTP server", Locator::id("smtp_server"))
            .with_field("SMTP server port", Locator::id("smtp_port"))
            .with_field("SMTP helo", Locator::id("smtp_helo"))
            .with_field("SMTP email", Locator::id("smtp_email"))
            .with_field("Connection security", Self::connection_security_field())
            .with_field("SSL verify peer", Locator::id("smtp_verify_peer"))
            .with_field("SSL verify host", Locator::id("smtp_verify_host"))
            .with_field("Authentication", Self::authentication_field())
            .with_field("Username", Locator::id("smtp_username"))
            .with_field("Password", Locator::id("passwd"))
            .with_field("Message format", Locator::id("content_type"))
            .with_field("Description", Locator::id("description"))
            .with_field("Enabled", Locator::id("status"))
            .with_submit(Locator::button("Add").within(Locator::id("media-type-form")))
    }
}

pub struct HostListPage;

impl HostListPage {
    pub fn tags() -> TagsTable {
        TagsTable::filter()
    }

    pub fn table() -> TableElement {
        TableElement::default()
    }

    fn apply_button() -> Locator {
        Locator::button("Apply").within(Locator::name("zbx_filter"))
    }

    fn reset_button() -> Locator {
        Locator::button("Reset").within(Locator::name("zbx_filter"))
    }

    /// Applies a tag filter and waits for the list to reload.
    pub async fn filter_by_tags<B: BrowserTrait>(
        session: &WebSession<B>,
        evaluation: Evaluation,
        conditions: &[TagCondition],
    ) -> Result<()> {
        Self::tags().set_tags(session, evaluation, conditions).await?;
        Self::form().submit_without_message(session).await
    }

    pub async fn reset_filter<B: BrowserTrait>(session: &WebSession<B>) -> Result<()> {
        session.click_and_reload(&Self::reset_button()).await?;
        Ok(())
    }
}

impl PageObject for HostListPage {
    const PATH: &'static str = "zabbix.php?action=host.list";
    const TITLE: &'static str = "Configuration of hosts";
    const HEADER: &'static str = "Hosts";

    fn form() -> FormElement {
        FormElement::new(Locator::name("zbx_filter")).with_submit(Self::apply_button())
    }
}
