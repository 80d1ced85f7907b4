//! An in-process stand-in for the frontend: it answers the page runtime
//! protocol from a small model of the login, housekeeping, media type, host
//! form and host list pages, persisting to a real SQLite file.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use browser_acceptance::core::{BrowserTrait, Config, CookieData};
use browser_acceptance::utils::ProbeCall;
use browser_acceptance::{Database, Locator, Result};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "http://localhost/";

pub const SCHEMA: &str = "
    CREATE TABLE config (
        configid INTEGER PRIMARY KEY,
        hk_events_mode INTEGER NOT NULL,
        hk_events_trigger TEXT NOT NULL,
        hk_events_internal TEXT NOT NULL,
        hk_trends TEXT NOT NULL
    );
    INSERT INTO config VALUES (1, 1, '365d', '1d', '365d');
    CREATE TABLE media_type (
        mediatypeid INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        smtp_security INTEGER NOT NULL,
        smtp_authentication INTEGER NOT NULL
    );
    INSERT INTO media_type VALUES (1, 'Email', 'Email', 0, 0);
    CREATE TABLE sessions (
        sessionid TEXT PRIMARY KEY,
        userid INTEGER NOT NULL,
        lastaccess INTEGER NOT NULL,
        status INTEGER NOT NULL
    );
";

/// Creates the schema in a fresh database file.
pub fn seed_database(path: &Path) -> Database {
    let db = Database::open(path).unwrap();
    db.execute_batch(SCHEMA).unwrap();
    db
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.frontend.base_url = BASE_URL.to_string();
    config.waits.navigation_timeout_ms = 500;
    config.waits.element_timeout_ms = 300;
    config.waits.message_timeout_ms = 300;
    config.waits.poll_interval_ms = 5;
    config
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Dashboard,
    Housekeeping,
    MediaType,
    HostForm,
    HostList,
}

impl Page {
    fn title(&self) -> &'static str {
        match self {
            Page::Login => "Zabbix",
            Page::Dashboard => "Dashboard",
            Page::Housekeeping => "Configuration of housekeeping",
            Page::MediaType => "Configuration of media types",
            Page::HostForm | Page::HostList => "Configuration of hosts",
        }
    }

    fn header(&self) -> &'static str {
        match self {
            Page::Login => "",
            Page::Dashboard => "Global view",
            Page::Housekeeping => "Housekeeping",
            Page::MediaType => "Media types",
            Page::HostForm | Page::HostList => "Hosts",
        }
    }

    fn form(&self) -> Option<Locator> {
        match self {
            Page::Housekeeping => Some(Locator::id("housekeeping-form")),
            Page::MediaType => Some(Locator::id("media-type-form")),
            Page::HostForm => Some(Locator::id("host-form")),
            Page::HostList => Some(Locator::name("zbx_filter")),
            Page::Login | Page::Dashboard => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Text(String),
    Checkbox(bool),
    Select { options: Vec<String>, selected: String },
    RadioList { options: Vec<String>, selected: String },
    CheckboxList(Vec<(String, bool)>),
    Multiselect {
        available: Vec<String>,
        selected: Vec<String>,
        typed: String,
    },
}

impl Control {
    fn kind(&self) -> &'static str {
        match self {
            Control::Text(_) => "text",
            Control::Checkbox(_) => "checkbox",
            Control::Select { .. } => "select",
            Control::RadioList { .. } => "radio-list",
            Control::CheckboxList(_) => "checkbox-list",
            Control::Multiselect { .. } => "multiselect",
        }
    }

    fn value(&self) -> Value {
        match self {
            Control::Text(text) => json!(text),
            Control::Checkbox(checked) => json!(checked),
            Control::Select { selected, .. } | Control::RadioList { selected, .. } => json!(selected),
            Control::CheckboxList(items) => json!(items
                .iter()
                .filter(|(_, checked)| *checked)
                .map(|(label, _)| label)
                .collect::<Vec<_>>()),
            Control::Multiselect { selected, .. } => json!(selected),
        }
    }

    fn fill(&mut self, value: &Value) -> Value {
        match (self, value) {
            (Control::Text(text), Value::String(v)) => {
                *text = v.clone();
                ok(json!(v))
            }
            (Control::Checkbox(checked), Value::Bool(v)) => {
                *checked = *v;
                ok(json!(v))
            }
            (
                Control::Select { options, selected } | Control::RadioList { options, selected },
                Value::String(v),
            ) => {
                if options.contains(v) {
                    *selected = v.clone();
                    ok(json!(v))
                } else {
                    fail("no_option", v)
                }
            }
            (control, _) => fail("type", &format!("{} cannot take {}", control.kind(), value)),
        }
    }
}

fn radio(options: &[&str], selected: &str) -> Control {
    Control::RadioList {
        options: options.iter().map(|s| s.to_string()).collect(),
        selected: selected.to_string(),
    }
}

fn select(options: &[&str], selected: &str) -> Control {
    Control::Select {
        options: options.iter().map(|s| s.to_string()).collect(),
        selected: selected.to_string(),
    }
}

fn text(value: &str) -> Control {
    Control::Text(value.to_string())
}

pub const OPERATORS: [&str; 6] = [
    "Exists",
    "Equals",
    "Contains",
    "Does not exist",
    "Does not equal",
    "Does not contain",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TagRow {
    pub tag: Control,
    pub operator: Control,
    pub value: Control,
}

impl TagRow {
    fn empty() -> Self {
        Self {
            tag: text(""),
            operator: select(&OPERATORS, "Contains"),
            value: text(""),
        }
    }

    fn text_of(control: &Control) -> String {
        control.value().as_str().unwrap_or("").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct FakeHost {
    pub name: &'static str,
    pub interface: &'static str,
    pub tags: Vec<(&'static str, &'static str)>,
}

pub fn fake_hosts() -> Vec<FakeHost> {
    vec![
        FakeHost {
            name: "Simple form test host",
            interface: "127.0.0.1:10050",
            tags: vec![("tag", "host"), ("test", "test_tag")],
        },
        FakeHost {
            name: "Host for tags filtering",
            interface: "127.0.0.2:10050",
            tags: vec![("tag", "host")],
        },
        FakeHost {
            name: "Host for tags filtering - clone",
            interface: "127.0.0.3:10050",
            tags: vec![("test", "test_tag_clone")],
        },
        FakeHost {
            name: "Host without tags",
            interface: "127.0.0.4:10050",
            tags: vec![],
        },
    ]
}

/// What a locator resolved to on the current page.
#[derive(Debug, Clone, PartialEq)]
enum Target {
    Header,
    Form,
    Control(String),
    RadioOption(String, usize),
    Button(String),
    Banner,
    BannerClose,
    Table,
    TableStats,
    TagsTable,
    TagRows,
    TagRow(usize),
    TagRemove(usize),
    TagName(usize),
    TagOperator(usize),
    TagValue(usize),
    TagAdd,
    MultiselectRemove(String),
    MultiselectInput(String),
    Suggestion(String),
}

fn ok(value: Value) -> Value {
    json!({ "ok": true, "value": value })
}

fn fail(kind: &str, error: &str) -> Value {
    json!({ "ok": false, "kind": kind, "error": error })
}

pub struct Frontend {
    db: Database,
    pub page: Page,
    pub url: String,
    pub user: Option<String>,
    pub cookies: Vec<CookieData>,
    pub banner: Option<String>,
    pub controls: BTreeMap<String, Control>,
    pub labels: BTreeMap<&'static str, &'static str>,
    pub tag_rows: Vec<TagRow>,
    /// Filter stored by the last Apply.
    pub applied: Option<(String, Vec<(String, String, String)>)>,
    /// Filter the current document was rendered with.
    pub shown: Option<(String, Vec<(String, String, String)>)>,
    pub hosts: Vec<FakeHost>,
    pub ops: Vec<String>,
    /// Set by the runtime's `mark` op, cleared by every page load.
    pub stale: bool,
    /// Number of runtime calls a click-triggered page load lags behind.
    pub navigation_delay: u32,
    pending_load: Option<(u32, String)>,
    /// The browser showing this frontend was shut down.
    pub closed: bool,
}

impl Frontend {
    pub fn new(db_path: &Path) -> Self {
        Self {
            db: Database::open(db_path).unwrap(),
            page: Page::Login,
            url: BASE_URL.to_string(),
            user: None,
            cookies: Vec::new(),
            banner: None,
            controls: BTreeMap::new(),
            labels: BTreeMap::new(),
            tag_rows: Vec::new(),
            applied: None,
            shown: None,
            hosts: fake_hosts(),
            ops: Vec::new(),
            stale: false,
            navigation_delay: 0,
            pending_load: None,
            closed: false,
        }
    }

    fn has_valid_cookie(&self) -> bool {
        self.cookies.iter().any(|cookie| {
            let Ok(raw) = base64::engine::general_purpose::STANDARD.decode(&cookie.value) else {
                return false;
            };
            let Ok(payload) = serde_json::from_slice::<Value>(&raw) else {
                return false;
            };
            let Some(id) = payload["sessionid"].as_str() else {
                return false;
            };
            self.db
                .get_count(&format!(
                    "SELECT * FROM sessions WHERE sessionid={} AND status=0",
                    browser_acceptance::db::quote(id)
                ))
                .map(|n| n == 1)
                .unwrap_or(false)
        })
    }

    fn navigate(&mut self, url: &str) {
        self.url = url.to_string();
        self.stale = false;
        self.pending_load = None;
        self.banner = None;
        self.controls.clear();
        self.labels.clear();

        let path = url.strip_prefix(BASE_URL).unwrap_or(url);
        if path == "index.php?reconnect=1" {
            self.user = None;
            self.cookies.clear();
        }
        let authenticated = self.user.is_some() || self.has_valid_cookie();

        self.page = match path {
            _ if !authenticated => Page::Login,
            "zabbix.php?action=housekeeping.edit" => Page::Housekeeping,
            "zabbix.php?action=mediatype.edit" => Page::MediaType,
            "hosts.php?form=create" => Page::HostForm,
            "zabbix.php?action=host.list" => Page::HostList,
            _ => Page::Dashboard,
        };
        self.load_page();
    }

    fn load_page(&mut self) {
        match self.page {
            Page::Login => {
                self.controls.insert("name".into(), text(""));
                self.controls.insert("password".into(), text(""));
            }
            Page::Dashboard => {}
            Page::Housekeeping => {
                let row = self
                    .db
                    .get_row("SELECT * FROM config WHERE configid=1")
                    .unwrap()
                    .unwrap();
                let as_text = |column: &str| browser_acceptance::db::render(&row[column]);
                self.controls.insert(
                    "hk_events_mode".into(),
                    Control::Checkbox(as_text("hk_events_mode") == "1"),
                );
                for column in ["hk_events_trigger", "hk_events_internal", "hk_trends"] {
                    self.controls.insert(column.into(), Control::Text(as_text(column)));
                }
            }
            Page::MediaType => {
                self.controls.insert("name".into(), text(""));
                self.controls
                    .insert("type".into(), select(&["Email", "SMS", "Script", "Webhook"], "Email"));
                self.controls.insert("smtp_server".into(), text("mail.example.com"));
                self.controls.insert("smtp_port".into(), text("25"));
                self.controls.insert("smtp_helo".into(), text("example.com"));
                self.controls.insert("smtp_email".into(), text("zabbix@example.com"));
                self.controls.insert(
                    "smtp_security".into(),
                    radio(&["No encryption", "STARTTLS", "SSL/TLS"], "No encryption"),
                );
                self.controls.insert(
                    "smtp_authentication".into(),
                    radio(&["None", "Username and password"], "None"),
                );
                self.controls.insert("description".into(), text(""));
                self.controls.insert("status".into(), Control::Checkbox(true));
            }
            Page::HostForm => {
                self.controls.insert("host".into(), text(""));
                self.controls.insert("visiblename".into(), text(""));
                self.controls.insert(
                    "groups_".into(),
                    Control::Multiselect {
                        available: vec![
                            "Discovered hosts".into(),
                            "Linux servers".into(),
                            "Zabbix servers".into(),
                        ],
                        selected: vec!["Discovered hosts".into()],
                        typed: String::new(),
                    },
                );
                self.controls.insert("status".into(), Control::Checkbox(true));
                self.controls.insert(
                    "tls_accept".into(),
                    Control::CheckboxList(vec![
                        ("No encryption".into(), true),
                        ("PSK".into(), false),
                        ("Certificate".into(), false),
                    ]),
                );
                self.controls.insert(
                    "tls_connect".into(),
                    radio(&["No encryption", "PSK", "Certificate"], "No encryption"),
                );
                self.labels = BTreeMap::from([
                    ("Host name", "host"),
                    ("Visible name", "visiblename"),
                    ("Groups", "groups_"),
                    ("Enabled", "status"),
                    ("Connections from host", "tls_accept"),
                    ("Connections to host", "tls_connect"),
                ]);
            }
            Page::HostList => {
                self.shown = self.applied.clone();
                let (evaluation, rows) = self.applied.clone().unwrap_or_default();
                let evaluation = if evaluation.is_empty() { "And/Or".to_string() } else { evaluation };
                self.controls
                    .insert("filter_evaltype".into(), radio(&["And/Or", "And", "Or"], &evaluation));
                self.tag_rows = rows
                    .into_iter()
                    .map(|(tag, operator, value)| TagRow {
                        tag: Control::Text(tag),
                        operator: select(&OPERATORS, &operator),
                        value: Control::Text(value),
                    })
                    .collect();
                if self.tag_rows.is_empty() {
                    self.tag_rows.push(TagRow::empty());
                }
            }
        }
    }

    fn resolve(&self, locator: &Locator) -> Option<Target> {
        match locator {
            locator if self.page.form().as_ref() == Some(locator) => Some(Target::Form),
            Locator::Id(id) if id == "page-title-general" && self.page != Page::Login => {
                Some(Target::Header)
            }
            Locator::Id(id) if id == "enter" && self.page == Page::Login => {
                Some(Target::Button("enter".into()))
            }
            Locator::Id(id) if id == "filter-tags" && self.page == Page::HostList => {
                Some(Target::TagsTable)
            }
            Locator::Id(id) if self.controls.contains_key(id) => Some(Target::Control(id.clone())),
            Locator::Id(id) => self.radio_option(id),
            Locator::Class(class) if class == "list-table" && self.page == Page::HostList => {
                Some(Target::Table)
            }
            Locator::Class(class) if class == "table-stats" && self.page == Page::HostList => {
                (!self.visible_hosts().is_empty()).then_some(Target::TableStats)
            }
            Locator::Css(css) if css.contains(".msg-good") => self.banner.as_ref().map(|_| Target::Banner),
            Locator::Css(css) => {
                let label = css
                    .strip_prefix("ul.multiselect-suggest li[data-label=")?
                    .strip_suffix(']')?;
                let label: String = serde_json::from_str(label).ok()?;
                self.suggestion_shown(&label).then_some(Target::Suggestion(label))
            }
            Locator::Within { parent, child } => self.resolve_within(self.resolve(parent)?, child),
            _ => None,
        }
    }

    fn resolve_within(&self, parent: Target, child: &Locator) -> Option<Target> {
        let row_index = Regex::new(r"\)\[(\d+)\]$").unwrap();
        match (parent, child) {
            (Target::Banner, Locator::Css(css)) if css == ".btn-overlay-close" => Some(Target::BannerClose),
            (Target::Form, Locator::Button(text)) => {
                let known = match self.page {
                    Page::Housekeeping => text == "Update",
                    Page::MediaType => text == "Add",
                    Page::HostList => text == "Apply" || text == "Reset",
                    _ => false,
                };
                known.then(|| Target::Button(text.clone()))
            }
            (Target::Form, Locator::Label(label)) => {
                let id = self.labels.get(label.as_str())?;
                Some(Target::Control(id.to_string()))
            }
            (Target::Control(id), Locator::Css(css)) => match self.controls.get(&id)? {
                Control::Multiselect { selected, .. } if css == ".multiselect-list li .btn-icon" => {
                    (!selected.is_empty()).then_some(Target::MultiselectRemove(id))
                }
                Control::Multiselect { .. } if css == "input:not([type=\"hidden\"])" => {
                    Some(Target::MultiselectInput(id))
                }
                _ => None,
            },
            (Target::TagsTable, Locator::Xpath(xpath)) => match row_index.captures(xpath) {
                Some(caps) => {
                    let index: usize = caps[1].parse().ok()?;
                    (index >= 1 && index <= self.tag_rows.len()).then(|| Target::TagRow(index - 1))
                }
                None => (xpath.contains("form_row") && !self.tag_rows.is_empty()).then_some(Target::TagRows),
            },
            (Target::TagsTable, Locator::Button(text)) if text == "Add" => Some(Target::TagAdd),
            (Target::TagRow(i), Locator::Button(text)) if text == "Remove" => Some(Target::TagRemove(i)),
            (Target::TagRow(i), Locator::Css(css)) => match css.as_str() {
                "input[name$=\"[tag]\"]" => Some(Target::TagName(i)),
                "[name$=\"[operator]\"]" => Some(Target::TagOperator(i)),
                "input[name$=\"[value]\"]" => Some(Target::TagValue(i)),
                _ => None,
            },
            _ => None,
        }
    }

    fn radio_option(&self, id: &str) -> Option<Target> {
        let (base, index) = id.rsplit_once('_')?;
        let index: usize = index.parse().ok()?;
        match self.controls.get(base)? {
            Control::RadioList { options, .. } if index < options.len() => {
                Some(Target::RadioOption(base.to_string(), index))
            }
            _ => None,
        }
    }

    fn suggestion_shown(&self, label: &str) -> bool {
        self.controls.values().any(|control| match control {
            Control::Multiselect {
                available,
                selected,
                typed,
            } => {
                !typed.is_empty()
                    && available.iter().any(|a| a == label)
                    && !selected.iter().any(|s| s == label)
                    && label.to_lowercase().contains(&typed.to_lowercase())
            }
            _ => false,
        })
    }

    fn tag_control(&mut self, target: &Target) -> Option<&mut Control> {
        match *target {
            Target::TagName(i) => self.tag_rows.get_mut(i).map(|r| &mut r.tag),
            Target::TagOperator(i) => self.tag_rows.get_mut(i).map(|r| &mut r.operator),
            Target::TagValue(i) => self.tag_rows.get_mut(i).map(|r| &mut r.value),
            _ => None,
        }
    }

    fn control_mut(&mut self, target: &Target) -> Option<&mut Control> {
        match target {
            Target::Control(id) => self.controls.get_mut(id),
            _ => self.tag_control(target),
        }
    }

    pub fn handle(&mut self, call: &ProbeCall) -> Value {
        self.ops.push(call.op.clone());
        self.tick_pending_load();
        match call.op.as_str() {
            "ready" => {
                return ok(json!({
                    "readyState": "complete",
                    "pending": 0,
                    "stale": self.stale,
                    "url": self.url
                }))
            }
            "mark" => {
                self.stale = true;
                return ok(json!(true));
            }
            _ => {}
        }

        let Some(locator) = call.locator() else {
            return fail("unknown_op", &call.op);
        };
        let target = self.resolve(&locator);

        match call.op.as_str() {
            "count" => ok(json!(match target {
                Some(Target::TagRows) => self.tag_rows.len(),
                Some(_) => 1,
                None => 0,
            })),
            "visible" => ok(json!(target.is_some())),
            _ => match target {
                Some(target) => self.act(call, target),
                None => fail("not_found", "no element"),
            },
        }
    }

    fn act(&mut self, call: &ProbeCall, target: Target) -> Value {
        match call.op.as_str() {
            "html" => match target {
                Target::Banner => ok(json!(self.banner.clone().unwrap_or_default())),
                Target::Table => ok(json!(self.render_table())),
                _ => ok(json!("<div></div>")),
            },
            "text" => match target {
                Target::Header => ok(json!(self.page.header())),
                Target::TableStats => {
                    let n = self.visible_hosts().len();
                    ok(json!(format!("Displaying {} of {} found", n, n)))
                }
                _ => ok(json!("")),
            },
            "click" => self.click(target),
            "read" => match target {
                Target::RadioOption(id, index) => match &self.controls[&id] {
                    Control::RadioList { options, selected } => {
                        ok(json!({ "kind": "radio", "value": options[index] == *selected }))
                    }
                    _ => fail("type", "not a radio"),
                },
                target => match self.control_mut(&target) {
                    Some(control) => ok(json!({ "kind": control.kind(), "value": control.value() })),
                    None => fail("type", "not a control"),
                },
            },
            "options" => match self.control_mut(&target) {
                Some(Control::CheckboxList(items)) => ok(json!(items
                    .iter()
                    .map(|(label, checked)| json!({ "label": label, "checked": checked }))
                    .collect::<Vec<_>>())),
                _ => fail("type", "no options"),
            },
            "toggle" => {
                let label = call.args["label"].as_str().unwrap_or_default().to_string();
                let checked = call.args["checked"].as_bool().unwrap_or(false);
                match self.control_mut(&target) {
                    Some(Control::CheckboxList(items)) => {
                        match items.iter_mut().find(|(l, _)| *l == label) {
                            Some(item) => {
                                item.1 = checked;
                                ok(json!(checked))
                            }
                            None => fail("no_option", &label),
                        }
                    }
                    _ => fail("type", "not a checkbox list"),
                }
            }
            "fill" => {
                let value = call.args["value"].clone();
                if let Target::MultiselectInput(id) = &target {
                    if let Some(Control::Multiselect { typed, .. }) = self.controls.get_mut(id) {
                        *typed = value.as_str().unwrap_or_default().to_string();
                        return ok(value);
                    }
                }
                match self.control_mut(&target) {
                    Some(control) => control.fill(&value),
                    None => fail("type", "not fillable"),
                }
            }
            other => fail("unknown_op", other),
        }
    }

    fn click(&mut self, target: Target) -> Value {
        match target {
            Target::Button(button) => match button.as_str() {
                "enter" => self.submit_login(),
                "Update" => self.submit_housekeeping(),
                "Add" => self.submit_media_type(),
                "Apply" => {
                    let evaluation = TagRow::text_of(&self.controls["filter_evaltype"]);
                    let rows = self
                        .tag_rows
                        .iter()
                        .map(|r| (TagRow::text_of(&r.tag), TagRow::text_of(&r.operator), TagRow::text_of(&r.value)))
                        .filter(|(tag, _, _)| !tag.is_empty())
                        .collect();
                    self.applied = Some((evaluation, rows));
                    let url = self.url.clone();
                    self.load_after_click(url);
                }
                "Reset" => {
                    self.applied = None;
                    let url = self.url.clone();
                    self.load_after_click(url);
                }
                _ => {}
            },
            Target::TagAdd => self.tag_rows.push(TagRow::empty()),
            Target::TagRemove(i) => {
                self.tag_rows.remove(i);
            }
            Target::BannerClose => self.banner = None,
            Target::MultiselectRemove(id) => {
                if let Some(Control::Multiselect { selected, .. }) = self.controls.get_mut(&id) {
                    selected.remove(0);
                }
            }
            Target::Suggestion(label) => {
                for control in self.controls.values_mut() {
                    if let Control::Multiselect { selected, typed, .. } = control {
                        if !typed.is_empty() {
                            selected.push(label.clone());
                            typed.clear();
                        }
                    }
                }
            }
            _ => {}
        }
        ok(json!(true))
    }

    /// A page load started by a click. With a navigation delay the old
    /// document keeps answering for that many runtime calls.
    fn load_after_click(&mut self, url: String) {
        if self.navigation_delay == 0 {
            self.navigate(&url);
        } else {
            self.pending_load = Some((self.navigation_delay, url));
        }
    }

    fn tick_pending_load(&mut self) {
        match self.pending_load.take() {
            Some((0, url)) => self.navigate(&url),
            Some((left, url)) => self.pending_load = Some((left - 1, url)),
            None => {}
        }
    }

    fn set_banner(&mut self, good: bool, title: &str, lines: &[String]) {
        let details = if lines.is_empty() {
            String::new()
        } else {
            format!(
                "<div class=\"msg-details\"><ul class=\"list-dashed\">{}</ul></div>",
                lines.iter().map(|l| format!("<li>{}</li>", html_escape(l))).collect::<String>()
            )
        };
        self.banner = Some(format!(
            "<output class=\"{}\" role=\"contentinfo\"><span>{}</span>{}<button type=\"button\" class=\"btn-overlay-close\" title=\"Close\"></button></output>",
            if good { "msg-good" } else { "msg-bad" },
            html_escape(title),
            details
        ));
    }

    fn submit_login(&mut self) {
        let name = TagRow::text_of(&self.controls["name"]);
        let password = TagRow::text_of(&self.controls["password"]);
        if name == "Admin" && password == "zabbix" {
            self.user = Some(name);
            self.load_after_click(format!("{}zabbix.php?action=dashboard.view", BASE_URL));
        } else {
            let url = self.url.clone();
            self.load_after_click(url);
        }
    }

    fn submit_housekeeping(&mut self) {
        let mode = self.controls["hk_events_mode"] == Control::Checkbox(true);
        let fields = [
            ("hk_events_trigger", "Trigger event and alert data storage period"),
            ("hk_events_internal", "Internal event and alert data storage period"),
        ];

        let mut errors = Vec::new();
        if mode {
            for (id, label) in fields {
                let value = TagRow::text_of(&self.controls[id]);
                let days = value.strip_suffix('d').unwrap_or(&value).parse::<u32>().ok();
                if !matches!(days, Some(1..=99999)) {
                    errors.push(format!(
                        "Incorrect value \"{}\" for \"{}\" field: must be between 1 and 99999.",
                        value, label
                    ));
                }
            }
        }
        let trends = TagRow::text_of(&self.controls["hk_trends"]);
        if trends.is_empty() {
            errors.push(
                "Incorrect value \"\" for \"Trends data storage period\" field: a time unit is expected."
                    .to_string(),
            );
        }

        if !errors.is_empty() {
            self.set_banner(false, "Cannot update configuration", &errors);
            return;
        }

        let sql = format!(
            "UPDATE config SET hk_events_mode={}, hk_events_trigger={}, hk_events_internal={}, hk_trends={} WHERE configid=1",
            u8::from(mode),
            browser_acceptance::db::quote(&TagRow::text_of(&self.controls["hk_events_trigger"])),
            browser_acceptance::db::quote(&TagRow::text_of(&self.controls["hk_events_internal"])),
            browser_acceptance::db::quote(&trends),
        );
        self.db.execute(&sql).unwrap();
        self.set_banner(true, "Configuration updated", &[]);
    }

    fn submit_media_type(&mut self) {
        let name = TagRow::text_of(&self.controls["name"]);
        let exists = self
            .db
            .get_count(&format!(
                "SELECT * FROM media_type WHERE name={}",
                browser_acceptance::db::quote(&name)
            ))
            .unwrap_or(0)
            > 0;

        if name.trim().is_empty() {
            self.set_banner(
                false,
                "Cannot add media type",
                &["Incorrect value for field \"name\": cannot be empty.".to_string()],
            );
        } else if exists {
            self.set_banner(
                false,
                "Cannot add media type",
                &[format!("Media type \"{}\" already exists.", name)],
            );
        } else {
            let index_of = |id: &str| match &self.controls[id] {
                Control::RadioList { options, selected } => {
                    options.iter().position(|o| o == selected).unwrap_or(0)
                }
                _ => 0,
            };
            let sql = format!(
                "INSERT INTO media_type (name, type, smtp_security, smtp_authentication) VALUES ({}, {}, {}, {})",
                browser_acceptance::db::quote(&name),
                browser_acceptance::db::quote(&TagRow::text_of(&self.controls["type"])),
                index_of("smtp_security"),
                index_of("smtp_authentication"),
            );
            self.db.execute(&sql).unwrap();
            self.set_banner(true, "Media type added", &[]);
        }
    }

    /// Host names after the applied tag filter, evaluated independently of
    /// the crate under test.
    pub fn visible_hosts(&self) -> Vec<&FakeHost> {
        let Some((evaluation, rows)) = &self.shown else {
            return self.hosts.iter().collect();
        };
        if rows.is_empty() {
            return self.hosts.iter().collect();
        }

        let hit = |host: &FakeHost, (tag, operator, value): &(String, String, String)| -> bool {
            let has = |pred: &dyn Fn(&str) -> bool| {
                host.tags.iter().any(|(t, v)| *t == tag.as_str() && pred(v))
            };
            match operator.as_str() {
                "Exists" => has(&|_| true),
                "Equals" => has(&|v| v == value.as_str()),
                "Contains" => has(&|v| v.to_lowercase().contains(&value.to_lowercase())),
                "Does not exist" => !has(&|_| true),
                "Does not equal" => !has(&|v| v == value.as_str()),
                _ => !has(&|v| v.to_lowercase().contains(&value.to_lowercase())),
            }
        };

        let mut by_tag: BTreeMap<&str, Vec<&(String, String, String)>> = BTreeMap::new();
        for row in rows {
            by_tag.entry(row.0.as_str()).or_default().push(row);
        }
        // negative value rows of one tag hold together; any other row of the
        // tag is an alternative
        let group_hit = |host: &FakeHost, group: &[&(String, String, String)]| -> bool {
            if let Some(exists) = group.iter().copied().find(|row| row.1 == "Exists") {
                return hit(host, exists);
            }
            let (negative, other): (Vec<&(String, String, String)>, Vec<&(String, String, String)>) =
                group
                    .iter()
                    .copied()
                    .partition(|row| matches!(row.1.as_str(), "Does not equal" | "Does not contain"));
            other.iter().any(|row| hit(host, *row))
                || (!negative.is_empty() && negative.iter().all(|row| hit(host, *row)))
        };

        self.hosts
            .iter()
            .filter(|host| {
                let host: &FakeHost = host;
                match evaluation.as_str() {
                    "Or" => by_tag.values().any(|group| group_hit(host, group.as_slice())),
                    "And" => rows.iter().all(|row| hit(host, row)),
                    _ => by_tag.values().all(|group| group_hit(host, group.as_slice())),
                }
            })
            .collect()
    }

    fn render_table(&self) -> String {
        let hosts = self.visible_hosts();
        let body = if hosts.is_empty() {
            "<tr class=\"nothing-to-show\"><td colspan=\"3\">No data found.</td></tr>".to_string()
        } else {
            hosts
                .iter()
                .map(|host| {
                    format!(
                        "<tr><td><a href=\"#\">{}</a></td><td>{}</td><td>{}</td></tr>",
                        html_escape(host.name),
                        host.interface,
                        host.tags
                            .iter()
                            .map(|(t, v)| format!("<span class=\"tag\">{}: {}</span>", t, v))
                            .collect::<String>()
                    )
                })
                .collect()
        };
        format!(
            "<table class=\"list-table\"><thead><tr><th>Name</th><th>Interface</th><th>Tags</th></tr></thead><tbody>{}</tbody></table>",
            body
        )
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A browser whose only tab shows the [`Frontend`] model.
pub struct FakeBrowser {
    frontend: Arc<Mutex<Frontend>>,
    running: bool,
}

impl FakeBrowser {
    pub fn new(db_path: &Path) -> (Self, Arc<Mutex<Frontend>>) {
        let frontend = Arc::new(Mutex::new(Frontend::new(db_path)));
        (
            Self {
                frontend: frontend.clone(),
                running: false,
            },
            frontend,
        )
    }
}

#[async_trait]
impl BrowserTrait for FakeBrowser {
    type TabHandle = ();

    async fn launch(&mut self, _config: &Config) -> Result<()> {
        self.running = true;
        Ok(())
    }

    async fn new_tab(&self) -> Result<()> {
        Ok(())
    }

    async fn navigate(&self, _tab: &(), url: &str) -> Result<()> {
        self.frontend.lock().unwrap().navigate(url);
        Ok(())
    }

    async fn execute_script(&self, _tab: &(), script: &str) -> Result<Value> {
        let call = ProbeCall::decode(script).expect("only runtime calls reach the fake");
        let reply = self.frontend.lock().unwrap().handle(&call);
        // the runtime stringifies its replies
        Ok(Value::String(reply.to_string()))
    }

    async fn take_screenshot(&self, _tab: &()) -> Result<Vec<u8>> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn get_url(&self, _tab: &()) -> Result<String> {
        Ok(self.frontend.lock().unwrap().url.clone())
    }

    async fn get_title(&self, _tab: &()) -> Result<String> {
        Ok(self.frontend.lock().unwrap().page.title().to_string())
    }

    async fn set_cookie(&self, _tab: &(), cookie: &CookieData) -> Result<()> {
        self.frontend.lock().unwrap().cookies.push(cookie.clone());
        Ok(())
    }

    async fn clear_cookies(&self, _tab: &()) -> Result<()> {
        self.frontend.lock().unwrap().cookies.clear();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    async fn close(&mut self) -> Result<()> {
        self.running = false;
        self.frontend.lock().unwrap().closed = true;
        Ok(())
    }
}
