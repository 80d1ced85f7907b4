//! Helpers for driving a monitoring frontend through a real browser in
//! acceptance tests: sessions, forms, tag filters, result tables, message
//! banners and database verification.

pub mod browser;
pub mod core;
pub mod db;
pub mod dom;
pub mod errors;
pub mod locator;
pub mod page;
pub mod scenario;
pub mod testing;
pub mod types;
pub mod utils;

#[cfg(feature = "chrome")]
pub use browser::ChromeBrowser;
pub use browser::{wait_until, NavigationManager, NavigationResult, WebSession};
pub use crate::core::{AuthState, BrowserTrait, Config, CookieData, Credentials, SessionToken};
pub use db::{Database, NoChangeGuard, TableBackup};
pub use dom::{Banner, CellMatch, MessageKind, TableSnapshot, TableStats};
pub use errors::{HarnessError, Result};
pub use locator::Locator;
pub use page::{
    Evaluation, FormElement, MessageBanner, PageObject, TableElement, TagCondition, TagFilter,
    TagOperator, TagsTable,
};
pub use scenario::{Expected, Scenario};
pub use types::{FieldValue, Fields, Outcome};
