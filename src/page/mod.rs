//! Helpers that act on a page through a [`crate::browser::WebSession`].

pub mod form;
pub mod message;
pub mod objects;
pub mod table;
pub mod tags;

pub use form::{reconcile, Choice, ControlKind, FormElement};
pub use message::{assert_message, MessageBanner};
pub use objects::{open_page, HostListPage, HousekeepingPage, MediaTypePage, PageObject};
pub use table::{
    assert_table_data, assert_table_data_column, assert_table_data_column_unordered,
    assert_table_stats, check_table_data, check_table_data_column,
    check_table_data_column_unordered, expected_row, ExpectedRow, TableElement,
};
pub use tags::{Evaluation, TagCondition, TagFilter, TagOperator, TagsTable};
