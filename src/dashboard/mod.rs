//! Dashboard module
//!
//! Provides the page showing a month's transaction table, sale statistics and
//! a bar chart of transactions per price range.

mod charts;
mod handlers;

pub use handlers::get_dashboard_page;
