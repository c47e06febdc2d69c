//! Monthly reports over the transaction table: sale statistics and the price histogram.

mod histogram;
mod statistics;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, month::MonthSelector};

pub use histogram::{
    PRICE_BUCKETS, PriceBucket, PriceRangeCount, get_bar_chart_endpoint, get_price_histogram,
};
pub use statistics::{Statistics, get_statistics, get_statistics_endpoint};

/// The state needed to run the monthly reports.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for reports that only take a month, e.g. `?month=03`.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// The month to report on, across all years.
    pub month: MonthSelector,
}
