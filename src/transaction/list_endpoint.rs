//! Defines the route handler for listing a month's transactions as JSON.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    db::lock_connection,
    month::MonthSelector,
    pagination::{Page, PaginationConfig},
};

use super::{core::Transaction, query::list_transactions};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The page defaults used when a request does not specify them.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query string for the transaction listing, e.g.
/// `?month=03&search=shirt&page=2&perPage=10`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    /// The month to list, across all years.
    pub month: MonthSelector,
    /// Text to look for in the title, description or price.
    #[serde(default)]
    pub search: String,
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The number of transactions per page.
    pub per_page: Option<u64>,
}

/// Route handler for listing transactions, e.g. `GET /transactions?month=03`.
///
/// # Errors
/// Returns [Error::InvalidQuery] for a zero page number or page size, or an
/// SQL error if the query fails.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionsState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let page = Page::new(
        query.page.unwrap_or(state.pagination_config.default_page),
        query
            .per_page
            .unwrap_or(state.pagination_config.default_page_size),
    )?;

    let connection = lock_connection(&state.db_connection)?;

    list_transactions(query.month, &query.search, page, &connection)
        .inspect_err(|error| tracing::error!("could not fetch transactions: {error}"))
        .map(Json)
}
