//! Sale totals for a month.

use axum::{
    Json,
    extract::{Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    db::{get_unsigned, lock_connection},
    month::MonthSelector,
};

use super::{MonthQuery, ReportState};

/// Aggregate sale figures for the transactions in a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// The sum of the prices of all transactions in the month, rounded to cents.
    pub total_sale_amount: f64,
    /// The number of transactions in the month that were sold.
    pub total_sold_items: u64,
    /// The number of transactions in the month that were not sold.
    pub total_not_sold_items: u64,
}

/// Sum the prices and count sold and unsold items for the transactions in
/// `month`, across all years.
///
/// A month with no transactions yields zero for every figure.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_statistics(month: MonthSelector, connection: &Connection) -> Result<Statistics, Error> {
    let statistics = connection
        .prepare(
            "SELECT COALESCE(SUM(price), 0.0), \
                COUNT(CASE WHEN sold = 'yes' THEN 1 END), \
                COUNT(CASE WHEN sold = 'no' THEN 1 END) \
            FROM \"transaction\" \
            WHERE CAST(strftime('%m', date_of_sale) AS INTEGER) = ?1",
        )?
        .query_row([month.number()], |row| {
            let total: f64 = row.get(0)?;

            Ok(Statistics {
                total_sale_amount: round_to_cents(total),
                total_sold_items: get_unsigned(row, 1)?,
                total_not_sold_items: get_unsigned(row, 2)?,
            })
        })?;

    Ok(statistics)
}

/// Route handler for the monthly statistics, e.g. `GET /statistics?month=03`.
pub async fn get_statistics_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Statistics>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_statistics(query.month, &connection)
        .inspect_err(|error| tracing::error!("could not fetch statistics: {error}"))
        .map(Json)
}

fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
