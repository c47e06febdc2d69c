//! Counts of a month's transactions grouped into fixed price ranges.

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

/// A price range in the histogram.
///
/// Bounds are whole numbers and inclusive. The last bucket has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBucket {
    /// The smallest whole-number price in the range.
    pub lower: u32,
    /// The largest whole-number price in the range, `None` for the last bucket.
    pub upper: Option<u32>,
}

impl PriceBucket {
    const fn new(lower: u32, upper: Option<u32>) -> Self {
        Self { lower, upper }
    }

    /// The label shown for the bucket, e.g. "101 - 200" or "901 - above".
    pub fn label(&self) -> String {
        match self.upper {
            Some(upper) => format!("{} - {}", self.lower, upper),
            None => format!("{} - above", self.lower),
        }
    }
}

/// The histogram buckets in ascending order.
pub const PRICE_BUCKETS: [PriceBucket; 10] = [
    PriceBucket::new(0, Some(100)),
    PriceBucket::new(101, Some(200)),
    PriceBucket::new(201, Some(300)),
    PriceBucket::new(301, Some(400)),
    PriceBucket::new(401, Some(500)),
    PriceBucket::new(501, Some(600)),
    PriceBucket::new(601, Some(700)),
    PriceBucket::new(701, Some(800)),
    PriceBucket::new(801, Some(900)),
    PriceBucket::new(901, None),
];

/// The number of transactions whose price falls in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRangeCount {
    /// The bucket label, e.g. "0 - 100".
    pub price_range: String,
    /// The number of transactions in the bucket.
    pub count: u64,
}

/// Count the transactions in `month`, across all years, per price bucket.
///
/// A price belongs to the first bucket whose upper bound it does not exceed,
/// so fractional prices between two buckets (e.g. 100.50) fall into the
/// higher one and every price lands in exactly one bucket. Buckets without
/// transactions are left out; the rest are in ascending price order.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_price_histogram(
    month: MonthSelector,
    connection: &Connection,
) -> Result<Vec<PriceRangeCount>, Error> {
    let query = format!(
        "SELECT {} AS bucket, COUNT(*) FROM \"transaction\" \
        WHERE CAST(strftime('%m', date_of_sale) AS INTEGER) = ?1 \
        GROUP BY bucket \
        ORDER BY bucket ASC",
        bucket_index_expression()
    );

    connection
        .prepare(&query)?
        .query_map([month.number()], |row| {
            let index: i64 = row.get(0)?;
            let bucket = usize::try_from(index)
                .ok()
                .and_then(|index| PRICE_BUCKETS.get(index))
                .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, index))?;

            Ok(PriceRangeCount {
                price_range: bucket.label(),
                count: get_unsigned(row, 1)?,
            })
        })?
        .map(|count_result| count_result.map_err(Error::SqlError))
        .collect()
}

/// Route handler for the price histogram, e.g. `GET /bar-chart?month=03`.
pub async fn get_bar_chart_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<PriceRangeCount>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_price_histogram(query.month, &connection)
        .inspect_err(|error| tracing::error!("could not fetch bar chart data: {error}"))
        .map(Json)
}

/// An SQL `CASE` expression mapping `price` to its index in [PRICE_BUCKETS].
fn bucket_index_expression() -> String {
    let conditions: String = PRICE_BUCKETS
        .iter()
        .enumerate()
        .filter_map(|(index, bucket)| bucket.upper.map(|upper| (index, upper)))
        .map(|(index, upper)| format!(" WHEN price <= {upper} THEN {index}"))
        .collect();

    format!("CASE{conditions} ELSE {} END", PRICE_BUCKETS.len() - 1)
}
