//! Sales Report is a small web service for reporting on product sale transactions.
//!
//! On first start it seeds a SQLite table from a remote JSON feed, then serves:
//! - `GET /transactions`: a paginated, searchable listing of a month's transactions,
//! - `GET /statistics`: the month's total sale amount and sold/unsold counts,
//! - `GET /bar-chart`: the number of the month's transactions per price range,
//! - `GET /`: an HTML page showing all three for a selected month.
//!
//! Months are matched by calendar month only, so March covers March of every year.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod logging;
mod month;
mod not_found;
mod pagination;
mod report;
mod routing;
mod seed;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use month::MonthSelector;
pub use pagination::PaginationConfig;
pub use report::{PRICE_BUCKETS, PriceBucket, PriceRangeCount, Statistics};
pub use routing::build_router;
pub use seed::{
    DEFAULT_FEED_URL, SeedOutcome, fetch_feed, parse_feed_str, seed_from_feed, seed_transactions,
    spawn_seeding,
};
pub use transaction::{Sold, Transaction, TransactionBuilder};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A query string parameter was present but not usable, e.g. page zero.
    ///
    /// The message is shown to the client.
    #[error("invalid query parameter: {0}")]
    InvalidQuery(String),

    /// A date-time could not be parsed or formatted.
    ///
    /// Callers should include the offending text and the original error.
    #[error("invalid date-time {0}")]
    InvalidDateFormat(String),

    /// The transaction feed could not be downloaded.
    #[error("could not fetch the transaction feed: {0}")]
    FeedRequest(String),

    /// The transaction feed, or a record in it, was not in the expected format.
    #[error("the transaction feed is malformed: {0}")]
    FeedFormat(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidQuery(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details.",
                )
                    .into_response()
            }
        }
    }
}
