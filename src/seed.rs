//! Populates an empty transaction table from a remote JSON feed.
//!
//! The feed is a JSON array of objects shaped like
//! `{"title", "description", "price", "category", "sold": bool, "image", "dateOfSale"}`.
//! Seeding only ever happens on an empty table, so restarting the server does
//! not duplicate rows.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::{Connection, Transaction as SqlTransaction};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use time::{
    OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    Error,
    db::lock_connection,
    transaction::{Transaction, TransactionBuilder, count_transactions, create_transaction},
};

/// The product transaction feed used when no other URL is configured.
pub const DEFAULT_FEED_URL: &str = "https://s3.amazonaws.com/roxiler.com/product_transaction.json";

/// How long to wait for the feed before giving up.
const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// One record of the remote feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedRecord {
    title: String,
    #[serde(default)]
    description: String,
    price: f64,
    #[serde(default)]
    category: String,
    sold: bool,
    #[serde(default)]
    image: String,
    #[serde(default)]
    date_of_sale: Option<String>,
}

impl FeedRecord {
    fn into_builder(self) -> Result<TransactionBuilder, Error> {
        let date_of_sale = self
            .date_of_sale
            .as_deref()
            .map(parse_sale_date)
            .transpose()?;

        Ok(Transaction::build(&self.title, self.price, self.sold.into())
            .description(&self.description)
            .category(&self.category)
            .image(&self.image)
            .date_of_sale(date_of_sale))
    }
}

/// What happened when seeding was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The table was empty and this many transactions were inserted.
    Seeded(u64),
    /// The table already held this many transactions, so nothing was inserted.
    AlreadySeeded(u64),
}

impl Display for SeedOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedOutcome::Seeded(count) => write!(f, "inserted {count} transactions"),
            SeedOutcome::AlreadySeeded(count) => {
                write!(f, "skipped seeding, {count} transactions already exist")
            }
        }
    }
}

/// Convert a feed timestamp into the canonical sale date.
///
/// Timestamps with an offset (e.g. "2021-11-27T20:29:54+05:30") are converted
/// to UTC before the offset is dropped. Timestamps without an offset are taken
/// as they are. Fractional seconds are discarded.
///
/// # Errors
/// Returns [Error::InvalidDateFormat] if `text` is not an ISO 8601 date-time.
pub fn parse_sale_date(text: &str) -> Result<PrimitiveDateTime, Error> {
    let naive = match OffsetDateTime::parse(text, &Rfc3339) {
        Ok(date_time) => {
            let utc = date_time.to_offset(UtcOffset::UTC);
            PrimitiveDateTime::new(utc.date(), utc.time())
        }
        Err(_) => PrimitiveDateTime::parse(
            text,
            format_description!(
                "[year]-[month]-[day][first [T][ ]][hour]:[minute]:[second][optional [.[subsecond]]]"
            ),
        )
        .map_err(|error| Error::InvalidDateFormat(format!("\"{text}\": {error}")))?,
    };

    let time = Time::from_hms(naive.hour(), naive.minute(), naive.second())
        .map_err(|error| Error::InvalidDateFormat(format!("\"{text}\": {error}")))?;

    Ok(naive.replace_time(time))
}

/// Parse feed records into transaction builders.
///
/// Records that are not objects of the expected shape, or whose sale date
/// cannot be parsed, are skipped with a warning.
pub fn parse_feed(records: Vec<Value>) -> Vec<TransactionBuilder> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            serde_json::from_value::<FeedRecord>(value)
                .map_err(|error| Error::FeedFormat(error.to_string()))
                .and_then(FeedRecord::into_builder)
                .inspect_err(|error| tracing::warn!("skipping feed record #{index}: {error}"))
                .ok()
        })
        .collect()
}

/// Parse a feed from JSON text, e.g. a file saved from the remote feed.
///
/// # Errors
/// Returns [Error::FeedFormat] if `json` is not a JSON array.
pub fn parse_feed_str(json: &str) -> Result<Vec<TransactionBuilder>, Error> {
    let records: Vec<Value> =
        serde_json::from_str(json).map_err(|error| Error::FeedFormat(error.to_string()))?;

    Ok(parse_feed(records))
}

/// Download the feed at `url`.
///
/// # Errors
/// Returns [Error::FeedRequest] if the request fails or the server responds
/// with an error status, or [Error::FeedFormat] if the body is not a JSON array.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<TransactionBuilder>, Error> {
    tracing::info!("fetching transactions from {url}");

    let response = client
        .get(url)
        .timeout(FEED_TIMEOUT)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|error| Error::FeedRequest(error.to_string()))?;

    let records: Vec<Value> = response.json().await.map_err(|error| {
        if error.is_decode() {
            Error::FeedFormat(error.to_string())
        } else {
            Error::FeedRequest(error.to_string())
        }
    })?;

    Ok(parse_feed(records))
}

/// Insert `transactions` if, and only if, the transaction table is empty.
///
/// All rows are written in a single database transaction, so either every
/// row is inserted or none are.
///
/// # Errors
/// Returns [Error::SqlError] if the count or an insert fails.
pub fn seed_transactions(
    transactions: Vec<TransactionBuilder>,
    connection: &Connection,
) -> Result<SeedOutcome, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Immediate)?;

    let existing = count_transactions(&sql_transaction)?;
    if existing > 0 {
        return Ok(SeedOutcome::AlreadySeeded(existing));
    }

    let mut inserted = 0;
    for builder in transactions {
        create_transaction(builder, &sql_transaction)?;
        inserted += 1;
    }

    sql_transaction.commit()?;

    Ok(SeedOutcome::Seeded(inserted))
}

/// Fetch the feed at `url` and insert it into an empty transaction table.
///
/// The table is checked before downloading so a seeded database never
/// touches the network, and again inside the write transaction.
///
/// # Errors
/// Returns an error if the feed cannot be fetched or the rows cannot be inserted.
pub async fn seed_from_feed(
    client: &reqwest::Client,
    url: &str,
    db_connection: &Mutex<Connection>,
) -> Result<SeedOutcome, Error> {
    let existing = count_transactions(&*lock_connection(db_connection)?)?;
    if existing > 0 {
        return Ok(SeedOutcome::AlreadySeeded(existing));
    }

    let transactions = fetch_feed(client, url).await?;

    let connection = lock_connection(db_connection)?;
    seed_transactions(transactions, &connection)
}

/// Run [seed_from_feed] on a background task so the server can accept
/// requests while the feed downloads.
///
/// The outcome is logged, never returned: a failed seed leaves the server
/// running with whatever the table already holds.
pub fn spawn_seeding(
    client: reqwest::Client,
    url: String,
    db_connection: Arc<Mutex<Connection>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match seed_from_feed(&client, &url, &db_connection).await {
            Ok(outcome) => tracing::info!("Seeding finished: {outcome}"),
            Err(error) => tracing::error!("Seeding failed: {error}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{Json, Router, routing::get};
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        AppState, Error, build_router, endpoints,
        pagination::PaginationConfig,
        report::Statistics,
        test_utils::get_test_connection,
        transaction::{Sold, Transaction, count_transactions},
    };

    use super::{
        SeedOutcome, parse_feed, parse_feed_str, parse_sale_date, seed_from_feed,
        seed_transactions, spawn_seeding,
    };

    fn sample_feed() -> Value {
        json!([
            {
                "id": 1,
                "title": "Fjallraven  Foldsack No 1 Backpack",
                "price": 329.85,
                "description": "Your perfect pack for everyday use",
                "category": "men's clothing",
                "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
                "sold": false,
                "dateOfSale": "2021-11-27T20:29:54+05:30"
            },
            {
                "id": 2,
                "title": "Mens Casual Premium Slim Fit T-Shirts ",
                "price": 44.6,
                "description": "Slim-fitting style",
                "category": "men's clothing",
                "image": "https://fakestoreapi.com/img/71-3HjGNDUL._AC_SY879._SX._UX._SY._UY_.jpg",
                "sold": true,
                "dateOfSale": "2021-10-27T20:29:54+05:30"
            }
        ])
    }

    /// Serve `feed` from a local HTTP server and return its URL.
    async fn serve_feed(feed: Value) -> String {
        let app = Router::new().route("/feed.json", get(move || async move { Json(feed) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind test listener");
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        format!("http://{address}/feed.json")
    }

    #[test]
    fn converts_offset_timestamps_to_utc() {
        let got = parse_sale_date("2021-11-27T20:29:54+05:30").unwrap();

        assert_eq!(got, datetime!(2021-11-27 14:59:54));
    }

    #[test]
    fn drops_fractional_seconds() {
        let got = parse_sale_date("2022-03-05T10:00:00.987Z").unwrap();

        assert_eq!(got, datetime!(2022-03-05 10:00:00));
    }

    #[test]
    fn accepts_timestamps_without_offset() {
        assert_eq!(
            parse_sale_date("2022-03-05T10:11:12").unwrap(),
            datetime!(2022-03-05 10:11:12)
        );
        assert_eq!(
            parse_sale_date("2022-03-05 10:11:12.5").unwrap(),
            datetime!(2022-03-05 10:11:12)
        );
    }

    #[test]
    fn rejects_invalid_timestamps() {
        assert!(matches!(
            parse_sale_date("last tuesday"),
            Err(Error::InvalidDateFormat(_))
        ));
    }

    #[test]
    fn maps_feed_records() {
        let Value::Array(records) = sample_feed() else {
            panic!("sample feed must be an array");
        };

        let got = parse_feed(records);

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].title, "Fjallraven  Foldsack No 1 Backpack");
        assert_eq!(got[0].price, 329.85);
        assert_eq!(got[0].sold, Sold::No);
        assert_eq!(got[0].date_of_sale, Some(datetime!(2021-11-27 14:59:54)));
        assert_eq!(got[1].sold, Sold::Yes);
        assert_eq!(got[1].category, "men's clothing");
    }

    #[test]
    fn missing_date_is_left_to_the_database() {
        let got = parse_feed_str(r#"[{"title": "Mug", "price": 5, "sold": true}]"#).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].date_of_sale, None);
        assert_eq!(got[0].description, "");
    }

    #[test]
    fn skips_malformed_records() {
        let got = parse_feed_str(
            r#"[
                {"title": "Mug", "price": 5, "sold": true, "dateOfSale": "yesterday"},
                {"title": "No price", "sold": true},
                "not an object",
                {"title": "Plate", "price": 7.5, "sold": false, "dateOfSale": "2022-01-02T03:04:05Z"}
            ]"#,
        )
        .unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Plate");
    }

    #[test]
    fn rejects_feed_that_is_not_an_array() {
        let result = parse_feed_str(r#"{"title": "Mug"}"#);

        assert!(matches!(result, Err(Error::FeedFormat(_))));
    }

    #[test]
    fn seeds_empty_table_once() {
        let conn = get_test_connection();
        let transactions = vec![
            Transaction::build("Mug", 5.0, Sold::Yes),
            Transaction::build("Plate", 7.5, Sold::No),
        ];

        let first = seed_transactions(transactions.clone(), &conn).unwrap();
        let second = seed_transactions(transactions, &conn).unwrap();

        assert_eq!(first, SeedOutcome::Seeded(2));
        assert_eq!(second, SeedOutcome::AlreadySeeded(2));
        assert_eq!(count_transactions(&conn).unwrap(), 2);
    }

    #[tokio::test]
    async fn seeds_from_remote_feed() {
        let url = serve_feed(sample_feed()).await;
        let db_connection = Arc::new(Mutex::new(get_test_connection()));
        let client = reqwest::Client::new();

        let first = seed_from_feed(&client, &url, &db_connection).await.unwrap();
        let second = seed_from_feed(&client, &url, &db_connection).await.unwrap();

        assert_eq!(first, SeedOutcome::Seeded(2));
        assert_eq!(second, SeedOutcome::AlreadySeeded(2));
        let count = count_transactions(&db_connection.lock().unwrap()).unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn unreachable_feed_leaves_table_empty() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let db_connection = Mutex::new(get_test_connection());

        let result = seed_from_feed(
            &reqwest::Client::new(),
            &format!("http://{address}/feed.json"),
            &db_connection,
        )
        .await;

        assert!(matches!(result, Err(Error::FeedRequest(_))), "got {result:?}");
        assert_eq!(count_transactions(&db_connection.lock().unwrap()).unwrap(), 0);
    }

    #[tokio::test]
    async fn serves_requests_while_feed_is_slow() {
        let app = Router::new().route(
            "/feed.json",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Json(json!([]))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind test listener");
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let state = AppState {
            pagination_config: PaginationConfig::default(),
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };
        let seeding = spawn_seeding(
            reqwest::Client::new(),
            format!("http://{address}/feed.json"),
            state.db_connection.clone(),
        );
        let server = TestServer::new(build_router(state)).expect("Could not create test server.");

        let response = tokio::time::timeout(
            Duration::from_secs(5),
            server
                .get(endpoints::STATISTICS_API)
                .add_query_param("month", "03"),
        )
        .await
        .expect("request should not wait for seeding");

        response.assert_status_ok();
        assert_eq!(response.json::<Statistics>().total_sold_items, 0);
        assert!(!seeding.is_finished());
        seeding.abort();
    }
}
