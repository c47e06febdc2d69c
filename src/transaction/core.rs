//! Defines the core data model and database functions for transactions.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, database_id::TransactionId, db::get_unsigned};

// ============================================================================
// MODELS
// ============================================================================

/// The canonical text form of a sale date, e.g. "2021-11-27 14:59:54".
pub(crate) const DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

time::serde::format_description!(
    canonical_date_time,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second]"
);

/// Whether a product in a transaction was sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sold {
    /// The product was sold.
    Yes,
    /// The product was not sold.
    No,
}

impl Sold {
    /// The string stored in the database for this value.
    pub fn as_str(self) -> &'static str {
        match self {
            Sold::Yes => "yes",
            Sold::No => "no",
        }
    }
}

impl From<bool> for Sold {
    fn from(sold: bool) -> Self {
        if sold { Sold::Yes } else { Sold::No }
    }
}

impl ToSql for Sold {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Sold {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "yes" => Ok(Sold::Yes),
            "no" => Ok(Sold::No),
            other => Err(FromSqlError::Other(
                format!("invalid sold value \"{other}\", expected \"yes\" or \"no\"").into(),
            )),
        }
    }
}

/// A product sale record.
///
/// To create a new `Transaction`, use [Transaction::build] and [create_transaction].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The name of the product.
    pub title: String,
    /// A longer description of the product.
    pub description: String,
    /// The price of the product.
    pub price: f64,
    /// A free-form product category, e.g. "electronics".
    pub category: String,
    /// Whether the product was sold.
    pub sold: Sold,
    /// A URL to an image of the product.
    pub image: String,
    /// When the sale happened, without timezone information.
    #[serde(with = "canonical_date_time")]
    pub date_of_sale: PrimitiveDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(title: &str, price: f64, sold: Sold) -> TransactionBuilder {
        TransactionBuilder {
            title: title.to_owned(),
            description: String::new(),
            price,
            category: String::new(),
            sold,
            image: String::new(),
            date_of_sale: None,
        }
    }
}

/// A builder for creating [Transaction] rows.
///
/// Optional fields default to empty strings. If `date_of_sale` is not set the
/// database fills in the time of insertion.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The name of the product.
    pub title: String,
    /// A longer description of the product.
    pub description: String,
    /// The price of the product.
    pub price: f64,
    /// A free-form product category.
    pub category: String,
    /// Whether the product was sold.
    pub sold: Sold,
    /// A URL to an image of the product.
    pub image: String,
    /// When the sale happened. `None` means "now".
    pub date_of_sale: Option<PrimitiveDateTime>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }

    /// Set the image URL for the transaction.
    pub fn image(mut self, image: &str) -> Self {
        self.image = image.to_owned();
        self
    }

    /// Set the sale date for the transaction.
    pub fn date_of_sale(mut self, date_of_sale: Option<PrimitiveDateTime>) -> Self {
        self.date_of_sale = date_of_sale;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of the transaction table in the order expected by [map_transaction_row].
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, title, description, price, category, sold, image, date_of_sale";

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let date_of_sale = builder
        .date_of_sale
        .map(format_date_time)
        .transpose()?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (title, description, price, category, sold, image, date_of_sale)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, COALESCE(?7, strftime('%Y-%m-%d %H:%M:%S', 'now')))
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.title,
                builder.description,
                builder.price,
                builder.category,
                builder.sold,
                builder.image,
                date_of_sale,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            get_unsigned(row, 0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL,
                category TEXT NOT NULL,
                sold TEXT NOT NULL CHECK (sold IN ('yes', 'no')),
                image TEXT NOT NULL,
                date_of_sale TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%S', 'now'))
                )",
        (),
    )?;

    // Every report filters on the month of the sale date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date_of_sale ON \"transaction\"(date_of_sale);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns listed in [TRANSACTION_COLUMNS], in that order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let date_text: String = row.get(7)?;
    let date_of_sale = PrimitiveDateTime::parse(&date_text, DATE_TIME_FORMAT)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        sold: row.get(5)?,
        image: row.get(6)?,
        date_of_sale,
    })
}

fn format_date_time(date_time: PrimitiveDateTime) -> Result<String, Error> {
    date_time
        .format(DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
