/*! Database setup and connection helpers shared by the route handlers. */

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Row, Transaction as SqlTransaction};

use crate::{Error, transaction::create_transaction_table};

/// Create the tables for the domain models if they do not already exist.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

/// Read a column that can never be negative, such as a `COUNT(*)`.
///
/// # Errors
/// Returns [rusqlite::Error::IntegralValueOutOfRange] if the value is negative.
pub fn get_unsigned(row: &Row, index: usize) -> Result<u64, rusqlite::Error> {
    let value: i64 = row.get(index)?;

    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(index, value))
}
