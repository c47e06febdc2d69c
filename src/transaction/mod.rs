//! Transaction records and the listing report.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and counting transactions
//! - The paginated, searchable listing of a month's transactions and its route handler

mod core;
mod list_endpoint;
mod query;

pub use core::{
    Sold, Transaction, TransactionBuilder, count_transactions, create_transaction,
    create_transaction_table,
};
pub use list_endpoint::list_transactions_endpoint;
pub use query::list_transactions;
