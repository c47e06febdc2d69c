#![allow(missing_docs)]

pub(crate) mod html;
pub(crate) mod http;

use rusqlite::Connection;
use time::macros::datetime;

use crate::{
    db::initialize,
    transaction::{Sold, Transaction, create_transaction},
};

pub(crate) use html::{assert_valid_html, parse_html_document, select_text};
pub(crate) use http::{assert_content_type, assert_status_ok};

/// An initialized, empty in-memory database.
pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&conn).expect("Could not initialize database");
    conn
}

/// Insert three March sales from two different years with IDs 1, 2 and 3:
/// - 2024-03-05, price 50, sold
/// - 2024-03-20, price 250, not sold
/// - 2023-03-11, price 950, sold
pub(crate) fn insert_march_scenario(conn: &Connection) {
    let sales = [
        ("Canvas tote", 50.0, Sold::Yes, datetime!(2024-03-05 09:15:00)),
        ("Desk lamp", 250.0, Sold::No, datetime!(2024-03-20 17:45:30)),
        ("Road bike", 950.0, Sold::Yes, datetime!(2023-03-11 12:00:00)),
    ];

    for (title, price, sold, date_of_sale) in sales {
        create_transaction(
            Transaction::build(title, price, sold)
                .description(&format!("A {} for sale", title.to_lowercase()))
                .category("misc")
                .image("https://example.com/item.jpg")
                .date_of_sale(Some(date_of_sale)),
            conn,
        )
        .expect("Could not create transaction");
    }
}
