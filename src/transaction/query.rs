//! Database query for listing the transactions sold in a given month.

use rusqlite::Connection;

use crate::{Error, month::MonthSelector, pagination::Page};

use super::core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row};

/// Get one page of the transactions in `month`, across all years, that match `search`.
///
/// A transaction matches when `search` appears in its title, its description
/// or its price written with two decimals (e.g. "329.85"). An empty `search`
/// matches every transaction. Transactions are ordered by ID so that
/// consecutive pages never overlap.
///
/// Matching uses SQLite's `LIKE`, which ignores case for ASCII letters only:
/// "SHIRT" finds "shirt", but "ÉCLAIR" does not find "éclair".
///
/// Pages past the last matching transaction are empty.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Transaction row mapping fails
pub fn list_transactions(
    month: MonthSelector,
    search: &str,
    page: Page,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" \
        WHERE CAST(strftime('%m', date_of_sale) AS INTEGER) = ?1 \
        AND (title LIKE ?2 ESCAPE '\\' \
            OR description LIKE ?2 ESCAPE '\\' \
            OR printf('%.2f', price) LIKE ?2 ESCAPE '\\') \
        ORDER BY id ASC \
        LIMIT ?3 OFFSET ?4"
    );

    connection
        .prepare(&query)?
        .query_map(
            (
                month.number(),
                like_pattern(search),
                page.limit(),
                page.offset(),
            ),
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Wrap `search` in wildcards, escaping the characters `LIKE` treats specially.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');

    for character in search.chars() {
        if matches!(character, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(character);
    }

    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use time::macros::datetime;

    use crate::{
        month::MonthSelector,
        pagination::Page,
        test_utils::{get_test_connection, insert_march_scenario},
        transaction::{Sold, Transaction, create_transaction},
    };

    use super::{like_pattern, list_transactions};

    fn march() -> MonthSelector {
        MonthSelector::MARCH
    }

    fn first_page() -> Page {
        Page::new(1, 10).unwrap()
    }

    #[test]
    fn filters_by_month_across_years() {
        let conn = get_test_connection();
        insert_march_scenario(&conn);
        create_transaction(
            Transaction::build("April sale", 10.0, Sold::Yes)
                .date_of_sale(Some(datetime!(2024-04-01 00:00:00))),
            &conn,
        )
        .unwrap();

        let got = list_transactions(march(), "", first_page(), &conn).unwrap();

        let got_ids: Vec<_> = got.iter().map(|transaction| transaction.id).collect();
        assert_eq!(got_ids, vec![1, 2, 3]);
    }

    #[test]
    fn empty_month_returns_nothing() {
        let conn = get_test_connection();
        insert_march_scenario(&conn);

        let got = list_transactions(MonthSelector::new(7).unwrap(), "", first_page(), &conn)
            .unwrap();

        assert!(got.is_empty(), "want no transactions, got {got:?}");
    }

    #[test]
    fn search_matches_price_text() {
        let conn = get_test_connection();
        insert_march_scenario(&conn);

        let got = list_transactions(march(), "50", first_page(), &conn).unwrap();

        assert!(
            got.iter().any(|transaction| transaction.price == 50.0),
            "want the transaction priced 50 in {got:?}"
        );
    }

    #[test]
    fn case_folding_is_limited_to_ascii() {
        let conn = get_test_connection();
        create_transaction(
            Transaction::build("éclair tray", 12.0, Sold::No)
                .date_of_sale(Some(datetime!(2022-03-01 12:00:00))),
            &conn,
        )
        .unwrap();

        let ascii = list_transactions(march(), "TRAY", first_page(), &conn).unwrap();
        let accented = list_transactions(march(), "ÉCLAIR", first_page(), &conn).unwrap();
        let exact = list_transactions(march(), "éclair", first_page(), &conn).unwrap();

        assert_eq!(ascii.len(), 1);
        assert!(accented.is_empty(), "want no match, got {accented:?}");
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn search_matches_title_and_description_ignoring_case() {
        let conn = get_test_connection();
        let date = Some(datetime!(2022-03-01 12:00:00));
        create_transaction(
            Transaction::build("Mens Casual Slim Fit", 15.99, Sold::Yes).date_of_sale(date),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build("Rain Jacket", 39.99, Sold::No)
                .description("Lightweight, perfect for trip or CASUAL wear")
                .date_of_sale(date),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build("SSD", 109.0, Sold::No).date_of_sale(date),
            &conn,
        )
        .unwrap();

        let got = list_transactions(march(), "casual", first_page(), &conn).unwrap();

        let got_titles: Vec<_> = got.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(got_titles, vec!["Mens Casual Slim Fit", "Rain Jacket"]);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let conn = get_test_connection();
        let date = Some(datetime!(2022-03-01 12:00:00));
        create_transaction(
            Transaction::build("100% cotton", 10.0, Sold::Yes).date_of_sale(date),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build("Cotton shirt", 20.0, Sold::Yes).date_of_sale(date),
            &conn,
        )
        .unwrap();

        let got = list_transactions(march(), "0%", first_page(), &conn).unwrap();

        assert_eq!(got.len(), 1, "want 1 transaction, got {got:?}");
        assert_eq!(got[0].title, "100% cotton");
    }

    #[test]
    fn empty_search_matches_everything() {
        let conn = get_test_connection();
        insert_march_scenario(&conn);

        let got = list_transactions(march(), "", first_page(), &conn).unwrap();

        assert_eq!(got.len(), 3);
    }

    #[test]
    fn pages_reconstruct_full_result() {
        let conn = get_test_connection();
        for i in 0..23 {
            create_transaction(
                Transaction::build(&format!("item {i}"), i as f64, Sold::from(i % 2 == 0))
                    .date_of_sale(Some(datetime!(2020-03-15 10:00:00))),
                &conn,
            )
            .unwrap();
        }
        let want = list_transactions(march(), "", Page::new(1, 100).unwrap(), &conn).unwrap();

        let mut got = Vec::new();
        for page_number in 1..=3 {
            let page = Page::new(page_number, 10).unwrap();
            got.extend(list_transactions(march(), "", page, &conn).unwrap());
        }

        assert_eq!(want.len(), 23);
        assert_eq!(want, got);
        let unique_ids: HashSet<_> = got.iter().map(|t| t.id).collect();
        assert_eq!(unique_ids.len(), 23);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let conn = get_test_connection();
        insert_march_scenario(&conn);

        let got = list_transactions(march(), "", Page::new(2, 10).unwrap(), &conn).unwrap();

        assert!(got.is_empty(), "want empty page, got {got:?}");
    }

    #[test]
    fn like_pattern_escapes_special_characters() {
        assert_eq!(like_pattern(""), "%%");
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("5%_\\"), "%5\\%\\_\\\\%");
    }
}
