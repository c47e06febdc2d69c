//! Dashboard HTTP handler and view rendering.
//!
//! This module contains:
//! - The route handler for displaying the dashboard
//! - HTML view functions for rendering the dashboard UI
//! - State and query types used by the handler

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    dashboard::charts::{
        DashboardChart, ECHARTS_SCRIPT_URL, charts_script, charts_view, price_range_chart,
    },
    db::lock_connection,
    endpoints,
    html::{
        BUTTON_DISABLED_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency, link,
    },
    month::MonthSelector,
    pagination::{Page, PaginationConfig},
    report::{PriceRangeCount, Statistics, get_price_histogram, get_statistics},
    transaction::{Transaction, list_transactions},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The page number and page size used for the transaction table.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query string for the dashboard, e.g. `/?month=03&search=lamp&page=2`.
///
/// Also used to build the links between pages, so the month and search
/// carry over when paging.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DashboardQuery {
    /// The month to show, March when absent.
    pub month: Option<MonthSelector>,
    /// Text to look for in the title, description or price.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub search: String,
    /// The 1-based page of the transaction table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    month: MonthSelector,
    search: String,
    page: Page,
    transactions: Vec<Transaction>,
    statistics: Statistics,
    histogram: Vec<PriceRangeCount>,
}

/// Display a page with a month's transactions, statistics and price ranges.
///
/// # Errors
/// Returns [Error::InvalidQuery] for page zero, or an SQL error if a query fails.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let month = query.month.unwrap_or(MonthSelector::MARCH);
    let page = Page::new(
        query.page.unwrap_or(state.pagination_config.default_page),
        state.pagination_config.default_page_size,
    )?;

    let connection = lock_connection(&state.db_connection)?;

    let transactions = list_transactions(month, &query.search, page, &connection)
        .inspect_err(|error| tracing::error!("could not fetch transactions: {error}"))?;
    let statistics = get_statistics(month, &connection)
        .inspect_err(|error| tracing::error!("could not get statistics: {error}"))?;
    let histogram = get_price_histogram(month, &connection)
        .inspect_err(|error| tracing::error!("could not get price histogram: {error}"))?;

    let data = DashboardData {
        month,
        search: query.search,
        page,
        transactions,
        statistics,
        histogram,
    };

    Ok(dashboard_view(&data).into_response())
}

/// The dashboard URL for `page` with the current month and search.
fn page_url(month: MonthSelector, search: &str, page: u64) -> String {
    let query = DashboardQuery {
        month: Some(month),
        search: search.to_owned(),
        page: Some(page),
    };

    match serde_urlencoded::to_string(&query) {
        Ok(query_string) => format!("{}?{query_string}", endpoints::ROOT),
        Err(error) => {
            tracing::error!("could not encode the dashboard query: {error}");
            endpoints::ROOT.to_owned()
        }
    }
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let charts = [DashboardChart {
        id: "price-range-chart",
        options: price_range_chart(data.month, &data.histogram).to_string(),
    }];

    let content = html!(
        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-3xl font-bold mb-6" { "Transaction Dashboard" }

            (filter_form(data.month, &data.search))
            (transaction_table(&data.transactions))
            (page_navigation(data.month, &data.search, data.page))
            (statistics_view(data.month, &data.statistics))
            (charts_view(&charts))
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
        charts_script(&charts),
    ];

    base("Dashboard", &scripts, &content)
}

fn filter_form(selected_month: MonthSelector, search: &str) -> Markup {
    html!(
        form
            method="get"
            action=(endpoints::ROOT)
            class="w-full flex flex-wrap items-end gap-4 mb-6"
        {
            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search transaction" }
                input
                    id="search"
                    type="search"
                    name="search"
                    value=(search)
                    placeholder="Title, description or price"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                select
                    id="month"
                    name="month"
                    onchange="this.form.submit()"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for month in MonthSelector::all() {
                        option value=(month) selected[month == selected_month] { (month.name()) }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Search" }
        }
    )
}

fn transaction_table(transactions: &[Transaction]) -> Markup {
    html!(
        div class="w-full overflow-x-auto rounded-lg shadow mb-4"
        {
            table id="transactions" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Price" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Sold" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Image" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                        {
                            td class=(TABLE_CELL_STYLE) { (transaction.id) }
                            td class=(TABLE_CELL_STYLE) { (transaction.title) }
                            td class=(TABLE_CELL_STYLE) { (transaction.description) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(transaction.price)) }
                            td class=(TABLE_CELL_STYLE) { (transaction.category) }
                            td class=(TABLE_CELL_STYLE) { (transaction.sold.as_str()) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @if !transaction.image.is_empty() {
                                    (link(&transaction.image, "View"))
                                }
                            }
                        }
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="7" class={(TABLE_CELL_STYLE) " text-center"}
                            {
                                "No transactions found."
                            }
                        }
                    }
                }
            }
        }
    )
}

/// Previous and Next links. Previous is disabled on the first page; Next is
/// always available since a page past the end is simply empty.
fn page_navigation(month: MonthSelector, search: &str, page: Page) -> Markup {
    let current = page.number();

    html!(
        nav class="w-full flex justify-between items-center mb-8" aria-label="Pagination"
        {
            @if current <= 1 {
                span id="previous-page" class=(BUTTON_DISABLED_STYLE) aria-disabled="true" { "Previous" }
            } @else {
                a id="previous-page" href=(page_url(month, search, current - 1)) class=(BUTTON_PRIMARY_STYLE)
                {
                    "Previous"
                }
            }

            span { "Page " (current) }

            a id="next-page" href=(page_url(month, search, current.saturating_add(1))) class=(BUTTON_PRIMARY_STYLE)
            {
                "Next"
            }
        }
    )
}

fn statistics_view(month: MonthSelector, statistics: &Statistics) -> Markup {
    html!(
        section class="w-full mb-8"
        {
            h2 class="text-xl font-semibold mb-4" { "Statistics - " (month.name()) }

            dl class="grid grid-cols-1 md:grid-cols-3 gap-4"
            {
                div class="p-4 rounded-lg shadow bg-white dark:bg-gray-800"
                {
                    dt class="text-sm text-gray-500 dark:text-gray-400" { "Total sale" }
                    dd id="total-sale-amount" class="text-2xl font-bold"
                    {
                        (format_currency(statistics.total_sale_amount))
                    }
                }
                div class="p-4 rounded-lg shadow bg-white dark:bg-gray-800"
                {
                    dt class="text-sm text-gray-500 dark:text-gray-400" { "Total sold items" }
                    dd id="total-sold-items" class="text-2xl font-bold" { (statistics.total_sold_items) }
                }
                div class="p-4 rounded-lg shadow bg-white dark:bg-gray-800"
                {
                    dt class="text-sm text-gray-500 dark:text-gray-400" { "Total not sold items" }
                    dd id="total-not-sold-items" class="text-2xl font-bold" { (statistics.total_not_sold_items) }
                }
            }
        }
    )
}
