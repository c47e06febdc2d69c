//! The API endpoints URIs.

/// The page showing the transaction table, statistics and price chart for a month.
pub const ROOT: &str = "/";
/// The route for listing a month's transactions.
pub const TRANSACTIONS_API: &str = "/transactions";
/// The route for a month's sale statistics.
pub const STATISTICS_API: &str = "/statistics";
/// The route for the number of a month's transactions per price range.
pub const BAR_CHART_API: &str = "/bar-chart";
