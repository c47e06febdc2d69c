//! Application router configuration.

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    dashboard::get_dashboard_page,
    endpoints,
    not_found::get_404_not_found,
    report::{get_bar_chart_endpoint, get_statistics_endpoint},
    transaction::list_transactions_endpoint,
};

/// Return a router with all the app's routes.
///
/// The JSON routes may be called from pages served on other origins, so any
/// origin is allowed.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_API, get(list_transactions_endpoint))
        .route(endpoints::STATISTICS_API, get(get_statistics_endpoint))
        .route(endpoints::BAR_CHART_API, get(get_bar_chart_endpoint))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
