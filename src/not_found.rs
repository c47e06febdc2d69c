//! The fallback response for routes that do not exist.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
