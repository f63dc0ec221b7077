use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::info;

use staffmetrics_report::employee_csv_stream;

use crate::state::ApiState;

const CONTENT_DISPOSITION: &str = "attachment; filename=\"employees.csv\"";

pub fn router() -> Router<ApiState> {
    Router::new().route("/api/export/employees", get(employees_csv))
}

/// Stream every employee as CSV, one keyset page at a time.
pub async fn employees_csv(State(state): State<ApiState>) -> Response {
    info!(chunk_size = state.settings.export_chunk_size, "employee export started");
    let stream = employee_csv_stream(Arc::clone(&state.store), state.settings.export_chunk_size);

    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(CONTENT_DISPOSITION),
    );
    response
}
