//! Aggregate reports over the employee table.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use staffmetrics_report::{DepartmentStat, RangeCount};
use staffmetrics_store::GenderCount;

use crate::error::ApiResult;
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/analytics/departments", get(departments))
        .route("/api/analytics/salary-distribution", get(salary_distribution))
        .route("/api/analytics/age-distribution", get(age_distribution))
        .route("/api/analytics/gender-distribution", get(gender_distribution))
        .route("/api/analytics/tenure-distribution", get(tenure_distribution))
}

pub async fn departments(State(state): State<ApiState>) -> ApiResult<Json<Vec<DepartmentStat>>> {
    Ok(Json(state.reports.department_stats().await?))
}

pub async fn salary_distribution(
    State(state): State<ApiState>,
) -> ApiResult<Json<Vec<RangeCount>>> {
    Ok(Json(state.reports.salary_distribution().await?))
}

pub async fn age_distribution(State(state): State<ApiState>) -> ApiResult<Json<Vec<RangeCount>>> {
    Ok(Json(state.reports.age_distribution().await?))
}

pub async fn gender_distribution(
    State(state): State<ApiState>,
) -> ApiResult<Json<Vec<GenderCount>>> {
    Ok(Json(state.reports.gender_distribution().await?))
}

/// Tenure buckets relative to the current UTC date.
pub async fn tenure_distribution(
    State(state): State<ApiState>,
) -> ApiResult<Json<Vec<RangeCount>>> {
    Ok(Json(state.reports.tenure_distribution().await?))
}
