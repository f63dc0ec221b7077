//! Performance-review CRUD handlers.
//!
//! Writes carry the four sub-scores only; the overall score is always
//! recomputed from them.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use staffmetrics_core::{NewPerformanceReview, PerformanceReview, ReviewChanges, Validate};
use staffmetrics_store::{Page, ReviewFilter};

use crate::error::{ApiError, ApiResult};
use crate::pagination::page_request;
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/performance-reviews", get(list).post(create))
        .route(
            "/api/performance-reviews/{id}",
            get(get_by_id).put(update).patch(patch).delete(delete),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    employee: Option<Uuid>,
    review_date: Option<NaiveDate>,
    page: Option<u32>,
    page_size: Option<u32>,
}

pub async fn list(
    State(state): State<ApiState>,
    query: Result<Query<ReviewQuery>, QueryRejection>,
) -> ApiResult<Json<Page<PerformanceReview>>> {
    let Query(query) = query?;
    let page = page_request(query.page, query.page_size, &state.settings)?;
    let filter = ReviewFilter {
        employee_id: query.employee,
        review_date: query.review_date,
    };
    Ok(Json(state.store.list_reviews(&filter, page).await?))
}

pub async fn create(
    State(state): State<ApiState>,
    payload: Result<Json<NewPerformanceReview>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PerformanceReview>)> {
    let Json(new) = payload?;
    new.validate()?;
    let review = state
        .store
        .insert_reviews(std::slice::from_ref(&new))
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("insert returned no row".to_string()))?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn get_by_id(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<PerformanceReview>> {
    let Path(id) = id?;
    Ok(Json(state.store.get_review(id).await?))
}

pub async fn update(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewPerformanceReview>, JsonRejection>,
) -> ApiResult<Json<PerformanceReview>> {
    let Path(id) = id?;
    let Json(replacement) = payload?;
    replacement.validate()?;
    let review = state
        .store
        .update_review(id, replacement.into_changes())
        .await?;
    Ok(Json(review))
}

pub async fn patch(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReviewChanges>, JsonRejection>,
) -> ApiResult<Json<PerformanceReview>> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    Ok(Json(state.store.update_review(id, changes).await?))
}

pub async fn delete(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.store.delete_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
