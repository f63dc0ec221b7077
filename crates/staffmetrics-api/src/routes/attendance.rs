//! Attendance CRUD handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use staffmetrics_core::{Attendance, AttendanceChanges, NewAttendance, Validate};
use staffmetrics_store::{AttendanceFilter, Page};

use crate::error::{ApiError, ApiResult};
use crate::pagination::page_request;
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/attendance", get(list).post(create))
        .route(
            "/api/attendance/{id}",
            get(get_by_id).put(update).patch(patch).delete(delete),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceQuery {
    employee: Option<Uuid>,
    date: Option<NaiveDate>,
    status: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

pub async fn list(
    State(state): State<ApiState>,
    query: Result<Query<AttendanceQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Attendance>>> {
    let Query(query) = query?;
    let page = page_request(query.page, query.page_size, &state.settings)?;
    let filter = AttendanceFilter {
        employee_id: query.employee,
        date: query.date,
        status: query.status,
    };
    Ok(Json(state.store.list_attendance(&filter, page).await?))
}

/// Record one day. A second record for the same employee and date is a
/// conflict; an Absent day is stored with zero hours.
pub async fn create(
    State(state): State<ApiState>,
    payload: Result<Json<NewAttendance>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Attendance>)> {
    let Json(new) = payload?;
    new.validate()?;
    let record = state
        .store
        .insert_attendance(std::slice::from_ref(&new))
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("insert returned no row".to_string()))?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_by_id(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Attendance>> {
    let Path(id) = id?;
    Ok(Json(state.store.get_attendance(id).await?))
}

pub async fn update(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewAttendance>, JsonRejection>,
) -> ApiResult<Json<Attendance>> {
    let Path(id) = id?;
    let Json(replacement) = payload?;
    replacement.validate()?;
    let record = state
        .store
        .update_attendance(id, replacement.into_changes())
        .await?;
    Ok(Json(record))
}

pub async fn patch(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AttendanceChanges>, JsonRejection>,
) -> ApiResult<Json<Attendance>> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    Ok(Json(state.store.update_attendance(id, changes).await?))
}

pub async fn delete(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.store.delete_attendance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
