//! Employee CRUD handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use staffmetrics_core::{Employee, EmployeeChanges, NewEmployee, Validate};
use staffmetrics_store::{EmployeeFilter, Page};

use crate::error::{ApiError, ApiResult};
use crate::pagination::page_request;
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/employees", get(list).post(create))
        .route(
            "/api/employees/{id}",
            get(get_by_id).put(update).patch(patch).delete(delete),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeQuery {
    department: Option<String>,
    position: Option<String>,
    gender: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

/// Filtered, searchable, newest-first employee list.
pub async fn list(
    State(state): State<ApiState>,
    query: Result<Query<EmployeeQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Employee>>> {
    let Query(query) = query?;
    let page = page_request(query.page, query.page_size, &state.settings)?;
    let filter = EmployeeFilter {
        department: query.department,
        position: query.position,
        gender: query.gender,
        search: query.search.filter(|term| !term.trim().is_empty()),
    };
    Ok(Json(state.store.list_employees(&filter, page).await?))
}

pub async fn create(
    State(state): State<ApiState>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    let Json(new) = payload?;
    new.validate()?;
    let mut created = state.store.insert_employees(std::slice::from_ref(&new)).await?;
    let employee = created
        .pop()
        .ok_or_else(|| ApiError::Internal("insert returned no row".to_string()))?;
    info!(employee_id = %employee.id, "employee created");
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn get_by_id(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Employee>> {
    let Path(id) = id?;
    Ok(Json(state.store.get_employee(id).await?))
}

/// Full replacement: every writable field must be present.
pub async fn update(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> ApiResult<Json<Employee>> {
    let Path(id) = id?;
    let Json(replacement) = payload?;
    replacement.validate()?;
    let employee = state
        .store
        .update_employee(id, replacement.into_changes())
        .await?;
    Ok(Json(employee))
}

pub async fn patch(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EmployeeChanges>, JsonRejection>,
) -> ApiResult<Json<Employee>> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    Ok(Json(state.store.update_employee(id, changes).await?))
}

/// Delete an employee together with their attendance and reviews.
pub async fn delete(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.store.delete_employee(id).await?;
    info!(employee_id = %id, "employee deleted");
    Ok(StatusCode::NO_CONTENT)
}
