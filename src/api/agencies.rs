use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde_json::json;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{
    AddAgencyRequest, ApiError, FieldError, ListQuery, PaginatedRows, SearchQuery, UniqueIdQuery,
    UniqueIdRequest, UpdateAgencyRequest, reply, validation,
};
use crate::api::AppState;
use crate::db::Ordering;
use crate::pagination::paginate;

/// GET /agencies
pub async fn list_agencies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let count = state.store.count_agencies().await?;
    let window = paginate(query.page, query.size, count);
    let ordering = Ordering::new(query.order_by, query.sort_by);

    let rows = state
        .store
        .list_agencies(&ordering, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Agencies Not found", json!([])));
    }

    Ok(reply(
        StatusCode::OK,
        "Agencies loaded",
        PaginatedRows {
            rows,
            count,
            pages: window.pages,
        },
    ))
}

/// GET /search/agencies
pub async fn search_agencies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let search = require_search(query.search.as_deref())?;

    let count = state.store.count_matching_agencies(search).await?;
    let window = paginate(query.list.page, query.list.size, count);

    let rows = state
        .store
        .search_agencies(search, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Agencies Not found", json!([])));
    }

    Ok(reply(
        StatusCode::OK,
        "Agencies loaded",
        PaginatedRows {
            rows,
            count,
            pages: window.pages,
        },
    ))
}

/// GET /agency
pub async fn get_agency(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UniqueIdQuery>,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(query.unique_id.as_deref())?;

    match state.store.get_agency(unique_id).await? {
        Some(agency) => Ok(reply(StatusCode::OK, "Agency loaded", agency)),
        None => Err(ApiError::not_found("Agency not found")),
    }
}

/// POST /add/agency
pub async fn add_agency(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<AddAgencyRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let name = validation::required(&mut errors, "name", "Name is required", payload.name.as_deref());
    if let Some(name) = name {
        validation::length(&mut errors, "name", name, 2, 100);
        if state.store.agency_name_exists(name).await? {
            errors.push(FieldError::new("name", "Agency already exists!"));
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let name = name.unwrap_or_default();

    state.store.add_agency(name).await?;

    state.audit.record(
        &auth.user_unique_id,
        "Agencies",
        &format!("Added new agency | Agency: {name}"),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "Agency created successfully!",
    ))
}

/// PUT /update/agency/details
pub async fn update_agency_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateAgencyRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let unique_id = validation::required(
        &mut errors,
        "unique_id",
        "Unique Id is required",
        payload.unique_id.as_deref(),
    );
    if let Some(unique_id) = unique_id
        && state.store.get_agency(unique_id).await?.is_none()
    {
        errors.push(FieldError::new("unique_id", "Agency not found!"));
    }

    let name = validation::required(&mut errors, "name", "Name is required", payload.name.as_deref());
    if let Some(name) = name {
        validation::length(&mut errors, "name", name, 2, 100);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let (unique_id, name) = (unique_id.unwrap_or_default(), name.unwrap_or_default());

    let updated = state.store.update_agency_details(unique_id, name).await?;
    if updated == 0 {
        return Err(ApiError::bad_request("Error updating details"));
    }

    state.audit.record(
        &auth.user_unique_id,
        "Agencies",
        &format!("Updated agency details | Agency: {name}"),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "Details updated successfully!",
    ))
}

/// DELETE /agency
pub async fn delete_agency(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UniqueIdRequest>,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(payload.unique_id.as_deref())?;

    let agency = state
        .store
        .get_agency(unique_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agency not found"))?;

    let deleted = state.store.delete_agency(unique_id).await?;
    if deleted == 0 {
        return Err(ApiError::bad_request("Error deleting agency"));
    }

    state.audit.record(
        &auth.user_unique_id,
        "Agencies",
        &format!("Deleted agency | Agency: {}", agency.name),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "Agency was deleted successfully!",
    ))
}

// ============================================================================
// Public (key-less) variants
// ============================================================================

/// GET /public/agencies
pub async fn public_list_agencies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let count = state.store.count_agencies().await?;
    let ordering = Ordering::new(query.order_by, query.sort_by);
    let rows = state.store.list_all_agencies(&ordering).await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Agencies Not found", json!([])));
    }

    Ok(reply(
        StatusCode::OK,
        "Agencies loaded",
        json!({ "rows": rows, "count": count }),
    ))
}

/// GET /public/search/agencies
pub async fn public_search_agencies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let search = require_search(query.search.as_deref())?;

    let count = state.store.count_matching_agencies(search).await?;
    let rows = state.store.search_all_agencies(search).await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Agencies Not found", json!([])));
    }

    Ok(reply(
        StatusCode::OK,
        "Agencies loaded",
        json!({ "rows": rows, "count": count }),
    ))
}

/// GET /public/agency
pub async fn public_get_agency(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UniqueIdQuery>,
) -> Result<Response, ApiError> {
    get_agency(State(state), Query(query)).await
}

pub(super) fn require_search(search: Option<&str>) -> Result<&str, ApiError> {
    let mut errors = Vec::new();
    let search = validation::required(&mut errors, "search", "Search is required", search);
    if let Some(search) = search {
        validation::length(&mut errors, "search", search, 2, 200);
    }
    if errors.is_empty() {
        Ok(search.unwrap_or_default())
    } else {
        Err(ApiError::validation(errors))
    }
}

pub(super) fn require_unique_id(unique_id: Option<&str>) -> Result<&str, ApiError> {
    let mut errors = Vec::new();
    let unique_id = validation::required(&mut errors, "unique_id", "Unique Id is required", unique_id);
    if errors.is_empty() {
        Ok(unique_id.unwrap_or_default())
    } else {
        Err(ApiError::validation(errors))
    }
}
