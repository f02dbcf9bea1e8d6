use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde_json::json;
use std::sync::Arc;

use super::agencies::{require_search, require_unique_id};
use super::auth::AuthUser;
use super::{
    AddProviderRequest, ApiError, FieldError, ListQuery, PaginatedRows, SearchQuery,
    UniqueIdQuery, UniqueIdRequest, UpdateProviderRequest, reply, validation,
};
use crate::api::AppState;
use crate::db::Ordering;
use crate::pagination::paginate;

/// GET /providers
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let count = state.store.count_providers().await?;
    let window = paginate(query.page, query.size, count);
    let ordering = Ordering::new(query.order_by, query.sort_by);

    let rows = state
        .store
        .list_providers(&ordering, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Providers Not found", json!([])));
    }

    Ok(reply(
        StatusCode::OK,
        "Providers loaded",
        PaginatedRows {
            rows,
            count,
            pages: window.pages,
        },
    ))
}

/// GET /search/providers
pub async fn search_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let search = require_search(query.search.as_deref())?;

    let count = state.store.count_matching_providers(search).await?;
    let window = paginate(query.list.page, query.list.size, count);

    let rows = state
        .store
        .search_providers(search, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Providers Not found", json!([])));
    }

    Ok(reply(
        StatusCode::OK,
        "Providers loaded",
        PaginatedRows {
            rows,
            count,
            pages: window.pages,
        },
    ))
}

/// GET /provider
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UniqueIdQuery>,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(query.unique_id.as_deref())?;

    match state.store.get_provider(unique_id).await? {
        Some(provider) => Ok(reply(StatusCode::OK, "Provider loaded", provider)),
        None => Err(ApiError::not_found("Provider not found")),
    }
}

/// POST /add/provider
pub async fn add_provider(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<AddProviderRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let name = validation::required(&mut errors, "name", "Name is required", payload.name.as_deref());
    if let Some(name) = name {
        validation::length(&mut errors, "name", name, 2, 100);
        if state.store.provider_name_exists(name).await? {
            errors.push(FieldError::new("name", "Provider already exists!"));
        }
    }

    let provider_type = validation::required(
        &mut errors,
        "type",
        "Type is required",
        payload.r#type.as_deref(),
    );
    if let Some(provider_type) = provider_type {
        validation::length(&mut errors, "type", provider_type, 2, 50);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let (name, provider_type) = (name.unwrap_or_default(), provider_type.unwrap_or_default());

    state.store.add_provider(name, provider_type).await?;

    state.audit.record(
        &auth.user_unique_id,
        "Providers",
        &format!("Added new provider | Provider: {name}"),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "Provider created successfully!",
    ))
}

/// PUT /update/provider/details
pub async fn update_provider_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateProviderRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let unique_id = validation::required(
        &mut errors,
        "unique_id",
        "Unique Id is required",
        payload.unique_id.as_deref(),
    );
    if let Some(unique_id) = unique_id
        && state.store.get_provider(unique_id).await?.is_none()
    {
        errors.push(FieldError::new("unique_id", "Provider not found!"));
    }

    let name = validation::required(&mut errors, "name", "Name is required", payload.name.as_deref());
    if let Some(name) = name {
        validation::length(&mut errors, "name", name, 2, 100);
    }

    let provider_type = validation::required(
        &mut errors,
        "type",
        "Type is required",
        payload.r#type.as_deref(),
    );
    if let Some(provider_type) = provider_type {
        validation::length(&mut errors, "type", provider_type, 2, 50);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let (unique_id, name, provider_type) = (
        unique_id.unwrap_or_default(),
        name.unwrap_or_default(),
        provider_type.unwrap_or_default(),
    );

    let updated = state
        .store
        .update_provider_details(unique_id, name, provider_type)
        .await?;
    if updated == 0 {
        return Err(ApiError::bad_request("Error updating details"));
    }

    state.audit.record(
        &auth.user_unique_id,
        "Providers",
        &format!("Updated provider details | Provider: {name}"),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "Details updated successfully!",
    ))
}

/// DELETE /provider
pub async fn delete_provider(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UniqueIdRequest>,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(payload.unique_id.as_deref())?;

    let provider = state
        .store
        .get_provider(unique_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;

    let deleted = state.store.delete_provider(unique_id).await?;
    if deleted == 0 {
        return Err(ApiError::bad_request("Error deleting provider"));
    }

    state.audit.record(
        &auth.user_unique_id,
        "Providers",
        &format!("Deleted provider | Provider: {}", provider.name),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "Provider was deleted successfully!",
    ))
}

// ============================================================================
// Public (key-less) variants
// ============================================================================

/// GET /public/providers
pub async fn public_list_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let count = state.store.count_providers().await?;
    let ordering = Ordering::new(query.order_by, query.sort_by);
    let rows = state.store.list_all_providers(&ordering).await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Providers Not found", json!([])));
    }

    Ok(reply(
        StatusCode::OK,
        "Providers loaded",
        json!({ "rows": rows, "count": count }),
    ))
}

/// GET /public/search/providers
pub async fn public_search_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let search = require_search(query.search.as_deref())?;

    let count = state.store.count_matching_providers(search).await?;
    let rows = state.store.search_all_providers(search).await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Providers Not found", json!([])));
    }

    Ok(reply(
        StatusCode::OK,
        "Providers loaded",
        json!({ "rows": rows, "count": count }),
    ))
}

/// GET /public/provider
pub async fn public_get_provider(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UniqueIdQuery>,
) -> Result<Response, ApiError> {
    get_provider(State(state), Query(query)).await
}
