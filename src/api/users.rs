use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;

use super::agencies::{require_search, require_unique_id};
use super::auth::AuthUser;
use super::{
    AddUserRequest, ApiError, FieldError, ListQuery, SearchQuery, UniqueIdQuery, UniqueIdRequest,
    UpdatePasswordRequest, UpdateUserAgencyRequest, UpdateUserDetailsRequest,
    UpdateUserProviderRequest, reply, validation,
};
use crate::api::AppState;
use crate::constants::access;
use crate::db::{NewUser, Ordering};
use crate::entities::{agencies, providers, users};
use crate::pagination::paginate;

/// Shapes a user row with its joined agency and provider for responses.
fn user_row(
    user: users::Model,
    agency: Option<agencies::Model>,
    provider: Option<providers::Model>,
) -> Value {
    let agency = agency.map(|a| {
        json!({
            "name": a.name,
            "sync_timestamp": a.sync_timestamp,
        })
    });
    let provider = provider.map(|p| {
        json!({
            "name": p.name,
            "type": p.r#type,
            "access_timestamp": p.access_timestamp,
        })
    });

    let mut row = serde_json::to_value(user).unwrap_or_default();
    if let Value::Object(map) = &mut row {
        map.insert("agency".to_string(), agency.unwrap_or(Value::Null));
        map.insert("provider".to_string(), provider.unwrap_or(Value::Null));
    }
    row
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let count = state.store.count_users().await?;
    let window = paginate(query.page, query.size, count);
    let ordering = Ordering::new(query.order_by, query.sort_by);

    let rows = state
        .store
        .list_users(&ordering, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Users Not found", json!([])));
    }

    let rows: Vec<Value> = rows.into_iter().map(|(u, a, p)| user_row(u, a, p)).collect();

    Ok(reply(
        StatusCode::OK,
        "Users loaded",
        json!({ "rows": rows, "count": count, "pages": window.pages }),
    ))
}

/// GET /search/users
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let search = require_search(query.search.as_deref())?;

    let count = state.store.count_matching_users(search).await?;
    let window = paginate(query.list.page, query.list.size, count);

    let rows = state
        .store
        .search_users(search, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Users Not found", json!([])));
    }

    let rows: Vec<Value> = rows.into_iter().map(|(u, a, p)| user_row(u, a, p)).collect();

    Ok(reply(
        StatusCode::OK,
        "Users loaded",
        json!({ "rows": rows, "count": count, "pages": window.pages }),
    ))
}

/// GET /user
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UniqueIdQuery>,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(query.unique_id.as_deref())?;

    match state.store.get_user(unique_id).await? {
        Some((user, agency, provider)) => Ok(reply(
            StatusCode::OK,
            "User loaded",
            user_row(user, agency, provider),
        )),
        None => Err(ApiError::not_found("User not found")),
    }
}

/// GET /profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    match state.store.get_user(&auth.user_unique_id).await? {
        Some((user, agency, provider)) => Ok(reply(
            StatusCode::OK,
            "User loaded",
            user_row(user, agency, provider),
        )),
        None => Err(ApiError::not_found("User not found")),
    }
}

/// POST /add/user
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<AddUserRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let user_type = validation::required(
        &mut errors,
        "type",
        "Type is required",
        payload.r#type.as_deref(),
    );
    if let Some(user_type) = user_type {
        validation::user_type(&mut errors, "type", user_type);
    }

    let agency_unique_id = validation::optional(payload.agency_unique_id.as_deref());
    if let Some(agency_unique_id) = agency_unique_id
        && state.store.get_agency(agency_unique_id).await?.is_none()
    {
        errors.push(FieldError::new("agency_unique_id", "Agency not found!"));
    }

    let provider_unique_id = validation::optional(payload.provider_unique_id.as_deref());
    if let Some(provider_unique_id) = provider_unique_id
        && state.store.get_provider(provider_unique_id).await?.is_none()
    {
        errors.push(FieldError::new("provider_unique_id", "Provider not found!"));
    }

    let fullname = validation::required(
        &mut errors,
        "fullname",
        "Fullname is required",
        payload.fullname.as_deref(),
    );
    if let Some(fullname) = fullname {
        validation::length(&mut errors, "fullname", fullname, 3, 300);
    }

    let email = validation::required(
        &mut errors,
        "email",
        "Email is required",
        payload.email.as_deref(),
    );
    if let Some(email) = email {
        validation::email_format(&mut errors, "email", email);
        if state.store.user_email_exists(email).await? {
            errors.push(FieldError::new("email", "Email already exists!"));
        }
    }

    let role = validation::required(&mut errors, "role", "Role is required", payload.role.as_deref());
    if let Some(role) = role {
        validation::length(&mut errors, "role", role, 3, 20);
    }

    let password = validation::required(
        &mut errors,
        "password",
        "Password is required",
        payload.password.as_deref(),
    );
    if let Some(password) = password {
        validation::strong_password(&mut errors, "password", password);
    }
    let confirm = validation::required(
        &mut errors,
        "confirmPassword",
        "Confirm Password is required",
        payload.confirm_password.as_deref(),
    );
    if let (Some(password), Some(confirm)) = (password, confirm) {
        validation::passwords_match(&mut errors, "confirmPassword", password, confirm);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let (user_type, fullname, email, role, password) =
        match (user_type, fullname, email, role, password) {
            (Some(t), Some(f), Some(e), Some(r), Some(p)) => (t, f, e, r, p),
            _ => return Err(ApiError::bad_request("Error creating user")),
        };

    state
        .store
        .add_user(NewUser {
            r#type: user_type.to_string(),
            agency_unique_id: agency_unique_id.map(str::to_string),
            provider_unique_id: provider_unique_id.map(str::to_string),
            fullname: fullname.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            password: password.to_string(),
        })
        .await?;

    state.audit.record(
        &auth.user_unique_id,
        "Users",
        &format!("Added new user | Fullname: {fullname} | Role: {role}"),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "User created successfully!",
    ))
}

async fn require_existing_user(
    state: &AppState,
    errors: &mut Vec<FieldError>,
    unique_id: Option<&str>,
) -> Result<Option<users::Model>, ApiError> {
    let unique_id = validation::required(errors, "unique_id", "Unique Id is required", unique_id);
    if let Some(unique_id) = unique_id {
        match state.store.get_active_user(unique_id).await? {
            Some(user) => return Ok(Some(user)),
            None => errors.push(FieldError::new("unique_id", "User not found!")),
        }
    }
    Ok(None)
}

/// PUT /update/details
pub async fn update_user_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateUserDetailsRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let user = require_existing_user(&state, &mut errors, payload.unique_id.as_deref()).await?;

    let fullname = validation::required(
        &mut errors,
        "fullname",
        "Fullname is required",
        payload.fullname.as_deref(),
    );
    if let Some(fullname) = fullname {
        validation::length(&mut errors, "fullname", fullname, 3, 300);
    }

    let role = validation::required(&mut errors, "role", "Role is required", payload.role.as_deref());
    if let Some(role) = role {
        validation::length(&mut errors, "role", role, 3, 20);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let (user, fullname, role) = match (user, fullname, role) {
        (Some(u), Some(f), Some(r)) => (u, f, r),
        _ => return Err(ApiError::bad_request("Error updating details")),
    };

    let updated = state
        .store
        .update_user_details(&user.unique_id, fullname, role)
        .await?;
    if updated == 0 {
        return Err(ApiError::bad_request("Error updating details"));
    }

    state
        .audit
        .record(&auth.user_unique_id, "Users", "Updated user details");

    Ok(super::reply_message(
        StatusCode::OK,
        "Details updated successfully!",
    ))
}

/// PUT /update/agency
pub async fn update_user_agency(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateUserAgencyRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let user = require_existing_user(&state, &mut errors, payload.unique_id.as_deref()).await?;

    let agency_unique_id = validation::required(
        &mut errors,
        "agency_unique_id",
        "Agency Unique Id is required",
        payload.agency_unique_id.as_deref(),
    );
    if let Some(agency_unique_id) = agency_unique_id
        && state.store.get_agency(agency_unique_id).await?.is_none()
    {
        errors.push(FieldError::new("agency_unique_id", "Agency not found!"));
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let (user, agency_unique_id) = match (user, agency_unique_id) {
        (Some(u), Some(a)) => (u, a),
        _ => return Err(ApiError::bad_request("Error updating details")),
    };

    let updated = state
        .store
        .update_user_agency(&user.unique_id, agency_unique_id)
        .await?;
    if updated == 0 {
        return Err(ApiError::bad_request("Error updating details"));
    }

    state
        .audit
        .record(&auth.user_unique_id, "Users", "Updated user details");

    Ok(super::reply_message(
        StatusCode::OK,
        "Details updated successfully!",
    ))
}

/// PUT /update/provider
pub async fn update_user_provider(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateUserProviderRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let user = require_existing_user(&state, &mut errors, payload.unique_id.as_deref()).await?;

    let provider_unique_id = validation::required(
        &mut errors,
        "provider_unique_id",
        "Provider Unique Id is required",
        payload.provider_unique_id.as_deref(),
    );
    if let Some(provider_unique_id) = provider_unique_id
        && state.store.get_provider(provider_unique_id).await?.is_none()
    {
        errors.push(FieldError::new("provider_unique_id", "Provider not found!"));
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let (user, provider_unique_id) = match (user, provider_unique_id) {
        (Some(u), Some(p)) => (u, p),
        _ => return Err(ApiError::bad_request("Error updating details")),
    };

    let updated = state
        .store
        .update_user_provider(&user.unique_id, provider_unique_id)
        .await?;
    if updated == 0 {
        return Err(ApiError::bad_request("Error updating details"));
    }

    state
        .audit
        .record(&auth.user_unique_id, "Users", "Updated user details");

    Ok(super::reply_message(
        StatusCode::OK,
        "Details updated successfully!",
    ))
}

/// PUT /update/password
pub async fn update_user_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let unique_id = validation::required(
        &mut errors,
        "unique_id",
        "Unique Id is required",
        payload.unique_id.as_deref(),
    );

    let password = validation::required(
        &mut errors,
        "password",
        "Password is required",
        payload.password.as_deref(),
    );
    if let Some(password) = password {
        validation::strong_password(&mut errors, "password", password);
    }
    let confirm = validation::required(
        &mut errors,
        "confirmPassword",
        "Confirm Password is required",
        payload.confirm_password.as_deref(),
    );
    if let (Some(password), Some(confirm)) = (password, confirm) {
        validation::passwords_match(&mut errors, "confirmPassword", password, confirm);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let (unique_id, password) = match (unique_id, password) {
        (Some(u), Some(p)) => (u, p),
        _ => return Err(ApiError::bad_request("Error updating password")),
    };

    let user = state
        .store
        .get_user(unique_id)
        .await?
        .map(|(u, _, _)| u)
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    match user.access {
        access::SUSPENDED => return Err(ApiError::forbidden("Account has been suspended")),
        access::REVOKED => return Err(ApiError::forbidden("Account access has been revoked")),
        _ => {}
    }

    let updated = state
        .store
        .update_user_password(&user.unique_id, password.to_string())
        .await?;
    if updated == 0 {
        return Err(ApiError::bad_request("Error updating password"));
    }

    state.audit.record(
        &auth.user_unique_id,
        "Users",
        &format!(
            "Updated user password | Fullname: {} | Role: {}",
            user.fullname,
            user.role.as_deref().unwrap_or_default()
        ),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "User's password changed successfully!",
    ))
}

async fn update_access(
    state: &AppState,
    auth: &AuthUser,
    unique_id: Option<&str>,
    new_access: i32,
    action: &str,
    success: &'static str,
    noop: &'static str,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(unique_id)?;

    let updated = state.store.update_user_access(unique_id, new_access).await?;
    if updated == 0 {
        return Err(ApiError::bad_request(noop));
    }

    state.audit.record(&auth.user_unique_id, "Access", action);

    Ok(super::reply_message(StatusCode::OK, success))
}

/// PUT /user/access/grant
pub async fn grant_user_access(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UniqueIdRequest>,
) -> Result<Response, ApiError> {
    update_access(
        &state,
        &auth,
        payload.unique_id.as_deref(),
        access::GRANTED,
        "Granted general access.",
        "User's access granted successfully!",
        "User access already granted",
    )
    .await
}

/// PUT /user/access/suspend
pub async fn suspend_user_access(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UniqueIdRequest>,
) -> Result<Response, ApiError> {
    update_access(
        &state,
        &auth,
        payload.unique_id.as_deref(),
        access::SUSPENDED,
        "Suspended general access.",
        "User's access suspended successfully!",
        "User access already suspended",
    )
    .await
}

/// PUT /user/access/revoke
pub async fn revoke_user_access(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UniqueIdRequest>,
) -> Result<Response, ApiError> {
    update_access(
        &state,
        &auth,
        payload.unique_id.as_deref(),
        access::REVOKED,
        "Revoked general access.",
        "User's access revoked successfully!",
        "User access already revoked",
    )
    .await
}

/// DELETE /user
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UniqueIdRequest>,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(payload.unique_id.as_deref())?;

    if unique_id == auth.user_unique_id {
        return Err(ApiError::bad_request("Unable to perform action"));
    }

    let user = state
        .store
        .get_user(unique_id)
        .await?
        .map(|(u, _, _)| u)
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let deleted = state.store.delete_user(unique_id).await?;
    if deleted == 0 {
        return Err(ApiError::bad_request("Error deleting user"));
    }

    state.audit.record(
        &auth.user_unique_id,
        "Users",
        &format!("Deleted user | User: {}", user.fullname),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "User was deleted successfully!",
    ))
}
