use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, AppState, SigninRequest, SignupRequest, TokenResponse, validation};
use crate::constants::{access, headers, status, user_types};
use crate::db::NewUser;

// ============================================================================
// Token claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_unique_id: Option<String>,
    pub exp: u64,
}

/// Authenticated caller, inserted into request extensions by the gates.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_unique_id: String,
    pub agency_unique_id: Option<String>,
    pub provider_unique_id: Option<String>,
    pub user_type: String,
}

fn issue_token(
    state: &AppState,
    user_unique_id: &str,
    agency_unique_id: Option<String>,
    provider_unique_id: Option<String>,
    remember_me: bool,
) -> Result<String, ApiError> {
    let ttl = if remember_me {
        state.config.auth.remember_me_ttl_seconds
    } else {
        state.config.auth.token_ttl_seconds
    };
    let exp = jsonwebtoken::get_current_timestamp() + ttl;

    let claims = Claims {
        user_unique_id: user_unique_id.to_string(),
        agency_unique_id,
        provider_unique_id,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.auth.token_secret.as_bytes()),
    )
    .map_err(|e| ApiError::InternalError(format!("Failed to issue token: {e}")))
}

fn decode_token(state: &AppState, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.auth.token_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

// ============================================================================
// Gates
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Role {
    Any,
    Agency,
    Provider,
    Citizen,
}

fn header_or_query(headers: &HeaderMap, uri: &axum::http::Uri, header: &str, param: &str) -> Option<String> {
    if let Some(value) = headers.get(header)
        && let Ok(value) = value.to_str()
        && !value.is_empty()
    {
        return Some(value.to_string());
    }

    uri.query().and_then(|q| {
        q.split('&').find_map(|pair| {
            pair.split_once('=')
                .filter(|(k, _)| *k == param)
                .map(|(_, v)| v.to_string())
                .filter(|v| !v.is_empty())
        })
    })
}

pub async fn verify_user(state: State<Arc<AppState>>, request: Request, next: Next) -> Response {
    authorize(state, request, next, Role::Any).await
}

pub async fn verify_agency_user(state: State<Arc<AppState>>, request: Request, next: Next) -> Response {
    authorize(state, request, next, Role::Agency).await
}

pub async fn verify_provider_user(state: State<Arc<AppState>>, request: Request, next: Next) -> Response {
    authorize(state, request, next, Role::Provider).await
}

pub async fn verify_citizen(state: State<Arc<AppState>>, request: Request, next: Next) -> Response {
    authorize(state, request, next, Role::Citizen).await
}

async fn authorize(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
    role: Role,
) -> Response {
    let token = header_or_query(
        request.headers(),
        request.uri(),
        headers::HEADER_ACCESS_TOKEN,
        "token",
    );

    let Some(token) = token else {
        return ApiError::forbidden("No token provided!").into_response();
    };

    let claims = match decode_token(&state, &token) {
        Ok(claims) => claims,
        Err(_) => return ApiError::unauthorized("Unauthorized!").into_response(),
    };

    if claims.user_unique_id.is_empty() {
        return ApiError::unauthorized("Invalid token!").into_response();
    }

    // Deleted rows are kept visible here so they get their own message
    // instead of the generic miss.
    let row = match state.store.get_user_any_status(&claims.user_unique_id).await {
        Ok(row) => row,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let Some(user) = row else {
        return ApiError::forbidden("Require User!").into_response();
    };

    let role_matches = match role {
        Role::Any => true,
        Role::Agency => {
            user.r#type == user_types::AGENCY
                && claims.agency_unique_id.is_some()
                && user.agency_unique_id == claims.agency_unique_id
        }
        Role::Provider => {
            user.r#type == user_types::PROVIDER
                && claims.provider_unique_id.is_some()
                && user.provider_unique_id == claims.provider_unique_id
        }
        Role::Citizen => user.r#type == user_types::CITIZEN,
    };

    if !role_matches {
        return ApiError::forbidden("Require User!").into_response();
    }

    if user.status == status::DELETED {
        return ApiError::forbidden("User not available!").into_response();
    }

    match user.access {
        access::SUSPENDED => return ApiError::forbidden("Access is suspended").into_response(),
        access::REVOKED => return ApiError::forbidden("Access is revoked").into_response(),
        _ => {}
    }

    tracing::Span::current().record("user_id", user.unique_id.as_str());

    request.extensions_mut().insert(AuthUser {
        user_unique_id: user.unique_id,
        agency_unique_id: claims.agency_unique_id,
        provider_unique_id: claims.provider_unique_id,
        user_type: user.r#type,
    });

    next.run(request).await
}

/// API-key gate for the anonymous verification endpoint.
pub async fn verify_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = header_or_query(
        request.headers(),
        request.uri(),
        headers::HEADER_ACCESS_KEY,
        "key",
    );

    let Some(key) = key else {
        return ApiError::forbidden("No key provided!").into_response();
    };

    if !state.config.auth.api_keys.contains(&key) {
        return ApiError::unauthorized("Invalid API Key!").into_response();
    }

    next.run(request).await
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/citizen/signup
pub async fn citizen_signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

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
            errors.push(super::FieldError::new("email", "Email already exists!"));
        }
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

    let (fullname, email, password) = match (fullname, email, password) {
        (Some(f), Some(e), Some(p)) => (f, e, p),
        _ => return Err(ApiError::bad_request("Error signing up")),
    };

    let user = state
        .store
        .add_user(NewUser {
            r#type: user_types::CITIZEN.to_string(),
            agency_unique_id: None,
            provider_unique_id: None,
            fullname: fullname.to_string(),
            email: email.to_string(),
            role: "User".to_string(),
            password: password.to_string(),
        })
        .await?;

    let token = issue_token(
        &state,
        &user.unique_id,
        None,
        None,
        payload.remember_me.unwrap_or(false),
    )?;

    Ok(super::reply(
        StatusCode::OK,
        "Signed up successfully!",
        TokenResponse {
            token,
            role: user.role.unwrap_or_default(),
            fullname: user.fullname,
            agency: None,
            provider: None,
        },
    ))
}

fn check_credentials_errors(payload: &SigninRequest, require_agency: bool) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    let email = validation::required(
        &mut errors,
        "email",
        "Email is required",
        payload.email.as_deref(),
    );
    if let Some(email) = email {
        validation::email_format(&mut errors, "email", email);
    }

    validation::required(
        &mut errors,
        "password",
        "Password is required",
        payload.password.as_deref(),
    );

    if require_agency {
        validation::required(
            &mut errors,
            "agency_unique_id",
            "Agency Unique Id is required",
            payload.agency_unique_id.as_deref(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

/// Shared tail of all signin flows: access checks, password verification,
/// login timestamp and the audit entry.
async fn complete_signin(
    state: &AppState,
    user: &crate::entities::users::Model,
    password: &str,
    audit_action: String,
) -> Result<(), ApiError> {
    match user.access {
        access::SUSPENDED => return Err(ApiError::forbidden("Account has been suspended")),
        access::REVOKED => return Err(ApiError::forbidden("Account access has been revoked")),
        _ => {}
    }

    let valid = crate::db::verify_password(user.privates.clone(), password.to_string()).await?;
    if !valid {
        return Err(ApiError::unauthorized("Invalid Password!"));
    }

    state
        .store
        .update_user_login_timestamp(&user.unique_id)
        .await?;

    state.audit.record(&user.unique_id, "Signin", &audit_action);

    Ok(())
}

/// POST /auth/citizen/signin
pub async fn citizen_signin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    check_credentials_errors(&payload, false)?;
    let email = payload.email.as_deref().unwrap_or_default().to_lowercase();
    let password = payload.password.as_deref().unwrap_or_default();

    let user = state
        .store
        .get_active_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    complete_signin(
        &state,
        &user,
        password,
        "Citizen signed in successfully".to_string(),
    )
    .await?;

    let token = issue_token(
        &state,
        &user.unique_id,
        None,
        None,
        payload.remember_me.unwrap_or(false),
    )?;

    Ok(super::reply(
        StatusCode::OK,
        "Logged in successfully!",
        TokenResponse {
            token,
            role: user.role.unwrap_or_default(),
            fullname: user.fullname,
            agency: None,
            provider: None,
        },
    ))
}

/// POST /auth/admin/signin
pub async fn admin_signin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    check_credentials_errors(&payload, false)?;
    let email = payload.email.as_deref().unwrap_or_default().to_lowercase();
    let password = payload.password.as_deref().unwrap_or_default();

    let user = state
        .store
        .get_active_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    complete_signin(
        &state,
        &user,
        password,
        "Admin signed in successfully".to_string(),
    )
    .await?;

    let token = issue_token(
        &state,
        &user.unique_id,
        None,
        None,
        payload.remember_me.unwrap_or(false),
    )?;

    Ok(super::reply(
        StatusCode::OK,
        "Logged in successfully!",
        TokenResponse {
            token,
            role: user.role.unwrap_or_default(),
            fullname: user.fullname,
            agency: None,
            provider: None,
        },
    ))
}

/// POST /auth/agency/signin
pub async fn agency_signin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    check_credentials_errors(&payload, true)?;
    let email = payload.email.as_deref().unwrap_or_default().to_lowercase();
    let password = payload.password.as_deref().unwrap_or_default();
    let agency_unique_id = payload.agency_unique_id.as_deref().unwrap_or_default();

    if state.store.get_agency(agency_unique_id).await?.is_none() {
        return Err(ApiError::validation(vec![super::FieldError::new(
            "agency_unique_id",
            "Agency not found!",
        )]));
    }

    let (user, agency) = state
        .store
        .get_active_agency_user(&email, agency_unique_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    complete_signin(
        &state,
        &user,
        password,
        format!("Agency User signed in successfully | Agency Unique ID: {agency_unique_id}"),
    )
    .await?;

    let token = issue_token(
        &state,
        &user.unique_id,
        Some(agency_unique_id.to_string()),
        None,
        payload.remember_me.unwrap_or(false),
    )?;

    Ok(super::reply(
        StatusCode::OK,
        "Logged in successfully!",
        TokenResponse {
            token,
            role: user.role.unwrap_or_default(),
            fullname: user.fullname,
            agency: agency.map(|a| a.name),
            provider: None,
        },
    ))
}

/// POST /auth/provider/signin
pub async fn provider_signin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    check_credentials_errors(&payload, false)?;
    let email = payload.email.as_deref().unwrap_or_default().to_lowercase();
    let password = payload.password.as_deref().unwrap_or_default();

    let (user, provider) = state
        .store
        .get_active_provider_user(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("Provider User not found"))?;

    let provider_unique_id = user.provider_unique_id.clone().unwrap_or_default();

    complete_signin(
        &state,
        &user,
        password,
        format!("Provider User signed in successfully | Provider Unique ID: {provider_unique_id}"),
    )
    .await?;

    let token = issue_token(
        &state,
        &user.unique_id,
        None,
        Some(provider_unique_id),
        payload.remember_me.unwrap_or(false),
    )?;

    Ok(super::reply(
        StatusCode::OK,
        "Logged in successfully!",
        TokenResponse {
            token,
            role: user.role.unwrap_or_default(),
            fullname: user.fullname,
            agency: None,
            provider: provider.map(|p| p.name),
        },
    ))
}
