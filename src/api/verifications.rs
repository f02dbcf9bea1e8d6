use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use sea_orm::Set;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use super::agencies::{require_search, require_unique_id};
use super::auth::AuthUser;
use super::{
    AddVerificationRequest, ApiError, FieldError, ListQuery, SearchQuery, TypeQuery,
    UniqueIdQuery, UniqueIdRequest, VerifyIdentityRequest, reply, validation,
};
use crate::api::AppState;
use crate::constants::{now_str, status};
use crate::db::{Ordering, VerificationScope};
use crate::entities::{agencies, providers, verifications};
use crate::pagination::paginate;
use crate::services::{LookupError, LookupOutcome, LookupRequest};

fn verification_row(
    record: verifications::Model,
    agency: Option<agencies::Model>,
    provider: Option<providers::Model>,
) -> Value {
    let agency = agency.map(|a| {
        json!({
            "name": a.name,
            "verifications": a.verifications,
            "sync_timestamp": a.sync_timestamp,
        })
    });
    let provider = provider.map(|p| {
        json!({
            "name": p.name,
            "type": p.r#type,
            "usage": p.usage,
            "access_timestamp": p.access_timestamp,
        })
    });

    let mut row = serde_json::to_value(record).unwrap_or_default();
    if let Value::Object(map) = &mut row {
        map.insert("agency".to_string(), agency.unwrap_or(Value::Null));
        map.insert("provider".to_string(), provider.unwrap_or(Value::Null));
    }
    row
}

async fn load_verifications(
    state: &AppState,
    scope: VerificationScope<'_>,
    query: &ListQuery,
) -> Result<Response, ApiError> {
    let count = state.store.count_verifications(scope).await?;
    let window = paginate(query.page, query.size, count);
    let ordering = Ordering::new(query.order_by.clone(), query.sort_by.clone());

    let rows = state
        .store
        .list_verifications(scope, &ordering, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Verifications Not found", json!([])));
    }

    let rows: Vec<Value> = rows
        .into_iter()
        .map(|(v, a, p)| verification_row(v, a, p))
        .collect();

    Ok(reply(
        StatusCode::OK,
        "Verifications loaded",
        json!({ "rows": rows, "count": count, "pages": window.pages }),
    ))
}

/// GET /verifications
pub async fn list_verifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    load_verifications(&state, VerificationScope::default(), &query).await
}

#[derive(Debug, serde::Deserialize)]
pub struct AgencyFilterQuery {
    pub agency_unique_id: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

#[derive(Debug, serde::Deserialize)]
pub struct ProviderFilterQuery {
    pub provider_unique_id: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

/// GET /verifications/via/agency
pub async fn list_verifications_via_agency(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgencyFilterQuery>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    let agency_unique_id = validation::required(
        &mut errors,
        "agency_unique_id",
        "Agency Unique Id is required",
        query.agency_unique_id.as_deref(),
    );
    if let Some(agency_unique_id) = agency_unique_id
        && state.store.get_agency(agency_unique_id).await?.is_none()
    {
        errors.push(FieldError::new("agency_unique_id", "Agency not found!"));
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    load_verifications(
        &state,
        VerificationScope {
            agency_unique_id,
            ..VerificationScope::default()
        },
        &query.list,
    )
    .await
}

/// GET /verifications/via/provider
pub async fn list_verifications_via_provider(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderFilterQuery>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    let provider_unique_id = validation::required(
        &mut errors,
        "provider_unique_id",
        "Provider Unique Id is required",
        query.provider_unique_id.as_deref(),
    );
    if let Some(provider_unique_id) = provider_unique_id
        && state.store.get_provider(provider_unique_id).await?.is_none()
    {
        errors.push(FieldError::new("provider_unique_id", "Provider not found!"));
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    load_verifications(
        &state,
        VerificationScope {
            provider_unique_id,
            ..VerificationScope::default()
        },
        &query.list,
    )
    .await
}

fn require_type(value: Option<&str>) -> Result<&str, ApiError> {
    let mut errors = Vec::new();
    let record_type = validation::required(&mut errors, "type", "Type is required", value);
    if let Some(record_type) = record_type {
        validation::length(&mut errors, "type", record_type, 2, 100);
    }
    if errors.is_empty() {
        Ok(record_type.unwrap_or_default())
    } else {
        Err(ApiError::validation(errors))
    }
}

/// GET /verifications/via/type
pub async fn list_verifications_via_type(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TypeQuery>,
) -> Result<Response, ApiError> {
    let record_type = require_type(query.r#type.as_deref())?;

    load_verifications(
        &state,
        VerificationScope {
            r#type: Some(record_type),
            ..VerificationScope::default()
        },
        &query.list,
    )
    .await
}

async fn search_scoped(
    state: &AppState,
    scope: VerificationScope<'_>,
    query: &SearchQuery,
) -> Result<Response, ApiError> {
    let search = require_search(query.search.as_deref())?;

    let count = state.store.count_matching_verifications(scope, search).await?;
    let window = paginate(query.list.page, query.list.size, count);

    let rows = state
        .store
        .search_verifications(scope, search, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, "Verifications Not found", json!([])));
    }

    let rows: Vec<Value> = rows
        .into_iter()
        .map(|(v, a, p)| verification_row(v, a, p))
        .collect();

    Ok(reply(
        StatusCode::OK,
        "Verifications loaded",
        json!({ "rows": rows, "count": count, "pages": window.pages }),
    ))
}

/// GET /search/verifications
pub async fn search_verifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    search_scoped(&state, VerificationScope::default(), &query).await
}

async fn get_scoped(
    state: &AppState,
    scope: VerificationScope<'_>,
    unique_id: Option<&str>,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(unique_id)?;

    match state.store.get_verification(unique_id, scope).await? {
        Some((record, agency, provider)) => Ok(reply(
            StatusCode::OK,
            "Verification loaded",
            verification_row(record, agency, provider),
        )),
        None => Err(ApiError::not_found("Verification not found")),
    }
}

/// GET /verification
pub async fn get_verification(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UniqueIdQuery>,
) -> Result<Response, ApiError> {
    get_scoped(&state, VerificationScope::default(), query.unique_id.as_deref()).await
}

/// DELETE /verification
pub async fn delete_verification(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UniqueIdRequest>,
) -> Result<Response, ApiError> {
    let unique_id = require_unique_id(payload.unique_id.as_deref())?;

    let (record, _, _) = state
        .store
        .get_verification(unique_id, VerificationScope::default())
        .await?
        .ok_or_else(|| ApiError::not_found("Verification not found"))?;

    let deleted = state.store.delete_verification(unique_id).await?;
    if deleted == 0 {
        return Err(ApiError::bad_request("Error deleting verification"));
    }

    state.audit.record(
        &auth.user_unique_id,
        "Verifications",
        &format!("Deleted verification | Verification: {}", record.unique_id),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "Verification was deleted successfully!",
    ))
}

// ============================================================================
// Identity lookup
// ============================================================================

async fn run_lookup(
    state: &AppState,
    actor: Option<&str>,
    payload: VerifyIdentityRequest,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let record_type = validation::required(&mut errors, "type", "Type is required", payload.r#type.as_deref());
    if let Some(record_type) = record_type {
        validation::length(&mut errors, "type", record_type, 2, 100);
    }

    let identification_id = validation::required(
        &mut errors,
        "identification_id",
        "Identification ID is required",
        payload.identification_id.as_deref(),
    );
    if let Some(identification_id) = identification_id {
        validation::length(&mut errors, "identification_id", identification_id, 2, 20);
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

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let (record_type, identification_id) = match (record_type, identification_id) {
        (Some(t), Some(i)) => (t, i),
        _ => return Err(ApiError::bad_request("Verification unavailable!")),
    };

    let outcome = state
        .verifier
        .lookup(LookupRequest {
            r#type: record_type.to_string(),
            identification_id: identification_id.to_string(),
            agency_unique_id: agency_unique_id.map(str::to_string),
            provider_unique_id: provider_unique_id.map(str::to_string),
        })
        .await;

    match outcome {
        Ok(LookupOutcome::Cached(record)) => {
            Ok(reply(StatusCode::OK, "Verification loaded!", record))
        }
        Ok(LookupOutcome::Created(record)) => {
            if let Some(actor) = actor {
                state.audit.record(
                    actor,
                    "Verifications",
                    &format!(
                        "Added new {} verification | Verification: {}",
                        record.r#type, record.unique_id
                    ),
                );
            }
            Ok(reply(
                StatusCode::OK,
                "Verification created successfully!",
                record,
            ))
        }
        Err(LookupError::Other(err)) => Err(ApiError::from(err)),
        Err(err) => Err(ApiError::bad_request(err.to_string())),
    }
}

/// POST /verify/identity
pub async fn verify_identity(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<VerifyIdentityRequest>,
) -> Result<Response, ApiError> {
    run_lookup(&state, Some(&auth.user_unique_id), payload).await
}

/// POST /public/verify/identity
pub async fn public_verify_identity(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyIdentityRequest>,
) -> Result<Response, ApiError> {
    run_lookup(&state, None, payload).await
}

// ============================================================================
// Agency / provider scoped surface
// ============================================================================

fn agency_scope(auth: &AuthUser) -> VerificationScope<'_> {
    VerificationScope {
        agency_unique_id: auth.agency_unique_id.as_deref(),
        ..VerificationScope::default()
    }
}

fn provider_scope(auth: &AuthUser) -> VerificationScope<'_> {
    VerificationScope {
        provider_unique_id: auth.provider_unique_id.as_deref(),
        ..VerificationScope::default()
    }
}

/// GET /agency/verifications
pub async fn agency_list_verifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    load_verifications(&state, agency_scope(&auth), &query).await
}

/// GET /agency/verifications/via/type
pub async fn agency_list_verifications_via_type(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<TypeQuery>,
) -> Result<Response, ApiError> {
    let record_type = require_type(query.r#type.as_deref())?;
    let scope = VerificationScope {
        r#type: Some(record_type),
        ..agency_scope(&auth)
    };
    load_verifications(&state, scope, &query.list).await
}

/// GET /agency/search/verifications
pub async fn agency_search_verifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    search_scoped(&state, agency_scope(&auth), &query).await
}

/// GET /agency/verification
pub async fn agency_get_verification(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UniqueIdQuery>,
) -> Result<Response, ApiError> {
    get_scoped(&state, agency_scope(&auth), query.unique_id.as_deref()).await
}

/// GET /provider/verifications
pub async fn provider_list_verifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    load_verifications(&state, provider_scope(&auth), &query).await
}

/// GET /provider/verifications/via/type
pub async fn provider_list_verifications_via_type(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<TypeQuery>,
) -> Result<Response, ApiError> {
    let record_type = require_type(query.r#type.as_deref())?;
    let scope = VerificationScope {
        r#type: Some(record_type),
        ..provider_scope(&auth)
    };
    load_verifications(&state, scope, &query.list).await
}

/// GET /provider/search/verifications
pub async fn provider_search_verifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    search_scoped(&state, provider_scope(&auth), &query).await
}

/// GET /provider/verification
pub async fn provider_get_verification(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UniqueIdQuery>,
) -> Result<Response, ApiError> {
    get_scoped(&state, provider_scope(&auth), query.unique_id.as_deref()).await
}

// ============================================================================
// Citizen self-submitted record
// ============================================================================

/// POST /add/verification
pub async fn add_verification(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<AddVerificationRequest>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let record_type = validation::required(&mut errors, "type", "Type is required", payload.r#type.as_deref());
    if let Some(record_type) = record_type {
        validation::length(&mut errors, "type", record_type, 2, 100);
    }

    let firstname = validation::required(
        &mut errors,
        "firstname",
        "Firstname is required",
        payload.firstname.as_deref(),
    );
    if let Some(firstname) = firstname {
        validation::length(&mut errors, "firstname", firstname, 2, 100);
    }

    let middlename = validation::optional(payload.middlename.as_deref());
    if let Some(middlename) = middlename {
        validation::length(&mut errors, "middlename", middlename, 2, 100);
    }

    let lastname = validation::required(
        &mut errors,
        "lastname",
        "Lastname is required",
        payload.lastname.as_deref(),
    );
    if let Some(lastname) = lastname {
        validation::length(&mut errors, "lastname", lastname, 2, 100);
    }

    let email = validation::required(&mut errors, "email", "Email is required", payload.email.as_deref());
    if let Some(email) = email {
        validation::email_format(&mut errors, "email", email);
        if state.store.verification_email_exists(email).await? {
            errors.push(FieldError::new("email", "Email already exists!"));
        }
    }

    let phone_number = validation::required(
        &mut errors,
        "phone_number",
        "Phone Number is required",
        payload.phone_number.as_deref(),
    );
    if let Some(phone_number) = phone_number {
        validation::phone_number(&mut errors, "phone_number", phone_number);
        if state.store.verification_phone_number_exists(phone_number).await? {
            errors.push(FieldError::new("phone_number", "Phone number already exists!"));
        }
    }

    let gender = validation::required(&mut errors, "gender", "Gender is required", payload.gender.as_deref());
    if let Some(gender) = gender {
        validation::length(&mut errors, "gender", gender, 1, 20);
    }

    let date_of_birth = validation::required(
        &mut errors,
        "date_of_birth",
        "Date of Birth is required",
        payload.date_of_birth.as_deref(),
    );
    if let Some(date_of_birth) = date_of_birth {
        validation::date_format(
            &mut errors,
            "date_of_birth",
            "Invalid Date of Birth format (YYYY-MM-DD)",
            date_of_birth,
        );
    }

    let address = validation::required(&mut errors, "address", "Address is required", payload.address.as_deref());
    if let Some(address) = address {
        validation::length(&mut errors, "address", address, 3, 300);
    }

    let bounded = [
        ("nationality", "Nationality is required", payload.nationality.as_deref(), 3, 50),
        ("state_of_origin", "State of Origin is required", payload.state_of_origin.as_deref(), 3, 50),
        ("lga_of_origin", "LGA of Origin is required", payload.lga_of_origin.as_deref(), 3, 50),
        ("marital_status", "Marital Status is required", payload.marital_status.as_deref(), 3, 200),
        ("educational_level", "Educational Level is required", payload.educational_level.as_deref(), 3, 200),
        ("employment_status", "Employment Status is required", payload.employment_status.as_deref(), 3, 200),
        ("nok_firstname", "Next of Kin Firstname is required", payload.nok_firstname.as_deref(), 2, 200),
        ("nok_surname", "Next of Kin Surname is required", payload.nok_surname.as_deref(), 2, 200),
    ];
    let mut required_values = Vec::with_capacity(bounded.len());
    for (param, message, value, min, max) in bounded {
        let value = validation::required(&mut errors, param, message, value);
        if let Some(value) = value {
            validation::length(&mut errors, param, value, min, max);
        }
        required_values.push(value);
    }

    let nok_middlename = validation::optional(payload.nok_middlename.as_deref());
    if let Some(nok_middlename) = nok_middlename {
        validation::length(&mut errors, "nok_middlename", nok_middlename, 2, 200);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let now = now_str();
    let set_opt = |v: Option<&str>| Set(v.map(str::to_string));

    let model = verifications::ActiveModel {
        unique_id: Set(Uuid::new_v4().to_string()),
        r#type: Set(record_type.unwrap_or_default().to_string()),
        firstname: set_opt(firstname),
        middlename: set_opt(middlename),
        lastname: set_opt(lastname),
        email: set_opt(email.map(|e| e.to_lowercase()).as_deref()),
        phone_number: set_opt(phone_number),
        gender: set_opt(gender),
        date_of_birth: set_opt(date_of_birth),
        address: set_opt(address),
        nationality: set_opt(required_values[0]),
        state_of_origin: set_opt(required_values[1]),
        lga_of_origin: set_opt(required_values[2]),
        marital_status: set_opt(required_values[3]),
        educational_level: set_opt(required_values[4]),
        employment_status: set_opt(required_values[5]),
        nok_firstname: set_opt(required_values[6]),
        nok_surname: set_opt(required_values[7]),
        nok_middlename: set_opt(nok_middlename),
        status: Set(status::ACTIVE),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let record = state.store.add_verification(model).await?;

    state.audit.record(
        &auth.user_unique_id,
        "Verifications",
        &format!("Added new verification | Verification: {}", record.unique_id),
    );

    Ok(super::reply_message(
        StatusCode::OK,
        "Verification created successfully!",
    ))
}
