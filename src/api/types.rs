use axum::{Json, http::StatusCode, response::Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            data,
        }
    }
}

/// Builds a `{status, message, data}` response with the given payload.
pub fn reply<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    use axum::response::IntoResponse;
    (status, Json(ApiResponse::new(status, message, Some(data)))).into_response()
}

/// Builds a `{status, message}` response with no payload.
pub fn reply_message(status: StatusCode, message: &str) -> Response {
    use axum::response::IntoResponse;
    (status, Json(ApiResponse::<Value>::new(status, message, None))).into_response()
}

/// One failed validation check, keyed by the offending parameter.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
}

impl FieldError {
    pub fn new(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            msg: msg.into(),
        }
    }
}

// ============================================================================
// Query types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub order_by: Option<String>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

#[derive(Debug, Deserialize)]
pub struct UniqueIdQuery {
    pub unique_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TypeQuery {
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

#[derive(Debug, Deserialize)]
pub struct UserFilterQuery {
    pub user_unique_id: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
    pub remember_me: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub remember_me: Option<bool>,
    pub agency_unique_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddAgencyRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAgencyRequest {
    pub unique_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddProviderRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProviderRequest {
    pub unique_id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub agency_unique_id: Option<String>,
    pub provider_unique_id: Option<String>,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserDetailsRequest {
    pub unique_id: Option<String>,
    pub fullname: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserAgencyRequest {
    pub unique_id: Option<String>,
    pub agency_unique_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserProviderRequest {
    pub unique_id: Option<String>,
    pub provider_unique_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub unique_id: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UniqueIdRequest {
    pub unique_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyIdentityRequest {
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub identification_id: Option<String>,
    pub agency_unique_id: Option<String>,
    pub provider_unique_id: Option<String>,
}

/// Citizen self-submitted verification record.
#[derive(Debug, Deserialize)]
pub struct AddVerificationRequest {
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub firstname: Option<String>,
    pub middlename: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub nationality: Option<String>,
    pub state_of_origin: Option<String>,
    pub lga_of_origin: Option<String>,
    pub marital_status: Option<String>,
    pub educational_level: Option<String>,
    pub employment_status: Option<String>,
    pub nok_firstname: Option<String>,
    pub nok_middlename: Option<String>,
    pub nok_surname: Option<String>,
}

// ============================================================================
// Response payloads
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PaginatedRows<T> {
    pub rows: Vec<T>,
    pub count: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub role: String,
    pub fullname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}
