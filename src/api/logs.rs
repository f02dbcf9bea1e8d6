use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;

use super::auth::AuthUser;
use super::{
    ApiError, DateRangeQuery, DateRangeRequest, ListQuery, TypeQuery, UserFilterQuery, reply,
    validation,
};
use crate::api::AppState;
use crate::constants::limits::PAGINATE_LIMIT;
use crate::db::{LogFilter, Ordering, day_range};
use crate::entities::{logs, users};
use crate::pagination::paginate;

fn log_row(log: logs::Model, user: Option<users::Model>) -> Value {
    let user = user.map(|u| {
        json!({
            "fullname": u.fullname,
            "role": u.role,
            "email": u.email,
            "access": u.access,
            "login_timestamp": u.login_timestamp,
        })
    });

    let mut row = serde_json::to_value(log).unwrap_or_default();
    if let Value::Object(map) = &mut row {
        map.insert("user".to_string(), user.unwrap_or(Value::Null));
    }
    row
}

async fn load_logs(
    state: &AppState,
    auth: &AuthUser,
    filter: LogFilter<'_>,
    query: &ListQuery,
    not_found: &'static str,
    loaded: &'static str,
    action: impl FnOnce(u64, u64) -> String,
) -> Result<Response, ApiError> {
    let count = state.store.count_logs(filter).await?;
    let window = paginate(query.page, query.size, count);
    let ordering = Ordering::new(query.order_by.clone(), query.sort_by.clone());

    let rows = state
        .store
        .list_logs(filter, &ordering, window.start, window.limit)
        .await?;

    if rows.is_empty() {
        return Ok(reply(StatusCode::OK, not_found, json!([])));
    }

    state
        .audit
        .record(&auth.user_unique_id, "Logs", &action(window.pages, count));

    let rows: Vec<Value> = rows.into_iter().map(|(l, u)| log_row(l, u)).collect();

    Ok(reply(
        StatusCode::OK,
        loaded,
        json!({ "rows": rows, "count": count, "pages": window.pages }),
    ))
}

/// GET /logs
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let page = query.page.unwrap_or(1);
    let size = query.size.unwrap_or(PAGINATE_LIMIT);

    load_logs(
        &state,
        &auth,
        LogFilter::default(),
        &query,
        "Logs Not found",
        "Logs loaded",
        |pages, total| {
            format!("Viewed all logs | page = {page}, size = {size}, pages = {pages}, total = {total}")
        },
    )
    .await
}

/// GET /logs/via/type
pub async fn list_logs_via_type(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<TypeQuery>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    let log_type = validation::required(&mut errors, "type", "Type is required", query.r#type.as_deref());
    if let Some(log_type) = log_type {
        validation::length(&mut errors, "type", log_type, 2, 50);
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let page = query.list.page.unwrap_or(1);
    let size = query.list.size.unwrap_or(PAGINATE_LIMIT);

    load_logs(
        &state,
        &auth,
        LogFilter {
            r#type: log_type,
            ..LogFilter::default()
        },
        &query.list,
        "Logs Not found",
        "Logs loaded",
        |pages, total| {
            format!(
                "Viewed all logs specifically | page = {page}, size = {size}, pages = {pages}, total = {total}"
            )
        },
    )
    .await
}

/// GET /logs/via/user
pub async fn list_logs_via_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UserFilterQuery>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    let user_unique_id = validation::required(
        &mut errors,
        "user_unique_id",
        "User Unique ID is required",
        query.user_unique_id.as_deref(),
    );
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let page = query.list.page.unwrap_or(1);
    let size = query.list.size.unwrap_or(PAGINATE_LIMIT);

    load_logs(
        &state,
        &auth,
        LogFilter {
            user_unique_id,
            ..LogFilter::default()
        },
        &query.list,
        "Logs Not found",
        "Logs loaded",
        |pages, total| {
            format!(
                "Viewed all logs specifically | page = {page}, size = {size}, pages = {pages}, total = {total}"
            )
        },
    )
    .await
}

fn require_date_range<'a>(
    start_date: Option<&'a str>,
    end_date: Option<&'a str>,
) -> Result<(&'a str, &'a str), ApiError> {
    let mut errors = Vec::new();

    let start = validation::required(&mut errors, "start_date", "Start Date is required", start_date);
    if let Some(start) = start {
        validation::date_format(
            &mut errors,
            "start_date",
            "Invalid start datetime format (YYYY-MM-DD)",
            start,
        );
    }

    let end = validation::required(&mut errors, "end_date", "End Date is required", end_date);
    if let Some(end) = end {
        validation::date_format(
            &mut errors,
            "end_date",
            "Invalid end datetime format (YYYY-MM-DD)",
            end,
        );
    }

    match (start, end) {
        (Some(start), Some(end)) if errors.is_empty() => Ok((start, end)),
        _ => Err(ApiError::validation(errors)),
    }
}

/// GET /logs/filter
pub async fn filter_logs(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, ApiError> {
    let (start_date, end_date) =
        require_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
    let (from, to) = day_range(start_date, end_date);

    let page = query.list.page.unwrap_or(1);
    let size = query.list.size.unwrap_or(PAGINATE_LIMIT);

    load_logs(
        &state,
        &auth,
        LogFilter {
            created_range: Some((&from, &to)),
            ..LogFilter::default()
        },
        &query.list,
        "Filtered Logs Not found",
        "Filtered Logs loaded",
        |pages, total| {
            format!(
                "Filtered all logs | start = {start_date}, end = {end_date} | page = {page}, size = {size}, pages = {pages}, total = {total}"
            )
        },
    )
    .await
}

/// DELETE /clear/filtered/logs
pub async fn clear_filtered_logs(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DateRangeRequest>,
) -> Result<Response, ApiError> {
    let (start_date, end_date) =
        require_date_range(payload.start_date.as_deref(), payload.end_date.as_deref())?;
    let (from, to) = day_range(start_date, end_date);

    let deleted = state.store.purge_logs_created_between(&from, &to).await?;
    if deleted == 0 {
        return Err(ApiError::bad_request("Error clearing logs"));
    }

    Ok(super::reply_message(
        StatusCode::OK,
        "Logs cleared successfully!",
    ))
}

/// DELETE /clear/expired/logs
pub async fn clear_expired_logs(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DateRangeRequest>,
) -> Result<Response, ApiError> {
    let (start_date, end_date) =
        require_date_range(payload.start_date.as_deref(), payload.end_date.as_deref())?;
    let (from, to) = day_range(start_date, end_date);

    let deleted = state.store.purge_logs_expiring_between(&from, &to).await?;
    if deleted == 0 {
        return Err(ApiError::bad_request("Error clearing expired logs"));
    }

    Ok(super::reply_message(
        StatusCode::OK,
        "Expired logs cleared successfully!",
    ))
}
