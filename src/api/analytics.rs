use axum::{
    Extension,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, DateRangeQuery, reply, validation};
use crate::api::AppState;
use crate::db::{VerificationScope, day_range};

fn grouped(rows: Vec<(String, i64)>, key: &str) -> Vec<Value> {
    rows.into_iter()
        .map(|(name, total_count)| json!({ key: name, "total_count": total_count }))
        .collect()
}

/// GET /analytics
pub async fn get_analytics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let total_users = state.store.count_users().await?;
    let total_agencies = state.store.count_agencies().await?;
    let total_providers = state.store.count_providers().await?;
    let total_logs = state.store.count_logs(Default::default()).await?;
    let total_verifications = state
        .store
        .count_verifications(VerificationScope::default())
        .await?;

    let agency_verification_sum = state.store.sum_agency_verifications(None).await?;
    let provider_usage_sum = state.store.sum_provider_usage(None).await?;

    let total_verifications_via_type = state
        .store
        .count_verifications_by_type(VerificationScope::default(), None)
        .await?;
    let total_verifications_via_agency = state
        .store
        .count_verifications_by_agency(None, None)
        .await?;
    let total_verifications_via_provider = state
        .store
        .count_verifications_by_provider(None, None)
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Analytics Loaded",
        json!({
            "total_users": total_users,
            "total_agencies": total_agencies,
            "total_providers": total_providers,
            "total_logs": total_logs,
            "total_verifications": total_verifications,
            "agency_verification_sum": agency_verification_sum,
            "provider_usage_sum": provider_usage_sum,
            "total_verifications_via_type": grouped(total_verifications_via_type, "type"),
            "total_verifications_via_agency": grouped(total_verifications_via_agency, "name"),
            "total_verifications_via_provider": grouped(total_verifications_via_provider, "name"),
        }),
    ))
}

/// GET /filter/analytics
pub async fn filter_analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();

    let start = validation::required(
        &mut errors,
        "start_date",
        "Start Date is required",
        query.start_date.as_deref(),
    );
    if let Some(start) = start {
        validation::date_format(
            &mut errors,
            "start_date",
            "Invalid start datetime format (YYYY-MM-DD)",
            start,
        );
    }
    let end = validation::required(
        &mut errors,
        "end_date",
        "End Date is required",
        query.end_date.as_deref(),
    );
    if let Some(end) = end {
        validation::date_format(
            &mut errors,
            "end_date",
            "Invalid end datetime format (YYYY-MM-DD)",
            end,
        );
    }

    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if errors.is_empty() => (s, e),
        _ => return Err(ApiError::validation(errors)),
    };

    let (from, to) = day_range(start, end);
    let range = Some((from.as_str(), to.as_str()));

    let total_users = state.store.count_users_created_between(&from, &to).await?;
    let total_agencies = state.store.count_agencies_created_between(&from, &to).await?;
    let total_providers = state
        .store
        .count_providers_created_between(&from, &to)
        .await?;
    let total_logs = state.store.count_logs_created_between(&from, &to).await?;
    let total_verifications = state
        .store
        .count_verifications_created_between(&from, &to)
        .await?;

    let agency_verification_sum = state.store.sum_agency_verifications(range).await?;
    let provider_usage_sum = state.store.sum_provider_usage(range).await?;

    let total_verifications_via_type = state
        .store
        .count_verifications_by_type(VerificationScope::default(), range)
        .await?;
    let total_verifications_via_agency = state
        .store
        .count_verifications_by_agency(None, range)
        .await?;
    let total_verifications_via_provider = state
        .store
        .count_verifications_by_provider(None, range)
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Filtered Analytics Loaded",
        json!({
            "total_users": total_users,
            "total_agencies": total_agencies,
            "total_providers": total_providers,
            "total_logs": total_logs,
            "total_verifications": total_verifications,
            "agency_verification_sum": agency_verification_sum,
            "provider_usage_sum": provider_usage_sum,
            "total_verifications_via_type": grouped(total_verifications_via_type, "type"),
            "total_verifications_via_agency": grouped(total_verifications_via_agency, "name"),
            "total_verifications_via_provider": grouped(total_verifications_via_provider, "name"),
        }),
    ))
}

/// GET /agency/analytics
pub async fn agency_analytics(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let agency_unique_id = auth
        .agency_unique_id
        .as_deref()
        .ok_or_else(|| ApiError::forbidden("Require User!"))?;

    let scope = VerificationScope {
        agency_unique_id: Some(agency_unique_id),
        ..VerificationScope::default()
    };

    let total_verifications = state.store.count_verifications(scope).await?;
    let agency_verification_sum = state
        .store
        .sum_agency_verifications_for(agency_unique_id)
        .await?;
    let total_verifications_via_type = state
        .store
        .count_verifications_by_type(scope, None)
        .await?;
    let total_verifications_via_agency = state
        .store
        .count_verifications_by_agency(Some(agency_unique_id), None)
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Agency Analytics Loaded",
        json!({
            "total_verifications": total_verifications,
            "agency_verification_sum": agency_verification_sum,
            "total_verifications_via_type": grouped(total_verifications_via_type, "type"),
            "total_verifications_via_agency": grouped(total_verifications_via_agency, "name"),
        }),
    ))
}

/// GET /provider/analytics
pub async fn provider_analytics(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let provider_unique_id = auth
        .provider_unique_id
        .as_deref()
        .ok_or_else(|| ApiError::forbidden("Require User!"))?;

    let scope = VerificationScope {
        provider_unique_id: Some(provider_unique_id),
        ..VerificationScope::default()
    };

    let total_verifications = state.store.count_verifications(scope).await?;
    let provider_usage_sum = state
        .store
        .sum_provider_usage_for(provider_unique_id)
        .await?;
    let total_verifications_via_type = state
        .store
        .count_verifications_by_type(scope, None)
        .await?;
    let total_verifications_via_provider = state
        .store
        .count_verifications_by_provider(Some(provider_unique_id), None)
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Provider Analytics Loaded",
        json!({
            "total_verifications": total_verifications,
            "provider_usage_sum": provider_usage_sum,
            "total_verifications_via_type": grouped(total_verifications_via_type, "type"),
            "total_verifications_via_provider": grouped(total_verifications_via_provider, "name"),
        }),
    ))
}
