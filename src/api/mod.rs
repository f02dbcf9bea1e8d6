use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware,
    response::Response,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::PasscoderClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuditService, VerificationService};

mod agencies;
mod analytics;
pub mod auth;
mod error;
mod logs;
mod observability;
mod providers;
mod types;
mod users;
mod validation;
mod verifications;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub audit: AuditService,

    pub verifier: VerificationService,

    pub prometheus_handle: Option<PrometheusHandle>,
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let audit = AuditService::new(store.clone());
    let client = PasscoderClient::new(
        &config.passcoder.base_url,
        config.passcoder.timeout_seconds,
    )?;
    let verifier = VerificationService::new(store.clone(), client);

    Ok(Arc::new(AppState {
        config,
        store,
        audit,
        verifier,
        prometheus_handle,
    }))
}

async fn root() -> Response {
    reply_message(StatusCode::OK, "NINVS API activated!")
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let auth_routes = Router::new()
        .route("/auth/citizen/signup", post(auth::citizen_signup))
        .route("/auth/citizen/signin", post(auth::citizen_signin))
        .route("/auth/admin/signin", post(auth::admin_signin))
        .route("/auth/agency/signin", post(auth::agency_signin))
        .route("/auth/provider/signin", post(auth::provider_signin));

    let user_routes = Router::new()
        .route("/agencies", get(agencies::list_agencies))
        .route("/search/agencies", get(agencies::search_agencies))
        .route("/agency", get(agencies::get_agency))
        .route("/add/agency", post(agencies::add_agency))
        .route("/update/agency/details", put(agencies::update_agency_details))
        .route("/agency", delete(agencies::delete_agency))
        .route("/providers", get(providers::list_providers))
        .route("/search/providers", get(providers::search_providers))
        .route("/provider", get(providers::get_provider))
        .route("/add/provider", post(providers::add_provider))
        .route(
            "/update/provider/details",
            put(providers::update_provider_details),
        )
        .route("/provider", delete(providers::delete_provider))
        .route("/users", get(users::list_users))
        .route("/search/users", get(users::search_users))
        .route("/user", get(users::get_user))
        .route("/profile", get(users::get_profile))
        .route("/add/user", post(users::add_user))
        .route("/update/details", put(users::update_user_details))
        .route("/update/agency", put(users::update_user_agency))
        .route("/update/provider", put(users::update_user_provider))
        .route("/update/password", put(users::update_user_password))
        .route("/user/access/grant", put(users::grant_user_access))
        .route("/user/access/suspend", put(users::suspend_user_access))
        .route("/user/access/revoke", put(users::revoke_user_access))
        .route("/user", delete(users::delete_user))
        .route("/logs", get(logs::list_logs))
        .route("/logs/via/type", get(logs::list_logs_via_type))
        .route("/logs/via/user", get(logs::list_logs_via_user))
        .route("/logs/filter", get(logs::filter_logs))
        .route("/clear/filtered/logs", delete(logs::clear_filtered_logs))
        .route("/clear/expired/logs", delete(logs::clear_expired_logs))
        .route("/verifications", get(verifications::list_verifications))
        .route(
            "/verifications/via/agency",
            get(verifications::list_verifications_via_agency),
        )
        .route(
            "/verifications/via/provider",
            get(verifications::list_verifications_via_provider),
        )
        .route(
            "/verifications/via/type",
            get(verifications::list_verifications_via_type),
        )
        .route(
            "/search/verifications",
            get(verifications::search_verifications),
        )
        .route("/verification", get(verifications::get_verification))
        .route("/verify/identity", post(verifications::verify_identity))
        .route("/verification", delete(verifications::delete_verification))
        .route("/analytics", get(analytics::get_analytics))
        .route("/filter/analytics", get(analytics::filter_analytics))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::verify_user,
        ));

    let agency_routes = Router::new()
        .route(
            "/agency/verifications",
            get(verifications::agency_list_verifications),
        )
        .route(
            "/agency/verifications/via/type",
            get(verifications::agency_list_verifications_via_type),
        )
        .route(
            "/agency/search/verifications",
            get(verifications::agency_search_verifications),
        )
        .route(
            "/agency/verification",
            get(verifications::agency_get_verification),
        )
        .route("/agency/analytics", get(analytics::agency_analytics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::verify_agency_user,
        ));

    let provider_routes = Router::new()
        .route(
            "/provider/verifications",
            get(verifications::provider_list_verifications),
        )
        .route(
            "/provider/verifications/via/type",
            get(verifications::provider_list_verifications_via_type),
        )
        .route(
            "/provider/search/verifications",
            get(verifications::provider_search_verifications),
        )
        .route(
            "/provider/verification",
            get(verifications::provider_get_verification),
        )
        .route("/provider/analytics", get(analytics::provider_analytics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::verify_provider_user,
        ));

    let citizen_routes = Router::new()
        .route("/add/verification", post(verifications::add_verification))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::verify_citizen,
        ));

    let keyed_routes = Router::new()
        .route(
            "/public/verify/identity",
            post(verifications::public_verify_identity),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::verify_key,
        ));

    let public_routes = Router::new()
        .route("/", get(root))
        .route("/public/agencies", get(agencies::public_list_agencies))
        .route(
            "/public/search/agencies",
            get(agencies::public_search_agencies),
        )
        .route("/public/agency", get(agencies::public_get_agency))
        .route("/public/providers", get(providers::public_list_providers))
        .route(
            "/public/search/providers",
            get(providers::public_search_providers),
        )
        .route("/public/provider", get(providers::public_get_provider));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .merge(agency_routes)
        .merge(provider_routes)
        .merge(citizen_routes)
        .merge(keyed_routes)
        .merge(public_routes)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}
