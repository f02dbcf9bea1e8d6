//! Integration tests for the identity lookup flow against a mock
//! Passcoder upstream.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::post,
};
use http_body_util::BodyExt;
use ninvs::api::AppState;
use ninvs::config::Config;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "Abcd-1234";

struct MockUpstream {
    hits: AtomicUsize,
    response: serde_json::Value,
}

async fn mock_handler(State(mock): State<Arc<MockUpstream>>) -> axum::Json<serde_json::Value> {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    axum::Json(mock.response.clone())
}

/// Serves the given envelope on every Passcoder data endpoint and
/// counts how often it is consulted.
async fn spawn_passcoder_mock(response: serde_json::Value) -> (String, Arc<MockUpstream>) {
    let mock = Arc::new(MockUpstream {
        hits: AtomicUsize::new(0),
        response,
    });

    let router = Router::new()
        .route("/extended/data/verification/nin", post(mock_handler))
        .route("/extended/data/verification/bvn", post(mock_handler))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    (format!("http://{addr}"), mock)
}

async fn spawn_app(passcoder_url: &str) -> (Router, Arc<AppState>) {
    let db_path =
        std::env::temp_dir().join(format!("ninvs-verify-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.passcoder.base_url = passcoder_url.to_string();

    let state = ninvs::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    state
        .store
        .set_app_default_value("Passcoder_Live_Key", Some("test-live-key"))
        .await
        .expect("Failed to seed Passcoder key");

    (ninvs::api::router(state.clone()), state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn post_json(
    app: &Router,
    uri: &str,
    token: &str,
    payload: &serde_json::Value,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .header("ninvs-access-token", token)
                .body(Body::from(serde_json::to_string(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn admin_token(app: &Router) -> String {
    let response = post_json_keyless(
        app,
        "/auth/admin/signin",
        &serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn post_json_keyless(
    app: &Router,
    uri: &str,
    payload: &serde_json::Value,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

fn nin_success_envelope() -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "message": "NIN details retrieved",
        "data": {
            "data": {
                "firstname": "Ada",
                "surname": "Obi",
                "email": "Ada.OBI@Example.COM",
                "telephoneno": "08030000000",
                "gender": "Female",
                "birthdate": "1990-04-12",
                "residence_AdressLine1": "12 Marina Road, Lagos",
                "birthcountry": "Nigeria",
                "heigth": "170",
                "maritalstatus": "",
                "nin": "12345678901"
            },
            "verification": { "reference": "ref-001", "status": "verified" },
            "endpoint_name": "NIN Lookup"
        }
    })
}

#[tokio::test]
async fn test_nin_lookup_creates_then_serves_from_cache() {
    let (upstream, mock) = spawn_passcoder_mock(nin_success_envelope()).await;
    let (app, state) = spawn_app(&upstream).await;
    let token = admin_token(&app).await;

    let agency = state
        .store
        .add_agency("Central Records Bureau")
        .await
        .expect("Failed to add agency");

    let payload = serde_json::json!({
        "type": "NIN",
        "identification_id": "12345678901",
        "agency_unique_id": agency.unique_id
    });

    let response = post_json(&app, "/verify/identity", &token, &payload).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Verification created successfully!");
    assert_eq!(body["data"]["firstname"], "Ada");
    assert_eq!(body["data"]["lastname"], "Obi");
    assert_eq!(body["data"]["email"], "ada.obi@example.com");
    assert_eq!(body["data"]["address"], "12 Marina Road, Lagos");
    assert_eq!(body["data"]["nationality"], "Nigeria");
    assert_eq!(body["data"]["height"], "170");
    assert_eq!(body["data"]["verification_reference"], "ref-001");
    assert_eq!(body["data"]["verification_endpoint"], "NIN Lookup");
    // Fields the upstream sent empty or not at all land as NULL.
    assert!(body["data"]["marital_status"].is_null());
    assert!(body["data"]["middlename"].is_null());
    assert_eq!(mock.hits.load(Ordering::SeqCst), 1);

    // Same document again is served from the stored record.
    let response = post_json(&app, "/verify/identity", &token, &payload).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Verification loaded!");
    assert_eq!(body["data"]["firstname"], "Ada");
    assert_eq!(mock.hits.load(Ordering::SeqCst), 1);

    // The agency is credited once per lookup, cached or not.
    let agency = state
        .store
        .get_agency(&agency.unique_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(agency.verifications, 2);
    assert!(agency.sync_timestamp.is_some());
}

#[tokio::test]
async fn test_bvn_lookup_maps_camel_case_fields() {
    let envelope = serde_json::json!({
        "success": true,
        "message": "BVN details retrieved",
        "data": {
            "data": {
                "firstName": "Chinedu",
                "middleName": "Kalu",
                "lastName": "Eze",
                "phoneNumber1": "08030000001",
                "phoneNumber2": "08120000000",
                "levelOfAccount": "Tier 3",
                "watchListed": "NO",
                "bvn": "22345678901"
            },
            "verification": { "reference": "ref-002", "status": "verified" },
            "endpoint_name": "BVN Lookup"
        }
    });
    let (upstream, mock) = spawn_passcoder_mock(envelope).await;
    let (app, _state) = spawn_app(&upstream).await;
    let token = admin_token(&app).await;

    let response = post_json(
        &app,
        "/verify/identity",
        &token,
        &serde_json::json!({ "type": "BVN", "identification_id": "22345678901" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Verification created successfully!");
    assert_eq!(body["data"]["firstname"], "Chinedu");
    assert_eq!(body["data"]["middlename"], "Kalu");
    assert_eq!(body["data"]["alt_phone_number"], "08120000000");
    assert_eq!(body["data"]["level_of_account"], "Tier 3");
    assert_eq!(body["data"]["watch_listed"], "NO");
    assert_eq!(body["data"]["bvn"], "22345678901");
    assert_eq!(mock.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsupported_type_is_rejected_before_upstream() {
    let (upstream, mock) = spawn_passcoder_mock(nin_success_envelope()).await;
    let (app, _state) = spawn_app(&upstream).await;
    let token = admin_token(&app).await;

    let response = post_json(
        &app,
        "/verify/identity",
        &token,
        &serde_json::json!({ "type": "DL", "identification_id": "12345678901" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Verification unavailable!");
    assert_eq!(mock.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_rejection_is_surfaced() {
    let envelope = serde_json::json!({
        "success": false,
        "message": "NIN not found"
    });
    let (upstream, _mock) = spawn_passcoder_mock(envelope).await;
    let (app, _state) = spawn_app(&upstream).await;
    let token = admin_token(&app).await;

    let response = post_json(
        &app,
        "/verify/identity",
        &token,
        &serde_json::json!({ "type": "NIN", "identification_id": "99999999999" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "NIN not found");
}

#[tokio::test]
async fn test_keyed_public_lookup_works_without_token() {
    let (upstream, mock) = spawn_passcoder_mock(nin_success_envelope()).await;
    let (app, state) = spawn_app(&upstream).await;

    let key = state.config.auth.api_keys[0].clone();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/public/verify/identity")
                .header("Content-Type", "application/json")
                .header("ninvs-access-key", key)
                .body(Body::from(
                    serde_json::json!({ "type": "NIN", "identification_id": "12345678901" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Verification created successfully!");
    assert_eq!(mock.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lookup_records_stay_after_agency_delete() {
    let (upstream, _mock) = spawn_passcoder_mock(nin_success_envelope()).await;
    let (app, state) = spawn_app(&upstream).await;
    let token = admin_token(&app).await;

    let agency = state
        .store
        .add_agency("Decommissioned Bureau")
        .await
        .expect("Failed to add agency");

    let response = post_json(
        &app,
        "/verify/identity",
        &token,
        &serde_json::json!({
            "type": "NIN",
            "identification_id": "12345678901",
            "agency_unique_id": agency.unique_id
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let deleted = state
        .store
        .delete_agency(&agency.unique_id)
        .await
        .expect("Failed to delete agency");
    assert_eq!(deleted, 1);

    // The stored verification outlives the agency that requested it.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/verifications")
                .header("ninvs-access-token", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Verifications loaded");
    assert_eq!(body["data"]["count"], 1);
}
