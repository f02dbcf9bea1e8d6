use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use ninvs::config::Config;
use tower::ServiceExt;

/// Default API key seeded into the configuration defaults.
const DEFAULT_API_KEY: &str = "ninvs_default_api_key_please_regenerate";

/// Admin credentials seeded by migration (must match m20240101_initial.rs)
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "Abcd-1234";

async fn spawn_app() -> Router {
    let db_path = std::env::temp_dir().join(format!("ninvs-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());

    let state = ninvs::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    ninvs::api::router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("ninvs-access-token", token);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    payload: &serde_json::Value,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("ninvs-access-token", token);
    }
    app.clone()
        .oneshot(
            builder
                .body(Body::from(serde_json::to_string(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn admin_token(app: &Router) -> String {
    let response = send_json(
        app,
        "POST",
        "/auth/admin/signin",
        None,
        &serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Logged in successfully!");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_root_is_public() {
    let app = spawn_app().await;

    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "NINVS API activated!");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_token_gate() {
    let app = spawn_app().await;

    let response = get(&app, "/agencies", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "No token provided!");

    let response = get(&app, "/agencies", Some("not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Unauthorized!");
}

#[tokio::test]
async fn test_token_accepted_from_query_param() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = get(&app, &format!("/profile?token={token}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "User loaded");
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn test_admin_signin_failures() {
    let app = spawn_app().await;

    let response = send_json(
        &app,
        "POST",
        "/auth/admin/signin",
        None,
        &serde_json::json!({ "email": "nobody@example.com", "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User not found");

    let response = send_json(
        &app,
        "POST",
        "/auth/admin/signin",
        None,
        &serde_json::json!({ "email": ADMIN_EMAIL, "password": "Wrong-1234" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid Password!");
}

#[tokio::test]
async fn test_agency_crud() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = send_json(
        &app,
        "POST",
        "/add/agency",
        Some(&token),
        &serde_json::json!({ "name": "Federal Road Safety Corps" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Agency created successfully!");

    // Same name again is a validation failure, not a second row.
    let response = send_json(
        &app,
        "POST",
        "/add/agency",
        Some(&token),
        &serde_json::json!({ "name": "Federal Road Safety Corps" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Validation Error Occured");
    assert_eq!(body["data"][0]["msg"], "Agency already exists!");

    let response = get(&app, "/agencies", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Agencies loaded");
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["pages"], 1);
    let unique_id = body["data"]["rows"][0]["unique_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get(&app, &format!("/agency?unique_id={unique_id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Agency loaded");
    assert_eq!(body["data"]["name"], "Federal Road Safety Corps");

    let response = send_json(
        &app,
        "PUT",
        "/update/agency/details",
        Some(&token),
        &serde_json::json!({ "unique_id": unique_id, "name": "FRSC National HQ" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Details updated successfully!");

    let response = send_json(
        &app,
        "DELETE",
        "/agency",
        Some(&token),
        &serde_json::json!({ "unique_id": unique_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Agency was deleted successfully!");

    // Soft-deleted row is invisible to active reads.
    let response = get(&app, &format!("/agency?unique_id={unique_id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Agency not found");

    let response = get(&app, "/agencies", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Agencies Not found");
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_agency_name_length_validated() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = send_json(
        &app,
        "POST",
        "/add/agency",
        Some(&token),
        &serde_json::json!({ "name": "A" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["param"], "name");
    assert_eq!(body["data"][0]["msg"], "Invalid length (2 - 100) characters");
}

#[tokio::test]
async fn test_public_agency_list_has_no_pages() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = send_json(
        &app,
        "POST",
        "/add/agency",
        Some(&token),
        &serde_json::json!({ "name": "Immigration Service" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/public/agencies", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Agencies loaded");
    assert_eq!(body["data"]["count"], 1);
    assert!(body["data"]["rows"].is_array());
    assert!(body["data"].get("pages").is_none());
}

#[tokio::test]
async fn test_citizen_signup_and_role_gate() {
    let app = spawn_app().await;

    let response = send_json(
        &app,
        "POST",
        "/auth/citizen/signup",
        None,
        &serde_json::json!({
            "fullname": "Ada Obi",
            "email": "ada.obi@example.com",
            "password": "Abcd-1234",
            "confirmPassword": "Abcd-1234"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Signed up successfully!");
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // A citizen token opens the general routes but not the agency ones.
    let response = get(&app, "/profile", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/agency/verifications", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Require User!");

    // Second signup with the same email is refused.
    let response = send_json(
        &app,
        "POST",
        "/auth/citizen/signup",
        None,
        &serde_json::json!({
            "fullname": "Ada Obi",
            "email": "ada.obi@example.com",
            "password": "Abcd-1234",
            "confirmPassword": "Abcd-1234"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["msg"], "Email already exists!");
}

#[tokio::test]
async fn test_signup_validation_accumulates_errors() {
    let app = spawn_app().await;

    let response = send_json(
        &app,
        "POST",
        "/auth/citizen/signup",
        None,
        &serde_json::json!({
            "email": "not-an-email",
            "password": "weak",
            "confirmPassword": "different"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Validation Error Occured");

    let params: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["param"].as_str().unwrap())
        .collect();
    assert!(params.contains(&"fullname"));
    assert!(params.contains(&"email"));
    assert!(params.contains(&"password"));
    assert!(params.contains(&"confirmPassword"));
}

#[tokio::test]
async fn test_user_access_lifecycle() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = send_json(
        &app,
        "POST",
        "/add/user",
        Some(&token),
        &serde_json::json!({
            "type": "ADMIN",
            "fullname": "Chinedu Eze",
            "email": "chinedu.eze@example.com",
            "role": "Operator",
            "password": "Abcd-1234",
            "confirmPassword": "Abcd-1234"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User created successfully!");

    let response = get(&app, "/search/users?search=Chinedu", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let unique_id = body["data"]["rows"][0]["unique_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Sign the new user in before suspension so their token exists.
    let response = send_json(
        &app,
        "POST",
        "/auth/admin/signin",
        None,
        &serde_json::json!({ "email": "chinedu.eze@example.com", "password": "Abcd-1234" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let suspended_token = body["data"]["token"].as_str().unwrap().to_string();

    let response = send_json(
        &app,
        "PUT",
        "/user/access/suspend",
        Some(&token),
        &serde_json::json!({ "unique_id": unique_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User's access suspended successfully!");

    // The token issued before the suspension stops working everywhere.
    let response = get(&app, "/profile", Some(&suspended_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Access is suspended");

    // Suspending twice changes nothing and says so.
    let response = send_json(
        &app,
        "PUT",
        "/user/access/suspend",
        Some(&token),
        &serde_json::json!({ "unique_id": unique_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User access already suspended");

    let response = send_json(
        &app,
        "POST",
        "/auth/admin/signin",
        None,
        &serde_json::json!({ "email": "chinedu.eze@example.com", "password": "Abcd-1234" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Account has been suspended");

    let response = send_json(
        &app,
        "PUT",
        "/user/access/revoke",
        Some(&token),
        &serde_json::json!({ "unique_id": unique_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        &app,
        "POST",
        "/auth/admin/signin",
        None,
        &serde_json::json!({ "email": "chinedu.eze@example.com", "password": "Abcd-1234" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Account access has been revoked");

    let response = send_json(
        &app,
        "PUT",
        "/user/access/grant",
        Some(&token),
        &serde_json::json!({ "unique_id": unique_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User's access granted successfully!");

    let response = send_json(
        &app,
        "POST",
        "/auth/admin/signin",
        None,
        &serde_json::json!({ "email": "chinedu.eze@example.com", "password": "Abcd-1234" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_user_token_is_refused_with_own_message() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = send_json(
        &app,
        "POST",
        "/add/user",
        Some(&token),
        &serde_json::json!({
            "type": "ADMIN",
            "fullname": "Ngozi Bello",
            "email": "ngozi.bello@example.com",
            "role": "Operator",
            "password": "Abcd-1234",
            "confirmPassword": "Abcd-1234"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        &app,
        "POST",
        "/auth/admin/signin",
        None,
        &serde_json::json!({ "email": "ngozi.bello@example.com", "password": "Abcd-1234" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let doomed_token = body["data"]["token"].as_str().unwrap().to_string();

    let response = get(&app, "/search/users?search=Ngozi", Some(&token)).await;
    let body = body_json(response).await;
    let unique_id = body["data"]["rows"][0]["unique_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send_json(
        &app,
        "DELETE",
        "/user",
        Some(&token),
        &serde_json::json!({ "unique_id": unique_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User was deleted successfully!");

    // The deleted account's still-valid token names the real reason.
    let response = get(&app, "/profile", Some(&doomed_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User not available!");
}

#[tokio::test]
async fn test_self_delete_rejected() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = get(&app, "/profile", Some(&token)).await;
    let body = body_json(response).await;
    let own_id = body["data"]["unique_id"].as_str().unwrap().to_string();

    let response = send_json(
        &app,
        "DELETE",
        "/user",
        Some(&token),
        &serde_json::json!({ "unique_id": own_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Unable to perform action");
}

#[tokio::test]
async fn test_key_gate_on_public_verify() {
    let app = spawn_app().await;

    let payload = serde_json::json!({ "type": "NIN", "identification_id": "12345678901" });

    let response = send_json(&app, "POST", "/public/verify/identity", None, &payload).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "No key provided!");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/public/verify/identity")
                .header("Content-Type", "application/json")
                .header("ninvs-access-key", "wrong-key")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid API Key!");

    // Key accepted, but no Passcoder credential is configured yet.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/public/verify/identity")
                .header("Content-Type", "application/json")
                .header("ninvs-access-key", DEFAULT_API_KEY)
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "App Default for Verification not found!");
}

#[tokio::test]
async fn test_logs_capture_admin_actions() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = send_json(
        &app,
        "POST",
        "/add/agency",
        Some(&token),
        &serde_json::json!({ "name": "Corporate Affairs Commission" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Audit writes are fire-and-forget, give the task a moment.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let response = get(&app, "/logs", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Logs loaded");

    let actions: Vec<String> = body["data"]["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["action"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(
        actions
            .iter()
            .any(|a| a == "Added new agency | Agency: Corporate Affairs Commission"),
        "expected agency audit entry, got {actions:?}"
    );
    assert!(
        actions.iter().any(|a| a == "Admin signed in successfully"),
        "expected signin audit entry, got {actions:?}"
    );
}

#[tokio::test]
async fn test_analytics_counts() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = send_json(
        &app,
        "POST",
        "/add/agency",
        Some(&token),
        &serde_json::json!({ "name": "National Population Commission" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/analytics", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Analytics Loaded");
    assert_eq!(body["data"]["total_agencies"], 1);
    assert_eq!(body["data"]["total_users"], 1);
    assert_eq!(body["data"]["total_verifications"], 0);
    assert_eq!(body["data"]["agency_verification_sum"], 0);
    assert!(body["data"]["total_verifications_via_type"].is_array());
}
