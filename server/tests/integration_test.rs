//! Integration tests for the RT/RW server
//!
//! These tests run the HTTP server on a local port and drive it with a
//! real client:
//! - Session authentication
//! - Dues payments and the duplicate-month guard
//! - Dues status reconciliation, including blank filter fields

use reqwest::{Client, Method, StatusCode};
use rtrw::api;
use rtrw::app::AppState;
use rtrw::config::ServerConfig;
use rtrw::database::create_pool;
use serde_json::{json, Value};
use tempfile::TempDir;

struct TestApp {
    base_url: String,
    client: Client,
    _temp: TempDir,
}

/// Helper to start a server over a fresh database with one administrator
async fn spawn_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let config = ServerConfig {
        data_dir: temp_dir.path().to_path_buf(),
        ..ServerConfig::default()
    };

    let pool = create_pool(&config.database_path()).await.unwrap();
    let state = AppState::new(pool, &config);
    state.auth.create_user("admin", "rahasia123").await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, api::router(state)).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: Client::new(),
        _temp: temp_dir,
    }
}

async fn send(app: &TestApp, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = app.client.request(method, format!("{}{}", app.base_url, path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await.unwrap();
    let status = response.status();
    let bytes = response.bytes().await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn login(app: &TestApp) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "rahasia123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = spawn_app().await;

    let (status, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    // Protected routes need a session
    let (status, body) = send(&app, Method::GET, "/addresses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::GET, "/addresses", Some("forged-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let (status, body) = send(&app, Method::GET, "/addresses", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/addresses", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dues_payment_and_status() {
    let app = spawn_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (status, address) = send(
        &app,
        Method::POST,
        "/addresses",
        token,
        Some(json!({ "fullAddress": "Jl. Melati No. 3" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let address_id = address["id"].as_str().unwrap().to_string();

    let (status, income) = send(
        &app,
        Method::POST,
        "/finance/income",
        token,
        Some(json!({
            "transactionDate": "2025-03-10",
            "transactionAmount": 100000,
            "remarks": "Iuran Januari dan Maret",
            "addressId": address_id,
            "months": ["01-2025", "03-2025"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(income["id"].is_string());
    assert_eq!(income["months"], json!(["2025-01", "2025-03"]));

    // March again, alongside an unpaid month
    let (status, body) = send(
        &app,
        Method::POST,
        "/finance/income",
        token,
        Some(json!({
            "transactionDate": "2025-04-02",
            "transactionAmount": 100000,
            "addressId": address_id,
            "months": ["04-2025", "03-2025"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("2025-03"));

    let (_, incomes) = send(&app, Method::GET, "/finance/income", token, None).await;
    assert_eq!(incomes.as_array().unwrap().len(), 1);

    // Every month of 2025 has passed, so unpaid months are late
    let uri = format!("/finance/iuran/status?year=2025&addressId={}", address_id);
    let (status, entries) = send(&app, Method::GET, &uri, token, None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 12);
    let paid: Vec<&str> = entries
        .iter()
        .filter(|e| e["status"] == "paid")
        .map(|e| e["month"].as_str().unwrap())
        .collect();
    assert_eq!(paid, vec!["2025-01", "2025-03"]);
    assert!(entries
        .iter()
        .filter(|e| e["status"] != "paid")
        .all(|e| e["status"] == "late"));

    let uri = format!("/finance/iuran/status?year=2025&month=4&addressId={}&status=late", address_id);
    let (_, entries) = send(&app, Method::GET, &uri, token, None).await;
    assert_eq!(entries.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/finance/iuran/status", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::GET,
        "/finance/iuran/status?year=2025&addressId=missing",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_query_with_blank_filters() {
    let app = spawn_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (_, address) = send(
        &app,
        Method::POST,
        "/addresses",
        token,
        Some(json!({ "fullAddress": "Jl. Anggrek 12" })),
    )
    .await;
    assert!(address["id"].is_string());

    // The dues form submits every field, filled or not
    let (status, entries) = send(
        &app,
        Method::GET,
        "/finance/iuran/status?month=03&year=2025&addressId=&status=",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["month"], "2025-03");

    let (status, entries) = send(
        &app,
        Method::GET,
        "/finance/iuran/status?month=&year=2025&addressId=&status=",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().unwrap().len(), 12);

    let (status, _) = send(
        &app,
        Method::GET,
        "/finance/iuran/status?month=&year=&addressId=&status=",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_income_frees_months() {
    let app = spawn_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (_, address) = send(
        &app,
        Method::POST,
        "/addresses",
        token,
        Some(json!({ "fullAddress": "Jl. Mawar 1" })),
    )
    .await;
    let address_id = address["id"].as_str().unwrap();

    let payment = json!({
        "transactionDate": "2025-02-01",
        "transactionAmount": 50000,
        "addressId": address_id,
        "months": ["02-2025"],
    });

    let (_, income) = send(&app, Method::POST, "/finance/income", token, Some(payment.clone())).await;
    let uri = format!("/finance/income/{}", income["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::DELETE, &uri, token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::POST, "/finance/income", token, Some(payment)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, report) = send(&app, Method::GET, "/finance/report?from=2025-01-01&to=2025-12-31", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["totalIncome"], 50000);
}
