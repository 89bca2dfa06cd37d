use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;

async fn app_with_user() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    server::app(engine, db)
}

fn basic_auth(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", basic_auth("alice", "password"))
        .header("content-type", "application/json");
    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Opens an account and returns its id.
async fn open_account(app: &Router) -> String {
    let res = app
        .clone()
        .oneshot(request("POST", "/accounts", Some(json!({"kind": "checking"}))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    json_body(res).await["id"].as_str().unwrap().to_string()
}

/// Creates and processes a deposit so the account has funds.
async fn deposit(app: &Router, account_id: &str, cents: i64) {
    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/transactions",
            Some(json!({
                "account_id": account_id,
                "kind": "deposit",
                "amount_cents": cents,
                "description": "Initial deposit",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let app = app_with_user().await;

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/accounts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/accounts")
                .header("authorization", basic_auth("alice", "wrong"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_lifecycle() {
    let app = app_with_user().await;
    let account_id = open_account(&app).await;

    let res = app
        .clone()
        .oneshot(request("GET", "/accounts", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let accounts = body["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["is_primary"], true);
    assert!(accounts[0]["account_number"]
        .as_str()
        .unwrap()
        .starts_with("ACC"));

    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/accounts/{account_id}/balance"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["balance_cents"], 0);
    assert_eq!(body["available_balance_cents"], 0);
}

#[tokio::test]
async fn transfer_flow_with_fee() {
    let app = app_with_user().await;
    let account_id = open_account(&app).await;
    deposit(&app, &account_id, 10_000).await;

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/transactions",
            Some(json!({
                "account_id": account_id,
                "kind": "transfer",
                "amount_cents": 5_000,
                "description": "Rent",
                "recipient_account_number": "ACC87654321",
                "recipient_name": "Bob",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["fee_cents"], 100);
    assert!(body["reference"].as_str().unwrap().starts_with("TXN"));

    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/accounts/{account_id}/balance"),
            None,
        ))
        .await
        .unwrap();
    let balance = json_body(res).await;
    assert_eq!(balance["balance_cents"], 4_900);
}

#[tokio::test]
async fn insufficient_funds_returns_failed_transaction() {
    let app = app_with_user().await;
    let account_id = open_account(&app).await;
    deposit(&app, &account_id, 1_000).await;

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/transactions",
            Some(json!({
                "account_id": account_id,
                "kind": "withdrawal",
                "amount_cents": 5_000,
                "description": "ATM",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["failure_reason"], "Insufficient funds");
}

#[tokio::test]
async fn invalid_amounts_and_recipients_are_rejected() {
    let app = app_with_user().await;
    let account_id = open_account(&app).await;

    for payload in [
        json!({
            "account_id": account_id,
            "kind": "deposit",
            "amount_cents": 0,
            "description": "Nothing",
        }),
        json!({
            "account_id": account_id,
            "kind": "deposit",
            "amount_cents": 10_000_001,
            "description": "Too big",
        }),
        json!({
            "account_id": account_id,
            "kind": "transfer",
            "amount_cents": 1_000,
            "description": "Bad recipient",
            "recipient_account_number": "12345678",
        }),
    ] {
        let res = app
            .clone()
            .oneshot(request("POST", "/transactions", Some(payload)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn missing_transaction_is_404() {
    let app = app_with_user().await;

    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/transactions/{}", uuid::Uuid::new_v4()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completed_transaction_cannot_be_cancelled() {
    let app = app_with_user().await;
    let account_id = open_account(&app).await;
    deposit(&app, &account_id, 10_000).await;

    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/transactions?account_id={account_id}&status=completed&limit=10"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let tx_id = body["transactions"][0]["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/transactions/{tx_id}/cancel"),
            Some(json!({"reason": "changed my mind"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["cancelled"], false);
    assert_eq!(body["transaction"]["status"], "completed");
}

#[tokio::test]
async fn logs_cover_every_transition() {
    let app = app_with_user().await;
    let account_id = open_account(&app).await;
    deposit(&app, &account_id, 10_000).await;

    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/transactions?account_id={account_id}&limit=10"),
            None,
        ))
        .await
        .unwrap();
    let body = json_body(res).await;
    let tx_id = body["transactions"][0]["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(request("GET", &format!("/transactions/{tx_id}/logs"), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|log| log["processed_by"] == "system"));
}

#[tokio::test]
async fn recurring_lifecycle_and_manual_run() {
    let app = app_with_user().await;
    let account_id = open_account(&app).await;
    deposit(&app, &account_id, 100_000).await;

    let today = chrono::Utc::now().date_naive();
    let res = app
        .clone()
        .oneshot(request(
            "POST",
            "/recurring",
            Some(json!({
                "account_id": account_id,
                "amount_cents": 5_000,
                "description": "Gym",
                "frequency": "monthly",
                "start_date": today,
                "recipient_account_number": "ACC87654321",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = json_body(res).await;
    let recurring_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["status"], "active");
    assert_eq!(body["execution_count"], 0);

    let res = app
        .clone()
        .oneshot(request("POST", "/jobs/recurring/run", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report = json_body(res).await;
    assert_eq!(report["processed"], 1);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["total"], 1);

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/recurring/{recurring_id}/pause"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let res = app
        .clone()
        .oneshot(request("GET", "/recurring", None))
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["recurring"][0]["status"], "paused");
    assert_eq!(body["recurring"][0]["execution_count"], 1);

    let res = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/recurring/{recurring_id}/cancel"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    // Resuming a cancelled definition is rejected.
    let res = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/recurring/{recurring_id}/resume"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
