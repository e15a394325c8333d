//! HTTP client and REST adapter against an in-process axum backend.

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use expense_splitter::adapters::http::{
    ApiResponse, DEFAULT_TIMEOUT, HttpClient, RequestOptions, RestExpenseApi,
};
use expense_splitter::domain::{ApiError, ErrorCode, ExpenseForm, ReceiptFile};
use expense_splitter::ports::ExpenseApi;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// What the backend saw on the last write.
#[derive(Clone, Default)]
struct Seen {
    last: Arc<Mutex<Option<(String, String)>>>,
}

impl Seen {
    fn record(&self, content_type: String, body: String) {
        *self.last.lock().unwrap() = Some((content_type, body));
    }

    fn take(&self) -> (String, String) {
        self.last.lock().unwrap().take().expect("no request recorded")
    }
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn fail_json() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, Json(json!({"message": "bad"})))
}

async fn fail_empty_message() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, Json(json!({"message": "", "code": "E1"})))
}

async fn fail_text() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "plain failure")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late"
}

async fn text() -> &'static str {
    "hello"
}

async fn login() -> impl IntoResponse {
    ([(header::SET_COOKIE, "session=abc123; Path=/")], "ok")
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({ "cookie": cookie }))
}

async fn list_groups() -> Json<Value> {
    Json(json!([
        {"id": 1, "name": "Lisbon trip", "created_at": "2024-04-02T09:15:00"},
        {"id": 2, "name": "Flat"}
    ]))
}

async fn not_a_list() -> Json<Value> {
    Json(json!({"unexpected": true}))
}

/// Group 2 answers JSON `null`, group 3 an empty 200.
async fn balances(Path(id): Path<i64>) -> axum::response::Response {
    match id {
        2 => Json(Value::Null).into_response(),
        3 => StatusCode::OK.into_response(),
        _ => Json(json!({
            "group_id": id,
            "balances": [
                {"user": {"id": 1, "name": "Ana"}, "balance": "-12.50"},
                {"user": {"id": 2}, "balance": "12.50"}
            ]
        }))
        .into_response(),
    }
}

async fn create_expense(
    State(seen): State<Seen>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    seen.record(content_type(&headers), body.clone());
    let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    Json(json!({
        "id": 9,
        "group": {"id": group_id},
        "description": payload["description"],
        "amount": payload["amount"],
        "shares": null
    }))
}

async fn upload_receipt(
    State(seen): State<Seen>,
    Path(expense_id): Path<i64>,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut fields = Vec::new();
    let mut file_name = None;
    let mut mime = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        fields.push(field.name().unwrap_or_default().to_string());
        file_name = field.file_name().map(str::to_string);
        mime = field.content_type().map(str::to_string);
        let _ = field.bytes().await.unwrap();
    }
    seen.record(mime.clone().unwrap_or_default(), fields.join(","));
    Json(json!({
        "id": expense_id,
        "description": "Dinner",
        "amount": "42.50",
        "receipt_filename": file_name,
        "receipt_mime_type": mime
    }))
}

async fn delete_receipt() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn spawn_backend() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/fail-json", get(fail_json))
        .route("/fail-empty-message", get(fail_empty_message))
        .route("/fail-text", get(fail_text))
        .route("/slow", get(slow))
        .route("/text", get(text))
        .route("/login", get(login))
        .route("/whoami", get(whoami))
        .route("/groups", get(list_groups))
        .route("/groups/:id/members", get(not_a_list))
        .route("/groups/:id/balances", get(balances))
        .route("/groups/:id/expenses", post(create_expense))
        .route(
            "/expenses/:id/receipt",
            post(upload_receipt).delete(delete_receipt),
        )
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

fn client(base: &str) -> HttpClient {
    HttpClient::new(base, "http://localhost:3000", DEFAULT_TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_json_error_carries_status_and_message() {
    let (base, _) = spawn_backend().await;
    let err = client(&base)
        .get("/fail-json", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Http);
    assert_eq!(err.status(), Some(400));
    let message = err.to_string();
    assert!(message.contains("bad"), "{message}");
    assert!(message.contains("GET /fail-json"), "{message}");
}

#[tokio::test]
async fn test_text_error_falls_back_to_body() {
    let (base, _) = spawn_backend().await;
    let err = client(&base)
        .get("fail-text", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("plain failure"));
}

#[tokio::test]
async fn test_timeout_is_aborted_not_network() {
    let (base, _) = spawn_backend().await;
    let started = Instant::now();
    let err = client(&base)
        .get("/slow", RequestOptions::new().timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Aborted);
    assert!(err.is_aborted());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_default_timeout_comes_from_client() {
    let (base, _) = spawn_backend().await;
    let http = HttpClient::new(base, "", Duration::from_millis(100)).unwrap();
    let err = http.get("/slow", RequestOptions::new()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Aborted);
}

#[tokio::test]
async fn test_caller_cancellation_aborts() {
    let (base, _) = spawn_backend().await;
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let err = client(&base)
        .get("/slow", RequestOptions::new().cancel(token))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Aborted { ref path, .. } if path == "/slow"));
}

#[tokio::test]
async fn test_already_cancelled_token_aborts_immediately() {
    let (base, _) = spawn_backend().await;
    let token = CancellationToken::new();
    token.cancel();
    let err = client(&base)
        .get("/text", RequestOptions::new().cancel(token))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Aborted);
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr))
        .get("/groups", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Network);
    assert!(err.to_string().contains(&addr.to_string()));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_success_bodies_by_content_type() {
    let (base, _) = spawn_backend().await;
    let http = client(&base);
    let text = http.get("/text", RequestOptions::new()).await.unwrap();
    assert_eq!(text, ApiResponse::Text("hello".into()));

    let groups = http.get("/groups", RequestOptions::new()).await.unwrap();
    assert!(matches!(groups, ApiResponse::Json(Value::Array(ref items)) if items.len() == 2));
}

#[tokio::test]
async fn test_cookies_are_replayed() {
    let (base, _) = spawn_backend().await;
    let http = client(&base);
    http.get("/login", RequestOptions::new()).await.unwrap();
    let me = http.get("/whoami", RequestOptions::new()).await.unwrap();
    let me: Value = me.decode("GET", "/whoami").unwrap();
    assert_eq!(me["cookie"], json!("session=abc123"));
}

#[tokio::test]
async fn test_create_expense_sends_minimal_json() {
    let (base, seen) = spawn_backend().await;
    let api = RestExpenseApi::new(client(&base));
    let form = ExpenseForm {
        description: "Dinner".into(),
        amount: "42.50".into(),
        ..ExpenseForm::default()
    };

    let expense = api
        .create_expense(3, &form.to_payload().unwrap())
        .await
        .unwrap();
    assert_eq!(expense.id, 9);
    assert!(expense.shares.is_empty());

    let (content_type, body) = seen.take();
    assert_eq!(content_type, "application/json");
    assert_eq!(body, r#"{"description":"Dinner","amount":"42.50"}"#);
}

#[tokio::test]
async fn test_receipt_upload_is_multipart_file_field() {
    let (base, seen) = spawn_backend().await;
    let api = RestExpenseApi::new(client(&base));

    let expense = api
        .upload_receipt(7, ReceiptFile::new("dinner.png", vec![0x89, b'P', b'N', b'G']))
        .await
        .unwrap();
    assert_eq!(expense.id, 7);
    assert_eq!(expense.receipt_filename.as_deref(), Some("dinner.png"));

    let (mime, fields) = seen.take();
    assert_eq!(fields, "file");
    assert_eq!(mime, "image/png");
}

#[tokio::test]
async fn test_delete_receipt_without_body() {
    let (base, _) = spawn_backend().await;
    let api = RestExpenseApi::new(client(&base));
    assert!(api.delete_receipt(7).await.unwrap().is_none());
    assert_eq!(api.receipt_url(7), format!("{}/expenses/7/receipt", base));
}

#[tokio::test]
async fn test_rest_reads_decode_entities() {
    let (base, _) = spawn_backend().await;
    let api = RestExpenseApi::new(client(&base));
    let none = CancellationToken::new();

    let groups = api.list_groups(&none).await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].created_at.as_deref(), Some("2024-04-02T09:15:00"));

    let members = api.list_members(1, &none).await.unwrap();
    assert!(members.is_empty());

    let balances = api.group_balances(1, &none).await.unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].balance, "-12.50");
    assert_eq!(balances[1].user.display_name(), "User #2");
}

#[tokio::test]
async fn test_balances_without_body_are_empty() {
    let (base, _) = spawn_backend().await;
    let api = RestExpenseApi::new(client(&base));
    let none = CancellationToken::new();

    assert!(api.group_balances(2, &none).await.unwrap().is_empty());
    assert!(api.group_balances(3, &none).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_json_message_falls_back_to_body() {
    let (base, _) = spawn_backend().await;
    let err = client(&base)
        .get("/fail-empty-message", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains(r#""code":"E1""#), "{err}");
}
