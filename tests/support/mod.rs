//! Fake expense API on an ephemeral port, plus helpers to drive the router.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use nitro::{create_router, AppConfig, AppState};

pub const USER_ID: &str = "0b6f3c1e-2d4a-4c8e-9f10-2a3b4c5d6e7f";
pub const COMPANY_NITRO: &str = "5d5f5d6e-8c43-4f32-9d07-8f3b0a7c2b10";
pub const COMPANY_ACME: &str = "9a1c4e0b-3e5d-4a8e-a1f2-6c7d8e9f0a1b";
pub const PASSWORD: &str = "correct horse";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
}

/// Expiry of every token the fake API hands out: 2100-01-01.
const TOKEN_EXP: i64 = 4_102_444_800;

pub fn token_for(user_id: &str) -> String {
    let claims = json!({ "sub": user_id, "exp": TOKEN_EXP });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"upstream-only"))
        .expect("encode token")
}

#[derive(Default)]
pub struct FakeUpstream {
    pub rows: Mutex<Vec<Value>>,
    pub calls: Mutex<Vec<String>>,
    pub reject_bodies: Mutex<Vec<Value>>,
    pub approvals: AtomicUsize,
    pub revoked: AtomicBool,
    /// When set, the validation list endpoints answer 500.
    pub failing: AtomicBool,
    /// Months whose list responses are held back, keyed by `YYYY-MM-01`.
    pub slow_months: Mutex<HashMap<String, Duration>>,
}

impl FakeUpstream {
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|call| call.split('?').next() == Some(path))
            .count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

pub fn expense(service_name: &str, company: &str, value: Value, currency: &str, value_brl: Value) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "code": format!("EXP-{}", &Uuid::new_v4().simple().to_string()[..4]),
        "service_name": service_name,
        "value": value,
        "currency": currency,
        "value_brl": value_brl,
        "exchange_rate": if currency == "USD" { json!("5.0") } else { Value::Null },
        "expense_type": "recurring",
        "periodicity": "monthly",
        "renewal_date": "2024-12-10",
        "status": "active",
        "company": { "id": company, "name": if company == COMPANY_NITRO { "Nitro" } else { "Acme" } },
        "department": { "id": Uuid::new_v4(), "name": "TI" },
        "owner": { "id": USER_ID, "name": "Ana Souza", "email": "ana@nitro.dev" }
    })
}

pub fn validation(status: &str, month: &str, expense: Value) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "expense_id": expense["id"],
        "validation_month": month,
        "status": status,
        "validated_at": if status == "pending" { Value::Null } else { json!("2024-06-03T10:00:00") },
        "is_overdue": false,
        "is_predicted": false,
        "expense": expense,
        "validator": if status == "pending" { Value::Null } else {
            json!({ "id": Uuid::new_v4(), "name": "Bruno Lima", "email": "bruno@nitro.dev" })
        }
    })
}

/// June 2024: Slack and AWS pending, Zoom approved, Figma rejected.
/// Values in BRL: 100, 10 USD at 5.0 = 50, 30, 20.
pub fn june_rows() -> Vec<Value> {
    vec![
        validation("pending", "2024-06-01", expense("Slack", COMPANY_NITRO, json!("100.00"), "BRL", json!("100.00"))),
        validation("pending", "2024-06-01", expense("AWS", COMPANY_ACME, json!(10), "USD", json!("not a number"))),
        validation("approved", "2024-06-01", expense("Zoom", COMPANY_NITRO, json!("30.00"), "BRL", json!("30.00"))),
        validation("rejected", "2024-06-01", expense("Figma", COMPANY_ACME, json!("20.00"), "BRL", json!("20.00"))),
    ]
}

pub fn row_id(rows: &[Value], service_name: &str) -> Uuid {
    rows.iter()
        .find(|row| row["expense"]["service_name"] == service_name)
        .and_then(|row| row["id"].as_str())
        .and_then(|id| Uuid::parse_str(id).ok())
        .expect("row present")
}

type Shared = Arc<FakeUpstream>;

fn authorized(headers: &HeaderMap, upstream: &FakeUpstream) -> bool {
    let expected = format!("Bearer {}", token_for(USER_ID));
    let bearer = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    !upstream.revoked.load(Ordering::SeqCst)
        && bearer == Some(expected.as_str())
}

fn record(upstream: &FakeUpstream, method: &str, uri: &Uri) {
    upstream.calls.lock().expect("calls lock").push(format!(
        "{} {}",
        method,
        uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_default()
    ));
}

fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "Internal Server Error" }))).into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Could not validate credentials" }))).into_response()
}

async fn hold_back(upstream: &FakeUpstream, month: Option<&String>) {
    let delay = month.and_then(|month| upstream.slow_months.lock().expect("slow lock").get(month).copied());
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == PASSWORD {
        Json(json!({ "access_token": token_for(USER_ID), "token_type": "bearer" })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Incorrect email or password" }))).into_response()
    }
}

async fn me(State(upstream): State<Shared>, headers: HeaderMap, uri: Uri) -> Response {
    record(&upstream, "GET", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    Json(json!({
        "id": USER_ID,
        "name": "Ana Souza",
        "email": "ana@nitro.dev",
        "role": "finance_admin",
        "is_active": true
    }))
    .into_response()
}

async fn companies(State(upstream): State<Shared>, headers: HeaderMap, uri: Uri) -> Response {
    record(&upstream, "GET", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    Json(json!([
        { "id": COMPANY_NITRO, "name": "Nitro", "is_active": true },
        { "id": COMPANY_ACME, "name": "Acme", "is_active": true }
    ]))
    .into_response()
}

async fn users(State(upstream): State<Shared>, headers: HeaderMap, uri: Uri) -> Response {
    record(&upstream, "GET", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    let ana = json!({ "id": USER_ID, "name": "Ana Souza", "email": "ana@nitro.dev", "is_active": true });
    let gone = json!({ "id": Uuid::new_v4(), "name": "Carlos Antigo", "email": "c@nitro.dev", "is_active": false });
    Json(json!([ana.clone(), ana, gone])).into_response()
}

async fn stats(State(upstream): State<Shared>, headers: HeaderMap, uri: Uri) -> Response {
    record(&upstream, "GET", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    let pending = upstream
        .rows
        .lock()
        .expect("rows lock")
        .iter()
        .filter(|row| row["status"] == "pending")
        .count();
    Json(json!({ "pending_validations": pending, "monthly_expenses_value": "150.00" })).into_response()
}

async fn expenses(State(upstream): State<Shared>, headers: HeaderMap, uri: Uri) -> Response {
    record(&upstream, "GET", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    let list: Vec<Value> = upstream
        .rows
        .lock()
        .expect("rows lock")
        .iter()
        .map(|row| {
            let mut expense = row["expense"].clone();
            if row["status"] == "rejected" {
                expense["status"] = json!("cancelled");
            }
            expense
        })
        .collect();
    Json(list).into_response()
}

async fn pending(
    State(upstream): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&upstream, "GET", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    if upstream.failing.load(Ordering::SeqCst) {
        return broken();
    }
    let rows: Vec<Value> = upstream
        .rows
        .lock()
        .expect("rows lock")
        .iter()
        .filter(|row| row["status"] == "pending")
        .filter(|row| query.get("month").map_or(true, |month| row["validation_month"] == *month))
        .cloned()
        .collect();
    // Rows are read before the hold, like a response already on the wire.
    hold_back(&upstream, query.get("month")).await;
    Json(rows).into_response()
}

async fn history(
    State(upstream): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&upstream, "GET", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    if upstream.failing.load(Ordering::SeqCst) {
        return broken();
    }
    let rows: Vec<Value> = upstream
        .rows
        .lock()
        .expect("rows lock")
        .iter()
        .filter(|row| query.get("status").map_or(true, |status| row["status"] == *status))
        .filter(|row| query.get("month").map_or(true, |month| row["validation_month"] == *month))
        .cloned()
        .collect();
    // Rows are read before the hold, like a response already on the wire.
    hold_back(&upstream, query.get("month")).await;
    Json(rows).into_response()
}

async fn predicted(
    State(upstream): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&upstream, "GET", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    let month = query.get("month").cloned().unwrap_or_default();
    let rows: Vec<Value> = upstream
        .rows
        .lock()
        .expect("rows lock")
        .iter()
        .filter(|row| row["status"] != "rejected")
        .map(|row| {
            json!({
                "id": null,
                "expense_id": row["expense_id"],
                "validation_month": month,
                "status": "pending",
                "is_overdue": false,
                "is_predicted": true,
                "expense": row["expense"],
            })
        })
        .collect();
    Json(rows).into_response()
}

fn decide(upstream: &FakeUpstream, id: Uuid, status: &str) -> Response {
    let mut rows = upstream.rows.lock().expect("rows lock");
    let Some(row) = rows.iter_mut().find(|row| row["id"] == id.to_string()) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Validation not found" }))).into_response();
    };
    if row["status"] != "pending" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "Validation already processed" }))).into_response();
    }
    row["status"] = json!(status);
    row["validated_at"] = json!("2024-06-15T09:30:00");
    Json(row.clone()).into_response()
}

async fn approve(State(upstream): State<Shared>, headers: HeaderMap, uri: Uri, Path(id): Path<Uuid>) -> Response {
    record(&upstream, "POST", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    upstream.approvals.fetch_add(1, Ordering::SeqCst);
    decide(&upstream, id, "approved")
}

async fn reject(
    State(upstream): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    record(&upstream, "POST", &uri);
    if !authorized(&headers, &upstream) {
        return unauthorized();
    }
    upstream.reject_bodies.lock().expect("bodies lock").push(body);
    decide(&upstream, id, "rejected")
}

/// Starts the fake API and returns its root URL.
pub async fn spawn_upstream(upstream: Shared) -> String {
    let app = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/users/me", get(me))
        .route("/api/v1/users", get(users))
        .route("/api/v1/companies/me", get(companies))
        .route("/api/v1/dashboard/stats", get(stats))
        .route("/api/v1/expenses", get(expenses))
        .route("/api/v1/expense-validations/pending", get(pending))
        .route("/api/v1/expense-validations/history", get(history))
        .route("/api/v1/expense-validations/predicted", get(predicted))
        .route("/api/v1/expense-validations/:id/approve", post(approve))
        .route("/api/v1/expense-validations/:id/reject", post(reject))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream");
    });
    format!("http://{addr}")
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upstream: Shared,
}

impl TestApp {
    pub async fn start(rows: Vec<Value>) -> Self {
        Self::start_with(rows, false).await
    }

    pub async fn start_with(rows: Vec<Value>, secure_cookies: bool) -> Self {
        let upstream = Arc::new(FakeUpstream {
            rows: Mutex::new(rows),
            ..FakeUpstream::default()
        });
        let api_url = spawn_upstream(Arc::clone(&upstream)).await;
        let config = AppConfig {
            api_url,
            port: 0,
            cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
            secure_cookies,
        };
        let state = AppState::new(config).expect("app state").with_today(today());
        Self {
            router: create_router(state.clone()),
            state,
            upstream,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.expect("router response")
    }

    pub async fn get(&self, uri: &str) -> Response {
        let request = Request::get(uri)
            .header(header::COOKIE, format!("nitro_token={}", token_for(USER_ID)))
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> Response {
        let request = Request::post(uri)
            .header(header::COOKIE, format!("nitro_token={}", token_for(USER_ID)))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("request");
        self.send(request).await
    }

    pub fn rows(&self) -> Vec<Value> {
        self.upstream.rows.lock().expect("rows lock").clone()
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect()
}
