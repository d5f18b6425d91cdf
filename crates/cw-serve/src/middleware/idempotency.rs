use crate::correlation_id_from_request;
use crate::{AppState, IdempotencyLocks};
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use cw_db::idempotency::{IdempotencyRecord, IdempotencyStore};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Notify;
use tower::{Layer, Service};

const KEY_HEADER: &str = "idempotency-key";
const MAX_KEY_LEN: usize = 128;
const TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    code: &'static str,
    message: String,
    correlation_id: Option<String>,
}

#[derive(Clone)]
pub struct IdempotencyLayer {
    state: AppState,
}

impl IdempotencyLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Clone)]
pub struct IdempotencyService<S> {
    inner: S,
    state: AppState,
}

impl<S> Layer<S> for IdempotencyLayer {
    type Service = IdempotencyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdempotencyService {
            inner,
            state: self.state.clone(),
        }
    }
}

impl<S> Service<Request<Body>> for IdempotencyService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let state = self.state.clone();
        Box::pin(async move { Ok(handle_request(state, request, &mut inner).await) })
    }
}

// Webhook delivery is at-least-once; a repeated POST carrying the same
// Idempotency-Key replays the original response instead of appending the
// event a second time.
async fn handle_request<S>(state: AppState, request: Request<Body>, inner: &mut S) -> Response
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Send,
    S::Future: Send,
{
    if request.method() != Method::POST {
        return pass_through(inner, request).await;
    }

    let key = match request
        .headers()
        .get(KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        Some(value) => value.to_string(),
        None => return pass_through(inner, request).await,
    };

    let correlation_id = correlation_id_from_request(&request);
    if !key.is_ascii() || key.len() > MAX_KEY_LEN {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "invalid idempotency key".to_string(),
            correlation_id,
        );
    }

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(ToString::to_string);
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => Bytes::new(),
    };

    let scope_hash = hash_str(&format!("{method}|{path}"));
    let request_hash = hash_str(&format!(
        "{}|{}",
        canonical_query(query.as_deref()),
        canonical_body(&body_bytes)
    ));

    match lookup(&state, &key, &scope_hash) {
        Ok(Some(record)) if record.request_hash != request_hash => {
            return error_response(
                StatusCode::CONFLICT,
                "conflict",
                "idempotency key conflict".to_string(),
                correlation_id,
            );
        }
        Ok(Some(record)) => return stored_response(&record),
        Ok(None) => {}
        Err(message) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                correlation_id,
            );
        }
    }

    // Another delivery of the same key may be in flight; wait for it and
    // replay its stored response rather than racing it.
    let lock_key = format!("{key}:{scope_hash}");
    if wait_on_inflight(&state.idempotency, &lock_key).await {
        match lookup(&state, &key, &scope_hash) {
            Ok(Some(record)) if record.request_hash == request_hash => {
                return stored_response(&record);
            }
            _ => {}
        }
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = pass_through(inner, request).await;
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let status = parts.status;
    let response = Response::from_parts(parts, Body::from(body_bytes.clone()));

    if status.is_success() || status.is_server_error() {
        let now = chrono::Utc::now();
        let record = IdempotencyRecord {
            key,
            scope_hash,
            request_hash,
            response_status: i32::from(status.as_u16()),
            response_body: String::from_utf8_lossy(&body_bytes).to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::seconds(TTL_SECONDS),
        };
        if let Ok(conn) = cw_db::schema::open_and_migrate(&state.db_path) {
            let _ = IdempotencyStore::new(&conn).insert(record);
        }
    }

    notify_inflight(&state.idempotency, &lock_key).await;
    response
}

async fn pass_through<S>(inner: &mut S, request: Request<Body>) -> Response
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Send,
    S::Future: Send,
{
    match inner.call(request).await {
        Ok(response) => response,
        Err(err) => match err {},
    }
}

fn lookup(
    state: &AppState,
    key: &str,
    scope_hash: &str,
) -> Result<Option<IdempotencyRecord>, String> {
    let conn = cw_db::schema::open_and_migrate(&state.db_path).map_err(|err| err.to_string())?;
    IdempotencyStore::new(&conn)
        .get(key, scope_hash)
        .map_err(|err| err.to_string())
}

fn stored_response(record: &IdempotencyRecord) -> Response {
    let status =
        StatusCode::from_u16(record.response_status as u16).unwrap_or(StatusCode::OK);
    let mut response = Response::builder()
        .status(status)
        .body(Body::from(record.response_body.clone()))
        .unwrap_or_else(|_| Response::new(Body::empty()));
    response
        .headers_mut()
        .insert("content-type", "application/json".parse().unwrap());
    response
}

fn error_response(
    status: StatusCode,
    code: &'static str,
    message: String,
    correlation_id: Option<String>,
) -> Response {
    let body = ErrorEnvelope {
        code,
        message,
        correlation_id,
    };
    (status, axum::Json(body)).into_response()
}

async fn wait_on_inflight(locks: &IdempotencyLocks, key: &str) -> bool {
    let notify = {
        let mut guard = locks.inner.lock().await;
        if let Some(existing) = guard.get(key) {
            existing.clone()
        } else {
            let notify = Arc::new(Notify::new());
            guard.insert(key.to_string(), notify.clone());
            return false;
        }
    };
    notify.notified().await;
    true
}

async fn notify_inflight(locks: &IdempotencyLocks, key: &str) {
    let notify = {
        let mut guard = locks.inner.lock().await;
        guard.remove(key)
    };
    if let Some(notify) = notify {
        notify.notify_waiters();
    }
}

fn canonical_query(query: Option<&str>) -> String {
    let mut pairs = Vec::new();
    if let Some(query) = query {
        for part in query.split('&').filter(|part| !part.is_empty()) {
            let mut iter = part.splitn(2, '=');
            let key = iter.next().unwrap_or("");
            let value = iter.next().unwrap_or("");
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_body(bytes: &Bytes) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => serde_json::to_string(&normalize_json(&value)).unwrap_or_default(),
        Err(_) => String::from_utf8_lossy(bytes).to_string(),
    }
}

fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut ordered = BTreeMap::new();
            for (key, value) in map {
                ordered.insert(key.clone(), normalize_json(value));
            }
            Value::Object(ordered.into_iter().collect())
        }
        Value::Array(values) => Value::Array(values.iter().map(normalize_json).collect()),
        other => other.clone(),
    }
}

fn hash_str(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
