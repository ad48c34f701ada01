use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{Instrument, Span, info, info_span};
use uuid::Uuid;

use crate::api::AppState;

const REQUEST_ID: &str = "x-request-id";

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("cache-control", "no-store"),
];

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// What the access log and the request metrics need to know about a request
/// once its handler has run.
struct RequestRecord {
    id: String,
    method: Method,
    /// Matched route template when there is one, so `/blogs/{id}` is one
    /// series rather than one per blog.
    route: String,
    started: Instant,
}

impl RequestRecord {
    fn new(method: Method, path: &str, matched: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method,
            route: matched.unwrap_or(path).to_string(),
            started: Instant::now(),
        }
    }

    fn capture(req: &Request) -> (Self, Span) {
        let path = req.uri().path();
        let matched = req.extensions().get::<MatchedPath>().map(MatchedPath::as_str);
        let record = Self::new(req.method().clone(), path, matched);

        let span = info_span!(
            "request",
            request_id = %record.id,
            method = %record.method,
            path = %path,
            route = matched,
            user_id = tracing::field::Empty,
        );
        (record, span)
    }

    fn labels(&self, status: StatusCode) -> [(&'static str, String); 3] {
        [
            ("method", self.method.to_string()),
            ("path", self.route.clone()),
            ("status", status.as_u16().to_string()),
        ]
    }

    fn finish(&self, status: StatusCode) {
        let elapsed = self.started.elapsed();
        let labels = self.labels(status);

        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        info!(
            event = "http_request_finished",
            duration_ms = millis(elapsed),
            status_code = status.as_u16(),
            outcome = outcome(status),
            "Request finished"
        );
    }
}

fn outcome(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "success"
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Wraps each request in a span carrying a fresh request id and an empty
/// `user_id` for the bearer middleware to fill. Echoes the id back in
/// `x-request-id`.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let (record, span) = RequestRecord::capture(&req);

    async move {
        let mut response = next.run(req).await;
        record.finish(response.status());

        if let Ok(value) = HeaderValue::from_str(&record.id) {
            response.headers_mut().insert(REQUEST_ID, value);
        }
        response
    }
    .instrument(span)
    .await
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}
