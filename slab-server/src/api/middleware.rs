//! 访问日志中间件
//!
//! 每个请求一条日志 (target `http_access`)：5xx 记 error，4xx 记 warn，其余 info

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use http::{Method, StatusCode};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// One access log line, captured before the request is consumed
struct AccessEntry {
    request_id: String,
    method: Method,
    /// Route template when matched (`/api/cards/{id}`), raw path otherwise
    route: String,
}

impl AccessEntry {
    fn capture(req: &Request) -> Self {
        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let route = match req.extensions().get::<MatchedPath>() {
            Some(matched) => matched.as_str().to_string(),
            None => req.uri().path().to_string(),
        };
        Self {
            request_id,
            method: req.method().clone(),
            route,
        }
    }

    fn finish(&self, status: StatusCode, elapsed: Duration) {
        let status = status.as_u16();
        let latency_ms = elapsed.as_millis() as u64;
        match status {
            500.. => error!(
                target: "http_access",
                request_id = %self.request_id, method = %self.method, route = %self.route,
                status, latency_ms, "Request errored"
            ),
            400..=499 => warn!(
                target: "http_access",
                request_id = %self.request_id, method = %self.method, route = %self.route,
                status, latency_ms, "Request rejected"
            ),
            _ => info!(
                target: "http_access",
                request_id = %self.request_id, method = %self.method, route = %self.route,
                status, latency_ms, "Request served"
            ),
        }
    }
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let entry = AccessEntry::capture(&req);
    let response = next.run(req).await;
    entry.finish(response.status(), started.elapsed());
    response
}
