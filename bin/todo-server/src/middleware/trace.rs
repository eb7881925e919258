use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ServerError;

pub static X_TRACE_ID: &str = "x-trace-id";

/// Bodies at or above this size are summarised instead of logged.
const BODY_PREVIEW_LIMIT: usize = 1024;

/// Largest request body read into memory.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub async fn trace_middleware(req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    // Reuse the caller's trace id when it is a valid UUID.
    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let trace_header = HeaderValue::from_str(&trace_id.to_string()).ok();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");
        let (parts, body) = req.into_parts();
        let req_bytes = match read_request_body(body).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(limit = MAX_BODY_BYTES, "request body rejected: {e}");
                let mut response = e.into_response();
                if let Some(value) = trace_header {
                    response.headers_mut().insert(X_TRACE_ID, value);
                }
                return response;
            }
        };
        log_body("request", &parts.headers, &req_bytes);
        let mut req = Request::from_parts(parts, Body::from(req_bytes));
        if let Some(value) = &trace_header {
            req.headers_mut().insert(X_TRACE_ID, value.clone());
        }

        let response = next.run(req).await;

        let (parts, body) = response.into_parts();
        let res_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(error = %e, "response body could not be read");
                Bytes::new()
            }
        };
        log_body("response", &parts.headers, &res_bytes);
        let mut response = Response::from_parts(parts, Body::from(res_bytes));
        if let Some(value) = trace_header {
            response.headers_mut().insert(X_TRACE_ID, value);
        }

        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "← response finished"
        );
        response
    }
    .instrument(span)
    .await
}

/// Buffer the request body, refusing anything over [`MAX_BODY_BYTES`].
async fn read_request_body(body: Body) -> Result<Bytes, ServerError> {
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(ServerError::PayloadTooLarge),
        Err(e) => {
            warn!(error = %e, "request body could not be read");
            Ok(Bytes::new())
        }
    }
}

/// Log small JSON payloads verbatim and summarise the rest.
fn log_body(direction: &str, headers: &header::HeaderMap, bytes: &Bytes) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.contains("application/json") && bytes.len() < BODY_PREVIEW_LIMIT {
        if let Ok(text) = std::str::from_utf8(bytes) {
            info!("{direction} body: {text}");
        }
    } else if !bytes.is_empty() {
        info!(
            "{direction} body: [skipped: type={content_type}, size={}]",
            bytes.len()
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schemas::envelope::Envelope;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn app() -> Router {
        Router::new()
            .route("/echo", post(|body: Bytes| async move { body }))
            .layer(axum::middleware::from_fn(trace_middleware))
    }

    #[tokio::test]
    async fn generates_trace_id_when_absent() {
        let res = app()
            .oneshot(Request::post("/echo").body(Body::from("hi")).unwrap())
            .await
            .unwrap();
        let id = res.headers().get(X_TRACE_ID).unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"hi");
    }

    #[tokio::test]
    async fn propagates_caller_trace_id() {
        let id = Uuid::new_v4().to_string();
        let res = app()
            .oneshot(
                Request::post("/echo")
                    .header(X_TRACE_ID, &id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers().get(X_TRACE_ID).unwrap(), id.as_str());
    }

    #[tokio::test]
    #[traced_test]
    async fn logs_small_json_bodies() {
        app()
            .oneshot(
                Request::post("/echo")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title":"buy milk"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(logs_contain(r#"request body: {"title":"buy milk"}"#));
    }

    #[tokio::test]
    async fn oversized_request_body_is_refused_with_envelope() {
        let res = app()
            .oneshot(
                Request::post("/echo")
                    .body(Body::from(vec![b'a'; MAX_BODY_BYTES + 1]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(res.headers().get(X_TRACE_ID).is_some());
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let env: Envelope = serde_json::from_slice(&body).unwrap();
        assert_eq!(env, Envelope::fail("request body is too large"));
    }

    #[tokio::test]
    async fn body_at_the_cap_is_passed_through() {
        let res = app()
            .oneshot(
                Request::post("/echo")
                    .body(Body::from(vec![b'a'; MAX_BODY_BYTES]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.len(), MAX_BODY_BYTES);
    }
}
