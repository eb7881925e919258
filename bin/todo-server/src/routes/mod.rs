//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI spec endpoint (disable with `TODO_ENABLE_SWAGGER=false`)
//! - Health route
//! - `/v1` record routes for the configured variant, behind the gateway guard

pub mod doc;
mod health;
mod v1;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{auth, cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let variant = state.config.variant;

    let records = v1::router(variant).route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_gateway,
    ));

    let mut app = Router::new().merge(health::router()).merge(records);

    if state.config.enable_swagger {
        app = app.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs(variant)),
        );
    }

    app
        // Outermost layers execute first on the way in.
        .layer(DefaultBodyLimit::max(trace::MAX_BODY_BYTES))
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::test_config;
    use crate::entities::SqliteStore;
    use crate::middleware::auth::GATEWAY_TOKEN_HEADER;
    use crate::middleware::identity::UID_HEADER;
    use crate::models::Variant;
    use crate::schemas::envelope::Envelope;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    const U1: &str = "5f1a2b3c4d5e6f708192a3b4";
    const U2: &str = "5f1a2b3c4d5e6f708192a3b5";

    async fn app_with(variant: Variant, gateway_token: Option<&str>) -> Router {
        let mut config = test_config(variant);
        config.gateway_token = gateway_token.map(str::to_owned);
        let store = SqliteStore::connect("sqlite::memory:", 1).await.unwrap();
        build(Arc::new(AppState {
            config: Arc::new(config),
            store: Arc::new(store.collection(variant.collection())),
        }))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        uid: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Envelope) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(uid) = uid {
            req = req.header(UID_HEADER, uid);
        }
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let app = app_with(Variant::Task, None).await;
        let (status, created) = call(
            &app,
            Method::POST,
            "/v1/task/create",
            Some(U1),
            Some(json!({ "title": "buy milk", "level": 2, "labels": ["home"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(created.ok);
        let id = created.data.unwrap();
        assert_eq!(id.as_str().unwrap().len(), 24);

        let (status, listed) = call(&app, Method::GET, "/v1/task/list", Some(U1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.total, Some(1));
        let rec = listed.data.unwrap()[0].clone();
        assert_eq!(rec["id"], id);
        assert_eq!(rec["uid"], json!(U1));
        assert_eq!(rec["title"], json!("buy milk"));
        assert_eq!(rec["level"], json!(2));
        assert_eq!(rec["labels"], json!(["home"]));
        assert!(rec["createAt"].is_string());
    }

    #[tokio::test]
    async fn missing_identity_is_rejected_before_body() {
        let app = app_with(Variant::Task, None).await;
        let (status, env) = call(&app, Method::POST, "/v1/task/create", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!env.ok);
        assert_eq!(env.msg.as_deref(), Some("missing uid header"));
    }

    #[tokio::test]
    async fn empty_body_and_missing_field_envelopes() {
        let app = app_with(Variant::Task, None).await;
        let (_, env) = call(&app, Method::POST, "/v1/task/create", Some(U1), None).await;
        assert_eq!(env, Envelope::fail("request body is empty"));

        let (status, env) = call(
            &app,
            Method::POST,
            "/v1/task/create",
            Some(U1),
            Some(json!({ "level": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(env, Envelope::fail("please enter a task name"));
    }

    #[tokio::test]
    async fn update_of_foreign_record_fails_and_leaves_it_untouched() {
        let app = app_with(Variant::Task, None).await;
        let (_, created) = call(
            &app,
            Method::POST,
            "/v1/task/create",
            Some(U1),
            Some(json!({ "title": "mine", "level": 1 })),
        )
        .await;
        let id = created.data.unwrap();

        let (status, env) = call(
            &app,
            Method::PUT,
            "/v1/task/update",
            Some(U2),
            Some(json!({ "id": id, "event": "done", "tid": ["t1"] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!env.ok);

        let (_, listed) = call(&app, Method::GET, "/v1/task/list", Some(U1), None).await;
        let rec = listed.data.unwrap()[0].clone();
        assert_eq!(rec["title"], json!("mine"));
        assert!(rec.get("updateAt").is_none());
    }

    #[tokio::test]
    async fn owner_can_update_and_delete() {
        let app = app_with(Variant::Log, None).await;
        let (_, created) = call(
            &app,
            Method::POST,
            "/v1/record/create",
            Some(U1),
            Some(json!({ "event": "start", "tid": ["t1"] })),
        )
        .await;
        let id = created.data.unwrap();
        let id_str = id.as_str().unwrap().to_owned();

        let (status, env) = call(
            &app,
            Method::PATCH,
            "/v1/record/update",
            Some(U1),
            Some(json!({ "id": id, "event": "done", "tid": ["t1", "t2"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(env, Envelope::ok("updated successfully"));

        let uri = format!("/v1/record/{id_str}");
        let (status, _) = call(&app, Method::DELETE, &uri, Some(U2), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, env) = call(&app, Method::DELETE, &uri, Some(U1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(env, Envelope::ok("deleted successfully"));

        let (_, listed) = call(&app, Method::GET, "/v1/record/list", Some(U1), None).await;
        assert_eq!(listed.total, Some(0));
        assert_eq!(listed.data, Some(json!([])));
    }

    #[tokio::test]
    async fn list_honours_limit_and_skip() {
        let app = app_with(Variant::Task, None).await;
        for level in 1..=4 {
            call(
                &app,
                Method::POST,
                "/v1/task/create",
                Some(U1),
                Some(json!({ "title": "t", "level": level })),
            )
            .await;
        }
        let (_, env) = call(&app, Method::GET, "/v1/task/list?limit=2&skip=1", Some(U1), None).await;
        assert_eq!(env.total, Some(4));
        let levels: Vec<_> = env.data.unwrap().as_array().unwrap().iter().map(|r| r["level"].clone()).collect();
        assert_eq!(levels, vec![json!(3), json!(2)]);

        let (_, env) = call(&app, Method::GET, "/v1/task/list?limit=abc", Some(U1), None).await;
        assert_eq!(env.data.unwrap().as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn gateway_token_guards_record_routes_only() {
        let app = app_with(Variant::Task, Some("s3cret")).await;
        let (status, env) = call(&app, Method::GET, "/v1/task/list", Some(U1), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(env, Envelope::fail("unauthorised"));

        let req = Request::get("/v1/task/list")
            .header(UID_HEADER, U1)
            .header(GATEWAY_TOKEN_HEADER, "s3cret")
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn extractor_rejections_use_the_envelope() {
        let app = app_with(Variant::Task, None).await;
        let (status, env) =
            call(&app, Method::GET, "/v1/task/list?limit=1&limit=2", Some(U1), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!env.ok);
        assert!(env.msg.unwrap().starts_with("invalid query: "));

        let oversized = Request::post("/v1/task/create")
            .header(UID_HEADER, U1)
            .body(Body::from(vec![b' '; trace::MAX_BODY_BYTES + 1]))
            .unwrap();
        let res = app.oneshot(oversized).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let env: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(env, Envelope::fail("request body is too large"));
    }
}
