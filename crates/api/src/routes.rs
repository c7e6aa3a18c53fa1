//! Router assembly

use crate::handlers::{self, accounts, auth, docs, health, intel, opportunities, reference};
use crate::middleware::{metrics::track_metrics, rate_limit};
use crate::AppState;
use axum::{
    extract::Request,
    middleware::{from_fn, Next},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .nest("/agencies", reference::agency_routes())
        .nest("/alerts", accounts::alert_routes())
        .nest("/attachments", opportunities::attachment_routes())
        .nest("/awards", opportunities::award_routes())
        .nest("/competitor-intel", intel::competitor_intel_routes())
        .nest("/contacts", intel::contact_routes())
        .nest("/contract-vehicles", reference::contract_vehicle_routes())
        .nest("/historical-data", intel::historical_data_routes())
        .nest("/naics", reference::naics_routes())
        .nest("/notice-types", reference::notice_type_routes())
        .nest("/opportunities", opportunities::opportunity_routes())
        .nest("/opportunity-scores", opportunities::score_routes())
        .nest("/organizations", intel::organization_routes())
        .nest("/saved-searches", accounts::saved_search_routes())
        .nest("/set-asides", reference::set_aside_routes())
        .nest("/sync-logs", accounts::sync_log_routes())
        .nest("/teams", intel::team_routes())
        .nest("/team-members", intel::team_member_routes())
        .nest("/users", accounts::user_routes());

    let mut app = Router::new()
        // Health and docs (no auth)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics))
        .route("/api-docs/openapi.json", get(docs::openapi))
        .nest(&state.config.server.api_prefix, api_routes)
        // Runs after routing so the matched path template is known
        .route_layer(from_fn(track_metrics))
        .fallback(handlers::not_found);

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    let limits = &state.config.rate_limit;
    if limits.enabled {
        let limiter = rate_limit::create_rate_limiter(limits.requests_per_second, limits.burst);
        let limit = limits.requests_per_second;
        app = app.layer(from_fn(move |request: Request, next: Next| {
            rate_limit::rate_limit_middleware(request, next, limiter.clone(), limit)
        }));
    }

    app.layer(timeout)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use athena_common::auth::{scopes_for, SCOPE_READ};
    use athena_common::config::AppConfig;
    use athena_core::DbPool;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use sea_orm::DatabaseConnection;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state() -> AppState {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("router-test-secret".to_string());
        config.rate_limit.enabled = false;
        let pool = DbPool::from_connection(DatabaseConnection::Disconnected);
        AppState::new(Arc::new(config), pool, None).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> Response {
        app.oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn bearer(state: &AppState, scopes: Vec<String>) -> String {
        let token = state.jwt.generate_token(Uuid::new_v4(), "analyst", scopes).unwrap();
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(
            create_router(test_state()),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_reports_missing_redis() {
        let response = send(
            create_router(test_state()),
            Request::get("/ready").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "not_ready");
        assert_eq!(body["checks"]["redis"]["status"], "down");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = send(
            create_router(test_state()),
            Request::get("/api/opportunities/active").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let response = send(
            create_router(test_state()),
            Request::get("/api/agencies")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_mutation_needs_write_scope() {
        let state = test_state();
        let auth = bearer(&state, vec![SCOPE_READ.to_string()]);

        let response = send(
            create_router(state),
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/naics/{}", Uuid::new_v4()))
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_user_delete_needs_admin() {
        let state = test_state();
        let auth = bearer(&state, scopes_for(false));

        let response = send(
            create_router(state),
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/users/{}", Uuid::new_v4()))
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let response = send(
            create_router(test_state()),
            Request::get("/api/nowhere").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Route not found with id: /api/nowhere");
    }

    #[tokio::test]
    async fn test_out_of_range_days_ahead_is_bad_request() {
        let state = test_state();
        let auth = bearer(&state, vec![SCOPE_READ.to_string()]);

        let response = send(
            create_router(state),
            Request::get("/api/opportunities/upcoming-deadlines?days_ahead=9223372036854775807")
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_openapi_is_public() {
        let response = send(
            create_router(test_state()),
            Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["info"]["title"], "Athena API");
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("router-test-secret".to_string());
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;
        let pool = DbPool::from_connection(DatabaseConnection::Disconnected);
        let app = create_router(AppState::new(Arc::new(config), pool, None).unwrap());

        let first = send(app.clone(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
