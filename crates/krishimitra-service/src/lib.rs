//! HTTP REST API for the KrishiMitra agricultural assistant.
//!
//! This crate provides a service that:
//! - Answers farming questions in English or Hindi
//! - Returns a mock crop disease diagnosis for an uploaded leaf photo
//! - Serves mandi prices with search, filters, sorting and CSV export
//! - Generates a mock weather report with a five-day forecast
//! - Hosts chat sessions whose replies arrive after a short delay
//!
//! # REST API Endpoints
//!
//! - `GET /` - Welcome message
//! - `POST /chat` - One-shot question and answer
//! - `POST /detect-disease` - Multipart image upload (field `file`)
//! - `GET /prices` - Prices filtered by crop, state and market
//! - `GET /weather` - Weather report for a location
//! - `GET /api/health` - Service health check
//! - `GET /api/prices` - Full price query with a view envelope
//! - `GET /api/prices/facets` - Distinct filter values
//! - `GET /api/prices/export` - The same query as CSV
//! - `POST /api/sessions` - Open a chat session
//! - `GET|DELETE /api/sessions/{id}` - Read or close a session
//! - `POST /api/sessions/{id}/messages` - Send a message
//! - `PUT /api/sessions/{id}/language` - Switch language
//! - `POST /api/sessions/{id}/reset` - Start the conversation over
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/krishimitra/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [chat]
//! reply_delay_ms = 1000
//! default_language = "en"
//! max_message_len = 500
//! max_sessions = 1000
//! session_idle_secs = 1800
//!
//! [prices]
//! seed_file = "/var/lib/krishimitra/prices.csv"
//!
//! [scanner]
//! max_upload_bytes = 5242880
//!
//! [security]
//! rate_limit_enabled = true
//! rate_limit_requests = 100   # max requests per window
//! rate_limit_window_secs = 60 # window duration
//! ```

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod middleware;
pub mod state;

pub use config::{
    ChatConfig, Config, ConfigError, PricesConfig, ScannerConfig, SecurityConfig, ServerConfig,
};
pub use middleware::RateLimitState;
pub use state::{AppState, SessionLimitReached, SessionRegistry};

/// Build the full application: API routes plus rate limiting, request
/// tracing and permissive CORS.
pub fn app(state: Arc<AppState>, rate_limits: Arc<RateLimitState>) -> Router {
    let security = Arc::new(state.config.security.clone());

    Router::new()
        .merge(api::router())
        .layer(axum::middleware::from_fn_with_state(
            (security, rate_limits),
            middleware::rate_limit,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode},
    };
    use krishimitra_store::RecordStore;
    use tower::ServiceExt;

    fn request_from(uri: &str, ip: [u8; 4]) -> Request<Body> {
        let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 50000))));
        request
    }

    #[tokio::test]
    async fn test_app_serves_routes_with_cors() {
        let state = AppState::new(RecordStore::sample(), Config::default());
        let app = app(state, Arc::new(RateLimitState::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_app_applies_rate_limit() {
        let mut config = Config::default();
        config.security.rate_limit_enabled = true;
        config.security.rate_limit_requests = 2;
        let state = AppState::new(RecordStore::sample(), config);
        let app = app(state, Arc::new(RateLimitState::new()));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request_from("/", [192, 168, 1, 9]))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app
            .oneshot(request_from("/", [192, 168, 1, 9]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
