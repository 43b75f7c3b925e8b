//! Fault Diagnosis API Server
//!
//! JSON HTTP surface over the diagnosis orchestrator: two diagnose routes
//! (one per strategy), history and statistics, alert management, health,
//! and Prometheus metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::Orchestrator;
use serde::Serialize;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod error;
mod rate_limit;
mod routes;
mod settings;

pub use error::ApiError;
pub use settings::{
    DatabaseSettings, ModelSettings, RateLimitSettings, ServerSettings, Settings,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub metrics: PrometheusHandle,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, metrics: PrometheusHandle) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            metrics,
            started_at: Instant::now(),
        }
    }
}

/// Build the application router.
///
/// The diagnose routes sit behind the GCRA rate limiter; everything else
/// is unlimited.
pub fn create_router(state: AppState, rate_limit: &RateLimitSettings) -> Router {
    let governor = rate_limit::governor_config(rate_limit);

    let diagnose = Router::new()
        .route("/api/v1/diagnose/rules", post(routes::diagnose::rules))
        .route("/api/v1/diagnose/model", post(routes::diagnose::model))
        .layer(GovernorLayer { config: governor });

    Router::new()
        .merge(diagnose)
        .route("/api/v1/history", get(routes::history::get_history))
        .route("/api/v1/stats", get(routes::history::get_stats))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/:id/ack", post(routes::alerts::acknowledge))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub metrics: SystemCounts,
}

/// Per-component health
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub database: String,
    pub model: String,
}

/// Coarse service counters
#[derive(Debug, Serialize)]
pub struct SystemCounts {
    pub total_diagnoses: i64,
    pub pending_alerts: usize,
    pub model_trees: usize,
}

/// Service health: storage probe, model presence, record counts
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = state.orchestrator.ping_storage().await.is_ok();
    let total_diagnoses = state
        .orchestrator
        .stats()
        .await
        .map(|stats| stats.total_diagnoses)
        .unwrap_or(-1);

    let status = if database_ok { "healthy" } else { "degraded" };
    let code = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        components: ComponentStatus {
            database: if database_ok { "ok" } else { "error" }.to_string(),
            model: "ok".to_string(),
        },
        metrics: SystemCounts {
            total_diagnoses,
            pending_alerts: state.orchestrator.pending_alerts().len(),
            model_trees: state.orchestrator.model_tree_count(),
        },
    };

    (code, Json(response))
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// Install the global tracing subscriber (fmt output, RUST_LOG filter)
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{AlertConfig, AlertManager};
    use axum::body::Body;
    use axum::extract::connect_info::ConnectInfo;
    use axum::http::{header, Request};
    use fault_model::{ModelDiagnoser, TRAINING_SEED};
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use rule_engine::RuleEngine;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use storage::Repository;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let orchestrator = Orchestrator::new(
            RuleEngine::default(),
            ModelDiagnoser::train(TRAINING_SEED),
            Repository::in_memory().await.unwrap(),
            AlertManager::new(AlertConfig::default()),
        );
        let metrics = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState::new(orchestrator, metrics);
        // Generous limit so tests never trip the governor
        let rate_limit = RateLimitSettings {
            per_second: 1,
            burst_size: 1000,
        };
        create_router(state, &rate_limit)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let mut request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        // PeerIpKeyExtractor reads the peer address from request extensions
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        request
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn rules_payload() -> Value {
        json!({
            "device_id": "panel-1",
            "voltage": 260.0,
            "current": 15.0,
            "frequency": 50.0,
            "power_factor": 0.95,
            "phase_a": 230.0,
            "phase_b": 230.0,
            "phase_c": 230.0,
            "temperature": 40.0
        })
    }

    #[tokio::test]
    async fn test_health_ok() {
        let app = test_app().await;
        let response = app
            .oneshot(request("GET", "/api/v1/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["database"], "ok");
        assert_eq!(body["metrics"]["model_trees"], 100);
    }

    #[tokio::test]
    async fn test_diagnose_rules_overvoltage() {
        let app = test_app().await;
        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/diagnose/rules",
                Some(rules_payload()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["device_id"], "panel-1");
        assert_eq!(body["primary_fault"], "Overvoltage");
        assert_eq!(body["severity"], "High");
        assert_eq!(body["confidence"], 100.0);
        assert_eq!(body["all_faults"], json!(["Overvoltage"]));
    }

    #[tokio::test]
    async fn test_diagnose_rules_missing_field_rejected() {
        let app = test_app().await;
        let mut payload = rules_payload();
        payload.as_object_mut().unwrap().remove("voltage");

        let response = app
            .oneshot(request("POST", "/api/v1/diagnose/rules", Some(payload)))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_diagnose_model_shape() {
        let app = test_app().await;
        let payload = json!({
            "voltage": 230.0,
            "current": 50.0,
            "temperature": 60.0,
            "vibration": 5.0,
            "power_factor": 0.9
        });

        let response = app
            .oneshot(request("POST", "/api/v1/diagnose/model", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        // Omitted device_id falls back to the default tag
        assert_eq!(body["device_id"], "Unknown");
        let fault = body["fault_type"].as_str().unwrap();
        assert!(
            ["Normal Operation", "Overheat", "Overload", "Short Circuit"].contains(&fault),
            "unexpected fault label {fault}"
        );
        let confidence = body["confidence"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&confidence));
        assert_eq!(body["readings"]["vibration"], 5.0);
    }

    #[tokio::test]
    async fn test_diagnose_model_out_of_range_value_rejected() {
        let app = test_app().await;
        // 1e999 overflows f64, the closest JSON can get to a non-finite
        // feature value; it must be rejected before the model runs
        let payload = r#"{
            "voltage": 1e999,
            "current": 50.0,
            "temperature": 60.0,
            "vibration": 5.0,
            "power_factor": 0.9
        }"#;
        let mut overflow = Request::builder()
            .method("POST")
            .uri("/api/v1/diagnose/model")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .unwrap();
        overflow
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        let response = app.clone().oneshot(overflow).await.unwrap();
        assert!(response.status().is_client_error());

        // Nothing was diagnosed or recorded
        let response = app
            .oneshot(request("GET", "/api/v1/history?limit=5", None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["count"], 0);
    }

    #[tokio::test]
    async fn test_history_reflects_diagnoses() {
        let app = test_app().await;
        app.clone()
            .oneshot(request(
                "POST",
                "/api/v1/diagnose/rules",
                Some(rules_payload()),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request("GET", "/api/v1/history?limit=5", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["fault_type"], "Overvoltage");
        assert_eq!(body["data"][0]["strategy"], "rules");
    }

    #[tokio::test]
    async fn test_stats_shape() {
        let app = test_app().await;
        app.clone()
            .oneshot(request(
                "POST",
                "/api/v1/diagnose/rules",
                Some(rules_payload()),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request("GET", "/api/v1/stats", None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["total_diagnoses"], 1);
        assert_eq!(body["fault_breakdown"]["Overvoltage"], 1);
        assert_eq!(body["avg_confidence"], 100.0);
    }

    #[tokio::test]
    async fn test_alert_lifecycle_over_http() {
        let app = test_app().await;
        app.clone()
            .oneshot(request(
                "POST",
                "/api/v1/diagnose/rules",
                Some(rules_payload()),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/alerts", None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        let id = body["data"][0]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request("POST", &format!("/api/v1/alerts/{id}/ack"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request("GET", "/api/v1/alerts", None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["count"], 0);
    }

    #[tokio::test]
    async fn test_ack_unknown_alert_is_404() {
        let app = test_app().await;
        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/alerts/00000000-0000-0000-0000-000000000000/ack",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_renders() {
        let app = test_app().await;
        let response = app
            .oneshot(request("GET", "/metrics", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
