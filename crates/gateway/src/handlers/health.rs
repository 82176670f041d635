//! Health check and metrics handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub explainer: ExplainerCheck,
    pub sessions: SessionCheck,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplainerCheck {
    pub status: String,
    pub provider: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCheck {
    pub active: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.observability.service_name.clone(),
        version: mathforge_common::VERSION.to_string(),
    })
}

/// Readiness probe - reports the explainer and the session store
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let sessions = state.tutor.sessions();

    Json(ReadyResponse {
        status: "ready".to_string(),
        checks: HealthChecks {
            explainer: ExplainerCheck {
                status: "up".to_string(),
                provider: state.tutor.explainer_provider().to_string(),
            },
            sessions: SessionCheck {
                active: sessions.len().await,
                max_turns: sessions.capacity(),
            },
        },
    })
}

/// Prometheus exposition
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(test_support::router(test_support::state()), "/health").await;
        assert_eq!(status, StatusCode::OK);

        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.service, "mathforge");
        assert_eq!(health.version, mathforge_common::VERSION);
    }

    #[tokio::test]
    async fn test_ready_reports_sessions() {
        let state = test_support::state();
        state.tutor.handle("alice", "solve x = 2").await;

        let (status, body) = get(test_support::router(state), "/ready").await;
        assert_eq!(status, StatusCode::OK);

        let ready: ReadyResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(ready.status, "ready");
        assert_eq!(ready.checks.explainer.provider, "mock");
        assert_eq!(ready.checks.sessions.active, 1);
        assert_eq!(ready.checks.sessions.max_turns, Some(5));
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let (status, _) = get(test_support::router(test_support::state()), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
