use super::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use quantumwaste::workflows::simulate::{self, SimulationError, SimulationRequest, SimulationResult};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

const INVALID_INPUT_MESSAGE: &str = "Invalid input data";

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/simulate", post(simulate_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn index_handler() -> Json<Value> {
    Json(json!({ "message": "Welcome to QuantumWaste API" }))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Validates the body, then runs the simulation on the blocking pool with a fresh generator.
async fn simulate_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SimulationResult>, ApiError> {
    let request = SimulationRequest::from_json_bytes(&body, &state.config)?;

    let result = tokio::task::spawn_blocking(move || {
        let mut rng = StdRng::from_entropy();
        simulate::run(&request, &state.predictor, &state.config, &mut rng)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("simulation task failed: {}", e)))??;

    Ok(Json(result))
}

#[derive(Debug)]
enum ApiError {
    InvalidInput(String),
    Internal(String),
}

impl From<SimulationError> for ApiError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::InvalidInput(reason) => Self::InvalidInput(reason),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(reason) => {
                warn!(%reason, "Rejected simulation request.");
                (StatusCode::BAD_REQUEST, INVALID_INPUT_MESSAGE.to_string())
            }
            ApiError::Internal(msg) => {
                error!("Simulation failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use quantumwaste::engine::config::{ModelConfig, SimulationConfig};
    use quantumwaste::engine::predictor::DifficultyPredictor;
    use quantumwaste::engine::progress::ProgressReporter;
    use std::path::PathBuf;

    fn test_state() -> AppState {
        let config = SimulationConfig {
            model: ModelConfig {
                artifacts_dir: PathBuf::from("unused"),
                samples: 300,
                trees: 8,
                max_depth: 6,
                ..ModelConfig::default()
            },
            ..SimulationConfig::default()
        };
        let (predictor, _) =
            DifficultyPredictor::train(&config.model, &ProgressReporter::new()).unwrap();
        AppState::new(predictor, config)
    }

    async fn into_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn simulate(state: AppState, body: &'static str) -> (StatusCode, Value) {
        let response = simulate_handler(State(state), Bytes::from_static(body.as_bytes()))
            .await
            .into_response();
        into_json(response).await
    }

    #[tokio::test]
    async fn index_greets() {
        let (status, body) = into_json(index_handler().await.into_response()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Welcome to QuantumWaste API" }));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = into_json(health_handler().await.into_response()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn uniform_request_returns_a_full_result() {
        let (status, body) = simulate(
            test_state(),
            r#"{"length": 10, "composition": "uniform"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["polymer_structure"]["composition"],
            serde_json::to_value(vec!["A"; 10]).unwrap()
        );
        assert_eq!(body["optimized_params"].as_array().unwrap().len(), 3);
        assert!(body["recycling_difficulty"].as_f64().unwrap().is_finite());
        assert_eq!(body["feature_importances"].as_object().unwrap().len(), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn empty_object_uses_defaults() {
        let (status, body) = simulate(test_state(), "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["polymer_structure"]["length"], json!(10));
    }

    #[tokio::test]
    async fn malformed_length_is_a_bad_request() {
        let (status, body) = simulate(test_state(), r#"{"length": "bad"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid input data" }));
    }

    #[tokio::test]
    async fn non_json_body_is_a_bad_request() {
        let (status, _) = simulate(test_state(), "length=10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_failures_map_to_internal_errors() {
        let err = SimulationError::Engine(
            quantumwaste::engine::error::EngineError::Computation("boom".to_string()),
        );
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn router_builds_with_layers() {
        let _ = router(test_state());
    }
}
