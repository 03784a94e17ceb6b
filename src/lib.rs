pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::database::store::ExamStore;
use crate::middleware::auth::{require_bearer_auth, AuthKeys};
use crate::services::{
    evaluation_service::EvaluationService, exam_service::ExamService,
    generation_service::GenerationService,
    llm_service::{GeminiService, LanguageModel},
};

#[derive(Clone)]
pub struct AppState {
    pub exam_service: ExamService,
    pub auth_keys: AuthKeys,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn ExamStore>) -> error::Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.gemini.timeout_secs))
            .build()
            .map_err(|e| error::Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let llm: Arc<dyn LanguageModel> =
            Arc::new(GeminiService::new(config.gemini.clone(), http_client));
        Ok(Self::with_model(config, store, llm))
    }

    /// Builds the state around an arbitrary model backend.
    pub fn with_model(config: &Config, store: Arc<dyn ExamStore>, llm: Arc<dyn LanguageModel>) -> Self {
        let exam_service = ExamService::new(
            store,
            GenerationService::new(llm.clone(), config.generation_attempts),
            EvaluationService::new(llm),
        );

        Self {
            exam_service,
            auth_keys: AuthKeys::new(&config.jwt_secret),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mock_test_api = Router::new()
        .route("/api/mock-tests", post(routes::mock_test::create_mock_test))
        .route(
            "/api/mock-tests/submit",
            post(routes::mock_test::submit_mock_test),
        )
        .route(
            "/api/mock-tests/attempts",
            get(routes::mock_test::list_attempts),
        )
        .route(
            "/api/mock-tests/:mockTestId",
            get(routes::mock_test::get_mock_test),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.auth_keys.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(mock_test_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
