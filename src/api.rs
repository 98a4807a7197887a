//! HTTP surface: `POST /api/analyze` plus service info, health and example endpoints.

use crate::config::Config;
use crate::error::{ProviderError, Result, ReviewError};
use crate::github::GitHubClient;
use crate::llm::client_from_config;
use crate::models::{AnalysisContext, AnalysisResponse, ExperienceLevel, FocusArea};
use crate::review::ReviewPipeline;
use crate::utils::validate_github_url;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Longest accepted project description, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Request payload for `POST /api/analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub github_url: String,
    #[serde(default)]
    pub project_description: Option<String>,
    #[serde(default)]
    pub project_goals: Option<Vec<String>>,
    #[serde(default)]
    pub focus_areas: Option<Vec<String>>,
    #[serde(default)]
    pub experience_level: Option<String>,
}

impl AnalyzeRequest {
    /// Validates the optional fields and converts them into an [`AnalysisContext`]
    pub fn to_context(&self) -> Result<AnalysisContext> {
        if let Some(description) = &self.project_description {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(ReviewError::Validation(format!(
                    "project_description must be at most {} characters",
                    MAX_DESCRIPTION_CHARS
                )));
            }
        }

        let focus_areas = self
            .focus_areas
            .iter()
            .flatten()
            .filter(|f| !f.trim().is_empty())
            .map(|f| f.parse::<FocusArea>().map_err(ReviewError::Validation))
            .collect::<Result<Vec<_>>>()?;

        let experience_level = match self.experience_level.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(level) => Some(
                level
                    .parse::<ExperienceLevel>()
                    .map_err(ReviewError::Validation)?,
            ),
        };

        Ok(AnalysisContext::new(
            self.project_description.clone(),
            self.project_goals.clone().unwrap_or_default(),
            focus_areas,
            experience_level,
        ))
    }
}

/// Uniform error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    pub retryable: bool,
    pub timestamp: DateTime<Utc>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    /// `None` when the model provider is not configured
    pipeline: Option<ReviewPipeline>,
}

impl AppState {
    pub fn new(config: Arc<Config>, pipeline: Option<ReviewPipeline>) -> Self {
        Self { config, pipeline }
    }

    /// Builds the GitHub and model clients from configuration
    ///
    /// A missing model API key leaves the service running in degraded mode.
    pub fn from_config(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let provider = Arc::new(GitHubClient::new(&config.github)?);

        let pipeline = match client_from_config(&config.llm) {
            Ok(model) => Some(ReviewPipeline::new(Arc::clone(&config), provider, model)),
            Err(ReviewError::Config(msg)) => {
                warn!("Model provider not configured ({}); /api/analyze is disabled", msg);
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self::new(config, pipeline))
    }
}

/// HTTP status for each error kind
pub fn status_for(err: &ReviewError) -> StatusCode {
    match err {
        ReviewError::InvalidUrl(_) | ReviewError::Validation(_) => StatusCode::BAD_REQUEST,
        ReviewError::NotFound(_) => StatusCode::NOT_FOUND,
        ReviewError::NoAnalyzableFiles => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        ReviewError::Forbidden(_) => StatusCode::FORBIDDEN,
        ReviewError::Provider(e) => match e {
            ProviderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProviderError::RateLimited { .. } | ProviderError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ProviderError::Auth(_)
            | ProviderError::InvalidRequest(_)
            | ProviderError::EmptyResponse => StatusCode::BAD_GATEWAY,
        },
        ReviewError::GitHubApi(_)
        | ReviewError::Network(_)
        | ReviewError::Http(_)
        | ReviewError::Json(_) => StatusCode::BAD_GATEWAY,
        ReviewError::Config(_) | ReviewError::IO(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("Request failed ({}): {}", self.kind(), self);
        } else {
            warn!("Request rejected ({}): {}", self.kind(), self);
        }

        let body = ErrorBody {
            error: self.public_message(),
            kind: self.kind().to_string(),
            retryable: self.is_retryable(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

/// Create the main application with all routes
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health_check))
        .route("/api/analyze/example", get(example_request))
        .route("/api/analyze", post(analyze_repository))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint - returns basic service information
async fn index() -> Json<Value> {
    Json(json!({
        "service": "LlamaReview",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AI-assisted code review for public GitHub repositories",
        "endpoints": {
            "health": "/api/health",
            "analyze": "/api/analyze",
            "example": "/api/analyze/example"
        }
    }))
}

/// Readiness of the configured upstreams; calls the model provider when one is configured
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let model_configured = state.pipeline.is_some();
    let model_error = match &state.pipeline {
        Some(pipeline) => match pipeline.check_model().await {
            Ok(()) => None,
            Err(e) => {
                warn!("Model health check failed: {}", e);
                Some(e.kind())
            }
        },
        None => Some("config_error"),
    };
    let model_reachable = model_error.is_none();

    let (status, label) = if model_reachable {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "LlamaReview",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now(),
            "checks": {
                "model_configured": model_configured,
                "model_reachable": model_reachable,
                "model_error": model_error,
                "model_provider": state.config.llm.provider.as_str(),
                "github_token_configured": state.config.github.token.is_some(),
            }
        })),
    )
}

/// Sample request body for `POST /api/analyze`
async fn example_request() -> Json<AnalyzeRequest> {
    Json(AnalyzeRequest {
        github_url: "https://github.com/octocat/Hello-World".to_string(),
        project_description: Some("A small demo repository".to_string()),
        project_goals: Some(vec![
            "Improve code quality".to_string(),
            "Prepare for production".to_string(),
        ]),
        focus_areas: Some(vec!["security".to_string(), "maintainability".to_string()]),
        experience_level: Some("intermediate".to_string()),
    })
}

/// Review a repository
async fn analyze_repository(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>> {
    let Json(request) = payload.map_err(|e| ReviewError::Validation(e.body_text()))?;
    let context = request.to_context()?;
    validate_github_url(&request.github_url)?;

    let pipeline = state.pipeline.as_ref().ok_or_else(|| {
        ReviewError::Config("model provider API key is not configured".to_string())
    })?;

    info!("Analysis requested for {}", request.github_url);
    let response = pipeline.analyze(&request.github_url, context).await?;
    Ok(Json(response))
}
