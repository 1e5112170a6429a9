use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use riskwise_core::config::Settings;
use riskwise_core::domain::answers::{AnswerSet, QuestionDef};
use riskwise_core::domain::payload::Prediction;
use riskwise_core::domain::profile::UserProfile;
use riskwise_core::domain::recommendation::Recommendations;
use riskwise_core::llm::anthropic::AnthropicExplainer;
use riskwise_core::llm::{ExplainContext, ExplanationProvider};
use riskwise_core::normalize::{explain_symbol, normalize, Enrichment, Explanation};
use riskwise_core::pipeline::{assess, Assessment};
use riskwise_core::policy::allocator::{target_sleeves, Jurisdiction, Sleeve};
use riskwise_core::policy::bands::RiskBand;
use riskwise_core::questions::{default_questions, default_sections, QuestionSection};
use riskwise_core::scoring::ValidationError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let explainer: Option<Arc<dyn ExplanationProvider>> = if settings.enrichment_enabled() {
        match AnthropicExplainer::from_settings(&settings) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "explanation provider unavailable; serving fallback rationales");
                None
            }
        }
    } else {
        tracing::info!("ANTHROPIC_API_KEY not set; rationale enrichment disabled");
        None
    };

    let state = AppState::new(settings, explainer);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/questions", get(get_questions))
        .route("/profile", post(post_profile))
        .route("/recommendations", post(post_recommendations))
        .route("/report", post(post_report))
        .route("/explain", post(post_explain))
        .route("/allocation/:score", get(get_allocation))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    settings: Arc<Settings>,
    questions: Arc<Vec<QuestionDef>>,
    explainer: Option<Arc<dyn ExplanationProvider>>,
}

impl AppState {
    fn new(settings: Settings, explainer: Option<Arc<dyn ExplanationProvider>>) -> Self {
        Self {
            settings: Arc::new(settings),
            questions: Arc::new(default_questions()),
            explainer,
        }
    }

    fn assess(&self, answers: &mut AnswerSet) -> Result<Assessment, ApiError> {
        Ok(assess(
            answers,
            &self.questions,
            &self.settings.default_jurisdiction,
        )?)
    }

    fn enrichment(&self) -> Option<Enrichment<'_>> {
        self.explainer
            .as_deref()
            .map(|p| Enrichment::new(p, self.settings.explanation_timeout))
    }

    async fn recommend(&self, assessment: &Assessment, payload: Option<&Value>) -> Recommendations {
        let enrichment = self.enrichment();
        normalize(
            assessment.trader_type,
            payload,
            &assessment.profile,
            enrichment.as_ref(),
        )
        .await
    }
}

#[derive(Debug)]
enum ApiError {
    Validation(ValidationError),
    BadRequest(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    key: Some(e.key().to_string()),
                    message: e.to_string(),
                },
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody { key: None, message },
            ),
        };
        (status, Json(body)).into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_questions() -> Json<Vec<QuestionSection>> {
    Json(default_sections())
}

#[derive(Debug, Deserialize)]
struct ProfileRequest {
    answers: AnswerSet,
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    #[serde(flatten)]
    assessment: Assessment,
    band: &'static RiskBand,
}

async fn post_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut answers = req.answers;
    let assessment = state.assess(&mut answers)?;
    let band = RiskBand::for_score(assessment.risk.score);
    Ok(Json(ProfileResponse { assessment, band }))
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    answers: AnswerSet,
    #[serde(default)]
    payload: Option<Value>,
}

#[derive(Debug, Serialize)]
struct RecommendationsResponse {
    trader_type: riskwise_core::domain::risk::TraderType,
    recommendations: Recommendations,
}

async fn post_recommendations(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let mut answers = req.answers;
    let assessment = state.assess(&mut answers)?;
    let recommendations = state.recommend(&assessment, req.payload.as_ref()).await;
    Ok(Json(RecommendationsResponse {
        trader_type: assessment.trader_type,
        recommendations,
    }))
}

async fn post_report(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<String, ApiError> {
    let mut answers = req.answers;
    let assessment = state.assess(&mut answers)?;
    let recommendations = state.recommend(&assessment, req.payload.as_ref()).await;
    Ok(riskwise_core::report::compose_now(
        &assessment.risk,
        assessment.trader_type,
        &recommendations,
    ))
}

#[derive(Debug, Deserialize)]
struct ExplainRequest {
    symbol: String,
    profile: UserProfile,
    #[serde(default)]
    prediction: Option<Prediction>,
    #[serde(default)]
    asset_class: Option<String>,
}

async fn post_explain(
    State(state): State<AppState>,
    Json(req): Json<ExplainRequest>,
) -> Result<Json<Explanation>, ApiError> {
    if req.symbol.trim().is_empty() {
        return Err(ApiError::BadRequest("symbol is required".to_string()));
    }
    let context = match (&req.prediction, req.asset_class.as_deref().map(str::trim)) {
        (Some(prediction), _) => Some(ExplainContext::Prediction(prediction)),
        (None, Some(class)) if !class.is_empty() => Some(ExplainContext::AssetClass(class)),
        _ => None,
    };
    let enrichment = state.enrichment();
    let explanation = explain_symbol(&req.symbol, &req.profile, context, enrichment.as_ref()).await;
    Ok(Json(explanation))
}

#[derive(Debug, Deserialize)]
struct AllocationQuery {
    jurisdiction: Option<String>,
}

#[derive(Debug, Serialize)]
struct AllocationResponse {
    score: u8,
    band: &'static RiskBand,
    sleeves: Vec<Sleeve>,
}

async fn get_allocation(
    State(state): State<AppState>,
    Path(score): Path<u8>,
    Query(q): Query<AllocationQuery>,
) -> Result<Json<AllocationResponse>, ApiError> {
    if !(1..=10).contains(&score) {
        return Err(ApiError::BadRequest(format!(
            "score must be between 1 and 10, got {score}"
        )));
    }
    let jurisdiction = Jurisdiction::parse(
        q.jurisdiction
            .as_deref()
            .unwrap_or(state.settings.default_jurisdiction.as_str()),
    );
    Ok(Json(AllocationResponse {
        score,
        band: RiskBand::for_score(score),
        sleeves: target_sleeves(score, jurisdiction),
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
