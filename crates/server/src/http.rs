//! HTTP Endpoints
//!
//! REST API for the language tutor.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lingotutor_chains::{
    PronunciationChain, PronunciationInput, QuestionChain, QuestionInput, ResponseChain,
    ResponseInput, TipsChain, TipsInput, TranslationChain, TranslationInput,
};
use lingotutor_core::{Error, MemoryStore, Transcriber, TurnRequest};

use crate::metrics::{
    metrics_handler, record_chain_run, record_llm_latency, record_speech_latency, record_turn,
    record_turn_latency,
};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.settings.server.cors_origins,
        state.settings.server.cors_enabled,
    );
    let request_timeout = Duration::from_secs(state.settings.server.request_timeout_secs);

    Router::new()
        // Conversation
        .route("/api/talk", post(talk))
        .route("/api/threads/:id/transcript", get(thread_transcript))
        // Practice chains
        .route("/api/questions", post(questions))
        .route("/api/tips", post(tips))
        .route("/api/translations/review", post(review_translation))
        .route("/api/responses/review", post(review_response))
        .route("/api/pronunciation", post(pronunciation))
        // Speech
        .route("/api/transcribe", post(transcribe))
        .route("/api/audio/:id", get(get_audio))
        // Health and metrics
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// Disabled means permissive; an empty origin list admits any origin;
/// otherwise only the listed origins are allowed.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled, allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!(origins = parsed.len(), "CORS configured");
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Caller address for the usage gate: first X-Forwarded-For hop when a
/// proxy supplied one, otherwise the socket peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Maps domain errors onto the wire error envelope
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::UsageLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::UpstreamModel { .. } => StatusCode::BAD_GATEWAY,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Memory(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "request failed");
        }
        let body = Json(serde_json::json!({
            "error": {
                "message": self.0.to_string(),
                "code": self.0.code(),
            }
        }));
        (status, body).into_response()
    }
}

/// Speech attachment on a turn reply
#[derive(Debug, Serialize)]
struct SpeechPayload {
    audio_url: String,
    audio_base64: String,
}

/// Turn reply wire form
#[derive(Debug, Serialize)]
struct TalkResponse {
    ai_output: String,
    history: String,
    has_grammar_error: bool,
    speech: Option<SpeechPayload>,
}

/// Conversational turn
async fn talk(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TalkResponse>, ApiError> {
    let ip = client_ip(&headers, peer);

    let started = Instant::now();
    let result = state.engine.run_turn(request, &ip).await;
    record_turn_latency(started.elapsed());

    match result {
        Ok(reply) => {
            record_turn(if reply.has_grammar_error {
                "correction"
            } else {
                "reply"
            });
            let speech = reply.speech.map(|clip| {
                let audio_base64 = BASE64.encode(&clip.audio);
                let id = state.audio.store(clip);
                SpeechPayload {
                    audio_url: format!("/api/audio/{id}"),
                    audio_base64,
                }
            });
            Ok(Json(TalkResponse {
                ai_output: reply.ai_output,
                history: reply.history,
                has_grammar_error: reply.has_grammar_error,
                speech,
            }))
        }
        Err(err) => {
            record_turn(match &err {
                Error::UsageLimit { .. } => "blocked",
                _ => "error",
            });
            Err(err.into())
        }
    }
}

/// Thread transcript wire form
#[derive(Debug, Serialize)]
struct TranscriptResponse {
    thread_id: String,
    transcript: String,
}

/// Read a thread's stored transcript; unknown threads read empty
async fn thread_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let transcript = state.memory.read(&id).await?;
    Ok(Json(TranscriptResponse {
        thread_id: id,
        transcript,
    }))
}

/// Generate a practice question
async fn questions(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(input): Json<QuestionInput>,
) -> Result<Json<lingotutor_chains::PracticeQuestion>, ApiError> {
    let chain = QuestionChain::new(state.metered_model(&client_ip(&headers, peer)));

    let started = Instant::now();
    let result = chain.run(&input).await;
    record_llm_latency(started.elapsed());
    record_chain_run("questions");

    Ok(Json(result?))
}

/// Generate a study tip
async fn tips(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(input): Json<TipsInput>,
) -> Result<Json<lingotutor_chains::StudyTip>, ApiError> {
    let chain = TipsChain::new(state.metered_model(&client_ip(&headers, peer)));

    let started = Instant::now();
    let result = chain.run(&input).await;
    record_llm_latency(started.elapsed());
    record_chain_run("tips");

    Ok(Json(result?))
}

/// Review a written translation attempt
async fn review_translation(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(input): Json<TranslationInput>,
) -> Result<Json<lingotutor_chains::TranslationReview>, ApiError> {
    let chain = TranslationChain::new(state.metered_model(&client_ip(&headers, peer)));

    let started = Instant::now();
    let result = chain.run(&input).await;
    record_llm_latency(started.elapsed());
    record_chain_run("translations");

    Ok(Json(result?))
}

/// Review a written answer to a practice question
async fn review_response(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(input): Json<ResponseInput>,
) -> Result<Json<lingotutor_chains::ResponseReview>, ApiError> {
    let chain = ResponseChain::new(state.metered_model(&client_ip(&headers, peer)));

    let started = Instant::now();
    let result = chain.run(&input).await;
    record_llm_latency(started.elapsed());
    record_chain_run("responses");

    Ok(Json(result?))
}

/// Pronunciation attempt: recorded audio plus the sentence it should say
#[derive(Debug, Deserialize)]
struct PronunciationRequest {
    audio_base64: String,
    mime_type: String,
    target_text: String,
    #[serde(default = "default_user_language")]
    user_language: String,
}

fn default_user_language() -> String {
    "English".to_string()
}

/// Score a pronunciation attempt: transcribe, then compare
async fn pronunciation(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<PronunciationRequest>,
) -> Result<Json<lingotutor_chains::PronunciationReport>, ApiError> {
    let ip = client_ip(&headers, peer);
    let audio = decode_audio(&request.audio_base64)?;

    let started = Instant::now();
    let transcribed = state.transcriber.transcribe(&audio, &request.mime_type).await;
    record_speech_latency(started.elapsed());
    let transcription = transcribed?;

    let chain = PronunciationChain::new(state.metered_model(&ip));
    let input = PronunciationInput {
        target_text: request.target_text,
        transcribed_text: transcription.text,
        user_language: request.user_language,
    };

    let started = Instant::now();
    let result = chain.run(&input).await;
    record_llm_latency(started.elapsed());
    record_chain_run("pronunciation");

    Ok(Json(result?))
}

#[derive(Debug, Deserialize)]
struct TranscribeRequest {
    audio_base64: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
struct TranscribeResponse {
    text: String,
}

/// Transcribe recorded audio
async fn transcribe(
    State(state): State<AppState>,
    Json(request): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let audio = decode_audio(&request.audio_base64)?;

    let started = Instant::now();
    let transcribed = state.transcriber.transcribe(&audio, &request.mime_type).await;
    record_speech_latency(started.elapsed());
    let transcription = transcribed?;

    Ok(Json(TranscribeResponse {
        text: transcription.text,
    }))
}

fn decode_audio(audio_base64: &str) -> Result<Vec<u8>, ApiError> {
    BASE64
        .decode(audio_base64)
        .map_err(|e| Error::InvalidRequest(format!("invalid audio_base64: {e}")).into())
}

/// Serve a cached synthesized clip
async fn get_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let clip = state.audio.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(([(header::CONTENT_TYPE, clip.mime_type)], clip.audio))
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check: probes the chat-completion backend
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let model_ready = state.backend.is_available().await;
    let status = if model_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if model_ready { "ready" } else { "degraded" },
            "model": model_ready,
        })),
    )
}
