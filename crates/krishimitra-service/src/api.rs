//! REST API endpoints for the krishimitra-service.
//!
//! Two groups of routes share one router:
//!
//! - The stateless assistant endpoints (`/`, `/chat`, `/detect-disease`,
//!   `/prices`, `/weather`), which keep the request and response shapes the
//!   web client already speaks.
//! - The `/api` endpoints, which expose the full price query (search,
//!   multi-select filters, sort, facets, CSV export) and server-held chat
//!   sessions with delayed replies.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Input the
//! engines refuse maps to 400, a pending chat reply to 409, an oversized upload
//! to 413 and a full session registry to 503. Store failures return 500.
//!
//! # Example
//!
//! ```ignore
//! use krishimitra_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use krishimitra_core::{Conversation, SessionSnapshot, weather};
use krishimitra_store::{
    EmptyState, Facets, FilterDimension, PriceQuery, RecordStore, SortDirection, SortField, SortKey,
};
use krishimitra_types::{
    ChatTurn, DetectionResult, Language, ParseError, PriceRecord, Trend, WeatherReport,
};

use crate::state::{AppState, SessionLimitReached};

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Assistant endpoints
        .route("/", get(root))
        .route("/chat", post(chat))
        .route(
            "/detect-disease",
            post(detect_disease).layer(DefaultBodyLimit::disable()),
        )
        .route("/prices", get(legacy_prices))
        .route("/weather", get(get_weather))
        // Health
        .route("/api/health", get(health))
        // Price queries
        .route("/api/prices", get(list_prices))
        .route("/api/prices/facets", get(price_facets))
        .route("/api/prices/export", get(export_prices))
        // Chat sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/messages", post(send_message))
        .route("/api/sessions/{id}/language", put(set_language))
        .route("/api/sessions/{id}/reset", post(reset_session))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to KrishiMitra AI API" }))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

// ==========================================================================
// Chat
// ==========================================================================

/// One-shot chat request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Language code; anything other than `hi` answers in English.
    #[serde(default)]
    pub language: String,
}

/// One-shot chat response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub suggestions: Vec<String>,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let language = Language::from_code_or_default(&request.language);
    let responder = &state.responder;
    let response = responder.reply(&request.message, language).to_string();
    debug!(
        "Chat ({}) matched rule: {}",
        language,
        responder.matching_rule(&request.message).is_some()
    );

    Json(ChatResponse {
        response,
        suggestions: responder
            .suggestions()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

// ==========================================================================
// Disease detection
// ==========================================================================

/// Read the `file` field chunk by chunk, refusing it once it grows past the
/// scanner's limit.
async fn detect_disease(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<DetectionResult>, AppError> {
    let scanner = &state.scanner;
    let max = scanner.max_upload_bytes();

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        // Format is checked before any bytes are read.
        scanner.validate(&file_name, 1)?;

        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await? {
            size = size.saturating_add(chunk.len() as u64);
            if size > max {
                warn!("Upload {} exceeded {} bytes", file_name, max);
                return Err(krishimitra_core::Error::ImageTooLarge { size, max }.into());
            }
        }

        let result = scanner.scan(&file_name, size)?;
        info!(
            "Scanned {} ({} bytes): {} at {}%",
            file_name, size, result.disease, result.confidence
        );
        return Ok(Json(result));
    }

    Err(AppError::BadRequest(
        "Missing multipart field 'file'".to_string(),
    ))
}

// ==========================================================================
// Prices
// ==========================================================================

/// Query parameters for the single-value price lookup.
#[derive(Debug, Default, Deserialize)]
pub struct LegacyPriceParams {
    pub crop: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
}

/// Each given parameter is a case-insensitive exact match.
async fn legacy_prices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LegacyPriceParams>,
) -> Json<Vec<PriceRecord>> {
    let store = &state.store;
    let mut query = PriceQuery::new();
    for (dimension, value) in [
        (FilterDimension::Crop, &params.crop),
        (FilterDimension::State, &params.state),
        (FilterDimension::Market, &params.market),
    ] {
        if let Some(value) = value.as_deref().map(str::trim)
            && !value.is_empty()
        {
            select(&mut query, store, dimension, value);
        }
    }

    let view = store.query(&query);
    Json(view.records.into_iter().cloned().collect())
}

/// Query parameters for `/api/prices` and `/api/prices/export`.
///
/// Multi-valued filters are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct PriceListParams {
    pub search: Option<String>,
    pub crop: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub trend: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

impl PriceListParams {
    /// Build a store query, matching selections against the store's own
    /// spelling of each value.
    fn to_query(&self, store: &RecordStore) -> Result<PriceQuery, ParseError> {
        let mut query = PriceQuery::new();
        if let Some(search) = &self.search {
            query = query.search(search.trim());
        }

        for (dimension, values) in [
            (FilterDimension::Crop, &self.crop),
            (FilterDimension::State, &self.state),
            (FilterDimension::Market, &self.market),
        ] {
            for value in split_list(values.as_deref()) {
                select(&mut query, store, dimension, value);
            }
        }
        for value in split_list(self.trend.as_deref()) {
            query = query.trend(value.parse::<Trend>()?);
        }

        let direction = match self.direction.as_deref() {
            Some(direction) => direction.parse::<SortDirection>()?,
            None => SortDirection::default(),
        };
        if let Some(field) = self.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.sort(Some(SortKey {
                field: field.parse::<SortField>()?,
                direction,
            }));
        }

        Ok(query)
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Add `value` to a selection set. Values the store does not hold are kept
/// as typed so they match nothing.
fn select(query: &mut PriceQuery, store: &RecordStore, dimension: FilterDimension, value: &str) {
    let value = store
        .canonical(dimension, value)
        .unwrap_or_else(|| value.to_string());
    let filter = &mut query.filter;
    match dimension {
        FilterDimension::Crop => filter.crops.insert(value),
        FilterDimension::State => filter.states.insert(value),
        FilterDimension::Market => filter.markets.insert(value),
        FilterDimension::Trend => match value.parse::<Trend>() {
            Ok(trend) => filter.trends.insert(trend),
            Err(_) => false,
        },
    };
}

/// Why a price view is empty, with the text to show.
#[derive(Debug, Serialize)]
pub struct EmptyInfo {
    pub kind: EmptyState,
    pub message: &'static str,
}

/// Price view envelope.
#[derive(Debug, Serialize)]
pub struct PriceListResponse {
    pub data: Vec<PriceRecord>,
    pub count: usize,
    pub total: usize,
    pub empty: Option<EmptyInfo>,
}

async fn list_prices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceListParams>,
) -> Result<Json<PriceListResponse>, AppError> {
    let query = params.to_query(&state.store)?;
    let view = state.store.query(&query);

    Ok(Json(PriceListResponse {
        count: view.count(),
        total: view.total,
        empty: view.empty_state().map(|kind| EmptyInfo {
            kind,
            message: kind.message(),
        }),
        data: view.records.into_iter().cloned().collect(),
    }))
}

async fn price_facets(State(state): State<Arc<AppState>>) -> Json<Facets> {
    Json(state.store.facets())
}

async fn export_prices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.to_query(&state.store)?;
    let view = state.store.query(&query);
    let csv = RecordStore::export_csv_string(&view.records)?;
    debug!("Exported {} price records", view.count());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"prices.csv\"",
            ),
        ],
        csv,
    ))
}

// ==========================================================================
// Weather
// ==========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    pub location: Option<String>,
}

async fn get_weather(Query(params): Query<WeatherParams>) -> Json<WeatherReport> {
    let location = params
        .location
        .as_deref()
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .unwrap_or(weather::DEFAULT_LOCATION);
    Json(weather::generate(location))
}

// ==========================================================================
// Chat sessions
// ==========================================================================

/// Request to open a session.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Language code; the configured default when absent.
    #[serde(default)]
    pub language: Option<String>,
}

/// Request to send a message in a session.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// Request to switch a session's language.
#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    request: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let language = request
        .and_then(|Json(request)| request.language)
        .map(|code| Language::from_code_or_default(&code));
    let options = state.config.chat.conversation_options(language);

    let conversation = state
        .sessions
        .create(Arc::clone(&state.responder), options)
        .await?;
    info!("Opened chat session {}", conversation.id());

    Ok((StatusCode::CREATED, Json(conversation.snapshot().await)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let conversation = find_session(&state, id).await?;
    Ok(Json(conversation.snapshot().await))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatTurn>), AppError> {
    let conversation = find_session(&state, id).await?;
    let turn = conversation.send(&request.message).await?;
    Ok((StatusCode::ACCEPTED, Json(turn)))
}

async fn set_language(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<LanguageRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let conversation = find_session(&state, id).await?;
    let language = Language::from_code_or_default(&request.language);
    Ok(Json(conversation.set_language(language).await?))
}

async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let conversation = find_session(&state, id).await?;
    Ok(Json(conversation.reset().await?))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        info!("Closed chat session {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Conversation>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| session_not_found(id))
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session not found: {}", id))
}

// ==========================================================================
// Errors
// ==========================================================================

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    PayloadTooLarge(String),
    ServiceUnavailable(String),
    Store(krishimitra_store::Error),
    Internal(String),
}

impl From<krishimitra_store::Error> for AppError {
    fn from(e: krishimitra_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<SessionLimitReached> for AppError {
    fn from(e: SessionLimitReached) -> Self {
        AppError::ServiceUnavailable(e.to_string())
    }
}

impl From<krishimitra_core::Error> for AppError {
    fn from(e: krishimitra_core::Error) -> Self {
        use krishimitra_core::Error;

        let message = e.to_string();
        match e {
            Error::EmptyMessage
            | Error::MessageTooLong { .. }
            | Error::UnsupportedImage(_)
            | Error::EmptyImage => AppError::BadRequest(message),
            Error::ReplyPending | Error::StaleReply(_) => AppError::Conflict(message),
            Error::ImageTooLarge { .. } => AppError::PayloadTooLarge(message),
            Error::Closed => AppError::NotFound(message),
            _ => AppError::Internal(message),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        let message = e.body_text();
        match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(message),
            status if status.is_client_error() => AppError::BadRequest(message),
            _ => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
