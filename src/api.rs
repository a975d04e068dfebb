//! REST API for the margin assistant
//!
//! Exposes the chat interpreter, the session exchange rates and the form
//! calculators over HTTP.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::calculator::{Field, MarginWorksheet, PricingRequest};
use crate::chat;
use crate::error::AssistantError;
use crate::session::{known_session_id, session_id, SessionStore};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub chat_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct RateParams {
    pub chat_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarginRequest {
    pub chat_id: Option<String>,
    #[serde(default)]
    pub worksheet: MarginWorksheet,
    /// Field being edited; absent for a plain recompute
    pub edit: Option<Field>,
    pub value: Option<f64>,
    /// Clear the worksheet before anything else
    #[serde(default)]
    pub reset: bool,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn failure(status: StatusCode, error: AssistantError) -> ApiResult {
    (status, Json(ApiResponse::error(error.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionStore>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.sessions.len().await,
        "market_rate": state.sessions.market().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> ApiResult {
    let Some(user_msg) = req.messages.iter().rev().find(|m| m.role == "user") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No user message found".into())),
        );
    };

    let chat_id = session_id(req.chat_id.as_deref());
    let session = state.sessions.get_or_create(chat_id).await;

    // interpretation runs under the write lock so "set rate" is atomic
    let reply = {
        let mut rates = session.write().await;
        chat::reply(&user_msg.content, &mut rates)
    };

    let Some(reply) = reply else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Message is empty".into())),
        );
    };

    info!(
        chat_id = %chat_id,
        matched = reply.matched,
        state_changed = reply.state_changed,
        "chat reply"
    );

    let mut data = serde_json::json!(reply);
    data["chat_id"] = serde_json::json!(chat_id.to_string());
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

/// =============================
/// Exchange Rate Endpoint
/// =============================

async fn rate_handler(State(state): State<ApiState>, Query(params): Query<RateParams>) -> ApiResult {
    let Some(chat_id) = known_session_id(params.chat_id.as_deref()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("chat_id is required".into())),
        );
    };

    match state.sessions.get(chat_id).await {
        Ok(session) => {
            let snapshot = session.read().await.snapshot();
            (StatusCode::OK, Json(ApiResponse::success(snapshot)))
        }
        Err(e) => failure(StatusCode::NOT_FOUND, e),
    }
}

/// =============================
/// Calculator Endpoints
/// =============================

async fn margin_handler(State(state): State<ApiState>, Json(req): Json<MarginRequest>) -> ApiResult {
    let mut worksheet = req.worksheet;
    if req.reset {
        worksheet.reset();
    }
    if let Some(field) = req.edit {
        worksheet.edit(field, req.value);
    }

    // read-only: an unknown chat prices with the rates a new chat would get
    let rates = state
        .sessions
        .rates_for(known_session_id(req.chat_id.as_deref()))
        .await;
    let revenue_usd = worksheet.revenue_usd(&rates);

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "worksheet": worksheet,
            "revenue_usd": revenue_usd,
            "profit": worksheet.profit(),
            "markup": worksheet.markup(),
        }))),
    )
}

async fn pricing_handler(Json(req): Json<PricingRequest>) -> ApiResult {
    match req.quote() {
        Ok(quote) => (StatusCode::OK, Json(ApiResponse::success(quote))),
        Err(e) => failure(StatusCode::UNPROCESSABLE_ENTITY, e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(sessions: Arc<SessionStore>) -> Router {
    let state = ApiState { sessions };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/rate", get(rate_handler))
        .route("/api/calculators/margin", post(margin_handler))
        .route("/api/calculators/pricing", post(pricing_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(sessions: Arc<SessionStore>, port: u16) -> crate::Result<()> {
    let router = create_router(sessions);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn chat(chat_id: &str, content: &str) -> Request<Body> {
        post_json(
            "/api/chat",
            json!({
                "chat_id": chat_id,
                "messages": [
                    {"role": "assistant", "content": "hi"},
                    {"role": "user", "content": content}
                ]
            }),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(Arc::new(SessionStore::default()));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_chat_answers_last_user_message() {
        let router = create_router(Arc::new(SessionStore::default()));
        let (status, body) = call(router, chat("c1", "30% of 130")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["answer"], "**39.00**");
        assert_eq!(body["data"]["matched"], true);
    }

    #[tokio::test]
    async fn test_rate_override_is_per_chat() {
        let sessions = Arc::new(SessionStore::default());
        let router = create_router(sessions.clone());

        let (_, body) = call(router.clone(), chat("c1", "set rate 1.40")).await;
        assert_eq!(body["data"]["state_changed"], true);

        let (_, body) = call(router.clone(), chat("c1", "convert 100 usd to cad")).await;
        assert_eq!(body["data"]["answer"], "**$140.00 CAD**");

        let (_, body) = call(router.clone(), chat("c2", "convert 100 usd to cad")).await;
        assert_eq!(body["data"]["answer"], "**$139.00 CAD**");

        let request = Request::builder()
            .uri("/api/rate?chat_id=c1")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["manual_override_rate"], 1.4);
    }

    #[tokio::test]
    async fn test_chat_fallback_and_bad_requests() {
        let router = create_router(Arc::new(SessionStore::default()));

        let (status, body) = call(router.clone(), chat("c1", "tell me a joke")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["matched"], false);
        assert_eq!(body["data"]["answer"], chat::FALLBACK_HELP);

        let (status, _) = call(router.clone(), chat("c1", "   ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = post_json("/api/chat", json!({"messages": []}));
        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_anonymous_chats_do_not_share_overrides() {
        let router = create_router(Arc::new(SessionStore::default()));
        let anonymous = |content: &str| {
            post_json(
                "/api/chat",
                json!({"messages": [{"role": "user", "content": content}]}),
            )
        };

        let (_, first) = call(router.clone(), anonymous("set rate 2")).await;
        assert_eq!(first["data"]["state_changed"], true);

        let (_, second) = call(router, anonymous("convert 100 usd to cad")).await;
        assert_eq!(second["data"]["answer"], "**$139.00 CAD**");
        assert_ne!(first["data"]["chat_id"], second["data"]["chat_id"]);
    }

    #[tokio::test]
    async fn test_margin_calculator_does_not_create_sessions() {
        let sessions = Arc::new(SessionStore::default());
        let router = create_router(sessions.clone());

        let request = post_json(
            "/api/calculators/margin",
            json!({"chat_id": "drive-by", "worksheet": {"cost": 60.0}, "edit": "margin", "value": 40.0}),
        );
        let (status, _) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_session_rate() {
        let router = create_router(Arc::new(SessionStore::default()));
        let request = Request::builder()
            .uri("/api/rate?chat_id=nobody")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(router.clone(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::builder().uri("/api/rate").body(Body::empty()).unwrap();
        let (status, _) = call(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_calculators() {
        let router = create_router(Arc::new(SessionStore::default()));

        let request = post_json(
            "/api/calculators/margin",
            json!({"worksheet": {"cost": 60.0}, "edit": "margin", "value": 40.0}),
        );
        let (status, body) = call(router.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["worksheet"]["revenue"], 100.0);
        assert_eq!(body["data"]["revenue_usd"], 72.0);
        assert_eq!(body["data"]["profit"], 40.0);

        let request = post_json(
            "/api/calculators/margin",
            json!({"worksheet": {"cost": 60.0, "margin": 40.0, "revenue": 100.0}, "reset": true}),
        );
        let (status, body) = call(router.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["worksheet"]["cost"], Value::Null);
        assert_eq!(body["data"]["revenue_usd"], 0.0);

        let request = post_json("/api/calculators/pricing", json!({"cost": 100.0}));
        let (status, body) = call(router.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["price_a"], 147.14);

        let request = post_json("/api/calculators/pricing", json!({"cost": 0.0}));
        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
    }
}
