//! Emergency assistant endpoints
//!
//! `POST /chat` always answers: either the assistant's reply or the static
//! helpline message, tagged with why the fallback was used.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::assistant::{AssistantReply, AssistantStatus, FallbackReason};
use crate::types::ValidationError;
use crate::{error::ApiResult, AppState};

/// POST /chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatData {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl From<AssistantReply> for ChatData {
    fn from(reply: AssistantReply) -> Self {
        match reply {
            AssistantReply::Answer {
                text,
                model,
                duration_ms,
            } => Self {
                response: text,
                model: Some(model),
                is_fallback: false,
                fallback_reason: None,
                duration_ms: Some(duration_ms),
            },
            AssistantReply::Fallback { text, reason } => Self {
                response: text.to_string(),
                model: None,
                is_fallback: true,
                fallback_reason: Some(reason),
                duration_ms: None,
            },
        }
    }
}

/// POST /chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub data: ChatData,
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ValidationError::EmptyMessage.into());
    }

    let reply = match &state.assistant {
        Some(assistant) => assistant.ask(message).await,
        None => AssistantReply::fallback(FallbackReason::Unreachable),
    };

    Ok(Json(ChatResponse {
        success: true,
        data: ChatData::from(reply),
    }))
}

/// GET /chat/health response
#[derive(Debug, Serialize)]
pub struct ChatHealthResponse {
    pub success: bool,
    pub data: Option<AssistantStatus>,
}

/// GET /chat/health
///
/// 503 when the assistant is offline or not configured.
pub async fn chat_health(State(state): State<AppState>) -> Response {
    let status = match &state.assistant {
        Some(assistant) => Some(assistant.probe().await),
        None => None,
    };

    let online = status.as_ref().is_some_and(|s| s.online);
    let code = if online {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(ChatHealthResponse {
            success: online,
            data: status,
        }),
    )
        .into_response()
}

/// Build assistant routes
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/health", get(chat_health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_chat_data() {
        let data = ChatData::from(AssistantReply::fallback(FallbackReason::Timeout));
        assert!(data.is_fallback);
        assert!(data.response.contains("112"));
        let value = serde_json::to_value(&data).unwrap();
        assert!(value.get("model").is_none());
        assert_eq!(value["fallback_reason"]["kind"], "timeout");
    }
}
