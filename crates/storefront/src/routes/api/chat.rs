//! Chat widget endpoints.
//!
//! Both answer JSON. `ask` forwards to the backend intent router;
//! `assistant` answers locally and keeps the conversation in the session.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::ChatReply;
use crate::chat::{AssistantAnswer, ChatTurn, FALLBACK_ANSWER, push_turn};
use crate::middleware::OptionalAuth;
use crate::models::keys;
use crate::state::AppState;

/// Longest message accepted from the widget, in characters.
pub const MAX_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

/// Trimmed message, or the error shown under the input.
fn clean_message(raw: &str) -> Result<&str, &'static str> {
    let message = raw.trim();
    if message.is_empty() {
        return Err("Vui lòng nhập câu hỏi");
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err("Câu hỏi quá dài");
    }
    Ok(message)
}

/// Intent-router widget: relay to the backend's `/chat/ask`.
///
/// Backend failures still answer 200 with the fallback text so the widget
/// always has a bubble to show.
#[instrument(skip_all)]
pub async fn ask(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<ChatRequest>,
) -> Response {
    let message = match clean_message(&request.message) {
        Ok(message) => message,
        Err(error) => return reject(StatusCode::BAD_REQUEST, error),
    };

    let token = user.as_ref().map(|u| u.token.as_str());
    match state.backend().chat_ask(token, message).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Chat intent router failed");
            Json(ChatReply {
                reply: FALLBACK_ANSWER.to_string(),
                actions: Vec::new(),
            })
            .into_response()
        }
    }
}

/// Assistant widget: keyword table, then Gemini, then the fallback.
#[instrument(skip_all)]
pub async fn assistant(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ChatRequest>,
) -> Response {
    let message = match clean_message(&request.message) {
        Ok(message) => message,
        Err(error) => return reject(StatusCode::BAD_REQUEST, error),
    };

    let mut history: Vec<ChatTurn> = session
        .get(keys::CHAT_HISTORY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    let answer: AssistantAnswer = state.assistant().answer(&history, message).await;
    tracing::debug!(source = ?answer.source, "Assistant answered");

    push_turn(&mut history, ChatTurn::user(message));
    push_turn(&mut history, ChatTurn::assistant(answer.reply.clone()));
    if let Err(e) = session.insert(keys::CHAT_HISTORY, &history).await {
        tracing::warn!(error = %e, "Failed to store chat history");
    }

    Json(answer).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_message_trims() {
        assert_eq!(clean_message("  phí ship?  "), Ok("phí ship?"));
    }

    #[test]
    fn test_clean_message_rejects_empty_and_long() {
        assert!(clean_message("   ").is_err());
        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(clean_message(&long), Err("Câu hỏi quá dài"));
        assert!(clean_message(&"ă".repeat(MAX_MESSAGE_CHARS)).is_ok());
    }
}
