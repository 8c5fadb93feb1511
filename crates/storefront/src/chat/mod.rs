//! Shopping assistant widget.
//!
//! Answers come from, in order:
//! 1. the keyword table of canned answers
//! 2. Gemini, when configured
//! 3. a fixed fallback message
//!
//! The intent-router widget is separate: it is answered by the backend's
//! `/chat/ask` endpoint through [`crate::backend::BackendClient::chat_ask`].

mod gemini;
mod keywords;

pub use gemini::{GeminiClient, GeminiError, SYSTEM_INSTRUCTION};
pub use keywords::{KeywordEntry, KeywordTable, fold};

use serde::{Deserialize, Serialize};

/// Turns kept in the session and sent to Gemini as context.
pub const MAX_HISTORY: usize = 10;

/// Reply used when nothing else could answer.
pub const FALLBACK_ANSWER: &str = "Xin lỗi, mình chưa hiểu câu hỏi của bạn. \
    Bạn có thể gọi hotline 1900 6868 để được nhân viên hỗ trợ trực tiếp.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message of the assistant conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Append a turn, dropping the oldest beyond [`MAX_HISTORY`].
pub fn push_turn(history: &mut Vec<ChatTurn>, turn: ChatTurn) {
    history.push(turn);
    if history.len() > MAX_HISTORY {
        let excess = history.len() - MAX_HISTORY;
        history.drain(..excess);
    }
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Keyword,
    Gemini,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantAnswer {
    pub reply: String,
    pub source: AnswerSource,
}

/// Keyword table with an optional Gemini fallback.
#[derive(Clone)]
pub struct ChatAssistant {
    keywords: KeywordTable,
    gemini: Option<GeminiClient>,
}

impl ChatAssistant {
    #[must_use]
    pub const fn new(keywords: KeywordTable, gemini: Option<GeminiClient>) -> Self {
        Self { keywords, gemini }
    }

    #[must_use]
    pub const fn has_gemini(&self) -> bool {
        self.gemini.is_some()
    }

    /// Answer `message`, given the earlier turns of the conversation.
    ///
    /// Never fails: Gemini errors are logged and replaced by the fallback.
    pub async fn answer(&self, history: &[ChatTurn], message: &str) -> AssistantAnswer {
        if let Some(entry) = self.keywords.best_match(message) {
            tracing::debug!(topic = entry.topic, "Assistant keyword match");
            return AssistantAnswer {
                reply: entry.answer.to_string(),
                source: AnswerSource::Keyword,
            };
        }

        if let Some(gemini) = &self.gemini {
            match gemini.generate(history, message).await {
                Ok(reply) => {
                    return AssistantAnswer {
                        reply,
                        source: AnswerSource::Gemini,
                    };
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Gemini request failed, using fallback answer");
                }
            }
        }

        AssistantAnswer {
            reply: FALLBACK_ANSWER.to_string(),
            source: AnswerSource::Fallback,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_push_turn_keeps_last_ten() {
        let mut history = Vec::new();
        for i in 0..13 {
            push_turn(&mut history, ChatTurn::user(format!("msg {i}")));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].text, "msg 3");
        assert_eq!(history[9].text, "msg 12");
    }

    #[test]
    fn test_turn_serializes_role_lowercase() {
        let json = serde_json::to_string(&ChatTurn::assistant("hi")).unwrap_or_default();
        assert_eq!(json, r#"{"role":"assistant","text":"hi"}"#);
    }

    #[tokio::test]
    async fn test_keyword_answer_first() {
        let assistant = ChatAssistant::new(KeywordTable::default(), None);
        let answer = assistant.answer(&[], "Bảo hành bao lâu vậy shop?").await;
        assert_eq!(answer.source, AnswerSource::Keyword);
        assert!(answer.reply.contains("12 tháng"));
    }

    #[tokio::test]
    async fn test_fallback_without_gemini() {
        let assistant = ChatAssistant::new(KeywordTable::default(), None);
        let answer = assistant.answer(&[], "iPhone 15 có màu gì?").await;
        assert_eq!(answer.source, AnswerSource::Fallback);
        assert_eq!(answer.reply, FALLBACK_ANSWER);
    }
}
