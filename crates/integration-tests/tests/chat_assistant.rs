//! Assistant widget answer chain with a mocked Gemini API.

#![allow(clippy::unwrap_used)]

use mobistore_integration_tests::{GEMINI_PATH, gemini_config};
use mobistore_storefront::chat::{
    AnswerSource, ChatAssistant, ChatTurn, FALLBACK_ANSWER, GeminiClient, GeminiError,
    KeywordTable,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    })
}

fn assistant_with_gemini(server: &MockServer) -> ChatAssistant {
    let gemini = GeminiClient::new(&gemini_config(server)).unwrap();
    ChatAssistant::new(KeywordTable::default(), Some(gemini))
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_sends_history_with_model_role() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "Chào shop" }] },
                { "role": "model", "parts": [{ "text": "Chào bạn!" }] },
                { "role": "user", "parts": [{ "text": "iPhone 15 có màu gì?" }] }
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("  iPhone 15 có 5 màu: đen, xanh, vàng, hồng, xanh lá.\n")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&gemini_config(&server)).unwrap();
    let history = vec![ChatTurn::user("Chào shop"), ChatTurn::assistant("Chào bạn!")];

    let text = client
        .generate(&history, "iPhone 15 có màu gì?")
        .await
        .unwrap();
    assert_eq!(text, "iPhone 15 có 5 màu: đen, xanh, vàng, hồng, xanh lá.");
}

#[tokio::test]
async fn generate_reports_api_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&gemini_config(&server)).unwrap();
    let err = client.generate(&[], "xin chào").await.unwrap_err();

    match err {
        GeminiError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn generate_without_candidates_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&gemini_config(&server)).unwrap();
    let err = client.generate(&[], "xin chào").await.unwrap_err();
    assert!(matches!(err, GeminiError::Empty));
}

// ---------------------------------------------------------------------------
// ChatAssistant
// ---------------------------------------------------------------------------

#[tokio::test]
async fn keyword_answer_skips_gemini() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("không dùng")))
        .expect(0)
        .mount(&server)
        .await;

    let assistant = assistant_with_gemini(&server);
    let answer = assistant.answer(&[], "Bảo hành bao lâu vậy shop?").await;

    assert_eq!(answer.source, AnswerSource::Keyword);
}

#[tokio::test]
async fn unmatched_question_goes_to_gemini() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("Có màu hồng ạ.")))
        .expect(1)
        .mount(&server)
        .await;

    let assistant = assistant_with_gemini(&server);
    let answer = assistant.answer(&[], "iPhone 15 có màu hồng không?").await;

    assert_eq!(answer.source, AnswerSource::Gemini);
    assert_eq!(answer.reply, "Có màu hồng ạ.");
}

#[tokio::test]
async fn gemini_failure_falls_back_to_fixed_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let assistant = assistant_with_gemini(&server);
    let answer = assistant.answer(&[], "iPhone 15 có màu hồng không?").await;

    assert_eq!(answer.source, AnswerSource::Fallback);
    assert_eq!(answer.reply, FALLBACK_ANSWER);
}
