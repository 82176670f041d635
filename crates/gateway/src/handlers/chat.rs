//! Chat handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use mathforge_common::errors::{AppError, Result};

/// One question from one user
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,

    #[validate(length(max = 4000))]
    pub question: String,
}

/// The user's conversation log after this exchange
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub chat_history: Vec<String>,
}

/// Run one tutoring turn
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: e.field_errors().keys().next().map(|field| field.to_string()),
    })?;

    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::Validation {
            message: "user_id must not be blank".to_string(),
            field: Some("user_id".to_string()),
        });
    }

    let turns = state.tutor.handle(user_id, &request.question).await;

    tracing::info!(
        user_id = %user_id,
        turns = turns.len(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Chat turn completed"
    );

    Ok(Json(ChatResponse {
        chat_history: turns.iter().map(ToString::to_string).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post_chat(app: &Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_chat_returns_history() {
        let app = test_support::router(test_support::state());
        let (status, body) =
            post_chat(&app, json!({"user_id": "alice", "question": "Solve 2x + 3 = 13"})).await;

        assert_eq!(status, StatusCode::OK);
        let history: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(history.chat_history.len(), 2);
        assert_eq!(history.chat_history[0], "User: Solve 2x + 3 = 13");
        assert!(history.chat_history[1].starts_with("Bot: "));
        assert!(history.chat_history[1].ends_with("**Computed Solution:** x = [5]"));
    }

    #[tokio::test]
    async fn test_history_accumulates_and_is_capped() {
        let app = test_support::router(test_support::state());
        for question in ["Factorize x^2 + 5x + 6", "Expand (x+3)(x-2)", "mean of 1, 2, 3"] {
            post_chat(&app, json!({"user_id": "bob", "question": question})).await;
        }

        let (_, body) = post_chat(&app, json!({"user_id": "bob", "question": "hello"})).await;
        let history = body["chat_history"].as_array().unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[3], "User: hello");

        let (_, other) = post_chat(&app, json!({"user_id": "carol", "question": "hello"})).await;
        assert_eq!(other["chat_history"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_question_still_answers() {
        let app = test_support::router(test_support::state());
        let (status, body) = post_chat(&app, json!({"user_id": "dave", "question": ""})).await;

        assert_eq!(status, StatusCode::OK);
        let bot = body["chat_history"][1].as_str().unwrap();
        assert!(bot.ends_with("I am not sure how to solve this."));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = test_support::router(test_support::state());

        let (status, body) = post_chat(&app, json!({"user_id": "", "question": "solve x = 1"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "user_id");

        let (status, _) = post_chat(&app, json!({"user_id": "   ", "question": "x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let long = "x".repeat(4001);
        let (status, body) = post_chat(&app, json!({"user_id": "eve", "question": long})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "question");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = test_support::router(test_support::state());
        let (status, _) = post_chat(&app, json!({"question": "no user"})).await;
        assert!(status.is_client_error());
    }
}
