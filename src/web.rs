//! HTTP 接入层
//!
//! POST /chat 校验 session_id、净化消息文本，然后把编排器产出的逐词流
//! 原样转发为 text/plain 流式响应（不重排、不额外缓冲）。

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures_util::StreamExt;
use regex::Regex;
use serde::Deserialize;

use crate::dialogue::DialogueAgent;

/// 接入层共享状态
pub struct AppState {
    pub agent: DialogueAgent,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

/// 创建路由
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

/// 会话 ID：字母数字、连字符、下划线，1~100 字符
pub fn is_valid_session_id(session_id: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9_-]{1,100}$")
        .unwrap()
        .is_match(session_id)
}

/// 消息净化：压缩空白并截断到 1000 字符
pub fn sanitize_message(message: &str) -> String {
    let collapsed = message.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(1000).collect()
}

/// POST /chat：流式返回智能体回复
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, (StatusCode, &'static str)> {
    if !is_valid_session_id(&request.session_id) {
        return Err((StatusCode::BAD_REQUEST, "Invalid session ID"));
    }

    let message = sanitize_message(&request.message);
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message cannot be empty"));
    }

    let reply = state.agent.process_message(&request.session_id, &message).await;
    let stream = reply.map(|fragment| Ok::<_, Infallible>(Bytes::from(fragment)));

    let mut response = Response::new(Body::from_stream(stream));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        "text/plain; charset=utf-8".parse().unwrap(),
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_session_ids() {
        assert!(is_valid_session_id("user-123"));
        assert!(is_valid_session_id("a"));
        assert!(is_valid_session_id(&"x".repeat(100)));
    }

    #[test]
    fn test_invalid_session_ids() {
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("has space"));
        assert!(!is_valid_session_id("semi;colon"));
        assert!(!is_valid_session_id(&"x".repeat(101)));
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_message("  hello \n  world  "), "hello world");
        assert_eq!(sanitize_message("\t\n "), "");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(2000);
        assert_eq!(sanitize_message(&long).len(), 1000);
    }
}
