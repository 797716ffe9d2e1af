//! Runtime types.

use serde::{Deserialize, Serialize};

use mindful_protocol::EmotionAssessment;

pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a session. Alternation is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Incoming chat message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

impl ChatRequest {
    pub fn session_id(&self) -> &str {
        self.session_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SESSION_ID)
    }
}

/// Reply to a chat message. Small-talk replies carry neither
/// `emotion_analysis` nor `is_crisis`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponsePayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_analysis: Option<EmotionAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_crisis: Option<bool>,
    pub is_small_talk: bool,
}

impl ChatResponsePayload {
    pub fn small_talk(message: String) -> Self {
        Self {
            message,
            emotion_analysis: None,
            is_crisis: None,
            is_small_talk: true,
        }
    }

    pub fn grounded(message: String, emotion: EmotionAssessment, is_crisis: bool) -> Self {
        Self {
            message,
            emotion_analysis: Some(emotion),
            is_crisis: Some(is_crisis),
            is_small_talk: false,
        }
    }
}
