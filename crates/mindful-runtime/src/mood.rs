//! Mood questionnaire, mood analysis and conversation starters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use mindful_chat::json::{fenced_or_outermost, parse_structured};
use mindful_chat::{prompts, CompletionModel, ParseOutcome};
use mindful_core::{Error, Result};

pub const DEFAULT_NUM_QUESTIONS: usize = 5;
pub const MAX_NUM_QUESTIONS: usize = 20;

const DEFAULT_INTRODUCTION: &str =
    "Let's take a quick, lighthearted check-in on how you're feeling today.";
const DEFAULT_CONCLUSION: &str =
    "Thanks for sharing! Whatever you're feeling right now is valid.";

fn default_introduction() -> String {
    DEFAULT_INTRODUCTION.into()
}
fn default_conclusion() -> String {
    DEFAULT_CONCLUSION.into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    pub score: i64,
    pub mood_indicator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodQuestion {
    pub question_id: String,
    pub question_text: String,
    pub question_type: String,
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodQuestionnaire {
    #[serde(default = "default_introduction")]
    pub introduction: String,
    pub questions: Vec<MoodQuestion>,
    #[serde(default = "default_conclusion")]
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    pub primary_emotion: String,
    pub primary_confidence: f64,
    pub secondary_emotion: String,
    pub secondary_confidence: f64,
    pub tertiary_emotion: String,
    pub tertiary_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAnalysis {
    pub mood_assessment: String,
    pub emotion_profile: EmotionProfile,
    pub conversation_starter: String,
    pub recommended_tone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationReply {
    pub response_text: String,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

/// Result of asking for a conversation starter.
#[derive(Debug, Clone, PartialEq)]
pub enum StarterOutcome {
    Reply(ConversationReply),
    /// The reply contained no JSON at all.
    NoJson,
    /// JSON was found but did not have the expected shape.
    InvalidJson(String),
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

pub struct MoodService {
    model: Arc<dyn CompletionModel>,
}

impl MoodService {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub async fn generate_questionnaire(&self, num_questions: usize) -> Result<MoodQuestionnaire> {
        if num_questions == 0 || num_questions > MAX_NUM_QUESTIONS {
            return Err(Error::Validation(format!(
                "num_questions must be between 1 and {}",
                MAX_NUM_QUESTIONS
            )));
        }

        let raw = self.model.complete(&prompts::mood_questions(num_questions)).await?;
        match parse_structured::<MoodQuestionnaire>(&raw) {
            ParseOutcome::Failed(reason) => Err(Error::Parse(format!(
                "Failed to generate valid questionnaire: {}",
                reason
            ))),
            outcome => {
                let questionnaire = outcome.into_result()?;
                if questionnaire.questions.len() != num_questions {
                    warn!(
                        "Asked for {} questions, model produced {}",
                        num_questions,
                        questionnaire.questions.len()
                    );
                }
                info!("Generated questionnaire with {} questions", questionnaire.questions.len());
                Ok(questionnaire)
            }
        }
    }

    /// `responses` is passed to the model as pretty-printed JSON.
    pub async fn analyze_responses(&self, responses: &Value) -> Result<MoodAnalysis> {
        if is_empty_json(responses) {
            return Err(Error::Validation("No responses provided".into()));
        }
        let rendered = serde_json::to_string_pretty(responses)?;
        let raw = self.model.complete(&prompts::mood_analysis(&rendered)).await?;
        parse_structured::<MoodAnalysis>(&raw).into_result()
    }

    pub async fn start_conversation(
        &self,
        mood_analysis: &Value,
        user_message: &str,
    ) -> Result<StarterOutcome> {
        if is_empty_json(mood_analysis) {
            return Err(Error::Validation("No mood analysis provided".into()));
        }
        let rendered = serde_json::to_string_pretty(mood_analysis)?;
        let raw = self
            .model
            .complete(&prompts::conversation_starter(&rendered, user_message))
            .await?;

        let Some(candidate) = fenced_or_outermost(&raw) else {
            return Ok(StarterOutcome::NoJson);
        };
        Ok(match serde_json::from_str::<ConversationReply>(candidate) {
            Ok(reply) => StarterOutcome::Reply(reply),
            Err(e) => StarterOutcome::InvalidJson(e.to_string()),
        })
    }
}
