//! Emotion analysis through the completion model.

use std::sync::Arc;

use tracing::warn;

use mindful_chat::json::parse_brace_span;
use mindful_chat::{prompts, CompletionModel, ParseOutcome};
use mindful_core::Result;
use mindful_protocol::EmotionAssessment;

/// An assessment together with the reply it was read from.
#[derive(Debug, Clone)]
pub struct EmotionReading {
    pub assessment: EmotionAssessment,
    pub raw: String,
}

impl EmotionReading {
    /// Text placed in the grounded prompt's emotion section.
    pub fn summary(&self) -> String {
        if self.assessment.is_fallback() {
            return self.raw.clone();
        }
        serde_json::to_string_pretty(&self.assessment).unwrap_or_else(|_| self.raw.clone())
    }
}

/// Read an assessment from the first `{` to the last `}` of `raw`.
/// Anything unparseable becomes [`EmotionAssessment::unknown`].
pub fn parse_assessment(raw: &str) -> ParseOutcome<EmotionAssessment> {
    parse_brace_span(raw, EmotionAssessment::unknown)
}

pub struct EmotionAnalyzer {
    model: Arc<dyn CompletionModel>,
}

impl EmotionAnalyzer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Only a failed completion call is an error; a bad reply falls back.
    pub async fn analyze(&self, message: &str) -> Result<EmotionReading> {
        let raw = self.model.complete(&prompts::emotion_analysis(message)).await?;
        let assessment = match parse_assessment(&raw) {
            ParseOutcome::Parsed(a) => a,
            ParseOutcome::Fallback { value, reason } => {
                warn!("Emotion analysis fell back to default: {}", reason);
                value
            }
            ParseOutcome::Failed(reason) => {
                warn!("Emotion analysis failed: {}", reason);
                EmotionAssessment::unknown()
            }
        };
        Ok(EmotionReading { assessment, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use mindful_core::Error;
    use mindful_protocol::EmotionScore;

    #[test]
    fn test_non_json_yields_unknown() {
        let outcome = parse_assessment("I'm sorry, I can't analyze that.");
        let value = outcome.value().unwrap();
        assert!(!outcome.is_parsed());
        assert_eq!(value.primary_emotion, EmotionScore::new("unknown", 5));
        assert!(value.secondary_emotions.is_empty());
        assert!(value.triggers.is_empty());
        assert!(value.error.is_some());
    }

    #[test]
    fn test_wrapped_json_parses() {
        let raw = "Analysis:\n{\"primary_emotion\": {\"emotion\": \"fear\", \"intensity\": 6}, \"triggers\": [\"exam\"]}\nTake care.";
        let outcome = parse_assessment(raw);
        assert!(outcome.is_parsed());
        assert_eq!(outcome.value().unwrap().triggers, vec!["exam"]);
    }

    #[tokio::test]
    async fn test_analyze_keeps_raw_reply() {
        let raw = r#"{"primary_emotion": {"emotion": "sadness", "intensity": 8}}"#;
        let model = Arc::new(ScriptedModel::new(&[raw]));
        let reading = EmotionAnalyzer::new(model.clone()).analyze("I miss her").await.unwrap();
        assert_eq!(reading.raw, raw);
        assert_eq!(reading.assessment.primary_emotion.intensity, 8);
        assert!(model.prompts()[0].contains("USER MESSAGE: I miss her"));
        assert!(reading.summary().contains("\"sadness\""));
    }

    #[tokio::test]
    async fn test_analyze_propagates_model_failure() {
        let model = Arc::new(ScriptedModel::failing("rate limited"));
        let result = EmotionAnalyzer::new(model).analyze("hello").await;
        assert!(matches!(result, Err(Error::Llm(_))));
    }
}
