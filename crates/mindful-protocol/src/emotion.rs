//! Emotion assessment as reported by the model.
//!
//! Intensities are the model's own claim and are not range-checked.

use serde::{Deserialize, Deserializer, Serialize};

pub const UNKNOWN_EMOTION: &str = "unknown";
pub const DEFAULT_INTENSITY: i64 = 5;
/// Error marker attached to the default assessment.
pub const PARSE_ERROR_MARKER: &str = "Failed to parse emotion analysis";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScoreRepr")]
pub struct EmotionScore {
    pub emotion: String,
    pub intensity: i64,
}

impl EmotionScore {
    pub fn new(emotion: impl Into<String>, intensity: i64) -> Self {
        Self {
            emotion: emotion.into(),
            intensity,
        }
    }
}

/// Models sometimes emit a bare emotion name instead of an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreRepr {
    Full {
        #[serde(alias = "name")]
        emotion: String,
        #[serde(default = "default_intensity", deserialize_with = "lenient_intensity")]
        intensity: i64,
    },
    Name(String),
}

impl From<ScoreRepr> for EmotionScore {
    fn from(repr: ScoreRepr) -> Self {
        match repr {
            ScoreRepr::Full { emotion, intensity } => Self { emotion, intensity },
            ScoreRepr::Name(emotion) => Self {
                emotion,
                intensity: DEFAULT_INTENSITY,
            },
        }
    }
}

fn default_intensity() -> i64 {
    DEFAULT_INTENSITY
}

/// Accept `8`, `8.4` or `"8"`. Anything else (`"high"`, `null`, an object)
/// reads as [`DEFAULT_INTENSITY`] so the rest of the assessment survives.
fn lenient_intensity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    };
    Ok(parsed.unwrap_or(DEFAULT_INTENSITY))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionAssessment {
    pub primary_emotion: EmotionScore,
    #[serde(default)]
    pub secondary_emotions: Vec<EmotionScore>,
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Set only on the default assessment used when parsing failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmotionAssessment {
    /// `{emotion: "unknown", intensity: 5}` with no secondaries or triggers.
    pub fn unknown() -> Self {
        Self {
            primary_emotion: EmotionScore::new(UNKNOWN_EMOTION, DEFAULT_INTENSITY),
            secondary_emotions: Vec::new(),
            triggers: Vec::new(),
            error: Some(PARSE_ERROR_MARKER.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}
