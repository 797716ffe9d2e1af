//! Crisis detection heuristic.
//!
//! A message is a crisis when it contains a crisis keyword, or when the
//! primary emotion is high-risk with intensity above 7, or when any primary
//! emotion has intensity exactly 10. This is a keyword heuristic, not a
//! clinical assessment.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::emotion::EmotionAssessment;

pub const CRISIS_KEYWORDS: &[&str] = &[
    "suicide",
    "kill myself",
    "end my life",
    "don't want to live",
    "harm myself",
    "hurt myself",
];

pub const HIGH_RISK_EMOTIONS: &[&str] = &["despair", "hopeless", "suicidal"];

/// Prepended to the reply whenever a crisis is detected.
pub const CRISIS_RESOURCES: &str = "I notice you may be going through a difficult time. \
Please consider reaching out to a mental health professional or crisis helpline:\n\
- India Crisis Helpline: 9152987821\n\
- NIMHANS Mental Health Helpline: 080-26995099\n\
- Vandrevala Foundation: 1860-2662-345\n\n";

static PRIMARY_EMOTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"?primary_emotion"?\s*:\s*(?:\{[^}]*?"?(?:emotion|name)"?\s*:\s*)?"?([a-z]+)"#)
        .unwrap()
});
static INTENSITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"?intensity"?\s*:\s*"?(\d+)"#).unwrap());

pub fn mentions_crisis_keyword(message: &str) -> bool {
    let lower = message.to_lowercase();
    CRISIS_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn is_high_risk(emotion: &str, intensity: i64) -> bool {
    let emotion = emotion.trim().to_lowercase();
    (HIGH_RISK_EMOTIONS.contains(&emotion.as_str()) && intensity > 7) || intensity == 10
}

/// Primary emotion name and intensity read straight from reply text.
/// The two are matched independently anywhere in `raw`, in either order.
/// Used only when the reply did not parse as an assessment.
pub fn scan_primary_emotion(raw: &str) -> Option<(String, i64)> {
    let emotion = PRIMARY_EMOTION_RE.captures(raw)?.get(1)?.as_str().to_lowercase();
    let intensity = INTENSITY_RE
        .captures(raw)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    Some((emotion, intensity))
}

/// `raw` is the unparsed analyzer reply; it is consulted only when
/// `assessment` is the parse-failure default.
pub fn detect_crisis(message: &str, assessment: &EmotionAssessment, raw: &str) -> bool {
    if mentions_crisis_keyword(message) {
        return true;
    }

    let reading = if assessment.is_fallback() {
        scan_primary_emotion(raw)
    } else {
        Some((
            assessment.primary_emotion.emotion.clone(),
            assessment.primary_emotion.intensity,
        ))
    };

    match reading {
        Some((emotion, intensity)) => {
            let crisis = is_high_risk(&emotion, intensity);
            debug!("Crisis check: {} at {} -> {}", emotion, intensity, crisis);
            crisis
        }
        None => false,
    }
}
