//! Prompt assembly and response generation.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::emotion::EmotionReading;
use crate::retriever::{format_context, Retriever};
use crate::types::{Role, Turn};
use mindful_chat::{prompts, CompletionModel};
use mindful_core::Result;
use mindful_store::UserProfile;

/// Profile fields shown to the model, in display order.
const DEMOGRAPHIC_FIELDS: &[&str] = &[
    "age",
    "gender",
    "occupation",
    "primary_concerns",
    "mental_health_history",
    "goals",
    "preferred_coping_strategies",
    "support_system",
];

/// `USER: ...` / `ASSISTANT: ...` lines, one per turn.
pub fn format_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| match t.role {
            Role::User => format!("USER: {}\n", t.content),
            Role::Assistant => format!("ASSISTANT: {}\n", t.content),
        })
        .collect()
}

/// Labelled profile lines for the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demographics {
    lines: Vec<(String, String)>,
}

impl Demographics {
    /// Known fields with a non-empty value; everything else is skipped.
    pub fn from_profile(profile: &UserProfile) -> Self {
        let lines = DEMOGRAPHIC_FIELDS
            .iter()
            .filter_map(|&key| {
                let value = render_value(profile.field(key)?)?;
                Some((title_case(key), value))
            })
            .collect();
        Self { lines }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("USER DEMOGRAPHICS:\n");
        for (label, value) in &self.lines {
            out.push_str(&format!("- {}: {}\n", label, value));
        }
        out
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `None` for empty or falsy values.
fn render_value(value: &Value) -> Option<String> {
    let scalar = |v: &Value| -> Option<String> {
        match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            Value::Bool(true) => Some("true".into()),
            _ => None,
        }
    };
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => scalar(other),
    }
}

fn demographics_block(demographics: Option<&Demographics>) -> String {
    demographics.map(Demographics::render).unwrap_or_default()
}

pub struct ResponseComposer {
    model: Arc<dyn CompletionModel>,
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl ResponseComposer {
    pub fn new(model: Arc<dyn CompletionModel>, retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        Self {
            model,
            retriever,
            top_k,
        }
    }

    pub async fn compose_small_talk(
        &self,
        message: &str,
        history: &[Turn],
        demographics: Option<&Demographics>,
    ) -> Result<String> {
        let prompt = prompts::small_talk(
            message,
            &format_history(history),
            &demographics_block(demographics),
        );
        self.model.complete(&prompt).await
    }

    /// Every retrieved passage goes into the context, whatever its score.
    pub async fn compose_grounded(
        &self,
        message: &str,
        history: &[Turn],
        emotion: &EmotionReading,
        demographics: Option<&Demographics>,
    ) -> Result<String> {
        let hits = self.retriever.retrieve(message, self.top_k).await?;
        debug!("Grounding on {} passages", hits.len());

        let prompt = prompts::grounded_response(
            &format_context(&hits),
            message,
            &emotion.summary(),
            &format_history(history),
            &demographics_block(demographics),
        );
        self.model.complete(&prompt).await
    }
}
