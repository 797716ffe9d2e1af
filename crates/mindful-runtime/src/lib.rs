//! Runtime for the Mindful chat pipeline.
//!
//! `Orchestrator` turns one user message into one reply: it records the
//! turn, classifies the message, runs emotion analysis and crisis checks on
//! substantive messages, retrieves supporting passages and asks the model
//! for a response. `MoodService` drives the questionnaire endpoints.

pub mod composer;
pub mod emotion;
pub mod mood;
pub mod orchestrator;
pub mod retriever;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use composer::{format_history, Demographics, ResponseComposer};
pub use emotion::{EmotionAnalyzer, EmotionReading};
pub use mood::{ConversationReply, MoodAnalysis, MoodQuestionnaire, MoodService, StarterOutcome};
pub use orchestrator::Orchestrator;
pub use retriever::{IndexRetriever, Retriever};
pub use session::{Session, SessionStore};
pub use types::*;
