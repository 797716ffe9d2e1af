//! Conversation safety protocol.
//!
//! Decides how a message is handled: small talk or a substantive query,
//! and whether a substantive query needs crisis resources attached.

pub mod classifier;
pub mod crisis;
pub mod emotion;

pub use classifier::{classify, MessageKind};
pub use crisis::{detect_crisis, CRISIS_RESOURCES};
pub use emotion::{EmotionAssessment, EmotionScore};
