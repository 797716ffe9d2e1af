//! Small-talk vs substantive message classification.
//!
//! Rules are checked in order against the lower-cased, trimmed message and
//! the first match wins:
//! 1. exact greeting
//! 2. bot-identity phrase anywhere in the message
//! 3. well-being phrase anywhere in the message
//! 4. exact casual question
//! 5. five words or fewer
//!
//! Rule 5 catches short genuine statements too ("I want to die" is four
//! words). Crisis keywords are only checked on the substantive path.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    SmallTalk,
    Substantive,
}

impl MessageKind {
    pub fn is_small_talk(&self) -> bool {
        matches!(self, MessageKind::SmallTalk)
    }
}

const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];

const BOT_IDENTITY: &[&str] = &[
    "who are you",
    "what are you",
    "what do you do",
    "who created you",
    "how do you work",
    "what's your name",
    "what is your name",
    "tell me about yourself",
];

const WELL_BEING: &[&str] = &[
    "how are you",
    "how are you doing",
    "how's it going",
    "what's up",
    "how do you feel",
];

const CASUAL_QUESTIONS: &[&str] = &["what can you do", "can you help me", "what should i do", "help"];

/// Messages with at most this many words are treated as small talk.
pub const SHORT_MESSAGE_WORDS: usize = 5;

pub fn classify(message: &str) -> MessageKind {
    let msg = message.trim().to_lowercase();

    let small_talk = GREETINGS.contains(&msg.as_str())
        || BOT_IDENTITY.iter().any(|p| msg.contains(p))
        || WELL_BEING.iter().any(|p| msg.contains(p))
        || CASUAL_QUESTIONS.contains(&msg.as_str())
        || msg.split_whitespace().count() <= SHORT_MESSAGE_WORDS;

    if small_talk {
        MessageKind::SmallTalk
    } else {
        MessageKind::Substantive
    }
}
