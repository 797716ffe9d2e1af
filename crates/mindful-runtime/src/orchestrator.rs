//! Orchestrator: one chat message in, one reply out.
//!
//! Per request: validate, lock the session, record the user turn, classify.
//! Small talk gets a conversational reply. Everything else goes through
//! emotion analysis, the crisis check and a retrieval-grounded reply, with
//! the hotline block prepended on a crisis. The reply is recorded as an
//! assistant turn. A failure after the user turn was recorded leaves that
//! turn in place.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::composer::{Demographics, ResponseComposer};
use crate::emotion::EmotionAnalyzer;
use crate::retriever::Retriever;
use crate::session::SessionStore;
use crate::types::*;
use mindful_chat::CompletionModel;
use mindful_core::{Error, Result};
use mindful_protocol::{classify, detect_crisis, EmotionAssessment, CRISIS_RESOURCES};
use mindful_store::SqliteStore;

pub struct Orchestrator {
    sessions: Arc<SessionStore>,
    profiles: Arc<SqliteStore>,
    analyzer: EmotionAnalyzer,
    composer: ResponseComposer,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        retriever: Arc<dyn Retriever>,
        profiles: Arc<SqliteStore>,
        sessions: Arc<SessionStore>,
        top_k: usize,
    ) -> Self {
        info!("Orchestrator using {} (top_k={})", model.describe(), top_k);
        Self {
            sessions,
            profiles,
            analyzer: EmotionAnalyzer::new(model.clone()),
            composer: ResponseComposer::new(model, retriever, top_k),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponsePayload> {
        let message = request.message.as_str();
        if message.trim().is_empty() {
            return Err(Error::Validation("No message provided".into()));
        }

        let demographics = match request.user_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => self.demographics_for(id).await,
            None => None,
        };

        let handle = self.sessions.get_or_create(request.session_id());
        let mut session = handle.lock().await;
        session.append(Role::User, message);

        let kind = classify(message);
        debug!("Session {}: message classified as {:?}", session.id(), kind);

        if kind.is_small_talk() {
            let reply = self
                .composer
                .compose_small_talk(message, session.turns(), demographics.as_ref())
                .await?;
            session.append(Role::Assistant, reply.as_str());
            return Ok(ChatResponsePayload::small_talk(reply));
        }

        let reading = self.analyzer.analyze(message).await?;
        let is_crisis = detect_crisis(message, &reading.assessment, &reading.raw);
        if is_crisis {
            warn!("Crisis indicators in session {}", session.id());
        }

        let reply = self
            .composer
            .compose_grounded(message, session.turns(), &reading, demographics.as_ref())
            .await?;
        let reply = if is_crisis {
            format!("{}{}", CRISIS_RESOURCES, reply)
        } else {
            reply
        };

        session.append(Role::Assistant, reply.as_str());
        Ok(ChatResponsePayload::grounded(reply, reading.assessment, is_crisis))
    }

    /// Standalone emotion analysis; no session is touched.
    pub async fn analyze_emotion(&self, message: &str) -> Result<EmotionAssessment> {
        if message.trim().is_empty() {
            return Err(Error::Validation("No message provided".into()));
        }
        Ok(self.analyzer.analyze(message).await?.assessment)
    }

    pub fn clear_history(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id)
    }

    /// A missing or unreadable profile means no demographics section.
    async fn demographics_for(&self, user_id: &str) -> Option<Demographics> {
        let profiles = self.profiles.clone();
        let id = user_id.to_string();
        let lookup = tokio::task::spawn_blocking(move || profiles.get_profile(&id)).await;
        match lookup {
            Ok(Ok(profile)) => profile.as_ref().map(Demographics::from_profile),
            Ok(Err(e)) => {
                warn!("Could not load profile {}: {}", user_id, e);
                None
            }
            Err(e) => {
                warn!("Profile lookup for {} did not complete: {}", user_id, e);
                None
            }
        }
    }
}
