//! Shared application state.

use std::sync::Arc;

use mindful_chat::CompletionModel;
use mindful_core::MindfulConfig;
use mindful_infer::EmbedderBackend;
use mindful_runtime::{IndexRetriever, MoodService, Orchestrator, SessionStore};
use mindful_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: MindfulConfig,
    pub store: Arc<SqliteStore>,
    pub orchestrator: Orchestrator,
    pub mood: MoodService,
}

impl AppState {
    /// Wire the pipeline around one store, one embedder and one model.
    pub fn new(
        config: MindfulConfig,
        store: Arc<SqliteStore>,
        embedder: Arc<dyn EmbedderBackend>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        let retriever = Arc::new(IndexRetriever::new(store.clone(), embedder));
        let orchestrator = Orchestrator::new(
            model.clone(),
            retriever,
            store.clone(),
            Arc::new(SessionStore::new()),
            config.top_k,
        );
        let mood = MoodService::new(model);

        Self {
            config,
            store,
            orchestrator,
            mood,
        }
    }
}
