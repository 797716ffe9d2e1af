//! Test doubles shared by the runtime unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use mindful_chat::CompletionModel;
use mindful_core::{Error, Result};
use mindful_store::SearchHit;
use std::sync::Mutex;

use crate::retriever::Retriever;

/// Replies with queued answers in order and records every prompt.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(Error::Llm(message.to_string()))])),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Llm("script exhausted".into())))
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

/// Returns fixed passages for every query.
pub struct FixedRetriever(pub Vec<&'static str>);

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        Ok(self
            .0
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, c)| SearchHit {
                chunk_id: i as i64,
                content: c.to_string(),
                source: "guide.pdf".into(),
                page: 1,
                score: 1.0,
            })
            .collect())
    }
}
