//! Test doubles shared by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anchor_core::{KnowledgeBaseStats, Passage};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::ChatError;
use crate::generator::AnswerGenerator;
use crate::retriever::Retriever;

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn passage(text: &str, name: &str, url: &str) -> Passage {
    Passage::new(text, name, url)
}

type RetrieveFn = dyn Fn() -> Result<Vec<Passage>, ChatError> + Send + Sync;
type GenerateFn = dyn Fn() -> Result<String, ChatError> + Send + Sync;

pub struct FakeRetriever {
    respond: Box<RetrieveFn>,
    gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
    pub last_k: Mutex<Option<usize>>,
}

impl FakeRetriever {
    pub fn returning(passages: Vec<Passage>) -> Self {
        Self {
            respond: Box::new(move || Ok(passages.clone())),
            gate: None,
            calls: AtomicUsize::new(0),
            last_k: Mutex::new(None),
        }
    }

    pub fn failing(make: fn() -> ChatError) -> Self {
        Self {
            respond: Box::new(move || Err(make())),
            gate: None,
            calls: AtomicUsize::new(0),
            last_k: Mutex::new(None),
        }
    }

    /// Blocks inside `retrieve` until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for FakeRetriever {
    async fn retrieve(&self, _question: &str, k: usize) -> Result<Vec<Passage>, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_k.lock().unwrap() = Some(k);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        (self.respond)()
    }

    async fn stats(&self) -> Option<KnowledgeBaseStats> {
        Some(KnowledgeBaseStats {
            collection_count: 42,
            source_count: Some(7),
            sources: Vec::new(),
        })
    }
}

pub struct FakeGenerator {
    respond: Box<GenerateFn>,
    gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl FakeGenerator {
    pub fn answering(text: &str) -> Self {
        let text = text.to_string();
        Self {
            respond: Box::new(move || Ok(text.clone())),
            gate: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(make: fn() -> ChatError) -> Self {
        Self {
            respond: Box::new(move || Err(make())),
            gate: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Blocks inside `generate` until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerGenerator for FakeGenerator {
    async fn generate(&self, context_block: &str, question: &str) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((context_block.to_string(), question.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        (self.respond)()
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}
