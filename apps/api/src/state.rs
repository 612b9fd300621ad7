use std::sync::Arc;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::explain::ExplanationEngine;
use crate::feedback::FeedbackProcessor;
use crate::llm_client::Oracle;
use crate::matching::MatchingEngine;
use crate::offers::OfferEngine;
use crate::store::Store;
use crate::vector::VectorStore;

/// Shared application state injected into all route handlers via Axum
/// extractors. Every collaborator sits behind a trait object so tests and
/// alternate backends swap in without touching handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub vectors: Arc<dyn VectorStore>,
    pub oracle: Arc<dyn Oracle>,
    pub embedder: Arc<dyn Embedder>,
    pub config: Config,
}

impl AppState {
    /// Engines are cheap bundles of `Arc` handles; handlers build one per
    /// request or per background task.
    pub fn matching_engine(&self) -> MatchingEngine {
        MatchingEngine::new(
            self.store.clone(),
            self.vectors.clone(),
            self.oracle.clone(),
            self.embedder.clone(),
            self.config.oracle_concurrency,
        )
    }

    pub fn offer_engine(&self) -> OfferEngine {
        OfferEngine::new(
            self.store.clone(),
            self.oracle.clone(),
            self.config.oracle_concurrency,
        )
    }

    pub fn feedback_processor(&self) -> FeedbackProcessor {
        FeedbackProcessor::new(self.store.clone(), self.oracle.clone())
    }

    pub fn explanation_engine(&self) -> ExplanationEngine {
        ExplanationEngine::new(self.store.clone(), self.oracle.clone())
    }
}
