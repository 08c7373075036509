//! AI analysis of category scores.
//!
//! [`AnalysisProvider`] is the narrow async boundary to the remote model.
//! [`GeminiClient`] implements it over HTTP with per-attempt timeouts and
//! bounded retries; [`AnalysisSource`] adds an overall deadline and exposes
//! the provider as a [`SuggestionSource`].

mod client;
mod types;


pub use client::GeminiClient;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AnalysisError, AnalysisResult};
use crate::scoring::CategoryScores;
use crate::suggestions::{Suggestion, SuggestionObject, SuggestionSource};

/// Remote analysis of a score breakdown.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Produce one structured suggestion object. May fail.
    async fn analyze(&self, scores: &CategoryScores) -> AnalysisResult<SuggestionObject>;
}

/// Deadline-bounded wrapper around an [`AnalysisProvider`].
#[derive(Clone)]
pub struct AnalysisSource {
    provider: Arc<dyn AnalysisProvider>,
    deadline: Duration,
}

impl AnalysisSource {
    /// Wrap a provider with an overall deadline.
    pub fn new(provider: Arc<dyn AnalysisProvider>, deadline: Duration) -> Self {
        Self { provider, deadline }
    }

    /// Run the analysis; exceeding the deadline is [`AnalysisError::Timeout`].
    pub async fn analyze(&self, scores: &CategoryScores) -> AnalysisResult<SuggestionObject> {
        match tokio::time::timeout(self.deadline, self.provider.analyze(scores)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout {
                timeout_ms: self.deadline.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl SuggestionSource for AnalysisSource {
    fn name(&self) -> &'static str {
        "analysis"
    }

    async fn suggest(&self, scores: &CategoryScores) -> AnalysisResult<Vec<Suggestion>> {
        Ok(vec![Suggestion::Analysis(self.analyze(scores).await?)])
    }
}
