//! Storage layer for assessment persistence.
//!
//! This module provides the [`Storage`] gateway used by the orchestrator
//! and its SQLite implementation. Records are append-only: there is no
//! update or delete path.

mod sqlite;


pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;
use crate::scoring::{Answer, CategoryScores, ScoreBreakdown};
use crate::suggestions::Suggestion;

/// A persisted questionnaire submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    /// Unique record identifier.
    pub id: String,
    /// Owner of the assessment.
    pub user_id: String,
    /// Answers exactly as submitted.
    pub answers: Vec<Answer>,
    /// Sum of every selected option.
    pub total_score: i64,
    /// Normalized category scores.
    pub category_scores: CategoryScores,
    /// Stored suggestions; the analysis object comes first.
    pub suggestions: Vec<Suggestion>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl AssessmentRecord {
    /// Create a new record stamped with a fresh id and the current time.
    pub fn new(
        user_id: impl Into<String>,
        answers: Vec<Answer>,
        breakdown: ScoreBreakdown,
        suggestions: Vec<Suggestion>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            answers,
            total_score: breakdown.total_score,
            category_scores: breakdown.category_scores,
            suggestions,
            created_at: Utc::now(),
        }
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Persistence gateway for assessment records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Durably store a record. Exactly one write.
    async fn save(&self, record: &AssessmentRecord) -> StorageResult<()>;

    /// Most recent record for a user by `created_at`; later inserts win ties.
    async fn find_latest_by_user(&self, user_id: &str) -> StorageResult<Option<AssessmentRecord>>;

    /// Number of records stored for a user.
    async fn count_by_user(&self, user_id: &str) -> StorageResult<u64>;
}
