//! Assessment submission and lookup.
//!
//! A submission moves through
//! `Received -> Validated -> Scored -> Analyzed -> Persisted -> Responded`.
//! Any failure ends the request at that stage; nothing is written unless
//! the analysis succeeded, and at most one record is written per request.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::analysis::{AnalysisProvider, AnalysisSource};
use crate::config::AssessmentConfig;
use crate::error::{AssessmentError, AssessmentResult};
use crate::scoring::{self, Answer, QuestionnaireLayout};
use crate::storage::{AssessmentRecord, Storage};
use crate::suggestions::{RuleEngine, Suggestion, SuggestionObject, SuggestionSource};

/// Message returned when `userId` or `answers` is absent.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing userId or answers.";

/// Raw submission body. Both fields are optional so absence can be reported
/// as a validation failure rather than a decoding error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitAssessment {
    /// Submitting user.
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    /// Answers in question order.
    #[serde(default)]
    pub answers: Option<Vec<Answer>>,
}

impl SubmitAssessment {
    /// Convenience constructor with both fields present.
    pub fn new(user_id: impl Into<String>, answers: Vec<Answer>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            answers: Some(answers),
        }
    }
}

/// Successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// The record as persisted.
    pub record: AssessmentRecord,
    /// The provider's analysis, also stored as the first suggestion.
    pub ai_analysis: SuggestionObject,
    /// Rule-engine output for these scores, persisted or not.
    pub rule_suggestions: Vec<String>,
}

/// Which suggestion sources end up in the stored record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuggestionPolicy {
    /// Only the analysis object. `suggestions` has exactly one element.
    #[default]
    AnalysisOnly,
    /// The analysis object followed by every matching rule message.
    AnalysisWithRules,
}

impl From<&AssessmentConfig> for SuggestionPolicy {
    fn from(config: &AssessmentConfig) -> Self {
        if config.persist_rule_suggestions {
            SuggestionPolicy::AnalysisWithRules
        } else {
            SuggestionPolicy::AnalysisOnly
        }
    }
}

/// Lifecycle stage of a submission, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Body decoded, nothing checked yet.
    Received,
    /// Required fields and answer shape accepted.
    Validated,
    /// Total and category scores computed.
    Scored,
    /// Analysis object received from the provider.
    Analyzed,
    /// Record written to storage.
    Persisted,
    /// Response sent to the client.
    Responded,
}

impl Stage {
    /// Stage at which a failed submission stopped.
    pub fn failed_at(error: &AssessmentError) -> Self {
        match error {
            AssessmentError::Validation { .. } => Stage::Received,
            AssessmentError::Analysis(_) => Stage::Analyzed,
            AssessmentError::Persistence(_) => Stage::Persisted,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Received => write!(f, "received"),
            Stage::Validated => write!(f, "validated"),
            Stage::Scored => write!(f, "scored"),
            Stage::Analyzed => write!(f, "analyzed"),
            Stage::Persisted => write!(f, "persisted"),
            Stage::Responded => write!(f, "responded"),
        }
    }
}

/// Composes scoring, suggestions, analysis and storage.
#[derive(Clone)]
pub struct AssessmentService {
    storage: Arc<dyn Storage>,
    analysis: AnalysisSource,
    rules: RuleEngine,
    layout: QuestionnaireLayout,
    policy: SuggestionPolicy,
}

impl AssessmentService {
    /// Create a service with the standard layout and rules.
    pub fn new(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn AnalysisProvider>,
        config: &AssessmentConfig,
    ) -> Self {
        Self {
            storage,
            analysis: AnalysisSource::new(
                provider,
                Duration::from_millis(config.analysis_deadline_ms),
            ),
            rules: RuleEngine::default(),
            layout: QuestionnaireLayout::STANDARD,
            policy: SuggestionPolicy::from(config),
        }
    }

    /// Override the suggestion policy.
    pub fn with_policy(mut self, policy: SuggestionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active suggestion policy.
    pub fn policy(&self) -> SuggestionPolicy {
        self.policy
    }

    /// Score, analyze and persist one submission.
    pub async fn submit(&self, request: SubmitAssessment) -> AssessmentResult<SubmissionOutcome> {
        let start = Instant::now();
        let user_id = request.user_id.clone().unwrap_or_default();

        let result = self.run_submission(request).await;

        match &result {
            Ok(outcome) => info!(
                user_id = %user_id,
                assessment_id = %outcome.record.id,
                total_score = outcome.record.total_score,
                latency_ms = start.elapsed().as_millis(),
                "Assessment submitted"
            ),
            Err(e @ AssessmentError::Validation { .. }) => warn!(
                user_id = %user_id,
                stage = %Stage::failed_at(e),
                reason = %e,
                "Assessment rejected"
            ),
            Err(e) => {
                error!(
                    user_id = %user_id,
                    stage = %Stage::failed_at(e),
                    error = %e,
                    latency_ms = start.elapsed().as_millis(),
                    "Assessment submission failed"
                );
            }
        }

        result
    }

    async fn run_submission(&self, request: SubmitAssessment) -> AssessmentResult<SubmissionOutcome> {
        let (user_id, answers) = match (request.user_id, request.answers) {
            (Some(user_id), Some(answers)) if !user_id.trim().is_empty() => (user_id, answers),
            _ => return Err(AssessmentError::validation(MISSING_FIELDS_MESSAGE)),
        };

        scoring::validate_answers(&self.layout, &answers).map_err(AssessmentError::validation)?;
        debug!(user_id = %user_id, stage = %Stage::Validated, "Submission validated");

        let breakdown = scoring::calculate_with_layout(&self.layout, &answers);
        let rule_suggestions: Vec<String> = self
            .rules
            .evaluate(&breakdown.category_scores)
            .into_iter()
            .map(str::to_string)
            .collect();
        debug!(
            user_id = %user_id,
            stage = %Stage::Scored,
            total_score = breakdown.total_score,
            scores = ?breakdown.category_scores,
            rules = ?rule_suggestions,
            "Submission scored"
        );

        let ai_analysis = self.analysis.analyze(&breakdown.category_scores).await?;
        debug!(user_id = %user_id, stage = %Stage::Analyzed, "Analysis received");

        let mut suggestions = vec![Suggestion::Analysis(ai_analysis.clone())];
        if self.policy == SuggestionPolicy::AnalysisWithRules {
            suggestions.extend(self.rules.suggest(&breakdown.category_scores).await?);
        }

        let record = AssessmentRecord::new(user_id, answers, breakdown, suggestions);
        self.storage.save(&record).await?;
        debug!(assessment_id = %record.id, stage = %Stage::Persisted, "Record persisted");

        Ok(SubmissionOutcome {
            record,
            ai_analysis,
            rule_suggestions,
        })
    }

    /// Most recent record for a user, or `None`.
    pub async fn latest(&self, user_id: &str) -> AssessmentResult<Option<AssessmentRecord>> {
        let latest = self
            .storage
            .find_latest_by_user(user_id)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "Latest assessment lookup failed");
                AssessmentError::Persistence(e)
            })?;

        debug!(user_id = %user_id, found = latest.is_some(), "Latest assessment lookup");
        Ok(latest)
    }
}
