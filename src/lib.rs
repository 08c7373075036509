//! # Wellness Assessment Service
//!
//! Scores a fixed ten-question wellness questionnaire, asks an AI model for
//! coping suggestions, and keeps every submission so the latest one can be
//! fetched per user.
//!
//! ## Pipeline
//!
//! ```text
//! answers ─► scoring ─► {totalScore, categoryScores}
//!                          │
//!                          ├─► suggestions::RuleEngine   (informational)
//!                          └─► analysis::AnalysisSource  (stored)
//!                                     │
//!                          assessment::AssessmentService ─► storage::Storage
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wellness_assessment::{Config, AppState};
//! use wellness_assessment::analysis::GeminiClient;
//! use wellness_assessment::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let gemini = GeminiClient::new(&config.analysis, config.request.clone())?;
//!     let state = Arc::new(AppState::new(config, Arc::new(storage), Arc::new(gemini)));
//!     wellness_assessment::server::serve(state).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// AI analysis provider boundary and Gemini client.
pub mod analysis;
/// Submission orchestration and latest-assessment lookup.
pub mod assessment;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Prompt text for the analysis call.
pub mod prompts;
/// Questionnaire scoring.
pub mod scoring;
/// HTTP server, routes and shared state.
pub mod server;
/// SQLite storage layer for persistence.
pub mod storage;
/// Rule-based suggestions and the suggestion source abstraction.
pub mod suggestions;

pub use assessment::{AssessmentService, SubmitAssessment};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, SharedState};
