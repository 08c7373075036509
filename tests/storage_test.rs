//! Integration tests for SQLite storage layer
//!
//! Tests database operations using in-memory and file-backed SQLite databases.

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

use wellness_assessment::config::DatabaseConfig;
use wellness_assessment::scoring::{calculate, Answer};
use wellness_assessment::storage::{AssessmentRecord, SqliteStorage, Storage};
use wellness_assessment::suggestions::{Suggestion, SuggestionObject};

/// Create an in-memory storage instance for testing
async fn create_test_storage() -> SqliteStorage {
    SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage")
}

fn record(user_id: &str, option: i64) -> AssessmentRecord {
    let answers: Vec<Answer> = (0..10)
        .map(|i| Answer::new(option).with_field("questionId", format!("q{}", i + 1)))
        .collect();
    let breakdown = calculate(&answers);
    let analysis = SuggestionObject::try_from(json!({
        "summary": format!("option {}", option),
        "suggestions": ["Stretch", "Hydrate"]
    }))
    .unwrap();
    AssessmentRecord::new(user_id, answers, breakdown, vec![Suggestion::Analysis(analysis)])
}

#[cfg(test)]
mod save_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_save_and_read_back() {
        let storage = create_test_storage().await;
        let original = record("user-1", 4);

        storage.save(&original).await.unwrap();
        let latest = storage.find_latest_by_user("user-1").await.unwrap();

        assert_eq!(latest, Some(original));
    }

    #[tokio::test]
    async fn test_answers_keep_extra_fields() {
        let storage = create_test_storage().await;
        storage.save(&record("user-1", 2)).await.unwrap();

        let latest = storage.find_latest_by_user("user-1").await.unwrap().unwrap();
        assert_eq!(
            latest.answers[9].extra.get("questionId"),
            Some(&json!("q10"))
        );
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let storage = create_test_storage().await;
        let rec = record("user-1", 1);

        storage.save(&rec).await.unwrap();
        assert!(storage.save(&rec).await.is_err());
        assert_eq!(storage.count_by_user("user-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mixed_suggestions_round_trip() {
        let storage = create_test_storage().await;
        let mut rec = record("user-1", 0);
        rec.suggestions
            .push(Suggestion::Rule("Consider a gratitude journal.".to_string()));

        storage.save(&rec).await.unwrap();
        let latest = storage.find_latest_by_user("user-1").await.unwrap().unwrap();

        assert_eq!(latest.suggestions.len(), 2);
        assert!(latest.suggestions[0].as_analysis().is_some());
        assert_eq!(
            latest.suggestions[1],
            Suggestion::Rule("Consider a gratitude journal.".to_string())
        );
    }
}

#[cfg(test)]
mod latest_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_latest_for_unknown_user_is_none() {
        let storage = create_test_storage().await;
        storage.save(&record("someone-else", 3)).await.unwrap();

        let result = storage.find_latest_by_user("nobody").await.unwrap();
        assert!(result.is_none(), "Should return None for unknown user");
    }

    #[tokio::test]
    async fn test_latest_orders_by_created_at_not_insert_order() {
        let storage = create_test_storage().await;
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let newer = record("user-1", 5).with_created_at(base + Duration::hours(2));
        let older = record("user-1", 1).with_created_at(base);

        storage.save(&newer).await.unwrap();
        storage.save(&older).await.unwrap();

        let latest = storage.find_latest_by_user("user-1").await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
        assert_eq!(latest.total_score, 50);
    }

    #[tokio::test]
    async fn test_identical_timestamps_resolve_to_last_insert() {
        let storage = create_test_storage().await;
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let first = record("user-1", 1).with_created_at(at);
        let second = record("user-1", 2).with_created_at(at);

        storage.save(&first).await.unwrap();
        storage.save(&second).await.unwrap();

        let latest = storage.find_latest_by_user("user-1").await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[tokio::test]
    async fn test_latest_is_scoped_per_user() {
        let storage = create_test_storage().await;
        let a = record("user-a", 1);
        let b = record("user-b", 5);

        storage.save(&a).await.unwrap();
        storage.save(&b).await.unwrap();

        assert_eq!(
            storage.find_latest_by_user("user-a").await.unwrap().map(|r| r.id),
            Some(a.id)
        );
        assert_eq!(storage.count_by_user("user-b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_is_idempotent() {
        let storage = create_test_storage().await;
        storage.save(&record("user-1", 3)).await.unwrap();

        let first = storage.find_latest_by_user("user-1").await.unwrap();
        let second = storage.find_latest_by_user("user-1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(storage.count_by_user("user-1").await.unwrap(), 1);
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("nested").join("assessments.db"),
            max_connections: 2,
        };

        let rec = record("user-1", 3);
        {
            let storage = SqliteStorage::new(&config).await.unwrap();
            storage.save(&rec).await.unwrap();
            storage.pool().close().await;
        }

        let reopened = SqliteStorage::new(&config).await.unwrap();
        let latest = reopened.find_latest_by_user("user-1").await.unwrap();
        assert_eq!(latest, Some(rec));
    }
}
