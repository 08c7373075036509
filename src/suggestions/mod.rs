//! Coping suggestions.
//!
//! Two producers exist: a deterministic rule table over category scores and
//! the remote analysis provider. Both sit behind [`SuggestionSource`]; the
//! orchestrator decides which of them end up in the stored record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AnalysisError, AnalysisResult};
use crate::scoring::{Category, CategoryScores};

/// Structured analysis returned by the AI provider.
///
/// The pipeline only guarantees that it is a JSON object. Its fields are
/// stored and returned verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionObject(Map<String, Value>);

impl SuggestionObject {
    /// Field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl TryFrom<Value> for SuggestionObject {
    type Error = AnalysisError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(AnalysisError::InvalidResponse {
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One entry of a record's `suggestions` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Suggestion {
    /// Output of the analysis provider.
    Analysis(SuggestionObject),
    /// Output of the rule engine.
    Rule(String),
}

impl Suggestion {
    /// The analysis object, if this entry came from the provider.
    pub fn as_analysis(&self) -> Option<&SuggestionObject> {
        match self {
            Suggestion::Analysis(object) => Some(object),
            Suggestion::Rule(_) => None,
        }
    }
}

/// Anything that can turn category scores into suggestions.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Produce suggestions for the given scores.
    async fn suggest(&self, scores: &CategoryScores) -> AnalysisResult<Vec<Suggestion>>;
}

/// Comparison applied by a [`SuggestionRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Fires when the score is strictly greater.
    Above(i64),
    /// Fires when the score is strictly less.
    Below(i64),
}

impl Threshold {
    fn matches(self, score: i64) -> bool {
        match self {
            Threshold::Above(limit) => score > limit,
            Threshold::Below(limit) => score < limit,
        }
    }
}

/// A single rule: category, threshold, message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionRule {
    /// Category whose score is compared.
    pub category: Category,
    /// Strict comparison against the score.
    pub threshold: Threshold,
    /// Suggestion text emitted on a match.
    pub message: &'static str,
}

/// Rules evaluated in order; every matching rule contributes its message.
///
/// The stress rule compares against 10 on a 0-10 scale and so never fires
/// for scores produced from in-range answers. It is kept as written.
pub const DEFAULT_RULES: &[SuggestionRule] = &[
    SuggestionRule {
        category: Category::Stress,
        threshold: Threshold::Above(10),
        message: "Try meditation or breathing exercises.",
    },
    SuggestionRule {
        category: Category::Focus,
        threshold: Threshold::Below(5),
        message: "Use a Pomodoro timer to stay on task.",
    },
    SuggestionRule {
        category: Category::Positivity,
        threshold: Threshold::Below(5),
        message: "Consider a gratitude journal.",
    },
];

/// Deterministic rule-based suggestion engine.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine {
    rules: &'static [SuggestionRule],
}

impl RuleEngine {
    /// Engine over a custom rule table.
    pub fn new(rules: &'static [SuggestionRule]) -> Self {
        Self { rules }
    }

    /// Messages of every matching rule, in table order.
    pub fn evaluate(&self, scores: &CategoryScores) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|rule| rule.threshold.matches(scores.get(rule.category)))
            .map(|rule| rule.message)
            .collect()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RULES)
    }
}

#[async_trait]
impl SuggestionSource for RuleEngine {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn suggest(&self, scores: &CategoryScores) -> AnalysisResult<Vec<Suggestion>> {
        Ok(self
            .evaluate(scores)
            .into_iter()
            .map(|message| Suggestion::Rule(message.to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scores(stress: i64, focus: i64, positivity: i64) -> CategoryScores {
        CategoryScores {
            stress,
            focus,
            positivity,
        }
    }

    #[test]
    fn test_all_zero_scores_fire_focus_and_positivity() {
        let engine = RuleEngine::default();
        assert_eq!(
            engine.evaluate(&scores(0, 0, 0)),
            vec![
                "Use a Pomodoro timer to stay on task.",
                "Consider a gratitude journal."
            ]
        );
    }

    #[test]
    fn test_stress_rule_unreachable_on_normalized_scale() {
        let engine = RuleEngine::default();
        for stress in 0..=10 {
            let fired = engine.evaluate(&scores(stress, 10, 10));
            assert!(fired.is_empty(), "stress {} fired {:?}", stress, fired);
        }
    }

    #[test]
    fn test_stress_rule_fires_literally_above_ten() {
        let engine = RuleEngine::default();
        assert_eq!(
            engine.evaluate(&scores(11, 10, 10)),
            vec!["Try meditation or breathing exercises."]
        );
    }

    #[test]
    fn test_threshold_boundaries() {
        let engine = RuleEngine::default();
        assert!(engine.evaluate(&scores(0, 5, 5)).is_empty());
        assert_eq!(
            engine.evaluate(&scores(0, 4, 5)),
            vec!["Use a Pomodoro timer to stay on task."]
        );
        assert_eq!(
            engine.evaluate(&scores(0, 5, 4)),
            vec!["Consider a gratitude journal."]
        );
    }

    #[test]
    fn test_all_three_in_table_order() {
        let engine = RuleEngine::default();
        assert_eq!(
            engine.evaluate(&scores(12, 1, 1)),
            vec![
                "Try meditation or breathing exercises.",
                "Use a Pomodoro timer to stay on task.",
                "Consider a gratitude journal."
            ]
        );
    }

    #[tokio::test]
    async fn test_rule_engine_as_suggestion_source() {
        let engine = RuleEngine::default();
        let suggestions = engine.suggest(&scores(10, 10, 0)).await.unwrap();
        assert_eq!(
            suggestions,
            vec![Suggestion::Rule("Consider a gratitude journal.".to_string())]
        );
        assert_eq!(engine.name(), "rules");
    }

    #[test]
    fn test_suggestion_object_rejects_non_objects() {
        assert!(SuggestionObject::try_from(json!({"summary": "ok"})).is_ok());

        let err = SuggestionObject::try_from(json!(["a", "b"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid response: expected a JSON object, got an array"
        );
        assert!(SuggestionObject::try_from(json!("text")).is_err());
    }

    #[test]
    fn test_suggestion_untagged_round_trip() {
        let stored: Vec<Suggestion> =
            serde_json::from_value(json!([{"summary": "calm"}, "Consider a gratitude journal."]))
                .unwrap();
        assert!(matches!(stored[0], Suggestion::Analysis(_)));
        assert_eq!(
            stored[1],
            Suggestion::Rule("Consider a gratitude journal.".to_string())
        );
        assert_eq!(
            stored[0].as_analysis().and_then(|o| o.get("summary")),
            Some(&json!("calm"))
        );
    }
}
