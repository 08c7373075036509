//! Questionnaire scoring.
//!
//! Turns an ordered list of answers into a raw total and one normalized
//! 0-10 score per category. Category membership is positional and is
//! declared once in [`QuestionnaireLayout::STANDARD`]:
//!
//! ```text
//! index  0 1 2 | 3 4 5 | 6 7 8 9
//!        stress| focus | positivity
//! ```
//!
//! [`calculate`] performs no validation. Callers that need bounded scores
//! run [`validate_answers`] first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Highest value a single `selectedOption` may take.
pub const MAX_OPTION: i64 = 5;

/// Upper end of the normalized category scale.
pub const NORMALIZED_SCALE: i64 = 10;

/// One questionnaire answer.
///
/// Only `selectedOption` takes part in scoring. Any other fields sent by the
/// client (question ids, labels) are carried through to storage untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Chosen option, expected in `0..=5`.
    #[serde(rename = "selectedOption")]
    pub selected_option: i64,
    /// Client-supplied fields outside the scoring contract.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Answer {
    /// Create an answer with no extra fields.
    pub fn new(selected_option: i64) -> Self {
        Self {
            selected_option,
            extra: Map::new(),
        }
    }

    /// Attach an extra passthrough field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Questionnaire dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Perceived stress.
    Stress,
    /// Ability to concentrate.
    Focus,
    /// General outlook.
    Positivity,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Stress => write!(f, "stress"),
            Category::Focus => write!(f, "focus"),
            Category::Positivity => write!(f, "positivity"),
        }
    }
}

/// A contiguous run of questions belonging to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySection {
    /// Category the questions count towards.
    pub category: Category,
    /// Index of the first question.
    pub start: usize,
    /// Number of questions.
    pub len: usize,
}

impl CategorySection {
    /// Highest raw sum this section can reach.
    pub const fn max_raw(&self) -> i64 {
        self.len as i64 * MAX_OPTION
    }

    /// Whether `index` falls inside this section.
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.len
    }
}

/// Declared mapping from question position to category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionnaireLayout {
    sections: &'static [CategorySection],
}

impl QuestionnaireLayout {
    /// The fixed 10-question layout: 3 stress, 3 focus, 4 positivity.
    pub const STANDARD: QuestionnaireLayout = QuestionnaireLayout {
        sections: &[
            CategorySection {
                category: Category::Stress,
                start: 0,
                len: 3,
            },
            CategorySection {
                category: Category::Focus,
                start: 3,
                len: 3,
            },
            CategorySection {
                category: Category::Positivity,
                start: 6,
                len: 4,
            },
        ],
    };

    /// Sections in question order.
    pub fn sections(&self) -> &'static [CategorySection] {
        self.sections
    }

    /// Number of questions the layout expects.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.len).sum()
    }

    /// Section owning the question at `index`.
    ///
    /// Indices past the declared questions fall into the last section, so an
    /// over-long answer list silently inflates the final category.
    pub fn section_for(&self, index: usize) -> Option<&'static CategorySection> {
        let sections: &'static [CategorySection] = self.sections;
        sections
            .iter()
            .find(|s| s.contains(index))
            .or_else(|| sections.last())
    }

    /// Section for a given category.
    pub fn section(&self, category: Category) -> Option<&'static CategorySection> {
        let sections: &'static [CategorySection] = self.sections;
        sections.iter().find(|s| s.category == category)
    }
}

impl Default for QuestionnaireLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Normalized per-category scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    /// Stress on the 0-10 scale.
    pub stress: i64,
    /// Focus on the 0-10 scale.
    pub focus: i64,
    /// Positivity on the 0-10 scale.
    pub positivity: i64,
}

impl CategoryScores {
    /// Score for one category.
    pub fn get(&self, category: Category) -> i64 {
        match category {
            Category::Stress => self.stress,
            Category::Focus => self.focus,
            Category::Positivity => self.positivity,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut i64 {
        match category {
            Category::Stress => &mut self.stress,
            Category::Focus => &mut self.focus,
            Category::Positivity => &mut self.positivity,
        }
    }
}

/// Output of [`calculate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Sum of every `selectedOption`.
    pub total_score: i64,
    /// Normalized category scores.
    pub category_scores: CategoryScores,
}

/// Score answers against the standard layout.
pub fn calculate(answers: &[Answer]) -> ScoreBreakdown {
    calculate_with_layout(&QuestionnaireLayout::STANDARD, answers)
}

/// Score answers against an explicit layout.
pub fn calculate_with_layout(layout: &QuestionnaireLayout, answers: &[Answer]) -> ScoreBreakdown {
    let mut total_score: i64 = 0;
    let mut raw = CategoryScores::default();

    for (index, answer) in answers.iter().enumerate() {
        total_score = total_score.saturating_add(answer.selected_option);
        if let Some(section) = layout.section_for(index) {
            let slot = raw.slot_mut(section.category);
            *slot = slot.saturating_add(answer.selected_option);
        }
    }

    let mut category_scores = CategoryScores::default();
    for section in layout.sections() {
        *category_scores.slot_mut(section.category) =
            normalize(raw.get(section.category), section.max_raw());
    }

    ScoreBreakdown {
        total_score,
        category_scores,
    }
}

/// Scale a raw sum onto 0-10, rounding half away from zero.
///
/// Sums outside `0..=max_raw` scale proportionally; arithmetic saturates
/// at the `i64` bounds.
pub fn normalize(raw: i64, max_raw: i64) -> i64 {
    if max_raw == 0 {
        return 0;
    }
    (raw.saturating_mul(NORMALIZED_SCALE) as f64 / max_raw as f64).round() as i64
}

/// Check answer count and option range against a layout.
///
/// Returns a client-facing reason on the first violation.
pub fn validate_answers(layout: &QuestionnaireLayout, answers: &[Answer]) -> Result<(), String> {
    let expected = layout.question_count();
    if answers.len() != expected {
        return Err(format!(
            "Expected {} answers, got {}.",
            expected,
            answers.len()
        ));
    }

    if let Some((index, answer)) = answers
        .iter()
        .enumerate()
        .find(|(_, a)| !(0..=MAX_OPTION).contains(&a.selected_option))
    {
        return Err(format!(
            "Answer {} has selectedOption {}, expected 0 to {}.",
            index, answer.selected_option, MAX_OPTION
        ));
    }

    Ok(())
}
