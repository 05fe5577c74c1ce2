// src/models/quiz.rs

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::FieldError;
use crate::models::question::Question;

pub type QuizId = Uuid;

pub const DEFAULT_PASSING_SCORE: u8 = 70;

/// How many times a learner may take the quiz.
/// On the wire this is an integer where `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Attempts {
    #[default]
    Unlimited,
    Limited(u32),
}

impl TryFrom<i64> for Attempts {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Attempts::Unlimited),
            n if n >= 1 => u32::try_from(n)
                .map(Attempts::Limited)
                .map_err(|_| format!("allowed_attempts {} is too large", n)),
            n => Err(format!(
                "allowed_attempts must be -1 (unlimited) or at least 1, got {}",
                n
            )),
        }
    }
}

impl From<Attempts> for i64 {
    fn from(value: Attempts) -> Self {
        match value {
            Attempts::Unlimited => -1,
            Attempts::Limited(n) => i64::from(n),
        }
    }
}

/// Represents a quiz being authored.
/// The quiz owns its questions; they are never shared between quizzes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Quiz {
    #[serde(default = "Uuid::new_v4")]
    pub id: QuizId,

    #[validate(custom(function = validate_title))]
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub instructions: String,

    #[validate(length(min = 1, message = "Add at least one question"))]
    #[serde(default)]
    pub questions: Vec<Question>,

    /// Minutes. `None` means no time limit.
    #[validate(range(min = 1, message = "Time limit must be at least one minute"))]
    #[serde(default)]
    pub time_limit: Option<u32>,

    /// Percentage needed to pass.
    #[validate(range(max = 100, message = "Passing score is a percentage between 0 and 100"))]
    #[serde(default = "default_passing_score")]
    pub passing_score: u8,

    #[serde(default)]
    pub allowed_attempts: Attempts,

    // Presentation flags. Captured here, applied when the quiz is taken.
    #[serde(default = "default_true")]
    pub show_correct_answers: bool,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub shuffle_options: bool,
}

fn default_passing_score() -> u8 {
    DEFAULT_PASSING_SCORE
}

fn default_true() -> bool {
    true
}

fn validate_title(title: &str) -> Result<(), validator::ValidationError> {
    if title.trim().is_empty() {
        return Err(validator::ValidationError::new("required")
            .with_message("Quiz title is required".into()));
    }
    Ok(())
}

impl Default for Quiz {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            instructions: String::new(),
            questions: Vec::new(),
            time_limit: None,
            passing_score: DEFAULT_PASSING_SCORE,
            allowed_attempts: Attempts::Unlimited,
            show_correct_answers: true,
            shuffle_questions: false,
            shuffle_options: false,
        }
    }
}

impl Quiz {
    /// Runs the declarative checks on the quiz fields and flattens the result.
    pub fn check_fields(&self) -> Vec<FieldError> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };

        FieldError::from_validation(&errors)
    }
}

/// Shallow merge into the top-level quiz fields. Nothing is validated here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    /// `null` removes the limit; a missing key leaves it unchanged.
    #[serde(default, deserialize_with = "double_option")]
    pub time_limit: Option<Option<u32>>,
    pub passing_score: Option<u8>,
    pub allowed_attempts: Option<Attempts>,
    pub show_correct_answers: Option<bool>,
    pub shuffle_questions: Option<bool>,
    pub shuffle_options: Option<bool>,
}

impl QuizPatch {
    pub fn apply_to(self, quiz: &mut Quiz) {
        if let Some(title) = self.title {
            quiz.title = title;
        }
        if let Some(description) = self.description {
            quiz.description = description;
        }
        if let Some(instructions) = self.instructions {
            quiz.instructions = instructions;
        }
        if let Some(time_limit) = self.time_limit {
            quiz.time_limit = time_limit;
        }
        if let Some(passing_score) = self.passing_score {
            quiz.passing_score = passing_score;
        }
        if let Some(allowed_attempts) = self.allowed_attempts {
            quiz.allowed_attempts = allowed_attempts;
        }
        if let Some(flag) = self.show_correct_answers {
            quiz.show_correct_answers = flag;
        }
        if let Some(flag) = self.shuffle_questions {
            quiz.shuffle_questions = flag;
        }
        if let Some(flag) = self.shuffle_options {
            quiz.shuffle_options = flag;
        }
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
