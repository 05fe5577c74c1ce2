// src/models/question.rs

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::FieldError;

pub type QuestionId = Uuid;

/// Points awarded when the author does not pick a value.
pub const DEFAULT_POINTS: u32 = 10;

/// Option-bearing questions need at least this many non-empty options.
pub const MIN_OPTIONS: usize = 2;

/// Longest accepted option text, in characters.
pub const MAX_OPTION_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    MultipleSelect,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::MultipleSelect => "multiple_select",
        }
    }
}

/// The fixed answer pair of a true/false question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrueFalse {
    True,
    False,
}

impl TrueFalse {
    pub const LABELS: [&'static str; 2] = ["true", "false"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Some(TrueFalse::True),
            "false" => Some(TrueFalse::False),
            _ => None,
        }
    }
}

/// Type-specific part of a question.
///
/// Each variant carries exactly the fields that type needs, so a short-answer
/// question cannot hold options and a true/false question cannot hold anything
/// but one of its two canonical answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionBody {
    MultipleChoice {
        options: Vec<String>,
        correct_answer: String,
    },
    TrueFalse {
        correct_answer: TrueFalse,
    },
    ShortAnswer {
        correct_answer: String,
    },
    MultipleSelect {
        options: Vec<String>,
        correct_answers: BTreeSet<String>,
    },
}

impl QuestionBody {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionBody::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionBody::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionBody::ShortAnswer { .. } => QuestionType::ShortAnswer,
            QuestionBody::MultipleSelect { .. } => QuestionType::MultipleSelect,
        }
    }

    /// Options as presented to the quiz taker. Empty for short answers.
    pub fn options(&self) -> Vec<&str> {
        match self {
            QuestionBody::MultipleChoice { options, .. }
            | QuestionBody::MultipleSelect { options, .. } => {
                options.iter().map(String::as_str).collect()
            }
            QuestionBody::TrueFalse { .. } => TrueFalse::LABELS.to_vec(),
            QuestionBody::ShortAnswer { .. } => Vec::new(),
        }
    }

    fn normalize(&mut self) {
        match self {
            QuestionBody::MultipleChoice { options, .. }
            | QuestionBody::MultipleSelect { options, .. } => {
                options.retain(|opt| !opt.trim().is_empty());
            }
            QuestionBody::TrueFalse { .. } | QuestionBody::ShortAnswer { .. } => {}
        }
    }
}

/// The answer rules depend on the variant, so they are written out by hand
/// and reported under the same field names the wire format uses.
impl Validate for QuestionBody {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self {
            QuestionBody::MultipleChoice {
                options,
                correct_answer,
            } => {
                let filled = check_options(options, &mut errors);
                if correct_answer.trim().is_empty() {
                    errors.add(
                        "correct_answer",
                        rule("required", "Select the correct answer".to_string()),
                    );
                } else if !filled.contains(&correct_answer.as_str()) {
                    errors.add(
                        "correct_answer",
                        rule(
                            "not_an_option",
                            format!("'{}' is not one of the options", correct_answer),
                        ),
                    );
                }
            }
            QuestionBody::TrueFalse { .. } => {}
            QuestionBody::ShortAnswer { correct_answer } => {
                if correct_answer.trim().is_empty() {
                    errors.add(
                        "correct_answer",
                        rule("required", "Enter the expected answer".to_string()),
                    );
                } else if correct_answer.chars().count() > MAX_OPTION_LEN {
                    errors.add(
                        "correct_answer",
                        rule(
                            "length",
                            format!("Answer must be at most {} characters", MAX_OPTION_LEN),
                        ),
                    );
                }
            }
            QuestionBody::MultipleSelect {
                options,
                correct_answers,
            } => {
                let filled = check_options(options, &mut errors);
                if correct_answers.is_empty() {
                    errors.add(
                        "correct_answers",
                        rule("required", "Select at least one correct answer".to_string()),
                    );
                }
                for answer in correct_answers {
                    if !filled.contains(&answer.as_str()) {
                        errors.add(
                            "correct_answers",
                            rule(
                                "not_an_option",
                                format!("'{}' is not one of the options", answer),
                            ),
                        );
                    }
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn rule(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn check_options<'a>(options: &'a [String], errors: &mut ValidationErrors) -> Vec<&'a str> {
    let filled: Vec<&str> = options
        .iter()
        .map(String::as_str)
        .filter(|opt| !opt.trim().is_empty())
        .collect();

    if filled.len() < MIN_OPTIONS {
        errors.add(
            "options",
            rule(
                "too_few_options",
                format!("At least {} non-empty options are required", MIN_OPTIONS),
            ),
        );
    }

    let mut seen = HashSet::new();
    for opt in &filled {
        if opt.chars().count() > MAX_OPTION_LEN {
            errors.add(
                "options",
                rule(
                    "length",
                    format!("Each option must be at most {} characters", MAX_OPTION_LEN),
                ),
            );
        }
        // An answer is stored by its text, so two equal options are ambiguous.
        if !seen.insert(opt.trim()) {
            errors.add(
                "options",
                rule("duplicate_option", format!("'{}' is listed more than once", opt)),
            );
        }
    }

    filled
}

fn validate_prompt(question: &str) -> Result<(), ValidationError> {
    if question.trim().is_empty() {
        return Err(ValidationError::new("required")
            .with_message("Question text is required".into()));
    }
    Ok(())
}

fn default_points() -> u32 {
    DEFAULT_POINTS
}

/// Everything about a question except its identity and position.
/// This is what the question dialog produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuestionData {
    /// The prompt shown to the quiz taker.
    #[validate(
        custom(function = validate_prompt),
        length(max = 1000, message = "Question text must be at most 1000 characters")
    )]
    pub question: String,

    #[serde(flatten)]
    pub body: QuestionBody,

    /// Shown after grading.
    #[validate(length(max = 2000, message = "Explanation must be at most 2000 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[validate(range(min = 1, message = "Points must be a positive number"))]
    #[serde(default = "default_points")]
    pub points: u32,
}

impl QuestionData {
    pub fn question_type(&self) -> QuestionType {
        self.body.question_type()
    }

    /// Drops blank option slots and turns a blank explanation into `None`.
    pub fn normalized(mut self) -> Self {
        self.body.normalize();
        if self
            .explanation
            .as_deref()
            .is_some_and(|text| text.trim().is_empty())
        {
            self.explanation = None;
        }
        self
    }

    /// Collects every rule this question breaks, prompt fields and answer
    /// fields together, sorted by field name.
    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Err(fields) = self.validate() {
            errors.extend(FieldError::from_validation(&fields));
        }
        if let Err(body) = self.body.validate() {
            errors.extend(FieldError::from_validation(&body));
        }
        errors.sort_by(|a, b| a.field.cmp(&b.field));

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// A question as owned by a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default = "Uuid::new_v4")]
    pub id: QuestionId,

    /// 1-based position inside the quiz. Always matches the list index + 1.
    #[serde(default)]
    pub order: u32,

    #[serde(flatten)]
    pub data: QuestionData,
}

impl Question {
    pub fn points(&self) -> u32 {
        self.data.points
    }

    pub fn question_type(&self) -> QuestionType {
        self.data.question_type()
    }
}

/// Partial update of a question. Absent fields stay as they are.
/// An empty `explanation` clears it.
///
/// Uses the same flat shape as a stored question: answer fields travel next to
/// `type` at the top level, and all of them must be sent together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "PatchWire")]
pub struct QuestionPatch {
    pub question: Option<String>,
    pub body: Option<QuestionBody>,
    pub explanation: Option<String>,
    pub points: Option<u32>,
}

#[derive(Deserialize)]
struct PatchWire {
    question: Option<String>,
    explanation: Option<String>,
    points: Option<u32>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<PatchWire> for QuestionPatch {
    type Error = String;

    fn try_from(wire: PatchWire) -> Result<Self, Self::Error> {
        let body = if wire.rest.is_empty() {
            None
        } else if wire.rest.contains_key("type") {
            let body = serde_json::from_value(serde_json::Value::Object(wire.rest))
                .map_err(|e| e.to_string())?;
            Some(body)
        } else {
            let keys: Vec<&str> = wire.rest.keys().map(String::as_str).collect();
            return Err(format!(
                "'type' is required when changing answer fields ({})",
                keys.join(", ")
            ));
        };

        Ok(QuestionPatch {
            question: wire.question,
            body,
            explanation: wire.explanation,
            points: wire.points,
        })
    }
}

impl QuestionPatch {
    pub fn apply_to(self, data: &mut QuestionData) {
        if let Some(question) = self.question {
            data.question = question;
        }
        if let Some(body) = self.body {
            data.body = body;
        }
        if let Some(explanation) = self.explanation {
            data.explanation = Some(explanation);
        }
        if let Some(points) = self.points {
            data.points = points;
        }
    }
}
