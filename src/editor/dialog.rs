// src/editor/dialog.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    editor::quiz_editor::QuizEditor,
    error::{EditorError, FieldError},
    models::question::{
        DEFAULT_POINTS, MIN_OPTIONS, Question, QuestionBody, QuestionData, QuestionId,
        QuestionType, TrueFalse,
    },
};

/// Empty option slots offered for a new option-bearing question.
pub const DEFAULT_OPTION_SLOTS: usize = 4;

fn empty_slots() -> Vec<String> {
    vec![String::new(); DEFAULT_OPTION_SLOTS]
}

/// Answer fields of the form, shaped by the active question type.
///
/// Same variants as [`QuestionBody`], but answers may still be unset
/// and option slots may still be blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerForm {
    MultipleChoice {
        options: Vec<String>,
        correct_answer: Option<String>,
    },
    TrueFalse {
        correct_answer: Option<TrueFalse>,
    },
    ShortAnswer {
        correct_answer: String,
    },
    MultipleSelect {
        options: Vec<String>,
        correct_answers: BTreeSet<String>,
    },
}

impl AnswerForm {
    fn blank(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::MultipleChoice => AnswerForm::MultipleChoice {
                options: empty_slots(),
                correct_answer: None,
            },
            QuestionType::TrueFalse => AnswerForm::TrueFalse {
                correct_answer: None,
            },
            QuestionType::ShortAnswer => AnswerForm::ShortAnswer {
                correct_answer: String::new(),
            },
            QuestionType::MultipleSelect => AnswerForm::MultipleSelect {
                options: empty_slots(),
                correct_answers: BTreeSet::new(),
            },
        }
    }

    fn from_body(body: &QuestionBody) -> Self {
        match body {
            QuestionBody::MultipleChoice {
                options,
                correct_answer,
            } => AnswerForm::MultipleChoice {
                options: options.clone(),
                correct_answer: Some(correct_answer.clone()),
            },
            QuestionBody::TrueFalse { correct_answer } => AnswerForm::TrueFalse {
                correct_answer: Some(*correct_answer),
            },
            QuestionBody::ShortAnswer { correct_answer } => AnswerForm::ShortAnswer {
                correct_answer: correct_answer.clone(),
            },
            QuestionBody::MultipleSelect {
                options,
                correct_answers,
            } => AnswerForm::MultipleSelect {
                options: options.clone(),
                correct_answers: correct_answers.clone(),
            },
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerForm::MultipleChoice { .. } => QuestionType::MultipleChoice,
            AnswerForm::TrueFalse { .. } => QuestionType::TrueFalse,
            AnswerForm::ShortAnswer { .. } => QuestionType::ShortAnswer,
            AnswerForm::MultipleSelect { .. } => QuestionType::MultipleSelect,
        }
    }

    /// Switches to another type. Options survive a switch between the two
    /// option-bearing types; everything else starts blank.
    fn convert(self, to: QuestionType) -> Self {
        if self.question_type() == to {
            return self;
        }
        match (self, to) {
            (
                AnswerForm::MultipleChoice {
                    options,
                    correct_answer,
                },
                QuestionType::MultipleSelect,
            ) => AnswerForm::MultipleSelect {
                options,
                correct_answers: correct_answer.into_iter().collect(),
            },
            (
                AnswerForm::MultipleSelect {
                    options,
                    correct_answers,
                },
                QuestionType::MultipleChoice,
            ) => {
                let correct_answer = if correct_answers.len() == 1 {
                    correct_answers.into_iter().next()
                } else {
                    None
                };
                AnswerForm::MultipleChoice {
                    options,
                    correct_answer,
                }
            }
            (_, to) => AnswerForm::blank(to),
        }
    }
}

/// All fields of the question dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionForm {
    pub question: String,
    #[serde(flatten)]
    pub answer: AnswerForm,
    pub explanation: String,
    pub points: u32,
}

impl Default for QuestionForm {
    fn default() -> Self {
        Self {
            question: String::new(),
            answer: AnswerForm::blank(QuestionType::MultipleChoice),
            explanation: String::new(),
            points: DEFAULT_POINTS,
        }
    }
}

impl QuestionForm {
    fn from_question(question: &Question) -> Self {
        Self {
            question: question.data.question.clone(),
            answer: AnswerForm::from_body(&question.data.body),
            explanation: question.data.explanation.clone().unwrap_or_default(),
            points: question.data.points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Closed,
    Open {
        /// The question being edited, `None` when adding a new one.
        editing: Option<QuestionId>,
        form: QuestionForm,
    },
}

/// One user edit to the open form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DialogCommand {
    SetType { question_type: QuestionType },
    SetQuestion { text: String },
    SetOption { index: usize, text: String },
    AddOption,
    RemoveOption { index: usize },
    SetCorrectAnswer { value: String },
    ToggleCorrectOption { value: String },
    SetExplanation { text: String },
    SetPoints { points: u32 },
}

/// What a successful submit asks the quiz editor to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Add(QuestionData),
    Update(QuestionId, QuestionData),
}

/// Create/edit form for a single question.
#[derive(Debug, Clone, Default)]
pub struct QuestionDialog {
    state: DialogState,
}

impl QuestionDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Open { .. })
    }

    pub fn form(&self) -> Option<&QuestionForm> {
        match &self.state {
            DialogState::Open { form, .. } => Some(form),
            DialogState::Closed => None,
        }
    }

    pub fn editing(&self) -> Option<QuestionId> {
        match &self.state {
            DialogState::Open { editing, .. } => *editing,
            DialogState::Closed => None,
        }
    }

    /// Opens the dialog. With a question every field is pre-filled from it,
    /// otherwise the form starts from defaults.
    pub fn open(&mut self, editing: Option<&Question>) {
        self.state = DialogState::Open {
            editing: editing.map(|q| q.id),
            form: editing.map(QuestionForm::from_question).unwrap_or_default(),
        };
    }

    pub fn close(&mut self) {
        self.state = DialogState::Closed;
    }

    fn form_mut(&mut self) -> Result<&mut QuestionForm, EditorError> {
        match &mut self.state {
            DialogState::Open { form, .. } => Ok(form),
            DialogState::Closed => Err(EditorError::DialogClosed),
        }
    }

    pub fn apply(&mut self, command: DialogCommand) -> Result<(), EditorError> {
        match command {
            DialogCommand::SetType { question_type } => self.set_type(question_type),
            DialogCommand::SetQuestion { text } => self.set_question(text),
            DialogCommand::SetOption { index, text } => self.set_option(index, text),
            DialogCommand::AddOption => self.add_option(),
            DialogCommand::RemoveOption { index } => self.remove_option(index),
            DialogCommand::SetCorrectAnswer { value } => self.set_correct_answer(value),
            DialogCommand::ToggleCorrectOption { value } => self.toggle_correct_option(value),
            DialogCommand::SetExplanation { text } => self.set_explanation(text),
            DialogCommand::SetPoints { points } => self.set_points(points),
        }
    }

    /// Changes the question type. Locked while editing an existing question.
    pub fn set_type(&mut self, question_type: QuestionType) -> Result<(), EditorError> {
        let editing = self.editing();
        let form = self.form_mut()?;
        let current = form.answer.question_type();
        if current == question_type {
            return Ok(());
        }
        if editing.is_some() {
            return Err(EditorError::TypeChange {
                from: current,
                to: question_type,
            });
        }

        form.answer = form.answer.clone().convert(question_type);
        Ok(())
    }

    pub fn set_question(&mut self, text: String) -> Result<(), EditorError> {
        self.form_mut()?.question = text;
        Ok(())
    }

    pub fn set_option(&mut self, index: usize, text: String) -> Result<(), EditorError> {
        match &mut self.form_mut()?.answer {
            AnswerForm::MultipleChoice { options, .. } | AnswerForm::MultipleSelect { options, .. } => {
                let len = options.len();
                let slot = options
                    .get_mut(index)
                    .ok_or(EditorError::OptionOutOfRange { index, len })?;
                *slot = text;
                Ok(())
            }
            other => Err(EditorError::NotApplicable {
                action: "set_option",
                question_type: other.question_type(),
            }),
        }
    }

    pub fn add_option(&mut self) -> Result<(), EditorError> {
        match &mut self.form_mut()?.answer {
            AnswerForm::MultipleChoice { options, .. } | AnswerForm::MultipleSelect { options, .. } => {
                options.push(String::new());
                Ok(())
            }
            other => Err(EditorError::NotApplicable {
                action: "add_option",
                question_type: other.question_type(),
            }),
        }
    }

    /// Removes an option slot. At least [`MIN_OPTIONS`] slots always remain.
    /// If the removed option was marked correct and no other slot holds the
    /// same text, the mark goes with it.
    pub fn remove_option(&mut self, index: usize) -> Result<(), EditorError> {
        match &mut self.form_mut()?.answer {
            AnswerForm::MultipleChoice {
                options,
                correct_answer,
            } => {
                let removed = remove_slot(options, index)?;
                if correct_answer.as_deref() == Some(removed.as_str())
                    && !options.contains(&removed)
                {
                    *correct_answer = None;
                }
                Ok(())
            }
            AnswerForm::MultipleSelect {
                options,
                correct_answers,
            } => {
                let removed = remove_slot(options, index)?;
                if !options.contains(&removed) {
                    correct_answers.remove(&removed);
                }
                Ok(())
            }
            other => Err(EditorError::NotApplicable {
                action: "remove_option",
                question_type: other.question_type(),
            }),
        }
    }

    /// Sets the single correct answer. Multi-select questions use
    /// [`QuestionDialog::toggle_correct_option`] instead.
    pub fn set_correct_answer(&mut self, value: String) -> Result<(), EditorError> {
        match &mut self.form_mut()?.answer {
            AnswerForm::MultipleChoice { correct_answer, .. } => {
                *correct_answer = Some(value);
                Ok(())
            }
            AnswerForm::TrueFalse { correct_answer } => {
                let parsed = TrueFalse::parse(&value).ok_or_else(|| {
                    EditorError::invalid(
                        "correct_answer",
                        "invalid_choice",
                        "A true/false answer must be 'true' or 'false'",
                    )
                })?;
                *correct_answer = Some(parsed);
                Ok(())
            }
            AnswerForm::ShortAnswer { correct_answer } => {
                *correct_answer = value;
                Ok(())
            }
            AnswerForm::MultipleSelect { .. } => Err(EditorError::NotApplicable {
                action: "set_correct_answer",
                question_type: QuestionType::MultipleSelect,
            }),
        }
    }

    pub fn toggle_correct_option(&mut self, value: String) -> Result<(), EditorError> {
        match &mut self.form_mut()?.answer {
            AnswerForm::MultipleSelect {
                correct_answers, ..
            } => {
                if !correct_answers.remove(&value) {
                    correct_answers.insert(value);
                }
                Ok(())
            }
            other => Err(EditorError::NotApplicable {
                action: "toggle_correct_option",
                question_type: other.question_type(),
            }),
        }
    }

    pub fn set_explanation(&mut self, text: String) -> Result<(), EditorError> {
        self.form_mut()?.explanation = text;
        Ok(())
    }

    pub fn set_points(&mut self, points: u32) -> Result<(), EditorError> {
        self.form_mut()?.points = points;
        Ok(())
    }

    /// Builds the question the form describes, or lists everything wrong with it.
    pub fn validate(&self) -> Result<QuestionData, EditorError> {
        let form = self.form().ok_or(EditorError::DialogClosed)?;
        let mut errors = Vec::new();

        let body = match &form.answer {
            AnswerForm::MultipleChoice {
                options,
                correct_answer,
            } => QuestionBody::MultipleChoice {
                options: options.clone(),
                correct_answer: correct_answer.clone().unwrap_or_default(),
            },
            AnswerForm::TrueFalse { correct_answer } => {
                let correct_answer = correct_answer.unwrap_or_else(|| {
                    errors.push(FieldError::new(
                        "correct_answer",
                        "required",
                        "Select true or false",
                    ));
                    TrueFalse::True
                });
                QuestionBody::TrueFalse { correct_answer }
            }
            AnswerForm::ShortAnswer { correct_answer } => QuestionBody::ShortAnswer {
                correct_answer: correct_answer.clone(),
            },
            AnswerForm::MultipleSelect {
                options,
                correct_answers,
            } => QuestionBody::MultipleSelect {
                options: options.clone(),
                correct_answers: correct_answers.clone(),
            },
        };

        let data = QuestionData {
            question: form.question.clone(),
            body,
            explanation: Some(form.explanation.clone()),
            points: form.points,
        }
        .normalized();

        if let Err(list) = data.check() {
            errors.extend(list);
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(EditorError::Invalid(errors))
        }
    }

    /// Validates the form and closes the dialog. On failure the dialog stays
    /// open with the form untouched.
    pub fn submit(&mut self) -> Result<DialogOutcome, EditorError> {
        let data = self.validate()?;
        let outcome = match self.editing() {
            Some(id) => DialogOutcome::Update(id, data),
            None => DialogOutcome::Add(data),
        };
        self.close();
        Ok(outcome)
    }

    /// Submits straight into `editor`. The dialog only closes once the editor
    /// accepted the question.
    pub fn submit_to(&mut self, editor: &mut QuizEditor) -> Result<QuestionId, EditorError> {
        let data = self.validate()?;
        let id = match self.editing() {
            Some(id) => editor.replace_question(id, data)?.id,
            None => editor.add_question(data)?.id,
        };
        self.close();
        Ok(id)
    }
}

fn remove_slot(options: &mut Vec<String>, index: usize) -> Result<String, EditorError> {
    if index >= options.len() {
        return Err(EditorError::OptionOutOfRange {
            index,
            len: options.len(),
        });
    }
    if options.len() <= MIN_OPTIONS {
        return Err(EditorError::TooFewOptions { min: MIN_OPTIONS });
    }
    Ok(options.remove(index))
}
