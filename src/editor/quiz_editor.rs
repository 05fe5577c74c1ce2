// src/editor/quiz_editor.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::EditorError,
    models::{
        question::{Question, QuestionData, QuestionId, QuestionPatch},
        quiz::{Quiz, QuizPatch},
    },
};

/// The page hosting the editor. Receives the finished quiz or the cancellation.
pub trait QuizHost {
    fn on_save(&mut self, quiz: Quiz);
    fn on_cancel(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Returned by [`QuizEditor::save`] when the quiz is not ready.
/// Hands the editor back so the author can fix it and retry.
#[derive(Debug)]
pub struct SaveRejected {
    pub editor: QuizEditor,
    pub error: EditorError,
}

/// Owns the quiz while it is being authored.
///
/// Every mutation goes through this type, which keeps question `order`
/// values equal to `1..=N` in list order at all times.
#[derive(Debug, Clone)]
pub struct QuizEditor {
    quiz: Quiz,
}

impl Default for QuizEditor {
    fn default() -> Self {
        Self::open(None)
    }
}

impl QuizEditor {
    /// Starts editing `existing`, or a fresh empty quiz when `None`.
    ///
    /// Every lookup goes by id, so a repeated question id is replaced with a
    /// fresh one. The first question carrying an id keeps it.
    pub fn open(existing: Option<Quiz>) -> Self {
        let mut editor = Self {
            quiz: existing.unwrap_or_default(),
        };
        editor.assign_unique_ids();
        editor.renumber();
        editor
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn questions(&self) -> &[Question] {
        &self.quiz.questions
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.quiz.questions.iter().find(|q| q.id == id)
    }

    pub fn update_quiz(&mut self, patch: QuizPatch) {
        patch.apply_to(&mut self.quiz);
    }

    /// Appends a question at the end of the quiz.
    pub fn add_question(&mut self, data: QuestionData) -> Result<&Question, EditorError> {
        let data = data.normalized();
        data.check().map_err(EditorError::Invalid)?;

        let order = self.quiz.questions.len() as u32 + 1;
        let question = Question {
            id: Uuid::new_v4(),
            order,
            data,
        };
        tracing::debug!(quiz_id = %self.quiz.id, question_id = %question.id, order, "question added");

        self.quiz.questions.push(question);
        let last = self.quiz.questions.len() - 1;
        Ok(&self.quiz.questions[last])
    }

    /// Merges `patch` into the question. The merged result must still be valid
    /// and keep the question's original type.
    pub fn update_question(
        &mut self,
        id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<&Question, EditorError> {
        let index = self.position(id)?;
        let mut data = self.quiz.questions[index].data.clone();
        patch.apply_to(&mut data);
        self.store(index, data)
    }

    /// Replaces the whole content of a question, keeping its id and position.
    pub fn replace_question(
        &mut self,
        id: QuestionId,
        data: QuestionData,
    ) -> Result<&Question, EditorError> {
        let index = self.position(id)?;
        self.store(index, data)
    }

    fn store(&mut self, index: usize, data: QuestionData) -> Result<&Question, EditorError> {
        let current = &self.quiz.questions[index];
        if data.question_type() != current.question_type() {
            return Err(EditorError::TypeChange {
                from: current.question_type(),
                to: data.question_type(),
            });
        }

        let data = data.normalized();
        data.check().map_err(EditorError::Invalid)?;

        let question = &mut self.quiz.questions[index];
        question.data = data;
        tracing::debug!(quiz_id = %self.quiz.id, question_id = %question.id, "question updated");
        Ok(question)
    }

    /// Removes a question once `confirm` agrees.
    ///
    /// Returns the removed question, or `None` when the confirmation was declined.
    pub fn delete_question<F>(
        &mut self,
        id: QuestionId,
        confirm: F,
    ) -> Result<Option<Question>, EditorError>
    where
        F: FnOnce(&Question) -> bool,
    {
        let index = self.position(id)?;
        if !confirm(&self.quiz.questions[index]) {
            return Ok(None);
        }

        let removed = self.quiz.questions.remove(index);
        self.renumber();
        tracing::debug!(quiz_id = %self.quiz.id, question_id = %id, "question deleted");
        Ok(Some(removed))
    }

    /// Swaps the question with its neighbour. Returns `false` at the boundaries.
    pub fn move_question(&mut self, id: QuestionId, direction: Direction) -> Result<bool, EditorError> {
        let index = self.position(id)?;
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.quiz.questions.len() => index + 1,
            _ => return Ok(false),
        };

        self.quiz.questions.swap(index, target);
        self.renumber();
        Ok(true)
    }

    pub fn total_points(&self) -> u64 {
        self.quiz
            .questions
            .iter()
            .map(|q| u64::from(q.points()))
            .sum()
    }

    /// Everything that would block [`QuizEditor::save`].
    pub fn validate(&self) -> Result<(), EditorError> {
        let mut errors = self.quiz.check_fields();

        for question in &self.quiz.questions {
            if let Err(list) = question.data.check() {
                errors.extend(list.into_iter().map(|mut err| {
                    err.field = format!("questions[{}].{}", question.order, err.field);
                    err
                }));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EditorError::Invalid(errors))
        }
    }

    /// Hands the quiz to `host` if it passes validation.
    /// `host.on_save` is never called for an invalid quiz.
    pub fn save<H: QuizHost>(self, host: &mut H) -> Result<(), SaveRejected> {
        if let Err(error) = self.validate() {
            tracing::info!(quiz_id = %self.quiz.id, "save blocked: {}", error);
            return Err(SaveRejected {
                editor: self,
                error,
            });
        }

        tracing::info!(
            quiz_id = %self.quiz.id,
            questions = self.quiz.questions.len(),
            "quiz saved"
        );
        host.on_save(self.quiz);
        Ok(())
    }

    /// Discards the quiz and notifies `host`.
    pub fn cancel<H: QuizHost>(self, host: &mut H) {
        tracing::info!(quiz_id = %self.quiz.id, "editing cancelled");
        host.on_cancel();
    }

    fn position(&self, id: QuestionId) -> Result<usize, EditorError> {
        self.quiz
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or(EditorError::QuestionNotFound(id))
    }

    fn assign_unique_ids(&mut self) {
        let quiz_id = self.quiz.id;
        let mut seen = HashSet::with_capacity(self.quiz.questions.len());
        for question in &mut self.quiz.questions {
            if !seen.insert(question.id) {
                let fresh = Uuid::new_v4();
                tracing::warn!(
                    %quiz_id,
                    duplicate = %question.id,
                    replacement = %fresh,
                    "repeated question id replaced"
                );
                question.id = fresh;
                seen.insert(fresh);
            }
        }
    }

    fn renumber(&mut self) {
        for (index, question) in self.quiz.questions.iter_mut().enumerate() {
            question.order = index as u32 + 1;
        }
    }
}
