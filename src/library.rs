// src/library.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    editor::QuizHost,
    models::quiz::{Quiz, QuizId},
};

/// A quiz handed over by the editor, with bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct SavedQuiz {
    pub quiz: Quiz,
    /// Starts at 1 and grows each time the same quiz is saved again.
    pub revision: u32,
    pub saved_at: DateTime<Utc>,
}

/// Summary row for listing.
#[derive(Debug, Serialize)]
pub struct SavedQuizSummary {
    pub id: QuizId,
    pub title: String,
    pub question_count: usize,
    pub total_points: u64,
    pub revision: u32,
    pub saved_at: DateTime<Utc>,
}

/// Receives finished quizzes from editor sessions. Lives in memory only.
#[derive(Debug, Default)]
pub struct QuizLibrary {
    quizzes: HashMap<QuizId, SavedQuiz>,
    cancelled: u64,
}

impl QuizLibrary {
    pub fn get(&self, id: QuizId) -> Option<&SavedQuiz> {
        self.quizzes.get(&id)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<SavedQuizSummary> {
        let mut rows: Vec<SavedQuizSummary> = self
            .quizzes
            .values()
            .map(|saved| SavedQuizSummary {
                id: saved.quiz.id,
                title: saved.quiz.title.clone(),
                question_count: saved.quiz.questions.len(),
                total_points: saved
                    .quiz
                    .questions
                    .iter()
                    .map(|q| u64::from(q.points()))
                    .sum(),
                revision: saved.revision,
                saved_at: saved.saved_at,
            })
            .collect();
        rows.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        rows
    }

    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl QuizHost for QuizLibrary {
    fn on_save(&mut self, quiz: Quiz) {
        let revision = self
            .quizzes
            .get(&quiz.id)
            .map_or(1, |previous| previous.revision + 1);
        tracing::info!(quiz_id = %quiz.id, revision, "quiz stored in library");

        self.quizzes.insert(
            quiz.id,
            SavedQuiz {
                quiz,
                revision,
                saved_at: Utc::now(),
            },
        );
    }

    fn on_cancel(&mut self) {
        self.cancelled += 1;
    }
}
