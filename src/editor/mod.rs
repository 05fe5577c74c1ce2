// src/editor/mod.rs

//! In-memory authoring state: the quiz editor and its question dialog.

pub mod dialog;
pub mod quiz_editor;

pub use dialog::{DialogCommand, DialogOutcome, DialogState, QuestionDialog};
pub use quiz_editor::{Direction, QuizEditor, QuizHost, SaveRejected};
