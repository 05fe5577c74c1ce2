// src/handlers/editor.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    editor::{DialogState, Direction, QuizEditor},
    error::AppError,
    models::{
        question::{QuestionData, QuestionId, QuestionPatch},
        quiz::{Quiz, QuizId, QuizPatch},
    },
    state::{EditorSession, Library, SessionId, SessionTable, Sessions},
};

/// Snapshot of an editor session returned to the client.
#[derive(Debug, Serialize)]
pub struct EditorView {
    pub session_id: SessionId,
    pub quiz: Quiz,
    pub total_points: u64,
    pub question_count: usize,
    pub dialog: DialogState,
    pub opened_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl EditorView {
    fn of(session_id: SessionId, session: &EditorSession) -> Self {
        Self {
            session_id,
            quiz: session.editor.quiz().clone(),
            total_points: session.editor.total_points(),
            question_count: session.editor.questions().len(),
            dialog: session.dialog.state().clone(),
            opened_at: session.opened_at,
            last_active: session.last_active,
        }
    }
}

/// DTO for opening an editor. Without `quiz` a fresh one is created.
#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

fn insert_session(sessions: &mut SessionTable, editor: QuizEditor) -> Result<EditorView, AppError> {
    let (session_id, session) = sessions.insert(editor)?;
    let view = EditorView::of(session_id, session);

    tracing::info!(session_id = %session_id, quiz_id = %view.quiz.id, "editor session opened");
    Ok(view)
}

/// Opens an editor on a new quiz, or on the quiz supplied in the body.
pub async fn open_session(
    State(sessions): State<Sessions>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let view = insert_session(&mut sessions, QuizEditor::open(req.quiz))?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Opens an editor on a quiz previously saved to the library.
pub async fn open_saved_quiz(
    State(sessions): State<Sessions>,
    State(library): State<Library>,
    Path(quiz_id): Path<QuizId>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let quiz = library
        .read()
        .await
        .get(quiz_id)
        .map(|saved| saved.quiz.clone())
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let view = insert_session(&mut sessions, QuizEditor::open(Some(quiz)))?;

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(sessions): State<Sessions>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = sessions.read().await;
    let session = sessions.get(session_id)?;

    Ok(Json(EditorView::of(session_id, session)))
}

/// Merges top-level quiz fields. Validation waits until save.
pub async fn update_quiz(
    State(sessions): State<Sessions>,
    Path(session_id): Path<SessionId>,
    Json(patch): Json<QuizPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let session = sessions.get_mut(session_id)?;
    session.editor.update_quiz(patch);

    Ok(Json(EditorView::of(session_id, session)))
}

/// Appends a question built by the client.
pub async fn add_question(
    State(sessions): State<Sessions>,
    Path(session_id): Path<SessionId>,
    Json(data): Json<QuestionData>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let session = sessions.get_mut(session_id)?;
    let question = session.editor.add_question(data)?.clone();

    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn update_question(
    State(sessions): State<Sessions>,
    Path((session_id, question_id)): Path<(SessionId, QuestionId)>,
    Json(patch): Json<QuestionPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let session = sessions.get_mut(session_id)?;
    let question = session.editor.update_question(question_id, patch)?.clone();

    Ok(Json(question))
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
}

/// Deletes a question. The client must confirm with `?confirm=true`.
pub async fn delete_question(
    State(sessions): State<Sessions>,
    Path((session_id, question_id)): Path<(SessionId, QuestionId)>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let session = sessions.get_mut(session_id)?;

    let removed = session
        .editor
        .delete_question(question_id, |_| params.confirm)?;
    if removed.is_none() {
        return Err(AppError::BadRequest(
            "Deleting a question must be confirmed with confirm=true".to_string(),
        ));
    }

    // The dialog must not keep editing a question that is gone.
    if session.dialog.editing() == Some(question_id) {
        session.dialog.close();
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

pub async fn move_question(
    State(sessions): State<Sessions>,
    Path((session_id, question_id)): Path<(SessionId, QuestionId)>,
    Json(req): Json<MoveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let session = sessions.get_mut(session_id)?;
    let moved = session.editor.move_question(question_id, req.direction)?;

    Ok(Json(serde_json::json!({
        "moved": moved,
        "questions": session.editor.questions(),
    })))
}

/// Validates the quiz and hands it to the library.
///
/// * On success the session ends and the stored quiz is returned.
/// * On failure the session stays open and the field errors are returned.
pub async fn save_session(
    State(sessions): State<Sessions>,
    State(library): State<Library>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let EditorSession {
        editor,
        dialog,
        opened_at,
        ..
    } = sessions.remove(session_id)?;

    let quiz_id = editor.quiz().id;
    let mut library = library.write().await;
    if let Err(rejected) = editor.save(&mut *library) {
        sessions.restore(
            session_id,
            EditorSession {
                editor: rejected.editor,
                dialog,
                opened_at,
                last_active: Utc::now(),
            },
        );
        return Err(rejected.error.into());
    }

    let saved = library
        .get(quiz_id)
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Saved quiz missing from library".to_string()))?;

    Ok(Json(saved))
}

/// Discards the session without saving.
pub async fn cancel_session(
    State(sessions): State<Sessions>,
    State(library): State<Library>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let session = sessions.remove(session_id)?;

    session.editor.cancel(&mut *library.write().await);

    Ok(StatusCode::NO_CONTENT)
}
