// src/handlers/dialog.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    editor::DialogCommand,
    error::AppError,
    models::question::QuestionId,
    state::{EditorSession, SessionId, Sessions},
};

/// DTO for opening the question dialog.
/// With `question_id` the dialog edits that question, otherwise it adds a new one.
#[derive(Debug, Default, Deserialize)]
pub struct OpenDialogRequest {
    #[serde(default)]
    pub question_id: Option<QuestionId>,
}

pub async fn open_dialog(
    State(sessions): State<Sessions>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<OpenDialogRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let EditorSession { editor, dialog, .. } = sessions.get_mut(session_id)?;

    match req.question_id {
        Some(id) => {
            let question = editor
                .question(id)
                .ok_or_else(|| AppError::NotFound(format!("Question {} not found", id)))?;
            dialog.open(Some(question));
        }
        None => dialog.open(None),
    }

    Ok(Json(dialog.state().clone()))
}

pub async fn get_dialog(
    State(sessions): State<Sessions>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = sessions.read().await;
    let session = sessions.get(session_id)?;

    Ok(Json(session.dialog.state().clone()))
}

/// Applies one form edit and returns the updated dialog state.
pub async fn apply_command(
    State(sessions): State<Sessions>,
    Path(session_id): Path<SessionId>,
    Json(command): Json<DialogCommand>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let session = sessions.get_mut(session_id)?;
    session.dialog.apply(command)?;

    Ok(Json(session.dialog.state().clone()))
}

/// Validates the form and adds or updates the question in the quiz.
pub async fn submit_dialog(
    State(sessions): State<Sessions>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    let EditorSession { editor, dialog, .. } = sessions.get_mut(session_id)?;

    let adding = dialog.editing().is_none();
    let question_id = dialog.submit_to(editor)?;
    let question = editor
        .question(question_id)
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Submitted question missing".to_string()))?;

    let status = if adding { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(question)))
}

pub async fn close_dialog(
    State(sessions): State<Sessions>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = sessions.write().await;
    sessions.get_mut(session_id)?.dialog.close();

    Ok(StatusCode::NO_CONTENT)
}
