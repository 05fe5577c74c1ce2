// src/handlers/library.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, models::quiz::QuizId, state::Library};

/// Lists saved quizzes, newest first.
pub async fn list_quizzes(State(library): State<Library>) -> Result<impl IntoResponse, AppError> {
    let rows = library.read().await.list();

    Ok(Json(rows))
}

pub async fn get_quiz(
    State(library): State<Library>,
    Path(quiz_id): Path<QuizId>,
) -> Result<impl IntoResponse, AppError> {
    let saved = library
        .read()
        .await
        .get(quiz_id)
        .cloned()
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(saved))
}
