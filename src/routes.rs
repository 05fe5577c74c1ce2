// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{dialog, editor, library},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Editor sessions: quiz fields, questions, save/cancel.
/// * Question dialog nested under each session.
/// * Library of saved quizzes.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let dialog_routes = Router::new()
        .route(
            "/",
            post(dialog::open_dialog)
                .get(dialog::get_dialog)
                .patch(dialog::apply_command)
                .delete(dialog::close_dialog),
        )
        .route("/submit", post(dialog::submit_dialog));

    let editor_routes = Router::new()
        .route("/", post(editor::open_session))
        .route(
            "/{session_id}",
            get(editor::get_session).patch(editor::update_quiz),
        )
        .route("/{session_id}/questions", post(editor::add_question))
        .route(
            "/{session_id}/questions/{question_id}",
            put(editor::update_question).delete(editor::delete_question),
        )
        .route(
            "/{session_id}/questions/{question_id}/move",
            post(editor::move_question),
        )
        .route("/{session_id}/save", post(editor::save_session))
        .route("/{session_id}/cancel", post(editor::cancel_session))
        .nest("/{session_id}/dialog", dialog_routes);

    let library_routes = Router::new()
        .route("/", get(library::list_quizzes))
        .route("/{quiz_id}", get(library::get_quiz))
        .route("/{quiz_id}/edit", post(editor::open_saved_quiz));

    Router::new()
        .nest("/api/editor/sessions", editor_routes)
        .nest("/api/quizzes", library_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
