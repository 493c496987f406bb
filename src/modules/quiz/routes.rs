use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_quiz, create_section, delete_quiz, join_quiz, list_quizzes, poll_quiz, update_quiz,
};
use crate::app_state::AppState;

pub fn quiz_routes() -> Router<AppState> {
    Router::new()
        .route("/api/quizzes", get(list_quizzes).post(create_quiz))
        .route(
            "/api/quizzes/:quiz_id",
            get(poll_quiz).patch(update_quiz).delete(delete_quiz),
        )
        .route("/api/quizzes/:quiz_id/join", post(join_quiz))
        .route("/api/quizzes/:quiz_id/sections", post(create_section))
}
