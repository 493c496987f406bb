use axum::{
    routing::{patch, post},
    Router,
};

use super::handlers::{
    clear_answers, close_question, create_value, delete_question, duplicate_question,
    like_question, open_question, order_question, submit_answer, update_question,
};
use crate::app_state::AppState;

pub fn question_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/questions/:question_id",
            patch(update_question).delete(delete_question),
        )
        .route("/api/questions/:question_id/order", post(order_question))
        .route("/api/questions/:question_id/open", post(open_question))
        .route("/api/questions/:question_id/close", post(close_question))
        .route(
            "/api/questions/:question_id/duplicate",
            post(duplicate_question),
        )
        .route("/api/questions/:question_id/like", post(like_question))
        .route("/api/questions/:question_id/answer", post(submit_answer))
        .route("/api/questions/:question_id/clear", post(clear_answers))
        .route("/api/questions/:question_id/values", post(create_value))
}
