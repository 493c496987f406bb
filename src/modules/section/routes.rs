use axum::{
    routing::{patch, post},
    Router,
};

use super::handlers::{
    close_section, create_question, delete_section, open_section, order_section, update_section,
};
use crate::app_state::AppState;

pub fn section_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/sections/:section_id",
            patch(update_section).delete(delete_section),
        )
        .route("/api/sections/:section_id/order", post(order_section))
        .route("/api/sections/:section_id/open", post(open_section))
        .route("/api/sections/:section_id/close", post(close_section))
        .route("/api/sections/:section_id/questions", post(create_question))
}
