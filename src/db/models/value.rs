use serde::{Deserialize, Serialize};
use validator::Validate;

/// An accepted (or penalized) answer for a question. Positive points
/// mark a correct answer, zero or negative points an explicit
/// wrong-answer distractor. `allowed_misses` is the exclusive edit
/// distance threshold; zero demands an exact match.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Value {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub allowed_misses: i32,
    pub points: f64,
    pub order_number: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewValue {
    #[validate(length(min = 1, max = 255))]
    pub text: String,
    #[validate(range(min = 0))]
    pub allowed_misses: Option<i32>,
    pub points: Option<f64>,
    pub order_number: Option<i32>,
}

/// One row of a bulk value import. Only allowlisted columns exist;
/// fields left empty in the source keep their current database value.
#[derive(Debug, Default, PartialEq)]
pub struct ValueImport {
    pub id: i64,
    pub question_id: Option<i64>,
    pub text: Option<String>,
    pub allowed_misses: Option<i32>,
    pub points: Option<f64>,
    pub order_number: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateValue {
    #[validate(length(min = 1, max = 255))]
    pub text: Option<String>,
    #[validate(range(min = 0))]
    pub allowed_misses: Option<i32>,
    pub points: Option<f64>,
    pub order_number: Option<i32>,
}
