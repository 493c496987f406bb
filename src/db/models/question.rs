use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub container_id: i64,
    pub order_number: Option<i32>,
    pub content: Option<String>,
    pub answer_content: Option<String>,
    pub show_values: bool,
    pub max_answers: i32,
    pub base_points: i32,
    pub bonus: bool,
    pub open: bool,
    pub closed: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct NewQuestion {
    pub content: Option<String>,
    pub answer_content: Option<String>,
    #[serde(default)]
    pub show_values: bool,
    #[validate(range(min = 1))]
    pub max_answers: Option<i32>,
    pub base_points: Option<i32>,
    #[serde(default)]
    pub bonus: bool,
    pub order_number: Option<i32>,
}

/// One row of a bulk question import, allowlisted columns only.
#[derive(Debug, Default, PartialEq)]
pub struct QuestionImport {
    pub id: i64,
    pub container_id: Option<i64>,
    pub order_number: Option<i32>,
    pub content: Option<String>,
    pub answer_content: Option<String>,
    pub show_values: Option<bool>,
    pub max_answers: Option<i32>,
    pub base_points: Option<i32>,
    pub bonus: Option<bool>,
    pub open: Option<bool>,
    pub closed: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestion {
    pub content: Option<String>,
    pub answer_content: Option<String>,
    pub show_values: Option<bool>,
    #[validate(range(min = 1))]
    pub max_answers: Option<i32>,
    pub base_points: Option<i32>,
    pub bonus: Option<bool>,
}
