use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub container_id: Option<i64>,
    pub user_id: Option<i64>,
    pub name: String,
    pub order_number: Option<i32>,
    pub open: bool,
    pub closed: bool,
}

/// Scaffolding templates for new sections, mirroring the classic
/// quiz-night round shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionTemplate {
    Generic,
    Multiple,
    Connection,
    Whoami,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewSection {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    pub order_number: Option<i32>,
    pub template: Option<SectionTemplate>,
    #[validate(range(min = 1))]
    pub number_of_questions: Option<i32>,
    #[validate(range(min = 1))]
    pub number_of_choices: Option<i32>,
    #[validate(range(min = 1))]
    pub opportunities: Option<i32>,
    /// Comma-separated accepted answers for the connection and
    /// who-am-I templates.
    pub connection: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSection {
    #[validate(length(min = 1, max = 80))]
    pub name: Option<String>,
}
