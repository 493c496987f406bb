use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A submitted answer. Its score is derived on read from the question's
/// current values and never stored.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub value: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewAnswer {
    pub value: Option<String>,
}
