use sqlx::{PgPool, Postgres, Transaction};

use crate::db::error::DatabaseError;
use crate::db::ids::generate_id;
use crate::db::models::Answer;

const ANSWER_COLUMNS: &str = r#"id, user_id, question_id, value, "timestamp""#;

pub struct AnswerRepository;

impl AnswerRepository {
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        question_id: i64,
        value: &str,
    ) -> Result<Answer, DatabaseError> {
        let id = generate_id(tx, "answers").await?;
        let answer = sqlx::query_as::<_, Answer>(&format!(
            r#"
            INSERT INTO answers (id, user_id, question_id, value)
            VALUES ($1, $2, $3, $4)
            RETURNING {ANSWER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(question_id)
        .bind(value)
        .fetch_one(&mut **tx)
        .await?;

        Ok(answer)
    }

    pub async fn delete_for_user(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
        user_id: i64,
    ) -> Result<u64, DatabaseError> {
        let removed = sqlx::query("DELETE FROM answers WHERE question_id = $1 AND user_id = $2")
            .bind(question_id)
            .bind(user_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(removed)
    }

    pub async fn list_by_quiz(pool: &PgPool, quiz_id: i64) -> Result<Vec<Answer>, DatabaseError> {
        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.id, a.user_id, a.question_id, a.value, a."timestamp"
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            JOIN sections s ON s.id = q.container_id
            WHERE s.container_id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_all(pool)
        .await?;

        Ok(answers)
    }

    /// Whether the user already answered another bonus question in the
    /// same section.
    pub async fn has_other_bonus_answer(
        pool: &PgPool,
        section_id: i64,
        question_id: i64,
        user_id: i64,
    ) -> Result<bool, DatabaseError> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM answers a
                JOIN questions q ON q.id = a.question_id
                WHERE q.container_id = $1
                  AND q.bonus
                  AND q.id != $2
                  AND a.user_id = $3
            )
            "#,
        )
        .bind(section_id)
        .bind(question_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(found)
    }
}
