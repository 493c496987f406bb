use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;

use crate::db::error::DatabaseError;
use crate::db::ids::generate_id;
use crate::db::models::{NewQuiz, Quiz, UpdateQuiz};

const QUIZ_COLUMNS: &str = "id, name, start_time, end_time, password, last_updated";

pub struct QuizRepository;

impl QuizRepository {
    pub async fn get(pool: &PgPool, quiz_id: i64) -> Result<Option<Quiz>, DatabaseError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?;

        Ok(quiz)
    }

    /// Quizzes a user may see: already started ones plus everything the
    /// user hosts, newest first.
    pub async fn list_visible(
        pool: &PgPool,
        user_id: i64,
        now: OffsetDateTime,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Quiz>, DatabaseError> {
        let quizzes = sqlx::query_as::<_, Quiz>(&format!(
            r#"
            SELECT {QUIZ_COLUMNS}
            FROM quizzes
            WHERE (start_time IS NOT NULL AND start_time < $1)
               OR id IN (SELECT quiz_id FROM quiz_hosts WHERE user_id = $2)
            ORDER BY start_time DESC NULLS LAST
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(now)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(quizzes)
    }

    pub async fn count_visible(
        pool: &PgPool,
        user_id: i64,
        now: OffsetDateTime,
    ) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM quizzes
            WHERE (start_time IS NOT NULL AND start_time < $1)
               OR id IN (SELECT quiz_id FROM quiz_hosts WHERE user_id = $2)
            "#,
        )
        .bind(now)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: &NewQuiz,
    ) -> Result<Quiz, DatabaseError> {
        let id = generate_id(tx, "quizzes").await?;
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            r#"
            INSERT INTO quizzes (id, name, start_time, end_time, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {QUIZ_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(&data.password)
        .fetch_one(&mut **tx)
        .await?;

        Ok(quiz)
    }

    pub async fn update(
        tx: &mut Transaction<'_, Postgres>,
        quiz_id: i64,
        data: &UpdateQuiz,
    ) -> Result<Quiz, DatabaseError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            r#"
            UPDATE quizzes
            SET name = COALESCE($1, name),
                start_time = COALESCE($2, start_time),
                end_time = COALESCE($3, end_time),
                password = COALESCE($4, password)
            WHERE id = $5
            RETURNING {QUIZ_COLUMNS}
            "#
        ))
        .bind(&data.name)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(&data.password)
        .bind(quiz_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(quiz)
    }

    pub async fn delete(
        tx: &mut Transaction<'_, Postgres>,
        quiz_id: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn add_host(
        tx: &mut Transaction<'_, Postgres>,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO quiz_hosts (user_id, quiz_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(quiz_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn is_host(
        pool: &PgPool,
        quiz_id: i64,
        user_id: i64,
    ) -> Result<bool, DatabaseError> {
        let hosted = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM quiz_hosts WHERE quiz_id = $1 AND user_id = $2)",
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(hosted)
    }

    /// Stamp the quiz watermark so polling clients pick up the change.
    pub async fn touch(
        tx: &mut Transaction<'_, Postgres>,
        quiz_id: i64,
        at: OffsetDateTime,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE quizzes SET last_updated = $1 WHERE id = $2")
            .bind(at)
            .bind(quiz_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
