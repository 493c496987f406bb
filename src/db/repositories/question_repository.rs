use sqlx::{PgPool, Postgres, Transaction};

use crate::db::error::DatabaseError;
use crate::db::ids::generate_id;
use crate::db::models::{NewQuestion, Question, QuestionImport, UpdateQuestion};
use crate::ordering::{Assignment, Sibling};

const QUESTION_COLUMNS: &str = "id, container_id, order_number, content, answer_content, \
     show_values, max_answers, base_points, bonus, open, closed";

pub struct QuestionRepository;

impl QuestionRepository {
    pub async fn get(pool: &PgPool, question_id: i64) -> Result<Option<Question>, DatabaseError> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(question_id)
        .fetch_optional(pool)
        .await?;

        Ok(question)
    }

    /// All questions of a quiz in section order, for snapshot assembly
    /// and export.
    pub async fn list_by_quiz(pool: &PgPool, quiz_id: i64) -> Result<Vec<Question>, DatabaseError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT q.id, q.container_id, q.order_number, q.content, q.answer_content,
                   q.show_values, q.max_answers, q.base_points, q.bonus, q.open, q.closed
            FROM questions q
            JOIN sections s ON s.id = q.container_id
            WHERE s.container_id = $1
            ORDER BY s.order_number, q.order_number
            "#,
        )
        .bind(quiz_id)
        .fetch_all(pool)
        .await?;

        Ok(questions)
    }

    pub async fn siblings(
        tx: &mut Transaction<'_, Postgres>,
        section_id: i64,
    ) -> Result<Vec<Sibling>, DatabaseError> {
        let rows = sqlx::query_as::<_, (i64, Option<i32>)>(
            "SELECT id, order_number FROM questions WHERE container_id = $1 ORDER BY order_number",
        )
        .bind(section_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, order_number)| Sibling { id, order_number })
            .collect())
    }

    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        section_id: i64,
        data: &NewQuestion,
        order_number: Option<i32>,
    ) -> Result<Question, DatabaseError> {
        let id = generate_id(tx, "questions").await?;
        let question = sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions
                (id, container_id, order_number, content, answer_content,
                 show_values, max_answers, base_points, bonus)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(section_id)
        .bind(order_number)
        .bind(&data.content)
        .bind(&data.answer_content)
        .bind(data.show_values)
        .bind(data.max_answers.unwrap_or(1))
        .bind(data.base_points.unwrap_or(0))
        .bind(data.bonus)
        .fetch_one(&mut **tx)
        .await?;

        Ok(question)
    }

    pub async fn update(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
        data: &UpdateQuestion,
    ) -> Result<Question, DatabaseError> {
        let question = sqlx::query_as::<_, Question>(&format!(
            r#"
            UPDATE questions
            SET content = COALESCE($1, content),
                answer_content = COALESCE($2, answer_content),
                show_values = COALESCE($3, show_values),
                max_answers = COALESCE($4, max_answers),
                base_points = COALESCE($5, base_points),
                bonus = COALESCE($6, bonus)
            WHERE id = $7
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(&data.content)
        .bind(&data.answer_content)
        .bind(data.show_values)
        .bind(data.max_answers)
        .bind(data.base_points)
        .bind(data.bonus)
        .bind(question_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(question)
    }

    pub async fn set_open(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
        open: bool,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE questions SET open = $1 WHERE id = $2")
            .bind(open)
            .bind(question_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn set_closed(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
        closed: bool,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE questions SET closed = $1 WHERE id = $2")
            .bind(closed)
            .bind(question_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn apply_order(
        tx: &mut Transaction<'_, Postgres>,
        assignments: &[Assignment],
    ) -> Result<(), DatabaseError> {
        for assignment in assignments {
            sqlx::query("UPDATE questions SET order_number = $1 WHERE id = $2")
                .bind(assignment.order_number)
                .bind(assignment.id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    pub async fn delete(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
    ) -> Result<Option<i32>, DatabaseError> {
        let order_number = sqlx::query_scalar::<_, Option<i32>>(
            "DELETE FROM questions WHERE id = $1 RETURNING order_number",
        )
        .bind(question_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(order_number)
    }

    /// Flip the like of a user on a question; returns whether the
    /// question ends up liked.
    pub async fn toggle_like(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
        user_id: i64,
    ) -> Result<bool, DatabaseError> {
        let removed = sqlx::query(
            "DELETE FROM question_likes WHERE question_id = $1 AND user_id = $2",
        )
        .bind(question_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO question_likes (user_id, question_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(question_id)
            .execute(&mut **tx)
            .await?;

        Ok(true)
    }

    /// `(question_id, user_id)` like pairs for every question of a quiz.
    pub async fn likes_by_quiz(
        pool: &PgPool,
        quiz_id: i64,
    ) -> Result<Vec<(i64, i64)>, DatabaseError> {
        let likes = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT l.question_id, l.user_id
            FROM question_likes l
            JOIN questions q ON q.id = l.question_id
            JOIN sections s ON s.id = q.container_id
            WHERE s.container_id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_all(pool)
        .await?;

        Ok(likes)
    }

    pub async fn exists(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
    ) -> Result<bool, DatabaseError> {
        let found =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM questions WHERE id = $1)")
                .bind(question_id)
                .fetch_one(&mut **tx)
                .await?;

        Ok(found)
    }

    pub async fn insert_import(
        tx: &mut Transaction<'_, Postgres>,
        data: &QuestionImport,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO questions
                (id, container_id, order_number, content, answer_content,
                 show_values, max_answers, base_points, bonus, open, closed)
            VALUES ($1, $2, $3, $4, $5,
                    COALESCE($6, FALSE), COALESCE($7, 1), COALESCE($8, 0),
                    COALESCE($9, FALSE), COALESCE($10, FALSE), COALESCE($11, FALSE))
            "#,
        )
        .bind(data.id)
        .bind(data.container_id)
        .bind(data.order_number)
        .bind(&data.content)
        .bind(&data.answer_content)
        .bind(data.show_values)
        .bind(data.max_answers)
        .bind(data.base_points)
        .bind(data.bonus)
        .bind(data.open)
        .bind(data.closed)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn update_import(
        tx: &mut Transaction<'_, Postgres>,
        data: &QuestionImport,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE questions
            SET container_id = COALESCE($1, container_id),
                order_number = COALESCE($2, order_number),
                content = COALESCE($3, content),
                answer_content = COALESCE($4, answer_content),
                show_values = COALESCE($5, show_values),
                max_answers = COALESCE($6, max_answers),
                base_points = COALESCE($7, base_points),
                bonus = COALESCE($8, bonus),
                open = COALESCE($9, open),
                closed = COALESCE($10, closed)
            WHERE id = $11
            "#,
        )
        .bind(data.container_id)
        .bind(data.order_number)
        .bind(&data.content)
        .bind(&data.answer_content)
        .bind(data.show_values)
        .bind(data.max_answers)
        .bind(data.base_points)
        .bind(data.bonus)
        .bind(data.open)
        .bind(data.closed)
        .bind(data.id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn delete_missing(
        tx: &mut Transaction<'_, Postgres>,
        keep_ids: &[i64],
    ) -> Result<u64, DatabaseError> {
        let removed = sqlx::query("DELETE FROM questions WHERE id != ALL($1)")
            .bind(keep_ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(removed)
    }
}
