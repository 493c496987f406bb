use sqlx::{PgPool, Postgres, Transaction};

use crate::db::error::DatabaseError;
use crate::db::ids::generate_id;
use crate::db::models::{UpdateValue, Value, ValueImport};

const VALUE_COLUMNS: &str = "id, question_id, text, allowed_misses, points, order_number";

pub struct ValueRepository;

impl ValueRepository {
    pub async fn get(pool: &PgPool, value_id: i64) -> Result<Option<Value>, DatabaseError> {
        let value = sqlx::query_as::<_, Value>(&format!(
            "SELECT {VALUE_COLUMNS} FROM question_values WHERE id = $1"
        ))
        .bind(value_id)
        .fetch_optional(pool)
        .await?;

        Ok(value)
    }

    pub async fn list_by_question(
        pool: &PgPool,
        question_id: i64,
    ) -> Result<Vec<Value>, DatabaseError> {
        let values = sqlx::query_as::<_, Value>(&format!(
            "SELECT {VALUE_COLUMNS} FROM question_values WHERE question_id = $1 ORDER BY order_number"
        ))
        .bind(question_id)
        .fetch_all(pool)
        .await?;

        Ok(values)
    }

    pub async fn list_by_quiz(pool: &PgPool, quiz_id: i64) -> Result<Vec<Value>, DatabaseError> {
        let values = sqlx::query_as::<_, Value>(
            r#"
            SELECT v.id, v.question_id, v.text, v.allowed_misses, v.points, v.order_number
            FROM question_values v
            JOIN questions q ON q.id = v.question_id
            JOIN sections s ON s.id = q.container_id
            WHERE s.container_id = $1
            ORDER BY s.order_number, q.order_number, v.order_number
            "#,
        )
        .bind(quiz_id)
        .fetch_all(pool)
        .await?;

        Ok(values)
    }

    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
        text: &str,
        allowed_misses: i32,
        points: f64,
        order_number: Option<i32>,
    ) -> Result<Value, DatabaseError> {
        let id = generate_id(tx, "question_values").await?;
        let value = sqlx::query_as::<_, Value>(&format!(
            r#"
            INSERT INTO question_values (id, question_id, text, allowed_misses, points, order_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VALUE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(question_id)
        .bind(text)
        .bind(allowed_misses)
        .bind(points)
        .bind(order_number)
        .fetch_one(&mut **tx)
        .await?;

        Ok(value)
    }

    pub async fn update(
        tx: &mut Transaction<'_, Postgres>,
        value_id: i64,
        data: &UpdateValue,
    ) -> Result<Value, DatabaseError> {
        let value = sqlx::query_as::<_, Value>(&format!(
            r#"
            UPDATE question_values
            SET text = COALESCE($1, text),
                allowed_misses = COALESCE($2, allowed_misses),
                points = COALESCE($3, points),
                order_number = COALESCE($4, order_number)
            WHERE id = $5
            RETURNING {VALUE_COLUMNS}
            "#
        ))
        .bind(&data.text)
        .bind(data.allowed_misses)
        .bind(data.points)
        .bind(data.order_number)
        .bind(value_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(value)
    }

    pub async fn delete(
        tx: &mut Transaction<'_, Postgres>,
        value_id: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM question_values WHERE id = $1")
            .bind(value_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn exists(
        tx: &mut Transaction<'_, Postgres>,
        value_id: i64,
    ) -> Result<bool, DatabaseError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM question_values WHERE id = $1)",
        )
        .bind(value_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(found)
    }

    pub async fn insert_import(
        tx: &mut Transaction<'_, Postgres>,
        data: &ValueImport,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO question_values (id, question_id, text, allowed_misses, points, order_number)
            VALUES ($1, $2, COALESCE($3, ''), COALESCE($4, 0), COALESCE($5, 1.0), $6)
            "#,
        )
        .bind(data.id)
        .bind(data.question_id)
        .bind(&data.text)
        .bind(data.allowed_misses)
        .bind(data.points)
        .bind(data.order_number)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn update_import(
        tx: &mut Transaction<'_, Postgres>,
        data: &ValueImport,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE question_values
            SET question_id = COALESCE($1, question_id),
                text = COALESCE($2, text),
                allowed_misses = COALESCE($3, allowed_misses),
                points = COALESCE($4, points),
                order_number = COALESCE($5, order_number)
            WHERE id = $6
            "#,
        )
        .bind(data.question_id)
        .bind(&data.text)
        .bind(data.allowed_misses)
        .bind(data.points)
        .bind(data.order_number)
        .bind(data.id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn delete_missing(
        tx: &mut Transaction<'_, Postgres>,
        keep_ids: &[i64],
    ) -> Result<u64, DatabaseError> {
        let removed = sqlx::query("DELETE FROM question_values WHERE id != ALL($1)")
            .bind(keep_ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(removed)
    }
}
