//! Record store - Per-user persistence of car records.
//!
//! Every operation except the keyed `delete` takes the caller's `user_id`
//! and filters on it in the query itself, so a record owned by another
//! user behaves exactly like a record that does not exist.
//!
//! # Consistency
//!
//! `update` and `set_attachment_url` first resolve the record's
//! `created_at` through [`CarStore::get_one`], then write by primary key.
//! The write repeats the `user_id` predicate, so a row deleted between the
//! two steps surfaces as `CarNotFound`. Two concurrent updates of the same
//! car still race and the last write wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::car::{CarRecord, UpdateCarRequest},
    services::attachment_issuer::attachment_url,
};

const CAR_COLUMNS: &str = "car_id, user_id, created_at, name, due_date, done, attachment_url";

/// Durable, user-scoped storage of [`CarRecord`]s.
#[async_trait]
pub trait CarStore: Send + Sync {
    /// All cars owned by `user_id`, in no particular order.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CarRecord>, AppError>;

    /// The car `car_id` if, and only if, it belongs to `user_id`.
    async fn get_one(&self, car_id: Uuid, user_id: &str) -> Result<Option<CarRecord>, AppError>;

    /// Insert `record`, overwriting any row with the same primary key.
    async fn create(&self, record: CarRecord) -> Result<CarRecord, AppError>;

    /// Delete the row keyed by `(car_id, created_at)`.
    ///
    /// # Errors
    ///
    /// - `ConditionalCheckFailed`: no such row
    async fn delete(&self, car_id: Uuid, created_at: DateTime<Utc>) -> Result<(), AppError>;

    /// Replace `name`, `done` and `due_date` of a car owned by `user_id`.
    ///
    /// # Errors
    ///
    /// - `CarNotFound`: unknown id or owned by someone else
    async fn update(
        &self,
        car_id: Uuid,
        user_id: &str,
        patch: &UpdateCarRequest,
    ) -> Result<CarRecord, AppError>;

    /// Point `attachment_url` of a car owned by `user_id` at its object in the bucket.
    ///
    /// # Errors
    ///
    /// - `CarNotFound`: unknown id or owned by someone else
    async fn set_attachment_url(&self, car_id: Uuid, user_id: &str)
    -> Result<CarRecord, AppError>;

    /// Whether `user_id` owns a car `car_id`.
    async fn exists(&self, car_id: Uuid, user_id: &str) -> Result<bool, AppError>;

    /// Connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed [`CarStore`].
#[derive(Debug, Clone)]
pub struct PgCarStore {
    pool: DbPool,
    bucket_name: String,
}

impl PgCarStore {
    pub fn new(pool: DbPool, bucket_name: impl Into<String>) -> Self {
        Self {
            pool,
            bucket_name: bucket_name.into(),
        }
    }

    /// Resolve `created_at` for a car owned by `user_id`.
    async fn owned_created_at(
        &self,
        car_id: Uuid,
        user_id: &str,
    ) -> Result<DateTime<Utc>, AppError> {
        self.get_one(car_id, user_id)
            .await?
            .map(|car| car.created_at)
            .ok_or(AppError::CarNotFound)
    }
}

#[async_trait]
impl CarStore for PgCarStore {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CarRecord>, AppError> {
        tracing::debug!(user_id, "Listing cars");

        let cars = sqlx::query_as::<_, CarRecord>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cars)
    }

    async fn get_one(&self, car_id: Uuid, user_id: &str) -> Result<Option<CarRecord>, AppError> {
        // car_id is unique, the ORDER BY only pins down which row wins if that ever changes
        let car = sqlx::query_as::<_, CarRecord>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars \
             WHERE user_id = $1 AND car_id = $2 \
             ORDER BY created_at \
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(car_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(car)
    }

    async fn create(&self, record: CarRecord) -> Result<CarRecord, AppError> {
        sqlx::query(
            r#"
            INSERT INTO cars (car_id, user_id, created_at, name, due_date, done, attachment_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (car_id, created_at) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                name = EXCLUDED.name,
                due_date = EXCLUDED.due_date,
                done = EXCLUDED.done,
                attachment_url = EXCLUDED.attachment_url
            "#,
        )
        .bind(record.car_id)
        .bind(&record.user_id)
        .bind(record.created_at)
        .bind(&record.name)
        .bind(record.due_date)
        .bind(record.done)
        .bind(&record.attachment_url)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, car_id: Uuid, created_at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cars WHERE car_id = $1 AND created_at = $2")
            .bind(car_id)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ConditionalCheckFailed);
        }

        Ok(())
    }

    async fn update(
        &self,
        car_id: Uuid,
        user_id: &str,
        patch: &UpdateCarRequest,
    ) -> Result<CarRecord, AppError> {
        let created_at = self.owned_created_at(car_id, user_id).await?;

        sqlx::query_as::<_, CarRecord>(&format!(
            "UPDATE cars SET name = $1, done = $2, due_date = $3 \
             WHERE car_id = $4 AND created_at = $5 AND user_id = $6 \
             RETURNING {CAR_COLUMNS}"
        ))
        .bind(&patch.name)
        .bind(patch.done)
        .bind(patch.due_date)
        .bind(car_id)
        .bind(created_at)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CarNotFound)
    }

    async fn set_attachment_url(
        &self,
        car_id: Uuid,
        user_id: &str,
    ) -> Result<CarRecord, AppError> {
        let created_at = self.owned_created_at(car_id, user_id).await?;

        sqlx::query_as::<_, CarRecord>(&format!(
            "UPDATE cars SET attachment_url = $1 \
             WHERE car_id = $2 AND created_at = $3 AND user_id = $4 \
             RETURNING {CAR_COLUMNS}"
        ))
        .bind(attachment_url(&self.bucket_name, car_id))
        .bind(car_id)
        .bind(created_at)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CarNotFound)
    }

    async fn exists(&self, car_id: Uuid, user_id: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM cars WHERE user_id = $1 AND car_id = $2)",
        )
        .bind(user_id)
        .bind(car_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
