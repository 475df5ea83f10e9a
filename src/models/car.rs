//! Car data models and API request/response types.
//!
//! This module defines:
//! - `CarRecord`: Database entity representing one car owned by one user
//! - `CreateCarRequest` / `UpdateCarRequest`: Request bodies
//! - `ItemResponse`, `ItemsResponse`, `UploadUrlResponse`: Response envelopes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Represents a car record from the database.
///
/// # Database Table
///
/// Maps to the `cars` table. The primary key is `(car_id, created_at)`;
/// every read and write is additionally filtered by `user_id` so one user
/// can never see or touch another user's cars.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    /// Server-generated identifier, immutable.
    pub car_id: Uuid,

    /// Owner, taken from the verified bearer token. Immutable.
    pub user_id: String,

    /// Creation time, second half of the primary key. Immutable.
    pub created_at: DateTime<Utc>,

    pub name: String,

    pub due_date: NaiveDate,

    pub done: bool,

    /// Public URL of the uploaded image.
    ///
    /// Only ever written by the attachment flow, never from request input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

/// Request body for creating a new car.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Errand",
///   "dueDate": "2024-01-01"
/// }
/// ```
///
/// # Overridable Fields
///
/// Only `name`, `dueDate` and the optional `done` flag are taken from the
/// request. Identity and bookkeeping fields (`carId`, `userId`,
/// `createdAt`, `attachmentUrl`) are always assigned by the server and are
/// ignored if a client sends them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    pub name: String,

    pub due_date: NaiveDate,

    /// Overrides the `false` default when present.
    #[serde(default)]
    pub done: Option<bool>,
}

impl CreateCarRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)
    }

    /// Build the record to persist, applying server defaults first and the
    /// request's overridable fields second.
    pub fn into_record(self, car_id: Uuid, user_id: &str, created_at: DateTime<Utc>) -> CarRecord {
        CarRecord {
            car_id,
            user_id: user_id.to_string(),
            created_at,
            name: self.name,
            due_date: self.due_date,
            done: self.done.unwrap_or(false),
            attachment_url: None,
        }
    }
}

/// Request body for updating a car.
///
/// Replaces exactly `name`, `dueDate` and `done`; every other field of the
/// record is left untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarRequest {
    pub name: String,

    pub due_date: NaiveDate,

    pub done: bool,
}

impl UpdateCarRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// `{"item": ...}`
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item: CarRecord,
}

/// `{"items": [...]}`
#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<CarRecord>,
}

/// `{"uploadUrl": "..."}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
}
