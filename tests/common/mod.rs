#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use car_records_server::{
    error::AppError,
    middleware::auth::TokenVerifier,
    models::car::{CarRecord, UpdateCarRequest},
    services::{
        attachment_issuer::{AttachmentIssuer, attachment_url},
        car_service::CarService,
        car_store::CarStore,
    },
    state::AppState,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use uuid::Uuid;

pub const BUCKET: &str = "car-images";
pub const JWT_SECRET: &str = "test-secret";

/// In-memory `CarStore` with the same ownership rules as the Postgres one.
#[derive(Default)]
pub struct MemoryCarStore {
    rows: Mutex<Vec<CarRecord>>,
    fail_attachment_update: AtomicBool,
    unreachable: AtomicBool,
}

impl MemoryCarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `set_attachment_url` fail with a store error.
    pub fn fail_attachment_updates(&self) {
        self.fail_attachment_update.store(true, Ordering::SeqCst);
    }

    /// Make `ping` fail as if the database were down.
    pub fn go_offline(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn modify<F>(&self, car_id: Uuid, user_id: &str, f: F) -> Result<CarRecord, AppError>
    where
        F: FnOnce(&mut CarRecord),
    {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.car_id == car_id && r.user_id == user_id)
            .ok_or(AppError::CarNotFound)?;
        f(row);
        Ok(row.clone())
    }
}

#[async_trait]
impl CarStore for MemoryCarStore {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CarRecord>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_one(&self, car_id: Uuid, user_id: &str) -> Result<Option<CarRecord>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.car_id == car_id && r.user_id == user_id)
            .cloned())
    }

    async fn create(&self, record: CarRecord) -> Result<CarRecord, AppError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|r| !(r.car_id == record.car_id && r.created_at == record.created_at));
        rows.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, car_id: Uuid, created_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.car_id == car_id && r.created_at == created_at));
        if rows.len() == before {
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
        self.modify(car_id, user_id, |row| {
            row.name = patch.name.clone();
            row.done = patch.done;
            row.due_date = patch.due_date;
        })
    }

    async fn set_attachment_url(
        &self,
        car_id: Uuid,
        user_id: &str,
    ) -> Result<CarRecord, AppError> {
        if self.fail_attachment_update.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        self.modify(car_id, user_id, |row| {
            row.attachment_url = Some(attachment_url(BUCKET, car_id));
        })
    }

    async fn exists(&self, car_id: Uuid, user_id: &str) -> Result<bool, AppError> {
        Ok(self.get_one(car_id, user_id).await?.is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Issuer that hands out predictable URLs and counts how often it was asked.
#[derive(Default)]
pub struct RecordingIssuer {
    calls: AtomicUsize,
}

impl RecordingIssuer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AttachmentIssuer for RecordingIssuer {
    fn generate_upload_url(&self, car_id: Uuid) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://{BUCKET}.s3.amazonaws.com/{car_id}?X-Amz-Signature=test"))
    }
}

pub struct Harness {
    pub store: Arc<MemoryCarStore>,
    pub issuer: Arc<RecordingIssuer>,
    pub service: CarService,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryCarStore::new());
    let issuer = Arc::new(RecordingIssuer::default());
    let service = CarService::new(store.clone(), issuer.clone());
    Harness {
        store,
        issuer,
        service,
    }
}

impl Harness {
    pub fn app_state(&self) -> AppState {
        AppState {
            cars: self.service.clone(),
            tokens: Arc::new(TokenVerifier::new(JWT_SECRET, None)),
        }
    }
}

/// A valid bearer token for `user_id`.
pub fn token_for(user_id: &str) -> String {
    encode(
        &Header::default(),
        &json!({"sub": user_id, "exp": Utc::now().timestamp() + 3600}),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
