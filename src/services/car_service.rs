//! Car service - Business façade between HTTP handlers and storage.
//!
//! Every method takes the `user_id` of the authenticated caller, as
//! resolved by the auth middleware from the bearer token. Nothing from
//! the request body or path is ever used as an identity.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::car::{CarRecord, CreateCarRequest, UpdateCarRequest},
    services::{attachment_issuer::AttachmentIssuer, car_store::CarStore},
};

/// Composes the record store and attachment issuer into the operations exposed over HTTP.
#[derive(Clone)]
pub struct CarService {
    store: Arc<dyn CarStore>,
    attachments: Arc<dyn AttachmentIssuer>,
}

impl CarService {
    pub fn new(store: Arc<dyn CarStore>, attachments: Arc<dyn AttachmentIssuer>) -> Self {
        Self { store, attachments }
    }

    /// Record store connectivity, for the health endpoint.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.store.ping().await
    }

    pub async fn list_cars(&self, user_id: &str) -> Result<Vec<CarRecord>, AppError> {
        self.store.list_by_user(user_id).await
    }

    /// Create a car for `user_id`.
    ///
    /// # Process
    ///
    /// 1. Validate the request
    /// 2. Generate `car_id` and `created_at` (microsecond precision, as stored)
    /// 3. Apply defaults, then the request's overridable fields
    /// 4. Persist
    pub async fn create_car(
        &self,
        user_id: &str,
        request: CreateCarRequest,
    ) -> Result<CarRecord, AppError> {
        request.validate()?;

        let record = request.into_record(Uuid::new_v4(), user_id, Utc::now().trunc_subsecs(6));
        let car = self.store.create(record).await?;

        tracing::info!(car_id = %car.car_id, user_id, "Car created");
        Ok(car)
    }

    /// Delete a car owned by `user_id`.
    ///
    /// # Errors
    ///
    /// - `CarNotFound`: unknown id, owned by someone else, or already deleted
    /// - `ConditionalCheckFailed`: the row disappeared between lookup and delete
    pub async fn delete_car(&self, user_id: &str, car_id: Uuid) -> Result<(), AppError> {
        let car = self
            .store
            .get_one(car_id, user_id)
            .await?
            .ok_or(AppError::CarNotFound)?;

        self.store.delete(car.car_id, car.created_at).await?;

        tracing::info!(%car_id, user_id, "Car deleted");
        Ok(())
    }

    pub async fn update_car(
        &self,
        user_id: &str,
        car_id: Uuid,
        patch: UpdateCarRequest,
    ) -> Result<CarRecord, AppError> {
        patch.validate()?;

        let car = self.store.update(car_id, user_id, &patch).await?;

        tracing::info!(%car_id, user_id, "Car updated");
        Ok(car)
    }

    pub async fn update_car_attachment(
        &self,
        user_id: &str,
        car_id: Uuid,
    ) -> Result<CarRecord, AppError> {
        self.store.set_attachment_url(car_id, user_id).await
    }

    pub async fn car_exists(&self, user_id: &str, car_id: Uuid) -> Result<bool, AppError> {
        self.store.exists(car_id, user_id).await
    }

    /// Issue an upload URL for a car's image and record where it will live.
    ///
    /// # Process
    ///
    /// 1. Check the car exists and belongs to `user_id` (otherwise `CarNotFound`, nothing is issued)
    /// 2. Issue the presigned upload URL
    /// 3. Store the public attachment URL on the record
    ///
    /// Steps 2 and 3 are not atomic. If step 3 fails the error is returned
    /// and the issued URL is simply left to expire.
    pub async fn generate_upload_url(&self, user_id: &str, car_id: Uuid) -> Result<String, AppError> {
        if !self.car_exists(user_id, car_id).await? {
            return Err(AppError::CarNotFound);
        }

        let upload_url = self.attachments.generate_upload_url(car_id)?;

        if let Err(e) = self.update_car_attachment(user_id, car_id).await {
            tracing::warn!(%car_id, user_id, error = %e, "Upload URL issued but attachment not recorded");
            return Err(e);
        }

        tracing::info!(%car_id, user_id, "Upload URL issued");
        Ok(upload_url)
    }
}
