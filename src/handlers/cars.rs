//! Car management HTTP handlers.
//!
//! This module implements the car-related API endpoints:
//! - GET /cars - List the caller's cars
//! - POST /cars - Create a car
//! - PATCH /cars/{car_id} - Update name, due date and done flag
//! - DELETE /cars/{car_id} - Delete a car
//! - POST /cars/{car_id}/attachment - Issue an image upload URL
//!
//! All routes sit behind the auth middleware. A car that belongs to
//! another user is reported exactly like a missing one (404), and so is a
//! car id that is not a UUID. Malformed bodies are 400 `invalid_request`.

use crate::{
    error::AppError,
    extract::{AppJson, AppPath},
    middleware::auth::AuthContext,
    models::car::{CreateCarRequest, ItemResponse, ItemsResponse, UpdateCarRequest, UploadUrlResponse},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// List all cars for the authenticated user.
///
/// # Response
///
/// - **Success (200 OK)**: `{"items": [...]}`, possibly empty, unordered
/// - **Error (401)**: Invalid token
pub async fn list_cars(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ItemsResponse>, AppError> {
    let items = state.cars.list_cars(&auth.user_id).await?;

    Ok(Json(ItemsResponse { items }))
}

/// Create a new car.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Errand",
///   "dueDate": "2024-01-01"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: `{"item": {...}}` with generated `carId`, `createdAt` and `done: false`
/// - **Error (400)**: Blank name
/// - **Error (401)**: Invalid token
pub async fn create_car(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(request): AppJson<CreateCarRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.cars.create_car(&auth.user_id, request).await?;

    Ok((StatusCode::CREATED, Json(ItemResponse { item })))
}

/// Update a car.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Errand",
///   "dueDate": "2024-01-01",
///   "done": true
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{"item": {...}}`
/// - **Error (404)**: Car not found or not owned by the caller
pub async fn update_car(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(car_id): AppPath<Uuid>,
    AppJson(patch): AppJson<UpdateCarRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = state.cars.update_car(&auth.user_id, car_id, patch).await?;

    Ok(Json(ItemResponse { item }))
}

/// Delete a car.
///
/// # Response
///
/// - **Success (204 No Content)**
/// - **Error (404)**: Car not found, not owned by the caller, or already deleted
pub async fn delete_car(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(car_id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.cars.delete_car(&auth.user_id, car_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Issue a presigned upload URL for the car's image.
///
/// # Response
///
/// - **Success (200 OK)**: `{"uploadUrl": "https://..."}`
/// - **Error (404)**: Car not found or not owned by the caller; no URL is issued
pub async fn generate_upload_url(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(car_id): AppPath<Uuid>,
) -> Result<Json<UploadUrlResponse>, AppError> {
    let upload_url = state.cars.generate_upload_url(&auth.user_id, car_id).await?;

    Ok(Json(UploadUrlResponse { upload_url }))
}
