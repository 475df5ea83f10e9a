//! Request extractors whose rejections go through [`AppError`].
//!
//! The plain axum `Json` and `Path` extractors answer malformed input with
//! plain-text bodies; these wrappers keep every error in the
//! `{"error": {"code", "message"}}` format.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body. Any deserialization failure becomes `InvalidRequest` (400).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path parameters. A car id that does not parse is reported as `CarNotFound` (404).
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
