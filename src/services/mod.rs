//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! Storage sits behind the [`car_store::CarStore`] and
//! [`attachment_issuer::AttachmentIssuer`] traits so the façade can be
//! constructed with any implementation.

pub mod attachment_issuer;
pub mod car_service;
pub mod car_store;
