//! HTTP request handlers (route handlers).
//!
//! Handlers only extract request data, call the car service and wrap the
//! result; ownership checks live in the service and store.

/// Car endpoints
pub mod cars;
/// Liveness and database connectivity
pub mod health;
