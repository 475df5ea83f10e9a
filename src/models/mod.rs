//! Data models representing database entities and API payloads.

/// Car record model
pub mod car;
