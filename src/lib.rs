//! Car Records Service
//!
//! A REST API where authenticated users manage a personal list of cars
//! (name, due date, done flag, optional image). Every record is owned by
//! exactly one user and every query is scoped to the caller's identity.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Record Store**: PostgreSQL with sqlx, behind the `CarStore` trait
//! - **Attachments**: SigV4 presigned S3 upload URLs, behind the `AttachmentIssuer` trait
//! - **Authentication**: HS256 bearer tokens, `sub` claim is the user id
//! - **Format**: JSON requests/responses

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
