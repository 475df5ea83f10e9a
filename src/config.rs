//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use anyhow::{Context, bail};
use serde::Deserialize;
use std::fmt;
use url::Url;

/// Longest lifetime AWS accepts for a SigV4 presigned URL (7 days).
const MAX_URL_EXPIRATION_SECS: u64 = 604_800;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `JWT_SECRET` (required): HS256 secret used to verify bearer tokens
/// - `JWT_AUDIENCE` (optional): expected `aud` claim
/// - `ATTACHMENTS_S3_BUCKET` (required): bucket holding car images
/// - `SIGNED_URL_EXPIRATION` (optional): upload URL lifetime in seconds, defaults to 300
/// - `AWS_REGION` (optional): defaults to `us-east-1`
/// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` (required), `AWS_SESSION_TOKEN` (optional)
/// - `S3_ENDPOINT` (optional): S3-compatible endpoint (MinIO, LocalStack) that upload
///   URLs are signed against. Only uploads move there: the `attachmentUrl` stored on a
///   car is always `https://<bucket>.s3.amazonaws.com/<carId>` and will not resolve
///   against a local endpoint.
#[derive(Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub jwt_secret: String,

    #[serde(default)]
    pub jwt_audience: Option<String>,

    pub attachments_s3_bucket: String,

    #[serde(default = "default_url_expiration")]
    pub signed_url_expiration: u64,

    #[serde(default = "default_region")]
    pub aws_region: String,

    pub aws_access_key_id: String,

    pub aws_secret_access_key: String,

    #[serde(default)]
    pub aws_session_token: Option<String>,

    #[serde(default)]
    pub s3_endpoint: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_url_expiration() -> u64 {
    300
}

fn default_region() -> String {
    "us-east-1".to_string()
}

// Secrets stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("jwt_audience", &self.jwt_audience)
            .field("attachments_s3_bucket", &self.attachments_s3_bucket)
            .field("signed_url_expiration", &self.signed_url_expiration)
            .field("aws_region", &self.aws_region)
            .field("s3_endpoint", &self.s3_endpoint)
            .finish_non_exhaustive()
    }
}

/// Static AWS credentials used to sign upload URLs.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything the record store and attachment issuer need to know about object storage.
#[derive(Debug, Clone)]
pub struct AttachmentConfig {
    pub bucket_name: String,
    pub url_expiration_secs: u64,
    pub region: String,
    pub endpoint: Option<Url>,
    pub credentials: AwsCredentials,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }

    /// Derive and validate the object storage settings.
    pub fn attachments(&self) -> anyhow::Result<AttachmentConfig> {
        if self.attachments_s3_bucket.trim().is_empty() {
            bail!("ATTACHMENTS_S3_BUCKET must not be empty");
        }
        if !(1..=MAX_URL_EXPIRATION_SECS).contains(&self.signed_url_expiration) {
            bail!(
                "SIGNED_URL_EXPIRATION must be between 1 and {} seconds, got {}",
                MAX_URL_EXPIRATION_SECS,
                self.signed_url_expiration
            );
        }

        let endpoint = self
            .s3_endpoint
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("S3_ENDPOINT is not a valid URL")?;

        Ok(AttachmentConfig {
            bucket_name: self.attachments_s3_bucket.clone(),
            url_expiration_secs: self.signed_url_expiration,
            region: self.aws_region.clone(),
            endpoint,
            credentials: AwsCredentials {
                access_key_id: self.aws_access_key_id.clone(),
                secret_access_key: self.aws_secret_access_key.clone(),
                session_token: self.aws_session_token.clone(),
            },
        })
    }
}
