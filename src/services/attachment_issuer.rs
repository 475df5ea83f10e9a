//! Attachment issuer - Time-limited upload URLs for car images.
//!
//! Upload URLs are AWS Signature Version 4 query-string presigned `PUT`
//! requests against the attachments bucket, with the car id as object key.
//! Signing happens locally; no request is made to object storage.
//!
//! # Ownership
//!
//! The issuer does not check who owns `car_id`. Callers must verify
//! ownership before asking for a URL.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{config::AttachmentConfig, error::AppError};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// Public URL of a car's image once uploaded.
///
/// Derived only from the bucket name and car id, never from client input.
/// A custom `S3_ENDPOINT` does not change it.
pub fn attachment_url(bucket_name: &str, car_id: Uuid) -> String {
    format!("https://{bucket_name}.s3.amazonaws.com/{car_id}")
}

/// Produces write-capable upload locations for car attachments.
pub trait AttachmentIssuer: Send + Sync {
    /// Return a URL permitting one HTTP `PUT` of arbitrary content to the object keyed by `car_id`.
    fn generate_upload_url(&self, car_id: Uuid) -> Result<String, AppError>;
}

/// S3 (or S3-compatible) implementation of [`AttachmentIssuer`].
#[derive(Debug, Clone)]
pub struct S3AttachmentIssuer {
    config: AttachmentConfig,
}

impl S3AttachmentIssuer {
    pub fn new(config: AttachmentConfig) -> Self {
        Self { config }
    }

    /// Build a presigned URL for `method` on `key`, as of `now`.
    ///
    /// # Process
    ///
    /// 1. Resolve scheme, host and canonical path for the object
    /// 2. Assemble the sorted, encoded `X-Amz-*` query parameters
    /// 3. Hash the canonical request and build the string to sign
    /// 4. Derive the signing key (date → region → service → `aws4_request`)
    /// 5. Append `X-Amz-Signature`
    fn presign(&self, method: &str, key: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let (scheme, host, path) = self.locate(key)?;
        let credentials = &self.config.credentials;

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/{SERVICE}/aws4_request", self.config.region);

        let mut params = vec![
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            (
                "X-Amz-Credential",
                format!("{}/{scope}", credentials.access_key_id),
            ),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", self.config.url_expiration_secs.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];
        if let Some(token) = &credentials.session_token {
            params.push(("X-Amz-Security-Token", token.clone()));
        }
        params.sort_by(|a, b| a.0.cmp(b.0));

        let canonical_query = params
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request =
            format!("{method}\n{path}\n{canonical_query}\nhost:{host}\n\nhost\nUNSIGNED-PAYLOAD");

        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let k_date = hmac_sha256(
            format!("AWS4{}", credentials.secret_access_key).as_bytes(),
            date.as_bytes(),
        )?;
        let k_region = hmac_sha256(&k_date, self.config.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

        Ok(format!(
            "{scheme}://{host}{path}?{canonical_query}&X-Amz-Signature={signature}"
        ))
    }

    /// Virtual-hosted style against AWS, path style against a custom endpoint.
    fn locate(&self, key: &str) -> Result<(String, String, String), AppError> {
        let bucket = &self.config.bucket_name;

        match &self.config.endpoint {
            Some(endpoint) => {
                let host = endpoint.host_str().ok_or_else(|| {
                    AppError::Attachment("S3 endpoint has no host".to_string())
                })?;
                let host = match endpoint.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                let path = format!(
                    "{}/{}/{}",
                    endpoint.path().trim_end_matches('/'),
                    uri_encode(bucket, true),
                    uri_encode(key, false)
                );
                Ok((endpoint.scheme().to_string(), host, path))
            }
            None => {
                let host = if self.config.region == "us-east-1" {
                    format!("{bucket}.s3.amazonaws.com")
                } else {
                    format!("{bucket}.s3.{}.amazonaws.com", self.config.region)
                };
                Ok(("https".to_string(), host, format!("/{}", uri_encode(key, false))))
            }
        }
    }
}

impl AttachmentIssuer for S3AttachmentIssuer {
    fn generate_upload_url(&self, car_id: Uuid) -> Result<String, AppError> {
        let url = self.presign("PUT", &car_id.to_string(), Utc::now())?;
        tracing::debug!(
            %car_id,
            bucket = %self.config.bucket_name,
            expires_in = self.config.url_expiration_secs,
            "Issued upload URL"
        );
        Ok(url)
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Attachment(format!("Invalid signing key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// SigV4 URI encoding: unreserved characters pass through, everything else
/// becomes `%XX` with uppercase hex.
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
