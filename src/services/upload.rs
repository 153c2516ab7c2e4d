//! Artifact upload: paste-service PUT with a multipart fallback for blobs
//! the paste service rejects as too large.
//!
//! [`Uploader::upload`] is the only way bytes leave the machine, and it
//! always routes through [`sanitize`](super::sanitize::sanitize) first. Both
//! transports return an opaque artifact reference string; callers never
//! inspect its shape.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::sanitize::{self, FileKind, SanitizeError};

/// Paste TTL sent as `expires_at`: roughly three months, matching the help
/// desk's case retention window.
const PASTE_TTL: Duration = Duration::from_secs(2190 * 60 * 60);

const DEFAULT_PASTE_URL: &str = "https://pste.me/v1/paste";
const DEFAULT_TRANSFER_URL: &str = "https://transfer.sh";

/// HTTP timeout for both transports.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum TransportError {
    /// The paste service rejected the blob for size. This is the only error
    /// that triggers the fallback transport.
    #[error("paste service rejected the content as too large")]
    TooLarge,

    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("transport failure: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("refusing to upload un-redacted content: {0}")]
    Sanitize(#[from] SanitizeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Transport seam between upload policy and the wire. Production code uses
/// [`HttpPasteTransport`]; tests substitute a recording stub.
#[allow(async_fn_in_trait)]
pub trait PasteTransport {
    /// PUT to the size-limited paste service; returns the artifact id.
    async fn put_paste(&self, data: &[u8], language: Option<&str>)
        -> Result<String, TransportError>;

    /// Multipart POST to the large-file service; returns the artifact URL.
    async fn post_large(&self, name: &str, data: &[u8]) -> Result<String, TransportError>;
}

#[derive(Debug, Deserialize)]
struct PasteResponse {
    data: PasteData,
}

#[derive(Debug, Deserialize)]
struct PasteData {
    id: String,
}

/// Reqwest-backed transport against the real paste and transfer services.
pub struct HttpPasteTransport {
    client: reqwest::Client,
    paste_url: String,
    transfer_url: String,
}

impl HttpPasteTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self {
            client,
            paste_url: DEFAULT_PASTE_URL.to_string(),
            transfer_url: DEFAULT_TRANSFER_URL.to_string(),
        })
    }

    /// Override the service endpoints (used against local test servers).
    pub fn with_endpoints(
        client: reqwest::Client,
        paste_url: impl Into<String>,
        transfer_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            paste_url: paste_url.into(),
            transfer_url: transfer_url.into(),
        }
    }
}

impl PasteTransport for HttpPasteTransport {
    async fn put_paste(
        &self,
        data: &[u8],
        language: Option<&str>,
    ) -> Result<String, TransportError> {
        let expires_at = chrono::Utc::now().timestamp() + PASTE_TTL.as_secs() as i64;
        let mut request = self
            .client
            .put(&self.paste_url)
            .query(&[("expires_at", expires_at.to_string())]);
        if let Some(language) = language {
            request = request.query(&[("language", language)]);
        }

        let response = request.body(data.to_vec()).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE {
            return Err(TransportError::TooLarge);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: PasteResponse = response.json().await?;
        Ok(parsed.data.id)
    }

    async fn post_large(&self, name: &str, data: &[u8]) -> Result<String, TransportError> {
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(name.to_string());
        let form = reqwest::multipart::Form::new().part("upload", part);

        let response = self
            .client
            .post(&self.transfer_url)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(body.trim().to_string())
    }
}

/// Upload policy: sanitize, try the paste service, fall back to the
/// large-file transport only on a size rejection.
pub struct Uploader<T: PasteTransport> {
    transport: T,
}

impl Uploader<HttpPasteTransport> {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self::with_transport(HttpPasteTransport::new()?))
    }
}

impl<T: PasteTransport> Uploader<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Sanitize `data` according to the kind inferred from `name` and upload
    /// it. Returns an opaque artifact reference.
    pub async fn upload(&self, name: &str, data: &[u8]) -> Result<String, UploadError> {
        let kind = FileKind::from_name(name);
        let clean = sanitize::sanitize(kind, data)?;

        match self.transport.put_paste(&clean, kind.language()).await {
            Ok(id) => Ok(id),
            Err(TransportError::TooLarge) => {
                tracing::info!("{name} is too large for the paste service, using fallback");
                Ok(self.transport.post_large(name, &clean).await?)
            }
            Err(other) => Err(other.into()),
        }
    }
}
