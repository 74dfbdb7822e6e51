//! Wire models returned by the HTTP API.

use serde::{Deserialize, Serialize};

/// Content type used when Drive does not report one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Drive file id.
    pub id: String,
    /// File name as stored in Drive.
    pub name: Option<String>,
    /// Mime type Drive recorded for the file.
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    /// Browser link; absent when Drive does not expose one.
    #[serde(rename = "url")]
    pub web_view_link: Option<String>,
}

/// Metadata fetched before a download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// File name.
    pub name: Option<String>,
    /// Mime type.
    pub mime_type: Option<String>,
}

impl FileMetadata {
    /// The mime type to serve, defaulting to binary.
    pub fn content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always true.
    pub success: bool,
}

/// Body returned by the OAuth callback: the raw token endpoint payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResponse {
    /// Token endpoint response body, verbatim.
    pub json: String,
}

/// Error body for every failure except upload failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub message: String,
    /// Stable error kind code, e.g. `invalid_input`.
    pub error: String,
}

/// Problem document used for upload failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Problem type reference.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary.
    pub title: String,
    /// HTTP status.
    pub status: u16,
    /// Underlying error message.
    pub detail: String,
}

impl ProblemDetails {
    /// A 500 problem carrying `detail`.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            kind: "https://tools.ietf.org/html/rfc9110#section-15.6.1".into(),
            title: "An error occurred while processing your request.".into(),
            status: 500,
            detail: detail.into(),
        }
    }
}
