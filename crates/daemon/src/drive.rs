//! Google Drive file create/get.
//!
//! - One `DriveHub` per call, authorized from the configured refresh token.
//! - Uploads go through the resumable protocol implemented by google-drive3.
//! - Downloads buffer the whole media body in memory.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use drivegate_core::model::{FileMetadata, UploadedFile};
use drivegate_core::oauth::DRIVE_SCOPE;
use drivegate_core::DriveCredentials;
use http_body_util::BodyExt;
use thiserror::Error;
use tracing::{debug, info};

// google-apis-rs generated client.
use google_drive3 as drive3;

use drive3::hyper_rustls::HttpsConnector;
use drive3::hyper_util::client::legacy::connect::HttpConnector;
use drive3::hyper_util::client::legacy::Client;
use drive3::hyper_util::rt::TokioExecutor;

type Hub = drive3::DriveHub<HttpsConnector<HttpConnector>>;

const UPLOAD_FIELDS: &str = "id,name,mimeType,webViewLink";
const METADATA_FIELDS: &str = "name,mimeType";

#[derive(Debug, Error)]
pub enum DriveError {
    /// Credentials were rejected or no access token could be minted.
    #[error("authorization failed: {0}")]
    Auth(String),
    #[error("file not found: {0}")]
    NotFound(String),
    /// Any other API or transport failure; the message is Drive's own.
    #[error("{0}")]
    Api(String),
}

impl From<drive3::Error> for DriveError {
    fn from(err: drive3::Error) -> Self {
        match err {
            drive3::Error::MissingToken(e) => DriveError::Auth(e.to_string()),
            drive3::Error::BadRequest(value) => {
                let code = value.pointer("/error/code").and_then(|c| c.as_u64());
                let message = value
                    .pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string());
                match code {
                    Some(401) => DriveError::Auth(message),
                    Some(404) => DriveError::NotFound(message),
                    _ => DriveError::Api(message),
                }
            }
            drive3::Error::Failure(response) if response.status().as_u16() == 404 => {
                DriveError::NotFound("file not found".into())
            }
            // google-apis-common terminates some messages with a newline.
            other => DriveError::Api(other.to_string().trim_end().to_string()),
        }
    }
}

/// A file received from a client, ready to be created in Drive.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub content: Bytes,
    pub folder_id: String,
}

#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub metadata: FileMetadata,
    pub content: Bytes,
}

/// The Drive operations the HTTP handlers depend on.
#[async_trait]
pub trait DriveFiles: Send + Sync {
    /// Creates `request.file_name` under `request.folder_id`.
    async fn upload(
        &self,
        credentials: &DriveCredentials,
        request: UploadRequest,
    ) -> Result<UploadedFile, DriveError>;

    /// Fetches metadata, then the full content, of `file_id`.
    async fn download(
        &self,
        credentials: &DriveCredentials,
        file_id: &str,
    ) -> Result<DownloadedFile, DriveError>;
}

/// Installs ring as the process-wide rustls provider.
///
/// ring and aws-lc-rs are both compiled in, so rustls cannot choose one by itself.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// `DriveFiles` backed by the Google Drive v3 API.
#[derive(Debug, Clone, Default)]
pub struct GoogleDrive {
    base_url: Option<String>,
}

impl GoogleDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends Drive API calls to `base_url` instead of `https://www.googleapis.com/drive/v3/`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }

    /// Builds an authorized hub from the refresh token.
    async fn connect(&self, credentials: &DriveCredentials) -> Result<Hub, DriveError> {
        let secret: drive3::yup_oauth2::authorized_user::AuthorizedUserSecret =
            serde_json::from_value(credentials.authorized_user_json())
                .map_err(|e| DriveError::Auth(format!("build authorized user secret: {e}")))?;

        let connector = drive3::hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_native_roots(rustls::crypto::ring::default_provider())
            .map_err(|e| DriveError::Api(format!("load native root certs: {e}")))?
            .https_only()
            .enable_http1()
            .enable_http2()
            .build();

        // yup-oauth2 and the hub want different body types; both share the connector.
        let auth_client =
            Client::builder(TokioExecutor::new()).build::<_, String>(connector.clone());
        let auth =
            drive3::yup_oauth2::AuthorizedUserAuthenticator::with_client(secret, auth_client)
                .build()
                .await
                .map_err(|e| DriveError::Auth(format!("build authenticator: {e}")))?;

        let client = Client::builder(TokioExecutor::new()).build(connector);
        let mut hub = drive3::DriveHub::new(client, auth);
        if let Some(base_url) = &self.base_url {
            hub.base_url(base_url.clone());
        }
        Ok(hub)
    }
}

#[async_trait]
impl DriveFiles for GoogleDrive {
    async fn upload(
        &self,
        credentials: &DriveCredentials,
        request: UploadRequest,
    ) -> Result<UploadedFile, DriveError> {
        let hub = self.connect(credentials).await?;

        let mime: mime::Mime = request
            .content_type
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);

        let metadata = drive3::api::File {
            name: Some(request.file_name.clone()),
            parents: Some(vec![request.folder_id.clone()]),
            ..Default::default()
        };

        let size = request.content.len();
        let (_resp, created) = hub
            .files()
            .create(metadata)
            .supports_all_drives(true)
            .param("fields", UPLOAD_FIELDS)
            .add_scope(DRIVE_SCOPE)
            .upload_resumable(Cursor::new(request.content), mime)
            .await?;

        let id = created
            .id
            .ok_or_else(|| DriveError::Api("upload response carried no file id".into()))?;
        info!(file_id = %id, file_name = %request.file_name, bytes = size, "uploaded to drive");

        Ok(UploadedFile {
            id,
            name: created.name,
            mime_type: created.mime_type,
            web_view_link: created.web_view_link,
        })
    }

    async fn download(
        &self,
        credentials: &DriveCredentials,
        file_id: &str,
    ) -> Result<DownloadedFile, DriveError> {
        let hub = self.connect(credentials).await?;

        let (_resp, meta) = hub
            .files()
            .get(file_id)
            .supports_all_drives(true)
            .param("fields", METADATA_FIELDS)
            .add_scope(DRIVE_SCOPE)
            .doit()
            .await?;
        debug!(file_id, name = ?meta.name, mime_type = ?meta.mime_type, "fetched metadata");

        // alt=media switches the response from JSON metadata to the file body.
        let (resp, _) = hub
            .files()
            .get(file_id)
            .supports_all_drives(true)
            .param("alt", "media")
            .add_scope(DRIVE_SCOPE)
            .doit()
            .await?;

        let content = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| DriveError::Api(format!("read download body: {e}")))?
            .to_bytes();
        info!(file_id, bytes = content.len(), "downloaded from drive");

        Ok(DownloadedFile {
            metadata: FileMetadata {
                name: meta.name,
                mime_type: meta.mime_type,
            },
            content,
        })
    }
}
