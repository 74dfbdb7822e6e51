use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use drivegate_core::model::{ErrorBody, ProblemDetails};
use drivegate_core::{Settings, SettingsError};
use thiserror::Error;
use tracing::{error, warn};

use crate::config::DaemonConfig;
use crate::drive::DriveFiles;
use crate::token_store::TokenStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DaemonConfig>,
    pub settings: Arc<Settings>,
    pub drive: Arc<dyn DriveFiles>,
    pub tokens: TokenStore,
    /// Client for the OAuth token endpoint.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: DaemonConfig,
        settings: Settings,
        drive: Arc<dyn DriveFiles>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("drivegate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build token endpoint http client")?;
        Ok(Self {
            tokens: TokenStore::new(config.token_file.clone()),
            config: Arc::new(config),
            settings: Arc::new(settings),
            drive,
            http,
        })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing configuration value `{0}`")]
    ConfigurationMissing(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    UpstreamAuthFailure(String),
    #[error("{0}")]
    UpstreamUploadFailure(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    UpstreamDownloadFailure(String),
    #[error("range not satisfiable")]
    RangeNotSatisfiable(u64),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UpstreamAuthFailure(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUploadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamDownloadFailure(_) => StatusCode::BAD_GATEWAY,
            ApiError::RangeNotSatisfiable(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code placed in the `error` field of the body.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::ConfigurationMissing(_) => "configuration_missing",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::UpstreamAuthFailure(_) => "upstream_auth_failure",
            ApiError::UpstreamUploadFailure(_) => "upstream_upload_failure",
            ApiError::NotFound(_) => "not_found",
            ApiError::UpstreamDownloadFailure(_) => "upstream_download_failure",
            ApiError::RangeNotSatisfiable(_) => "range_not_satisfiable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::Missing { key } => ApiError::ConfigurationMissing(key),
            other => ApiError::internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "request failed");
        } else {
            warn!(kind = self.kind(), error = %self, "request rejected");
        }

        match self {
            ApiError::UpstreamUploadFailure(detail) => {
                (status, Json(ProblemDetails::internal(detail))).into_response()
            }
            ApiError::RangeNotSatisfiable(size) => {
                let body = Json(ErrorBody {
                    message: "range not satisfiable".into(),
                    error: "range_not_satisfiable".into(),
                });
                let mut response = (status, body).into_response();
                if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
                    response.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                response
            }
            other => {
                let body = Json(ErrorBody {
                    message: other.to_string(),
                    error: other.kind().to_string(),
                });
                (status, body).into_response()
            }
        }
    }
}
