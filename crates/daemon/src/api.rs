use axum::body::{Body, Bytes};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use drivegate_core::model::{CallbackResponse, HealthResponse, UploadedFile, DEFAULT_MIME_TYPE};
use drivegate_core::oauth::{self, TokenExchangeForm};
use drivegate_core::range::{parse_range, RangeRequest};
use drivegate_core::settings;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::drive::{DriveError, UploadRequest};
use crate::state::{ApiError, AppState};

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { success: true })
}

/// Redirects the browser to Google's consent screen.
pub async fn login(State(state): State<AppState>) -> Result<Response, ApiError> {
    let client_id = state.settings.require(settings::CLIENT_ID)?;
    let redirect_uri = state.settings.require(settings::REDIRECT_URI)?;

    let url = oauth::authorization_url(&state.config.authorization_endpoint, client_id, redirect_uri)
        .map_err(ApiError::internal)?;
    debug!(redirect_uri, "redirecting to consent screen");

    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Set by Google when the user denies consent.
    pub error: Option<String>,
}

/// Exchanges the authorization code and stores the token endpoint's answer.
pub async fn login_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>, ApiError> {
    if let Some(err) = query.error.filter(|e| !e.is_empty()) {
        return Err(ApiError::UpstreamAuthFailure(format!(
            "authorization was not granted: {err}"
        )));
    }
    let code = query
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidInput("missing authorization code".into()))?;

    let client_id = state.settings.require(settings::CLIENT_ID)?;
    let client_secret = state.settings.require(settings::CLIENT_SECRET)?;
    let redirect_uri = state.settings.require(settings::CALLBACK_URI)?;

    let form = TokenExchangeForm::new(&code, client_id, client_secret, redirect_uri);
    let resp = state
        .http
        .post(&state.config.token_endpoint)
        .form(&form)
        .send()
        .await
        .map_err(|e| ApiError::UpstreamAuthFailure(format!("token request failed: {e}")))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ApiError::UpstreamAuthFailure(format!("read token response: {e}")))?;

    // Error payloads never replace a previously stored token.
    if !status.is_success() {
        warn!(status = status.as_u16(), "token endpoint rejected the code");
        return Err(ApiError::UpstreamAuthFailure(oauth::describe_token_error(
            status.as_u16(),
            &body,
        )));
    }

    state.tokens.replace(&body).await.map_err(|e| {
        ApiError::Internal(format!(
            "write token file {}: {e}",
            state.tokens.path().display()
        ))
    })?;
    info!(path = %state.tokens.path().display(), "stored token response");

    Ok(Json(CallbackResponse { json: body }))
}

struct ReceivedFile {
    file_name: String,
    content_type: String,
    content: Bytes,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::InvalidInput(format!("malformed multipart body: {}", e.body_text()))
    }
}

/// Reads the first `file` part; anything missing or empty is invalid input.
async fn read_file_field(multipart: &mut Multipart) -> Result<ReceivedFile, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("upload")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        let content = field.bytes().await.map_err(multipart_error)?;
        if content.is_empty() {
            return Err(ApiError::InvalidInput("invalid file: empty content".into()));
        }
        return Ok(ReceivedFile {
            file_name,
            content_type,
            content,
        });
    }
    Err(ApiError::InvalidInput(format!(
        "invalid file: missing `{FILE_FIELD}` field"
    )))
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadedFile>, ApiError> {
    let file = read_file_field(&mut multipart).await?;

    let folder_id = state.settings.require(settings::FOLDER_ID)?.to_string();
    let credentials = state.settings.drive_credentials()?;

    info!(
        file_name = %file.file_name,
        content_type = %file.content_type,
        bytes = file.content.len(),
        "upload requested"
    );

    let uploaded = state
        .drive
        .upload(
            &credentials,
            UploadRequest {
                file_name: file.file_name,
                content_type: file.content_type,
                content: file.content,
                folder_id,
            },
        )
        .await
        .map_err(|e| match e {
            DriveError::Auth(m) => ApiError::UpstreamAuthFailure(m),
            DriveError::NotFound(m) | DriveError::Api(m) => ApiError::UpstreamUploadFailure(m),
        })?;

    Ok(Json(uploaded))
}

/// Serves a Drive file, honoring single `Range` requests.
pub async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credentials = state.settings.drive_credentials()?;

    let file = state
        .drive
        .download(&credentials, &file_id)
        .await
        .map_err(|e| match e {
            DriveError::Auth(m) => ApiError::UpstreamAuthFailure(m),
            DriveError::NotFound(m) => ApiError::NotFound(m),
            DriveError::Api(m) => ApiError::UpstreamDownloadFailure(m),
        })?;

    let size = file.content.len() as u64;
    let content_type = file.metadata.content_type().to_string();
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    match parse_range(range, size) {
        RangeRequest::Full => {
            debug!(file_id, size, "serving full file");
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                Body::from(file.content),
            )
                .into_response())
        }
        RangeRequest::Partial(r) => {
            debug!(file_id, start = r.start, end = r.end, size, "serving range");
            let slice = file.content.slice(r.start as usize..=r.end as usize);
            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CONTENT_RANGE, r.content_range(size)),
                ],
                Body::from(slice),
            )
                .into_response())
        }
        RangeRequest::Unsatisfiable => Err(ApiError::RangeNotSatisfiable(size)),
    }
}
