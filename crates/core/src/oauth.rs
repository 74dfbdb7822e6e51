//! OAuth 2.0 pieces for the Google consent flow: the authorization
//! redirect, the code-exchange form and the credentials used for Drive.

use serde::{Deserialize, Serialize};
use url::Url;

/// Google's consent screen.
pub const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google's token endpoint.
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
/// Full Drive access.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Builds the consent-screen URL.
///
/// Offline access and forced consent make Google return a refresh token on
/// every grant.
pub fn authorization_url(
    endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        endpoint,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", DRIVE_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
}

/// Form body POSTed to the token endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TokenExchangeForm<'a> {
    /// Authorization code from the callback.
    pub code: &'a str,
    /// OAuth client id.
    pub client_id: &'a str,
    /// OAuth client secret.
    pub client_secret: &'a str,
    /// Must match the redirect URI registered for the client.
    pub redirect_uri: &'a str,
    /// Always `authorization_code`.
    pub grant_type: &'static str,
}

impl<'a> TokenExchangeForm<'a> {
    /// Form for exchanging `code`.
    pub fn new(
        code: &'a str,
        client_id: &'a str,
        client_secret: &'a str,
        redirect_uri: &'a str,
    ) -> Self {
        Self {
            code,
            client_id,
            client_secret,
            redirect_uri,
            grant_type: "authorization_code",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Human-readable summary of a failed token endpoint answer.
///
/// Google answers with `{"error": "...", "error_description": "..."}`;
/// anything else is reported as-is.
pub fn describe_token_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<TokenErrorBody>(body) {
        Ok(TokenErrorBody {
            error_description: Some(desc),
            ..
        }) => format!("token endpoint returned {status}: {desc}"),
        Ok(TokenErrorBody {
            error: Some(err), ..
        }) => format!("token endpoint returned {status}: {err}"),
        _ if body.trim().is_empty() => format!("token endpoint returned {status}"),
        _ => format!("token endpoint returned {status}: {}", body.trim()),
    }
}

/// Client credentials plus the refresh token that authorizes Drive calls.
#[derive(Clone, PartialEq, Eq)]
pub struct DriveCredentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

impl std::fmt::Debug for DriveCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

impl DriveCredentials {
    /// The `authorized_user` secret document understood by Google auth
    /// libraries (the same shape `gcloud` writes for user credentials).
    pub fn authorized_user_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "authorized_user",
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "refresh_token": self.refresh_token,
        })
    }
}
