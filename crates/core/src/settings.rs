//! Key/value settings for the proxy.
//!
//! The on-disk shape follows an `appsettings.json` layout:
//!
//! ```json
//! {
//!   "GoogleDrive": { "ClientId": "...", "FolderId": "..." },
//!   "FormOptions": { "MultipartBodyLengthLimit": 134217728 }
//! }
//! ```
//!
//! Values are addressed by hierarchical keys such as `GoogleDrive:ClientId`.
//! Environment variables override the file using `__` as the separator
//! (`GoogleDrive__ClientId`). Empty strings count as missing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::oauth::DriveCredentials;

/// OAuth client id.
pub const CLIENT_ID: &str = "GoogleDrive:ClientId";
/// OAuth client secret.
pub const CLIENT_SECRET: &str = "GoogleDrive:ClientSecret";
/// Redirect URI sent with the consent-screen redirect.
pub const REDIRECT_URI: &str = "GoogleDrive:RedirectURI";
/// Redirect URI sent with the code exchange.
pub const CALLBACK_URI: &str = "GoogleDrive:CallbackURI";
/// Destination folder for uploads.
pub const FOLDER_ID: &str = "GoogleDrive:FolderId";
/// Long-lived refresh token used for Drive calls.
pub const REFRESH_TOKEN: &str = "GoogleDrive:RefreshToken";
/// Maximum accepted request body for multipart uploads, in bytes.
pub const MULTIPART_BODY_LENGTH_LIMIT: &str = "FormOptions:MultipartBodyLengthLimit";

/// Default multipart body limit (128 MiB).
pub const DEFAULT_MULTIPART_BODY_LENGTH_LIMIT: u64 = 134_217_728;

/// Every string-valued key, in lookup order.
pub const STRING_KEYS: [&str; 6] = [
    CLIENT_ID,
    CLIENT_SECRET,
    REDIRECT_URI,
    CALLBACK_URI,
    FOLDER_ID,
    REFRESH_TOKEN,
];

/// Errors raised while loading or reading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required key is absent or empty.
    #[error("missing configuration value `{key}`")]
    Missing {
        /// The hierarchical key, e.g. `GoogleDrive:ClientId`.
        key: &'static str,
    },
    /// The settings file exists but could not be read.
    #[error("read settings file {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The settings file is not valid JSON of the expected shape.
    #[error("parse settings file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A value has the wrong type, e.g. a non-numeric body limit.
    #[error("invalid value for `{key}`: {value}")]
    Invalid {
        /// The hierarchical key.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// The `GoogleDrive` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GoogleDriveSection {
    /// OAuth client id.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Redirect URI for the consent screen.
    #[serde(default, rename = "RedirectURI")]
    pub redirect_uri: Option<String>,
    /// Redirect URI for the code exchange.
    #[serde(default, rename = "CallbackURI")]
    pub callback_uri: Option<String>,
    /// Upload destination folder.
    #[serde(default)]
    pub folder_id: Option<String>,
    /// Refresh token used to authorize Drive calls.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// The `FormOptions` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FormOptionsSection {
    /// Maximum multipart body length in bytes.
    #[serde(default)]
    pub multipart_body_length_limit: Option<u64>,
}

/// All settings consumed by the proxy. Unknown sections are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// Google Drive / OAuth values.
    #[serde(default)]
    pub google_drive: GoogleDriveSection,
    /// Multipart form limits.
    #[serde(default)]
    pub form_options: FormOptionsSection,
}

impl Settings {
    /// Loads settings from a JSON file. A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file; starting empty");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses settings from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Applies `Section__Key=value` overrides. Names are matched
    /// case-insensitively; unrelated variables are skipped.
    ///
    /// Returns the number of values applied.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<usize, SettingsError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut applied = 0;
        for (name, value) in vars {
            let key = name.replace("__", ":");
            if self.set(&key, value)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Sets a value by hierarchical key. Returns `false` for unknown keys.
    pub fn set(&mut self, key: &str, value: String) -> Result<bool, SettingsError> {
        if key.eq_ignore_ascii_case(MULTIPART_BODY_LENGTH_LIMIT) {
            let limit = value.trim().parse::<u64>().map_err(|_| SettingsError::Invalid {
                key: MULTIPART_BODY_LENGTH_LIMIT,
                value: value.clone(),
            })?;
            self.form_options.multipart_body_length_limit = Some(limit);
            return Ok(true);
        }
        let Some(canonical) = STRING_KEYS.iter().find(|k| k.eq_ignore_ascii_case(key)) else {
            return Ok(false);
        };
        let gd = &mut self.google_drive;
        let slot = match *canonical {
            CLIENT_ID => &mut gd.client_id,
            CLIENT_SECRET => &mut gd.client_secret,
            REDIRECT_URI => &mut gd.redirect_uri,
            CALLBACK_URI => &mut gd.callback_uri,
            FOLDER_ID => &mut gd.folder_id,
            _ => &mut gd.refresh_token,
        };
        *slot = Some(value);
        Ok(true)
    }

    /// Looks up a string value. Empty strings are reported as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        let gd = &self.google_drive;
        let value = match key {
            CLIENT_ID => gd.client_id.as_deref(),
            CLIENT_SECRET => gd.client_secret.as_deref(),
            REDIRECT_URI => gd.redirect_uri.as_deref(),
            CALLBACK_URI => gd.callback_uri.as_deref(),
            FOLDER_ID => gd.folder_id.as_deref(),
            REFRESH_TOKEN => gd.refresh_token.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Looks up a required string value.
    pub fn require(&self, key: &'static str) -> Result<&str, SettingsError> {
        self.get(key).ok_or(SettingsError::Missing { key })
    }

    /// Credentials used by the Drive-facing handlers.
    pub fn drive_credentials(&self) -> Result<DriveCredentials, SettingsError> {
        Ok(DriveCredentials {
            client_id: self.require(CLIENT_ID)?.to_string(),
            client_secret: self.require(CLIENT_SECRET)?.to_string(),
            refresh_token: self.require(REFRESH_TOKEN)?.to_string(),
        })
    }

    /// String keys that are absent or empty.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        STRING_KEYS
            .iter()
            .copied()
            .filter(|key| self.get(key).is_none())
            .collect()
    }

    /// Multipart body limit, falling back to 128 MiB.
    pub fn multipart_body_limit(&self) -> u64 {
        self.form_options
            .multipart_body_length_limit
            .unwrap_or(DEFAULT_MULTIPART_BODY_LENGTH_LIMIT)
    }
}
