#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and I/O-free logic for the drivegate Google Drive proxy.

pub mod model;
pub mod oauth;
pub mod range;
pub mod settings;

pub use oauth::DriveCredentials;
pub use settings::{Settings, SettingsError};
