//! drivegate daemon: HTTP proxy for Google Drive login, upload and download.

pub mod api;
pub mod config;
pub mod drive;
pub mod http;
pub mod state;
pub mod token_store;
