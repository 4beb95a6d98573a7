//! Error types for finledger-client

use finledger_core::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid base URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Could not build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    #[error("Login failed: {0}")]
    Login(RemoteError),

    #[error("Registration failed: {0}")]
    Register(RemoteError),
}
