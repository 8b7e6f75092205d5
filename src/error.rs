// src/error.rs

use thiserror::Error;

pub type Result<T> = anyhow::Result<T>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0} environment variable not set. Export it or add it to a .env file.")]
    MissingApiKey(&'static str),

    // Rejected by the service before generation started (e.g. prompt too long)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Stream error: {0}")]
    Stream(String),
}
