//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Discovery failed for {root}: {message}")]
    Discovery { root: PathBuf, message: String },

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("Could not resolve changed files for {baseline}: {message}")]
    ChangeResolution { baseline: String, message: String },

    #[error("No environment found for {package}: {message}")]
    EnvironmentNotFound { package: String, message: String },

    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("Invalid check '{check}' in {package}: {message}")]
    InvalidCheck {
        package: String,
        check: String,
        message: String,
    },
}

impl Error {
    /// Whether this error means the run scope could not be established.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Discovery { .. } | Error::ChangeResolution { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
