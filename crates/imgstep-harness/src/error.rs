use std::path::PathBuf;

use imgstep_engine::NavConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("config error: {0}")]
    Config(#[from] NavConfigError),

    #[error("unsupported config format: {path} (expected .toml or .json)")]
    ConfigFormat { path: PathBuf },

    #[error("invalid fixture {name}: {message}")]
    InvalidFixture { name: String, message: String },

    #[error("{failed} of {total} fixtures did not match their expectations")]
    Mismatches { failed: usize, total: usize },
}

impl HarnessError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Mismatches { .. } => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid_fixture(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFixture {
            name: name.into(),
            message: message.into(),
        }
    }
}
