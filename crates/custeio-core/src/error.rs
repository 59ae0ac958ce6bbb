use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CusteioError {
    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("required column \"{column}\" not found in the spreadsheet header")]
    MissingColumn { column: String },

    #[error("failed to read spreadsheet: {0}")]
    SheetRead(String),

    #[error("failed to commit batch: {0}")]
    Persistence(String),

    #[error("failed to read from store: {0}")]
    StoreRead(String),

    #[error("document '{key}' not found in '{collection}'")]
    NotFound { collection: String, key: String },

    #[error("invalid cell range: {0}")]
    InvalidRange(String),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error shape reported to the caller of a sync trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CusteioError {
    pub fn code(&self) -> &'static str {
        match self {
            CusteioError::Unauthenticated => "unauthenticated",
            CusteioError::NotFound { .. } => "not-found",
            CusteioError::InvalidRange(_)
            | CusteioError::ConfigLoad { .. }
            | CusteioError::ConfigInvalid(_) => "invalid-argument",
            _ => "internal",
        }
    }

    /// Map into the caller-facing error. Internal failures get a generic
    /// message with the underlying cause attached as details.
    pub fn to_call_error(&self) -> CallError {
        match self.code() {
            "internal" => CallError {
                code: "internal",
                message: "failed to read the spreadsheet and update the database".into(),
                details: Some(self.to_string()),
            },
            code => CallError {
                code,
                message: self.to_string(),
                details: None,
            },
        }
    }
}
