use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::picking::TableFormat;

/// Fatal picking list failure: the table could not be loaded at all.
///
/// Problems inside an otherwise readable table (bad rows, odd dates) never
/// surface here; they are logged and degrade the result instead.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported picking list format: {filename}")]
    UnsupportedFormat { filename: String },

    #[error("Failed to read {format} picking list: {message}")]
    Load { format: TableFormat, message: String },

    #[error("Picking list has no table: {reason}")]
    EmptyTable { reason: String },

    #[error("Failed to open picking list: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub fn load(format: TableFormat, message: impl ToString) -> Self {
        Self::Load {
            format,
            message: message.to_string(),
        }
    }

    pub fn empty_table(reason: impl Into<String>) -> Self {
        Self::EmptyTable {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum PickingError {
    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl PickingError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSING_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Parse { .. } => 422,
            Self::Validation { .. } => 400,
            Self::Configuration { .. } => 500,
            Self::PayloadTooLarge { .. } => 413,
            Self::Internal { .. } => 500,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<PickingError> for ErrorResponse {
    fn from(error: PickingError) -> Self {
        let details = match &error {
            PickingError::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
            PickingError::PayloadTooLarge { limit } => Some(serde_json::json!({ "limit": limit })),
            _ => None,
        };

        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl From<ParseError> for PickingError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::UnsupportedFormat { filename } => Self::validation(
                "file",
                format!("unsupported file type: {filename}; expected .xlsx, .xls or .csv"),
            ),
            other => Self::parse(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for PickingError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<serde_json::Error> for PickingError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}
