use std::{fmt, io};

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[cfg(feature = "wasm")]
use serde_wasm_bindgen::Error as WasmError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DeckError {
    #[error("Data integrity error: {0}")]
    Integrity(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Please select an OWL file first")]
    NoSourceSelected,
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("{0}")]
    Service(String),
    #[error("Stale load for '{source_file}': generation {generation} superseded by {current}")]
    StaleLoad {
        source_file: String,
        generation: u64,
        current: u64,
    },
}

impl DeckError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeckError::Integrity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DeckError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DeckError::NotFound(_) => StatusCode::NOT_FOUND,
            DeckError::NoSourceSelected => StatusCode::BAD_REQUEST,
            DeckError::PermissionDenied => StatusCode::FORBIDDEN,
            DeckError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DeckError::Service(_) => StatusCode::BAD_GATEWAY,
            DeckError::StaleLoad { .. } => StatusCode::CONFLICT,
        }
    }

    /// Maps a failed HTTP response from an ontology API onto an error variant. `detail` is
    /// the server-provided message, if any.
    pub fn from_status(status: StatusCode, detail: Option<&str>) -> DeckError {
        let detail = detail
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        match status {
            StatusCode::NOT_FOUND => DeckError::NotFound(detail),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => DeckError::PermissionDenied,
            StatusCode::UNPROCESSABLE_ENTITY => DeckError::Integrity(detail),
            _ => DeckError::Service(detail),
        }
    }

    /// Message shown to the participant, without the variant prefix where the prefix adds
    /// nothing.
    pub fn detail(&self) -> String {
        match self {
            DeckError::Integrity(msg)
            | DeckError::Io(msg)
            | DeckError::NotFound(msg)
            | DeckError::Serialization(msg)
            | DeckError::Service(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for DeckError {
    fn from(src: toml::de::Error) -> DeckError {
        DeckError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for DeckError {
    fn from(src: toml::ser::Error) -> DeckError {
        DeckError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for DeckError {
    fn from(src: JsonError) -> DeckError {
        DeckError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for DeckError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => DeckError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => DeckError::PermissionDenied,
            _ => DeckError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for DeckError {
    fn from(x: fmt::Error) -> Self {
        DeckError::Serialization(format!("{x}"))
    }
}

#[cfg(feature = "wasm")]
impl From<WasmError> for DeckError {
    fn from(wasm_error: WasmError) -> Self {
        DeckError::Serialization(format!("Serde-wasm-bindgen error: {wasm_error}"))
    }
}
