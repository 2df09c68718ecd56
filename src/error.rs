use thiserror::Error;

use crate::trigger::EntityKind;

/// Top-level error type for the stage path engine.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Manager(#[from] ManagerError),
}

/// Errors in static level data or driver configuration.
///
/// These are fatal at load time: the caller must reject the stage.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no {kind:?} template registered at index {index}")]
    UnknownTemplate { kind: EntityKind, index: usize },

    #[error("invalid configuration value {field} = {value}: {reason}")]
    InvalidValue {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("malformed configuration: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Errors raised while decoding a persisted stage document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed stage document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported stage document version {found} (expected at most {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Errors related to path editing through the manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("path not found (deleted or never created)")]
    PathNotFound,

    #[error("{what} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

/// Convenience type alias for results using [`StageError`].
pub type Result<T> = std::result::Result<T, StageError>;
