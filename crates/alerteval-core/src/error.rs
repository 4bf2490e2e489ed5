//! Error types for AlertEval

use std::fmt;

use thiserror::Error;

/// Result type alias using AlertEval's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Which dimension of a frame violated the single-row, single-field shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDimension {
    /// Number of rows
    Row,
    /// Number of fields
    Field,
}

impl fmt::Display for FrameDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameDimension::Row => f.write_str("row"),
            FrameDimension::Field => f.write_str("field"),
        }
    }
}

/// Error types for AlertEval operations
#[derive(Error, Debug)]
pub enum Error {
    /// The dashboard store could not be reached or read
    #[error("Storage error: {0}")]
    Storage(String),

    /// A document or engine payload did not match the expected schema
    #[error("Decode error: {0}")]
    Decode(String),

    /// No data source identity was available for a query that needs one
    #[error("No data source found for {name:?} (query {ref_id:?})")]
    MissingDataSource { name: String, ref_id: String },

    /// The requested panel does not exist in the dashboard document
    #[error("Panel {panel_id} not found in dashboard {dashboard_id}")]
    PanelNotFound { dashboard_id: i64, panel_id: i64 },

    /// The condition cannot be executed
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// The time range could not be parsed
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// The execution engine failed, was cancelled, or timed out
    #[error("Execution of condition {condition_id} failed: {message}")]
    EngineExecution { condition_id: i64, message: String },

    /// The execution engine returned no result for the condition's ref id
    #[error("No results for condition {condition_id}: ref id {ref_id:?} produced no frames")]
    MissingResult { condition_id: i64, ref_id: String },

    /// A frame does not have exactly one row and one field
    #[error("Invalid frame {frame:?}: {dimension} length {observed}")]
    InvalidFrameShape {
        frame: String,
        dimension: FrameDimension,
        observed: usize,
    },

    /// A frame's value field is not a nullable float
    #[error("Invalid frame {frame:?}: field type {observed}")]
    InvalidFrameType { frame: String, observed: String },

    /// Two frames carry the same label set
    #[error("Invalid frame {frame:?}: frames cannot uniquely be identified by its labels: {labels:?}")]
    DuplicateInstance { frame: String, labels: String },

    /// Transport or protocol failure talking to the execution engine
    #[error("Engine error: {0}")]
    Engine(String),

    /// Not found error
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Engine(err.to_string())
    }
}
