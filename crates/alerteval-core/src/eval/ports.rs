//! Collaborator interfaces consumed by the evaluation pipeline
//!
//! The loader and executor receive these as injected trait objects; there is
//! no global registry or dispatch bus behind them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{DashboardDocument, DataSourceIdentity, Frames, Identity, Query, TimeRange};

/// Read-only access to stored dashboards
#[async_trait::async_trait]
pub trait DashboardStore: Send + Sync {
    /// Fetch a dashboard by id
    async fn get_by_id(&self, dashboard_id: i64) -> Result<DashboardDocument>;
}

/// Resolves data source names to concrete connections
#[async_trait::async_trait]
pub trait DataSourceDirectory: Send + Sync {
    /// Resolve `name` within `org_id`. `Ok(None)` means the name is unknown.
    /// `skip_cache` asks a caching implementation to bypass its cache.
    async fn resolve(
        &self,
        name: &str,
        org_id: i64,
        identity: &Identity,
        skip_cache: bool,
    ) -> Result<Option<DataSourceIdentity>>;
}

/// Runs resolved queries and expressions
#[async_trait::async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Execute a request, returning one sub-result per ref id
    async fn run(&self, request: &ExecutionRequest) -> Result<HashMap<String, EngineSubResult>>;
}

/// A single execution request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// Correlation id for logs
    pub request_id: Uuid,
    /// Queries and expressions to run
    pub queries: Vec<Query>,
    /// Time range to run them over
    pub time_range: TimeRange,
    /// Caller identity
    pub identity: Identity,
    /// Ask the engine for debug output
    pub debug: bool,
}

/// The engine's raw answer for one ref id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSubResult {
    /// Encoded frames
    #[serde(default)]
    pub frames: serde_json::Value,
}

impl EngineSubResult {
    /// Wrap already-encoded frames
    pub fn new(frames: serde_json::Value) -> Self {
        Self { frames }
    }

    /// Wrap typed frames
    pub fn from_frames(frames: &Frames) -> Result<Self> {
        Ok(Self {
            frames: serde_json::to_value(frames)?,
        })
    }

    /// Decode into frames. A missing payload decodes to no frames.
    pub fn decode(&self) -> Result<Frames> {
        if self.frames.is_null() {
            return Ok(Frames::new());
        }
        Frames::deserialize(&self.frames).map_err(|e| Error::decode(format!("engine frames: {e}")))
    }
}
