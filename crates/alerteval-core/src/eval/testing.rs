//! In-memory fakes for the collaborator ports

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::models::{DashboardDocument, DataSourceIdentity, Frames, Identity};

use super::ports::{
    DashboardStore, DataSourceDirectory, EngineSubResult, ExecutionEngine, ExecutionRequest,
};

pub(crate) struct FakeStore {
    dashboards: HashMap<i64, DashboardDocument>,
    fail: bool,
}

impl FakeStore {
    pub(crate) fn with_dashboard(id: i64, org_id: i64, data: serde_json::Value) -> Self {
        let mut dashboards = HashMap::new();
        dashboards.insert(
            id,
            DashboardDocument {
                id,
                org_id,
                title: format!("dashboard {id}"),
                data,
            },
        );
        Self {
            dashboards,
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            dashboards: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl DashboardStore for FakeStore {
    async fn get_by_id(&self, dashboard_id: i64) -> Result<DashboardDocument> {
        if self.fail {
            return Err(Error::storage("connection refused"));
        }
        self.dashboards
            .get(&dashboard_id)
            .cloned()
            .ok_or_else(|| Error::not_found("dashboard", dashboard_id.to_string()))
    }
}

pub(crate) struct FakeDirectory {
    org_id: i64,
    datasources: Vec<DataSourceIdentity>,
    calls: Mutex<Vec<(String, i64, bool)>>,
}

impl FakeDirectory {
    pub(crate) fn new(org_id: i64, datasources: Vec<DataSourceIdentity>) -> Self {
        Self {
            org_id,
            datasources,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, i64, bool)> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl DataSourceDirectory for FakeDirectory {
    async fn resolve(
        &self,
        name: &str,
        org_id: i64,
        _identity: &Identity,
        skip_cache: bool,
    ) -> Result<Option<DataSourceIdentity>> {
        self.calls.lock().push((name.to_string(), org_id, skip_cache));
        if org_id != self.org_id {
            return Ok(None);
        }
        Ok(self.datasources.iter().find(|ds| ds.name == name).cloned())
    }
}

pub(crate) enum EngineBehavior {
    Respond(HashMap<String, EngineSubResult>),
    Fail(String),
    Hang,
}

pub(crate) struct FakeEngine {
    behavior: EngineBehavior,
    calls: AtomicUsize,
    last_request: Mutex<Option<ExecutionRequest>>,
}

impl FakeEngine {
    pub(crate) fn new(behavior: EngineBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Engine answering `ref_id` with `frames`
    pub(crate) fn responding(ref_id: &str, frames: &Frames) -> Self {
        let mut results = HashMap::new();
        results.insert(
            ref_id.to_string(),
            EngineSubResult::from_frames(frames).expect("frames encode"),
        );
        Self::new(EngineBehavior::Respond(results))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<ExecutionRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait::async_trait]
impl ExecutionEngine for FakeEngine {
    async fn run(&self, request: &ExecutionRequest) -> Result<HashMap<String, EngineSubResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());
        match &self.behavior {
            EngineBehavior::Respond(results) => Ok(results.clone()),
            EngineBehavior::Fail(msg) => Err(Error::Engine(msg.clone())),
            EngineBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(HashMap::new())
            }
        }
    }
}
