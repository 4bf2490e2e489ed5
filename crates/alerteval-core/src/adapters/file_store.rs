//! Dashboard store backed by a JSON file

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::eval::DashboardStore;
use crate::models::DashboardDocument;

/// Reads dashboards from a JSON array of `{id, orgId, title, data}` objects.
///
/// The file is read on every lookup, so edits are picked up without a
/// restart.
#[derive(Debug, Clone)]
pub struct JsonFileDashboardStore {
    path: PathBuf,
}

impl JsonFileDashboardStore {
    /// Create a store reading from `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl DashboardStore for JsonFileDashboardStore {
    async fn get_by_id(&self, dashboard_id: i64) -> Result<DashboardDocument> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::storage(format!("{}: {e}", self.path.display())))?;

        let documents: Vec<DashboardDocument> = serde_json::from_slice(&raw)
            .map_err(|e| Error::decode(format!("{}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), dashboards = documents.len(), "Read dashboard file");

        documents
            .into_iter()
            .find(|d| d.id == dashboard_id)
            .ok_or_else(|| Error::not_found("dashboard", dashboard_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_dashboard_by_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = json!([
            {"id": 1, "orgId": 2, "title": "one", "data": {"panels": []}},
            {"id": 3, "orgId": 2, "title": "three", "data": {"panels": [{"id": 1}]}}
        ]);
        write!(file, "{body}").unwrap();

        let store = JsonFileDashboardStore::new(file.path());
        let doc = store.get_by_id(3).await.unwrap();
        assert_eq!(doc.title, "three");
        assert_eq!(doc.org_id, 2);

        assert!(matches!(store.get_by_id(4).await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileDashboardStore::new(dir.path().join("missing.json"));
        assert!(matches!(store.get_by_id(1).await, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let store = JsonFileDashboardStore::new(file.path());
        assert!(matches!(store.get_by_id(1).await, Err(Error::Decode(_))));
    }
}
