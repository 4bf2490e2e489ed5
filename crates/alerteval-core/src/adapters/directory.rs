//! Data source directories

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::config::DataSourceConfig;
use crate::error::Result;
use crate::eval::DataSourceDirectory;
use crate::models::{DataSourceIdentity, Identity};

/// Directory over a fixed set of data sources, keyed by organization and name
#[derive(Debug, Clone, Default)]
pub struct StaticDataSourceDirectory {
    datasources: HashMap<(i64, String), DataSourceIdentity>,
}

impl StaticDataSourceDirectory {
    /// Build from configured data sources
    pub fn from_config(datasources: &[DataSourceConfig]) -> Self {
        let datasources = datasources
            .iter()
            .map(|cfg| ((cfg.org_id, cfg.name.clone()), DataSourceIdentity::from(cfg)))
            .collect();
        Self { datasources }
    }

    /// Number of known data sources
    pub fn len(&self) -> usize {
        self.datasources.len()
    }

    /// Whether no data sources are known
    pub fn is_empty(&self) -> bool {
        self.datasources.is_empty()
    }
}

#[async_trait::async_trait]
impl DataSourceDirectory for StaticDataSourceDirectory {
    async fn resolve(
        &self,
        name: &str,
        org_id: i64,
        _identity: &Identity,
        _skip_cache: bool,
    ) -> Result<Option<DataSourceIdentity>> {
        Ok(self.datasources.get(&(org_id, name.to_string())).cloned())
    }
}

/// Caches another directory's answers per organization and name.
///
/// `skip_cache` bypasses the lookup and refreshes the entry. Unknown names
/// are not cached.
pub struct CachedDirectory<D> {
    inner: D,
    cache: Arc<DashMap<(i64, String), DataSourceIdentity>>,
}

impl<D: DataSourceDirectory> CachedDirectory<D> {
    /// Wrap `inner`
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[async_trait::async_trait]
impl<D: DataSourceDirectory> DataSourceDirectory for CachedDirectory<D> {
    async fn resolve(
        &self,
        name: &str,
        org_id: i64,
        identity: &Identity,
        skip_cache: bool,
    ) -> Result<Option<DataSourceIdentity>> {
        let key = (org_id, name.to_string());

        if !skip_cache {
            if let Some(hit) = self.cache.get(&key) {
                debug!(name, org_id, "Data source cache hit");
                return Ok(Some(hit.value().clone()));
            }
        }

        let resolved = self.inner.resolve(name, org_id, identity, skip_cache).await?;
        match &resolved {
            Some(ds) => {
                self.cache.insert(key, ds.clone());
            }
            None => {
                self.cache.remove(&key);
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::testing::FakeDirectory;

    fn ds(id: i64, name: &str) -> DataSourceIdentity {
        DataSourceIdentity {
            id,
            uid: None,
            name: name.to_string(),
            type_name: "prometheus".to_string(),
        }
    }

    #[tokio::test]
    async fn test_static_directory_is_org_scoped() {
        let directory = StaticDataSourceDirectory::from_config(&[DataSourceConfig {
            id: 3,
            uid: None,
            name: "prom".to_string(),
            type_name: "prometheus".to_string(),
            org_id: 1,
        }]);
        let identity = Identity::default();

        let found = directory.resolve("prom", 1, &identity, false).await.unwrap();
        assert_eq!(found.map(|d| d.id), Some(3));
        assert!(directory.resolve("prom", 2, &identity, false).await.unwrap().is_none());
        assert!(directory.resolve("loki", 1, &identity, false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_hits_and_bypass() {
        let cached = CachedDirectory::new(FakeDirectory::new(1, vec![ds(3, "prom")]));
        let identity = Identity::default();

        for _ in 0..3 {
            let hit = cached.resolve("prom", 1, &identity, false).await.unwrap();
            assert_eq!(hit.map(|d| d.id), Some(3));
        }
        assert_eq!(cached.inner.calls().len(), 1);

        cached.resolve("prom", 1, &identity, true).await.unwrap();
        assert_eq!(
            cached.inner.calls().last(),
            Some(&("prom".to_string(), 1, true))
        );
        assert_eq!(cached.inner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_names_are_not_cached() {
        let cached = CachedDirectory::new(FakeDirectory::new(1, vec![]));
        let identity = Identity::default();

        assert!(cached.resolve("ghost", 1, &identity, false).await.unwrap().is_none());
        assert!(cached.resolve("ghost", 1, &identity, false).await.unwrap().is_none());
        assert_eq!(cached.inner.calls().len(), 2);
    }
}
