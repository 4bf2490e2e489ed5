//! Resolves a stored panel's targets into an executable condition

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EvalConfig;
use crate::error::{Error, Result};
use crate::models::{
    Condition, DataSourceIdentity, Identity, MinimalDashboard, Panel, Query, Target,
};

use super::ports::{DashboardStore, DataSourceDirectory};

/// Target keys the loader reads into named query fields. Everything else is
/// passed through to the engine untouched.
const NAMED_KEYS: [&str; 7] = [
    "refId",
    "datasource",
    "datasourceId",
    "orgId",
    "maxDataPoints",
    "intervalMs",
    "queryType",
];

/// Builds conditions from the queries stored on dashboard panels
pub struct ConditionLoader {
    store: Arc<dyn DashboardStore>,
    directory: Arc<dyn DataSourceDirectory>,
    defaults: EvalConfig,
}

impl ConditionLoader {
    /// Create a new loader
    pub fn new(
        store: Arc<dyn DashboardStore>,
        directory: Arc<dyn DataSourceDirectory>,
        defaults: EvalConfig,
    ) -> Self {
        Self {
            store,
            directory,
            defaults,
        }
    }

    /// Load the condition made of the targets of `panel_id` on `dashboard_id`,
    /// evaluated at `output_ref_id`.
    ///
    /// The first plain target's data source is resolved through the
    /// directory; later plain targets reuse it. Expression targets never hit
    /// the directory.
    pub async fn load(
        &self,
        dashboard_id: i64,
        panel_id: i64,
        output_ref_id: &str,
        identity: &Identity,
        skip_cache: bool,
    ) -> Result<Condition> {
        let (org_id, dashboard) = self.fetch_dashboard(dashboard_id).await?;

        let panel = dashboard
            .panel(panel_id)
            .ok_or(Error::PanelNotFound {
                dashboard_id,
                panel_id,
            })?;

        let mut resolved: Option<DataSourceIdentity> = None;
        let mut queries = Vec::with_capacity(panel.targets.len());

        for (i, target) in panel.targets.iter().enumerate() {
            let ref_id = string_field(target, "refId")?.unwrap_or("A").to_string();
            let explicit = string_field(target, "datasource")?;
            let declared = explicit.or(panel.datasource.as_deref());
            let is_expression = declared == Some(self.defaults.expression_datasource.as_str());

            if i == 0 && !is_expression {
                resolved = self
                    .resolve_first(panel, declared, &ref_id, org_id, identity, skip_cache)
                    .await?;
            }

            let datasource = if is_expression {
                resolved.clone().unwrap_or_else(|| {
                    DataSourceIdentity::expression(&self.defaults.expression_datasource)
                })
            } else {
                let ds = resolved.clone().ok_or_else(|| Error::MissingDataSource {
                    name: declared.unwrap_or_default().to_string(),
                    ref_id: ref_id.clone(),
                })?;
                if let Some(name) = explicit {
                    if name != ds.name {
                        warn!(
                            dashboard_id,
                            panel_id,
                            ref_id = %ref_id,
                            declared = name,
                            resolved = %ds.name,
                            "Query declares its own data source; using the condition's first data source"
                        );
                    }
                }
                ds
            };

            queries.push(self.build_query(target, ref_id, explicit, datasource, is_expression)?);
        }

        debug!(
            dashboard_id,
            panel_id,
            ref_id = output_ref_id,
            queries = queries.len(),
            "Loaded condition"
        );

        Ok(Condition {
            ref_id: output_ref_id.to_string(),
            queries,
        })
    }

    /// Fetch the dashboard and decode its panels in one step. The raw
    /// document is dropped before returning.
    async fn fetch_dashboard(&self, dashboard_id: i64) -> Result<(i64, MinimalDashboard)> {
        let document = self.store.get_by_id(dashboard_id).await?;
        let dashboard = MinimalDashboard::deserialize(&document.data)
            .map_err(|e| Error::decode(format!("dashboard {dashboard_id}: {e}")))?;
        Ok((document.org_id, dashboard))
    }

    async fn resolve_first(
        &self,
        panel: &Panel,
        declared: Option<&str>,
        ref_id: &str,
        org_id: i64,
        identity: &Identity,
        skip_cache: bool,
    ) -> Result<Option<DataSourceIdentity>> {
        let Some(name) = declared else {
            debug!(panel_id = panel.id, ref_id, "No data source declared on query or panel");
            return Ok(None);
        };

        let ds = self
            .directory
            .resolve(name, org_id, identity, skip_cache)
            .await?
            .ok_or_else(|| Error::MissingDataSource {
                name: name.to_string(),
                ref_id: ref_id.to_string(),
            })?;

        debug!(name, org_id, datasource_id = ds.id, skip_cache, "Resolved data source");
        Ok(Some(ds))
    }

    fn build_query(
        &self,
        target: &Target,
        ref_id: String,
        explicit: Option<&str>,
        datasource: DataSourceIdentity,
        expression: bool,
    ) -> Result<Query> {
        let datasource_name = explicit.unwrap_or(&datasource.name).to_string();
        let datasource_id = int_field(target, "datasourceId", &ref_id)?.unwrap_or(datasource.id);
        let org_id = int_field(target, "orgId", &ref_id)?.unwrap_or(self.defaults.default_org_id);
        let max_data_points = int_field(target, "maxDataPoints", &ref_id)?
            .unwrap_or(self.defaults.default_max_data_points);
        let interval_ms =
            int_field(target, "intervalMs", &ref_id)?.unwrap_or(self.defaults.default_interval_ms);
        let query_type = string_field(target, "queryType")?.unwrap_or_default().to_string();

        let mut model = target.clone();
        for key in NAMED_KEYS {
            model.remove(key);
        }

        Ok(Query {
            ref_id,
            datasource,
            datasource_name,
            datasource_id,
            org_id,
            max_data_points,
            interval_ms,
            query_type,
            model,
            expression,
        })
    }
}

/// A string field; absent, null and empty all count as missing
fn string_field<'a>(target: &'a Target, key: &str) -> Result<Option<&'a str>> {
    match target.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::decode(format!("{key} must be a string, got {other}"))),
    }
}

/// An integer field, stored either as a number or a numeric string; absent,
/// null and empty all count as missing
fn int_field(target: &Target, key: &str, ref_id: &str) -> Result<Option<i64>> {
    let invalid = |v: &Value| Error::decode(format!("query {ref_id:?}: {key} must be an integer, got {v}"));

    let Some(value) = target.get(key) else {
        return Ok(None);
    };

    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => s.trim().parse().map(Some).map_err(|_| invalid(value)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| invalid(value)),
        _ => Err(invalid(value)),
    }
}
