//! Minimal dashboard schema
//!
//! Only the parts of a stored dashboard needed to build a condition are
//! modeled: panels, their default data source, and their targets. Targets
//! stay loosely typed because they carry arbitrary engine-specific fields.

use serde::{Deserialize, Serialize};

/// A stored dashboard as returned by the dashboard store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    /// Dashboard id
    pub id: i64,
    /// Owning organization
    #[serde(default)]
    pub org_id: i64,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Raw dashboard JSON
    pub data: serde_json::Value,
}

/// The subset of the dashboard JSON the loader reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MinimalDashboard {
    /// Panels in document order
    #[serde(default)]
    pub panels: Vec<Panel>,
}

impl MinimalDashboard {
    /// Find a panel by id
    pub fn panel(&self, panel_id: i64) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == panel_id)
    }
}

/// A panel with its targets
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Panel {
    /// Panel id
    pub id: i64,
    /// Panel-level default data source name
    #[serde(default, deserialize_with = "deserialize_datasource_name")]
    pub datasource: Option<String>,
    /// Stored queries in document order
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// A stored query definition
pub type Target = serde_json::Map<String, serde_json::Value>;

/// Panel data sources are stored either as a plain name or as null
fn deserialize_datasource_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.filter(|n| !n.is_empty()))
}
