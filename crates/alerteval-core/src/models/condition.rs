//! Conditions and the resolved queries they are made of

use serde::{Deserialize, Serialize};

/// Id of the in-engine expression pseudo data source
pub const EXPRESSION_DATASOURCE_ID: i64 = -100;

/// A concrete data source connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceIdentity {
    /// Numeric id
    pub id: i64,
    /// Stable uid, if the directory has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Display name
    pub name: String,
    /// Plugin type
    #[serde(rename = "type", default)]
    pub type_name: String,
}

impl DataSourceIdentity {
    /// Pseudo data source for expressions evaluated inside the engine
    pub fn expression(name: impl Into<String>) -> Self {
        Self {
            id: EXPRESSION_DATASOURCE_ID,
            uid: None,
            name: name.into(),
            type_name: "expression".to_string(),
        }
    }

    /// Whether this is the expression pseudo data source
    pub fn is_expression(&self) -> bool {
        self.id == EXPRESSION_DATASOURCE_ID
    }
}

/// The caller on whose behalf a condition is loaded and executed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// User id
    pub user_id: i64,
    /// Organization the user is signed in to
    pub org_id: i64,
    /// Login name
    pub login: String,
}

impl Identity {
    /// Create a new identity
    pub fn new(user_id: i64, org_id: i64, login: impl Into<String>) -> Self {
        Self {
            user_id,
            org_id,
            login: login.into(),
        }
    }
}

/// A fully-specified query or expression, ready for the execution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Reference id, unique within a condition
    pub ref_id: String,
    /// Resolved data source
    #[serde(rename = "datasourceRef")]
    pub datasource: DataSourceIdentity,
    /// Declared data source name
    #[serde(rename = "datasource")]
    pub datasource_name: String,
    /// Data source id as sent to the engine
    #[serde(rename = "datasourceId")]
    pub datasource_id: i64,
    /// Organization id as sent to the engine
    pub org_id: i64,
    /// Maximum number of data points
    pub max_data_points: i64,
    /// Interval in milliseconds
    pub interval_ms: i64,
    /// Query type tag
    #[serde(default)]
    pub query_type: String,
    /// Engine-specific parameters passed through untouched
    #[serde(flatten)]
    pub model: serde_json::Map<String, serde_json::Value>,
    /// Evaluated inside the engine rather than against `datasource`
    #[serde(skip)]
    pub expression: bool,
}

impl Query {
    /// Whether this query is evaluated inside the engine
    pub fn is_expression(&self) -> bool {
        self.expression
    }
}

/// Queries and expressions plus the ref id of the one that holds the
/// condition's truth value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Ref id of the query or expression that is evaluated
    pub ref_id: String,
    /// Queries and expressions in document order
    #[serde(rename = "queriesAndExpressions")]
    pub queries: Vec<Query>,
}

impl Condition {
    /// Whether there is anything to execute
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Non-empty, and exactly one query carries the condition's ref id
    pub fn is_valid(&self) -> bool {
        !self.is_empty() && self.queries.iter().filter(|q| q.ref_id == self.ref_id).count() == 1
    }

    /// The query holding the condition's truth value
    pub fn output_query(&self) -> Option<&Query> {
        self.queries.iter().find(|q| q.ref_id == self.ref_id)
    }
}
