//! Execution engine reached over HTTP

use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::eval::{EngineSubResult, ExecutionEngine, ExecutionRequest};
use crate::models::Query;

const QUERY_PATH: &str = "api/ds/query";

/// Posts execution requests to `{engine.url}/api/ds/query`
pub struct HttpExecutionEngine {
    client: Client,
    endpoint: Url,
}

impl HttpExecutionEngine {
    /// Create a new engine client
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("http client: {e}")))?;

        let mut base = Url::parse(&config.url)
            .map_err(|e| Error::config(format!("engine.url {:?}: {e}", config.url)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(QUERY_PATH)
            .map_err(|e| Error::config(format!("engine.url {:?}: {e}", config.url)))?;

        Ok(Self { client, endpoint })
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct QueryBody<'a> {
    from: String,
    to: String,
    queries: &'a [Query],
    debug: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: HashMap<String, RawSubResult>,
}

#[derive(Deserialize)]
struct RawSubResult {
    #[serde(default)]
    frames: Value,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait::async_trait]
impl ExecutionEngine for HttpExecutionEngine {
    async fn run(&self, request: &ExecutionRequest) -> Result<HashMap<String, EngineSubResult>> {
        let body = QueryBody {
            from: request.time_range.from_epoch_ms().to_string(),
            to: request.time_range.to_epoch_ms().to_string(),
            queries: &request.queries,
            debug: request.debug,
        };

        debug!(
            endpoint = %self.endpoint,
            request_id = %request.request_id,
            "Posting execution request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("X-Request-Id", request.request_id.to_string())
            .header("X-Grafana-Org-Id", request.identity.org_id.to_string())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, request_id = %request.request_id, "Execution engine returned an error status");
            return Err(Error::Engine(format!("status {status}: {text}")));
        }

        let decoded: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::decode(format!("engine response: {e}")))?;

        let mut results = HashMap::with_capacity(decoded.results.len());
        for (ref_id, raw) in decoded.results {
            if let Some(error) = raw.error.filter(|e| !e.is_empty()) {
                return Err(Error::Engine(format!("query {ref_id:?}: {error}")));
            }
            results.insert(ref_id, EngineSubResult::new(raw.frames));
        }
        Ok(results)
    }
}
