//! Sends a condition to the execution engine and extracts its output

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::{Condition, Frames, Identity, TimeRange};

use super::ports::{ExecutionEngine, ExecutionRequest};

/// Context for executing an alert condition
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Id of the alert definition being evaluated, for diagnostics
    pub condition_id: i64,
    /// Caller identity forwarded to the engine
    pub identity: Identity,
    /// Cancels the in-flight engine call
    pub cancel: CancellationToken,
    /// Overrides the configured engine timeout
    pub timeout: Option<Duration>,
}

impl ExecutionContext {
    /// Create a context with a fresh cancellation token
    pub fn new(condition_id: i64, identity: Identity) -> Self {
        Self {
            condition_id,
            identity,
            cancel: CancellationToken::new(),
            timeout: None,
        }
    }

    /// Set a timeout for this execution
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// The unevaluated output of executing a condition
#[derive(Debug)]
pub struct ExecutionResults {
    /// Id of the alert definition
    pub condition_id: i64,
    /// Set when execution failed; `results` is then empty
    pub error: Option<Error>,
    /// Frames of the condition's output ref id
    pub results: Frames,
}

impl ExecutionResults {
    /// Successful results
    pub fn new(condition_id: i64, results: Frames) -> Self {
        Self {
            condition_id,
            error: None,
            results,
        }
    }

    /// Failed results
    pub fn failed(condition_id: i64, error: Error) -> Self {
        Self {
            condition_id,
            error: Some(error),
            results: Frames::new(),
        }
    }

    /// Turn a recorded error into `Err`
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Runs conditions through the execution engine. Never retries.
pub struct ConditionExecutor {
    engine: Arc<dyn ExecutionEngine>,
    config: EngineConfig,
}

impl ConditionExecutor {
    /// Create a new executor
    pub fn new(engine: Arc<dyn ExecutionEngine>, config: EngineConfig) -> Self {
        Self { engine, config }
    }

    /// Execute the condition over `from`..`to`, failing on any error
    pub async fn execute(
        &self,
        condition: &Condition,
        from: &str,
        to: &str,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResults> {
        self.run(condition, from, to, ctx).await.into_result()
    }

    /// Execute the condition over `from`..`to`, recording any error in the
    /// returned results instead of discarding them
    pub async fn run(
        &self,
        condition: &Condition,
        from: &str,
        to: &str,
        ctx: &ExecutionContext,
    ) -> ExecutionResults {
        match self.try_run(condition, from, to, ctx).await {
            Ok(frames) => ExecutionResults::new(ctx.condition_id, frames),
            Err(err) => {
                warn!(condition_id = ctx.condition_id, ref_id = %condition.ref_id, error = %err, "Condition execution failed");
                ExecutionResults::failed(ctx.condition_id, err)
            }
        }
    }

    async fn try_run(
        &self,
        condition: &Condition,
        from: &str,
        to: &str,
        ctx: &ExecutionContext,
    ) -> Result<Frames> {
        if condition.is_empty() {
            return Err(Error::InvalidCondition(format!(
                "condition {} has no queries or expressions",
                ctx.condition_id
            )));
        }

        let request = ExecutionRequest {
            request_id: Uuid::new_v4(),
            queries: condition.queries.clone(),
            time_range: TimeRange::parse(from, to)?,
            identity: ctx.identity.clone(),
            debug: self.config.debug,
        };

        let timeout = ctx.timeout.unwrap_or(self.config.timeout);
        let engine_error = |message: String| Error::EngineExecution {
            condition_id: ctx.condition_id,
            message,
        };

        debug!(
            condition_id = ctx.condition_id,
            request_id = %request.request_id,
            queries = request.queries.len(),
            from = request.time_range.from_epoch_ms(),
            to = request.time_range.to_epoch_ms(),
            "Dispatching condition to execution engine"
        );

        let mut response = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(engine_error("cancelled".to_string())),
            outcome = tokio::time::timeout(timeout, self.engine.run(&request)) => match outcome {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => return Err(engine_error(err.to_string())),
                Err(_) => {
                    return Err(engine_error(format!(
                        "timed out after {}",
                        humantime::format_duration(timeout)
                    )))
                }
            },
        };

        let sub_result = response
            .remove(&condition.ref_id)
            .ok_or_else(|| Error::MissingResult {
                condition_id: ctx.condition_id,
                ref_id: condition.ref_id.clone(),
            })?;

        sub_result.decode()
    }
}
