//! Alert condition evaluation
//!
//! Conditions flow through four stages, each depending only on the previous
//! one: the [`ConditionLoader`] builds a condition from a dashboard panel,
//! the [`ConditionExecutor`] runs it through the execution engine,
//! [`evaluate_execution_result`] reduces the frames to instance states, and
//! [`Results::as_frame`](crate::models::Results::as_frame) projects the
//! states for display. [`AlertEngine`] chains all four.

mod evaluator;
mod executor;
mod loader;
mod ports;
mod presenter;

#[cfg(test)]
pub(crate) mod testing;

pub use evaluator::evaluate_execution_result;
pub use executor::{ConditionExecutor, ExecutionContext, ExecutionResults};
pub use loader::ConditionLoader;
pub use ports::{
    DashboardStore, DataSourceDirectory, EngineSubResult, ExecutionEngine, ExecutionRequest,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::models::{Condition, Frame, Results};

/// What to evaluate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    /// Dashboard holding the panel
    pub dashboard_id: i64,
    /// Panel whose targets make up the condition
    pub panel_id: i64,
    /// Ref id of the query or expression holding the truth value
    pub condition_ref_id: String,
    /// Range start
    pub from: String,
    /// Range end
    pub to: String,
    /// Bypass the data source directory cache
    #[serde(default)]
    pub skip_cache: bool,
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// The loaded condition
    pub condition: Condition,
    /// Per-instance states
    pub results: Results,
    /// Display projection of `results`
    pub frame: Frame,
}

/// Loads, executes, evaluates and presents alert conditions.
///
/// Holds no state between calls; concurrent evaluations are independent.
pub struct AlertEngine {
    loader: ConditionLoader,
    executor: ConditionExecutor,
}

impl AlertEngine {
    /// Create a new engine
    pub fn new(loader: ConditionLoader, executor: ConditionExecutor) -> Self {
        Self { loader, executor }
    }

    /// The condition loader
    pub fn loader(&self) -> &ConditionLoader {
        &self.loader
    }

    /// The condition executor
    pub fn executor(&self) -> &ConditionExecutor {
        &self.executor
    }

    /// Evaluate the condition described by `request` right now
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
        ctx: &ExecutionContext,
    ) -> Result<Evaluation> {
        let condition = self
            .loader
            .load(
                request.dashboard_id,
                request.panel_id,
                &request.condition_ref_id,
                &ctx.identity,
                request.skip_cache,
            )
            .await?;

        let executed = self
            .executor
            .execute(&condition, &request.from, &request.to, ctx)
            .await?;

        let results = evaluate_execution_result(&executed)?;
        let frame = results.as_frame();

        info!(
            condition_id = ctx.condition_id,
            dashboard_id = request.dashboard_id,
            panel_id = request.panel_id,
            ref_id = %request.condition_ref_id,
            instances = results.len(),
            alerting = results.alerting_count(),
            "Evaluated alert condition"
        );

        Ok(Evaluation {
            condition,
            results,
            frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::config::{EngineConfig, EvalConfig};
    use crate::error::Error;
    use crate::models::{
        DataSourceIdentity, Field, FieldValues, Identity, Labels, State,
    };
    use super::testing::{FakeDirectory, FakeEngine, FakeStore};

    fn instance_frame(host: &str, value: Option<f64>) -> Frame {
        Frame::new(
            "C",
            vec![Field::new(
                "",
                [("host", host)].into_iter().collect::<Labels>(),
                FieldValues::NullableFloat64 {
                    values: vec![value],
                },
            )],
        )
    }

    fn engine_with(frames: Vec<Frame>) -> (AlertEngine, Arc<FakeEngine>) {
        let store = FakeStore::with_dashboard(
            1,
            1,
            json!({"panels": [{"id": 4, "datasource": "prom", "targets": [
                {"refId": "A", "expr": "up"},
                {"refId": "C", "datasource": "__expr__", "type": "math", "expression": "$A == 0"}
            ]}]}),
        );
        let directory = FakeDirectory::new(
            1,
            vec![DataSourceIdentity {
                id: 9,
                uid: None,
                name: "prom".to_string(),
                type_name: "prometheus".to_string(),
            }],
        );
        let fake_engine = Arc::new(FakeEngine::responding("C", &frames));

        let engine = AlertEngine::new(
            ConditionLoader::new(Arc::new(store), Arc::new(directory), EvalConfig::default()),
            ConditionExecutor::new(fake_engine.clone(), EngineConfig::default()),
        );
        (engine, fake_engine)
    }

    fn request() -> EvaluationRequest {
        EvaluationRequest {
            dashboard_id: 1,
            panel_id: 4,
            condition_ref_id: "C".to_string(),
            from: "now-10m".to_string(),
            to: "now".to_string(),
            skip_cache: false,
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let (engine, fake_engine) = engine_with(vec![
            instance_frame("a", Some(0.0)),
            instance_frame("b", Some(2.0)),
        ]);
        let ctx = ExecutionContext::new(5, Identity::new(1, 1, "admin"));

        let evaluation = engine.evaluate(&request(), &ctx).await.unwrap();

        assert_eq!(evaluation.condition.queries.len(), 2);
        assert_eq!(evaluation.results.len(), 2);
        let states: Vec<State> = evaluation.results.iter().map(|r| r.state).collect();
        assert_eq!(states, vec![State::Normal, State::Alerting]);
        assert_eq!(evaluation.frame.fields.len(), 2);
        assert_eq!(
            evaluation.frame.fields[1].values,
            FieldValues::NullableBool { values: vec![Some(true)] }
        );
        assert_eq!(fake_engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_surfaces_evaluation_errors() {
        let (engine, _) = engine_with(vec![
            instance_frame("a", Some(0.0)),
            instance_frame("a", Some(1.0)),
        ]);
        let ctx = ExecutionContext::new(5, Identity::new(1, 1, "admin"));

        let err = engine.evaluate(&request(), &ctx).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateInstance { .. }));
    }

    #[tokio::test]
    async fn test_pipeline_stops_at_load_errors() {
        let (engine, fake_engine) = engine_with(vec![]);
        let ctx = ExecutionContext::new(5, Identity::new(1, 1, "admin"));
        let mut req = request();
        req.panel_id = 99;

        let err = engine.evaluate(&req, &ctx).await.unwrap_err();
        assert!(matches!(err, Error::PanelNotFound { .. }));
        assert_eq!(fake_engine.calls(), 0);
    }
}
