//! # AlertEval
//!
//! Alert condition evaluation engine.
//!
//! AlertEval answers one question: what is the state of an alert condition
//! right now? It resolves the queries stored on a dashboard panel into an
//! executable condition, runs them through an external execution engine,
//! and reduces the returned single-value frames into a `Normal` or
//! `Alerting` state per labeled instance.
//!
//! ## Architecture
//!
//! - **Loader**: panel targets to a fully-specified condition
//! - **Executor**: one cancellable call to the execution engine
//! - **Evaluator**: shape checks and zero/non-zero reduction
//! - **Presenter**: one boolean column per instance for display
//!
//! Storage, the data source directory and the execution engine are injected
//! through the traits in [`eval`]; [`adapters`] has implementations backed
//! by files, configuration and HTTP.
//!
//! ## Quick Start
//!
//! ```bash
//! alerteval eval --dashboards dashboards.json --dashboard-id 1 --panel-id 2 --condition B
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod eval;
pub mod models;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::eval::{
        evaluate_execution_result, AlertEngine, ConditionExecutor, ConditionLoader,
        EvaluationRequest, ExecutionContext, ExecutionResults,
    };
    pub use crate::models::*;
}
