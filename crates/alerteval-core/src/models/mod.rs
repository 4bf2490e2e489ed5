//! Data models for AlertEval

mod condition;
mod dashboard;
mod frame;
mod state;
mod time_range;

pub use condition::*;
pub use dashboard::*;
pub use frame::*;
pub use state::*;
pub use time_range::*;
