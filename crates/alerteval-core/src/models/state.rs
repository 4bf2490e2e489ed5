//! Evaluated alert instance states

use std::fmt;

use serde::{Deserialize, Serialize};

use super::frame::Labels;

/// Evaluation state of an alert instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// The condition value was exactly zero
    #[default]
    Normal,
    /// Any other outcome: nonzero, missing, or not a number
    Alerting,
}

impl State {
    /// Reduce a scalar condition value to a state.
    ///
    /// Only a present, exactly-zero value is `Normal`.
    pub fn from_value(value: Option<f64>) -> Self {
        match value {
            Some(v) if v == 0.0 => State::Normal,
            _ => State::Alerting,
        }
    }

    /// Whether this state is `Alerting`
    pub fn is_alerting(self) -> bool {
        self != State::Normal
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Normal => f.write_str("Normal"),
            State::Alerting => f.write_str("Alerting"),
        }
    }
}

/// State of one alert instance, identified by its labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Instance labels
    pub instance: Labels,
    /// Evaluated state
    pub state: State,
}

/// Evaluated instances, in the order of the frames they came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Results(Vec<EvalResult>);

impl Results {
    /// Create an empty result list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result
    pub fn push(&mut self, result: EvalResult) {
        self.0.push(result);
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no instances
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate results in order
    pub fn iter(&self) -> std::slice::Iter<'_, EvalResult> {
        self.0.iter()
    }

    /// Number of alerting instances
    pub fn alerting_count(&self) -> usize {
        self.0.iter().filter(|r| r.state.is_alerting()).count()
    }
}

impl From<Vec<EvalResult>> for Results {
    fn from(results: Vec<EvalResult>) -> Self {
        Self(results)
    }
}

impl IntoIterator for Results {
    type Item = EvalResult;
    type IntoIter = std::vec::IntoIter<EvalResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Results {
    type Item = &'a EvalResult;
    type IntoIter = std::slice::Iter<'a, EvalResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
