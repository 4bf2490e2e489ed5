//! Reduces execution results into per-instance alert states

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, FrameDimension, Result};
use crate::models::{EvalResult, FieldType, Results, State};

use super::executor::ExecutionResults;

/// Evaluate every frame of `results` into an instance state.
///
/// Each frame must hold exactly one row and one `nullable_float64` field,
/// and no two frames may share a label set. The first violation aborts the
/// whole evaluation. A present value of exactly zero is `Normal`; anything
/// else, including a missing value, is `Alerting`.
pub fn evaluate_execution_result(results: &ExecutionResults) -> Result<Results> {
    let mut evaluated = Results::new();
    let mut seen = HashSet::with_capacity(results.results.len());

    for frame in &results.results {
        let rows = frame.row_len();
        if rows != 1 {
            return Err(Error::InvalidFrameShape {
                frame: frame.name.clone(),
                dimension: FrameDimension::Row,
                observed: rows,
            });
        }

        if frame.fields.len() != 1 {
            return Err(Error::InvalidFrameShape {
                frame: frame.name.clone(),
                dimension: FrameDimension::Field,
                observed: frame.fields.len(),
            });
        }

        let field = &frame.fields[0];
        if field.field_type() != FieldType::NullableFloat64 {
            return Err(Error::InvalidFrameType {
                frame: frame.name.clone(),
                observed: field.field_type().to_string(),
            });
        }

        if !seen.insert(&field.labels) {
            return Err(Error::DuplicateInstance {
                frame: frame.name.clone(),
                labels: field.labels.to_string(),
            });
        }

        evaluated.push(EvalResult {
            instance: field.labels.clone(),
            state: State::from_value(field.float_at(0)),
        });
    }

    debug!(
        condition_id = results.condition_id,
        instances = evaluated.len(),
        alerting = evaluated.alerting_count(),
        "Evaluated execution results"
    );

    Ok(evaluated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, FieldValues, Frame, Labels};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs.iter().copied().collect()
    }

    fn frame(name: &str, labels: Labels, values: Vec<Option<f64>>) -> Frame {
        Frame::new(
            name,
            vec![Field::new("", labels, FieldValues::NullableFloat64 { values })],
        )
    }

    fn results(frames: Vec<Frame>) -> ExecutionResults {
        ExecutionResults::new(7, frames)
    }

    #[rstest]
    #[case(Some(0.0), State::Normal)]
    #[case(Some(3.5), State::Alerting)]
    #[case(Some(-1.0), State::Alerting)]
    #[case(Some(f64::NAN), State::Alerting)]
    #[case(None, State::Alerting)]
    fn test_scalar_reduction(#[case] value: Option<f64>, #[case] expected: State) {
        let evaluated =
            evaluate_execution_result(&results(vec![frame("B", labels(&[("host", "a")]), vec![value])]))
                .unwrap();

        assert_eq!(evaluated.len(), 1);
        let result = evaluated.iter().next().unwrap();
        assert_eq!(result.state, expected);
        assert_eq!(result.instance, labels(&[("host", "a")]));
    }

    #[test]
    fn test_preserves_frame_order() {
        let evaluated = evaluate_execution_result(&results(vec![
            frame("B", labels(&[("host", "z")]), vec![Some(1.0)]),
            frame("B", labels(&[("host", "a")]), vec![Some(0.0)]),
            frame("B", labels(&[("host", "m")]), vec![None]),
        ]))
        .unwrap();

        let hosts: Vec<_> = evaluated
            .iter()
            .map(|r| (r.instance.get("host").unwrap().to_string(), r.state))
            .collect();
        assert_eq!(
            hosts,
            vec![
                ("z".to_string(), State::Alerting),
                ("a".to_string(), State::Normal),
                ("m".to_string(), State::Alerting),
            ]
        );
        assert_eq!(evaluated.alerting_count(), 2);
    }

    #[test]
    fn test_empty_results_evaluate_to_nothing() {
        assert!(evaluate_execution_result(&results(vec![])).unwrap().is_empty());
    }

    #[rstest]
    #[case(vec![], 0)]
    #[case(vec![Some(1.0), Some(2.0)], 2)]
    fn test_row_count_must_be_one(#[case] values: Vec<Option<f64>>, #[case] observed_rows: usize) {
        let err = evaluate_execution_result(&results(vec![frame("series", Labels::new(), values)]))
            .unwrap_err();

        match err {
            Error::InvalidFrameShape {
                frame,
                dimension,
                observed,
            } => {
                assert_eq!(frame, "series");
                assert_eq!(dimension, FrameDimension::Row);
                assert_eq!(observed, observed_rows);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_row_count_error_message_names_frame_and_count() {
        let err = evaluate_execution_result(&results(vec![frame(
            "series",
            Labels::new(),
            vec![Some(1.0), Some(2.0)],
        )]))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid frame \"series\": row length 2");
    }

    #[test]
    fn test_field_count_must_be_one() {
        let two_fields = Frame::new(
            "wide",
            vec![
                Field::new("", Labels::new(), FieldValues::NullableFloat64 { values: vec![Some(0.0)] }),
                Field::new("", Labels::new(), FieldValues::NullableFloat64 { values: vec![Some(0.0)] }),
            ],
        );

        let err = evaluate_execution_result(&results(vec![two_fields])).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFrameShape { dimension: FrameDimension::Field, observed: 2, .. }
        ));
    }

    #[test]
    fn test_field_type_must_be_nullable_float() {
        let ints = Frame::new(
            "ints",
            vec![Field::new("", Labels::new(), FieldValues::Int64 { values: vec![0] })],
        );

        let err = evaluate_execution_result(&results(vec![ints])).unwrap_err();
        match err {
            Error::InvalidFrameType { frame, observed } => {
                assert_eq!(frame, "ints");
                assert_eq!(observed, "int64");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_label_sets_are_rejected() {
        let err = evaluate_execution_result(&results(vec![
            frame("B", labels(&[("host", "a"), ("dc", "1")]), vec![Some(0.0)]),
            frame("C", labels(&[("dc", "1"), ("host", "a")]), vec![Some(1.0)]),
        ]))
        .unwrap_err();

        match err {
            Error::DuplicateInstance { frame, labels } => {
                assert_eq!(frame, "C");
                assert_eq!(labels, "dc=1, host=a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_label_values_containing_separators_are_distinct_instances() {
        let evaluated = evaluate_execution_result(&results(vec![
            frame("x", labels(&[("a", "1, b=2")]), vec![Some(0.0)]),
            frame("x", labels(&[("a", "1"), ("b", "2")]), vec![Some(0.0)]),
        ]))
        .unwrap();

        assert_eq!(evaluated.len(), 2);
        assert_eq!(evaluated.alerting_count(), 0);
    }

    #[test]
    fn test_first_violation_aborts_without_partial_results() {
        let result = evaluate_execution_result(&results(vec![
            frame("ok", labels(&[("host", "a")]), vec![Some(0.0)]),
            frame("bad", labels(&[("host", "b")]), vec![]),
        ]));
        assert!(result.is_err());
    }
}
