//! Display projection of evaluated states

use crate::models::{Field, FieldValues, Frame, Results};

impl Results {
    /// One unnamed boolean field per instance, labeled with the instance
    /// labels and holding `true` when alerting, all in a single unnamed frame.
    pub fn as_frame(&self) -> Frame {
        let fields = self
            .iter()
            .map(|result| {
                Field::new(
                    "",
                    result.instance.clone(),
                    FieldValues::NullableBool {
                        values: vec![Some(result.state.is_alerting())],
                    },
                )
            })
            .collect();

        Frame::new("", fields)
    }
}
