//! Aggregate/transform stage.
//!
//! Declares the operation vocabulary over connector rows and validates the
//! target source, but performs no computation: the stage is a deliberately
//! stubbed extension point and the acknowledgement says so with
//! `computed: false`. Completing it means replacing [`plan_transform`] with
//! a real implementation, not quietly widening the ack.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::registry::Registry;

/// Declared operation vocabulary for `transform_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOp {
    Count,
    Sum,
    Average,
    GroupBy,
}

impl fmt::Display for TransformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransformOp::Count => "count",
            TransformOp::Sum => "sum",
            TransformOp::Average => "average",
            TransformOp::GroupBy => "group_by",
        };
        f.write_str(label)
    }
}

/// Acknowledgement returned by the stubbed stage.
#[derive(Debug, Clone, Serialize)]
pub struct TransformAck {
    pub operation: TransformOp,
    pub field: Option<String>,
    /// Always false in the current contract.
    pub computed: bool,
    pub note: String,
}

/// Validate the target source and describe what the operation would do.
///
/// Succeeds whenever the descriptor exists; never fetches or computes rows.
pub fn plan_transform(
    registry: &Registry,
    source_name: &str,
    operation: TransformOp,
    field: Option<&str>,
) -> Result<TransformAck, GatewayError> {
    registry.resolve(source_name)?;

    let target = match field {
        Some(field) => format!("field '{field}'"),
        None => "all rows".to_string(),
    };

    Ok(TransformAck {
        operation,
        field: field.map(str::to_string),
        computed: false,
        note: format!(
            "would apply {operation} over {target} of '{source_name}'; \
             aggregation is declared but not executed"
        ),
    })
}
