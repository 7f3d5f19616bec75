use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::domain::{ParameterPath, ParameterValue, Scenario};
use crate::error::EngineError;

/// Dotted path → new value, as sent by clients. Applied in key order.
pub type Overrides = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedOverride {
    /// Key exactly as supplied
    pub parameter: String,
    pub path: ParameterPath,
    pub value: ParameterValue,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedOverride {
    pub parameter: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct OverrideOutcome {
    pub scenario: Scenario,
    pub applied: Vec<AppliedOverride>,
    pub skipped: Vec<SkippedOverride>,
}

/// Derive a modified copy of `base`. Overrides with an unknown path or an
/// incompatible value are skipped and reported; `base` is never touched.
pub fn apply_overrides(base: &Scenario, overrides: &Overrides) -> OverrideOutcome {
    let mut scenario = base.clone();
    let mut applied = Vec::with_capacity(overrides.len());
    let mut skipped = Vec::new();

    for (parameter, raw) in overrides {
        match apply_one(&mut scenario, parameter, raw) {
            Ok((path, value)) => applied.push(AppliedOverride {
                parameter: parameter.clone(),
                path,
                value,
            }),
            Err(e) => {
                warn!(parameter = %parameter, value = %raw, error = %e, "Skipping override");
                skipped.push(SkippedOverride {
                    parameter: parameter.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    OverrideOutcome {
        scenario,
        applied,
        skipped,
    }
}

fn apply_one(
    scenario: &mut Scenario,
    parameter: &str,
    raw: &serde_json::Value,
) -> Result<(ParameterPath, ParameterValue), EngineError> {
    let path: ParameterPath = parameter.parse()?;
    let value = ParameterValue::try_from(raw).map_err(|reason| EngineError::InvalidParameterValue {
        path: path.to_string(),
        reason,
    })?;
    scenario.set(path, value)?;
    Ok((path, value))
}
