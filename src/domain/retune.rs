use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{BeatSpec, FrequencyValue};

/// A carrier pair described by its midpoint and spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterBeat {
    pub center_hz: f64,
    pub beat_hz: f64,
}

/// Raw left/right carriers that already passed domain validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeftRight {
    pub left_hz: f64,
    pub right_hz: f64,
}

/// Splits `center ± beat/2` into left/right carriers.
///
/// The result goes through the same [`FrequencyValue`] and [`BeatSpec`]
/// checks as direct construction, so an unreachable pair fails with the same
/// errors.
pub fn compute_left_right(req: CenterBeat) -> Result<LeftRight> {
    let half = req.beat_hz / 2.0;
    let left = FrequencyValue::from_hz(req.center_hz - half)?;
    let right = FrequencyValue::from_hz(req.center_hz + half)?;
    BeatSpec::create(left, right)?;

    Ok(LeftRight {
        left_hz: left.hz(),
        right_hz: right.hz(),
    })
}
