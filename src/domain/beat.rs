use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Bound, Result, SimbeatError};

use super::FrequencyValue;

pub const MIN_BEAT_FREQUENCY_HZ: f64 = 0.5;
pub const MAX_BEAT_FREQUENCY_HZ: f64 = 40.0;

/// A validated left/right carrier pair.
///
/// Ear assignment matters to the listener, so `left` and `right` are kept in
/// the order they were given. Retuning builds a new value rather than editing
/// this one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatSpec {
    left: FrequencyValue,
    right: FrequencyValue,
    created_at: DateTime<Utc>,
}

impl BeatSpec {
    pub fn create(left: FrequencyValue, right: FrequencyValue) -> Result<Self> {
        Self::with_created_at(left, right, Utc::now())
    }

    /// Validates both raw frequencies, then the pair.
    pub fn from_hz(left_hz: f64, right_hz: f64) -> Result<Self> {
        let left = FrequencyValue::from_hz(left_hz)?;
        let right = FrequencyValue::from_hz(right_hz)?;
        Self::create(left, right)
    }

    /// Same validation as [`BeatSpec::create`] with an explicit timestamp, used
    /// when rehydrating stored sessions.
    pub fn with_created_at(
        left: FrequencyValue,
        right: FrequencyValue,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let beat = (left.hz() - right.hz()).abs();
        let violated = if beat < MIN_BEAT_FREQUENCY_HZ {
            Some(Bound::Lower)
        } else if beat > MAX_BEAT_FREQUENCY_HZ {
            Some(Bound::Upper)
        } else {
            None
        };

        if let Some(violated) = violated {
            return Err(SimbeatError::BeatOutOfRange {
                beat,
                min: MIN_BEAT_FREQUENCY_HZ,
                max: MAX_BEAT_FREQUENCY_HZ,
                violated,
            });
        }

        Ok(Self {
            left,
            right,
            created_at,
        })
    }

    pub fn left(&self) -> FrequencyValue {
        self.left
    }

    pub fn right(&self) -> FrequencyValue {
        self.right
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn beat_frequency(&self) -> f64 {
        (self.left.hz() - self.right.hz()).abs()
    }
}
