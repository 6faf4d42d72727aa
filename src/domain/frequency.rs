use serde::{Serialize, Serializer};

use crate::error::{Result, SimbeatError};

pub const MIN_FREQUENCY_HZ: f64 = 20.0;
pub const MAX_FREQUENCY_HZ: f64 = 20_000.0;

/// One audible carrier frequency.
///
/// The only way to obtain a value is [`FrequencyValue::from_hz`], so holding
/// one proves the frequency is finite and within
/// [`MIN_FREQUENCY_HZ`]..=[`MAX_FREQUENCY_HZ`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FrequencyValue {
    hz: f64,
}

impl FrequencyValue {
    pub fn from_hz(hz: f64) -> Result<Self> {
        if !hz.is_finite() || !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&hz) {
            return Err(SimbeatError::OutOfRange {
                hz,
                min: MIN_FREQUENCY_HZ,
                max: MAX_FREQUENCY_HZ,
            });
        }
        Ok(Self { hz })
    }

    pub fn hz(&self) -> f64 {
        self.hz
    }
}

impl Serialize for FrequencyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_inside_the_audible_range() {
        for hz in [20.0, 20.000_1, 440.0, 1_000.5, 19_999.99, 20_000.0] {
            let value = FrequencyValue::from_hz(hz).expect("frequency should be valid");
            assert_eq!(value.hz(), hz);
        }
    }

    #[test]
    fn rejects_values_outside_the_audible_range() {
        for hz in [
            0.0,
            -440.0,
            19.999,
            20_000.01,
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ] {
            let err = FrequencyValue::from_hz(hz).unwrap_err();
            assert!(matches!(err, SimbeatError::OutOfRange { min, max, .. }
                if min == MIN_FREQUENCY_HZ && max == MAX_FREQUENCY_HZ));
        }
    }

    #[test]
    fn error_carries_offending_value() {
        match FrequencyValue::from_hz(12.5) {
            Err(SimbeatError::OutOfRange { hz, .. }) => assert_eq!(hz, 12.5),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
