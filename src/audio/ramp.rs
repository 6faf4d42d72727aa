//! Linear parameter automation against the graph's sample clock.
//!
//! A [`RampedParam`] is the only way a live value in the signal graph ever
//! changes. Scheduling a new ramp drops whatever was in flight and starts from
//! the value the parameter has *now*, never from the old target.

/// One linear segment: `from` at `start`, `to` at `start + duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledRamp {
    pub from: f64,
    pub to: f64,
    pub start: f64,
    pub duration: f64,
}

impl ScheduledRamp {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Interpolated value at `time` seconds, held flat outside the segment.
    pub fn value_at(&self, time: f64) -> f64 {
        if time <= self.start {
            return self.from;
        }
        if self.duration <= 0.0 || time >= self.end() {
            return self.to;
        }
        let progress = (time - self.start) / self.duration;
        self.from + (self.to - self.from) * progress
    }
}

/// A parameter that follows at most one [`ScheduledRamp`].
#[derive(Debug, Clone, PartialEq)]
pub struct RampedParam {
    value: f64,
    ramp: Option<ScheduledRamp>,
}

impl RampedParam {
    pub fn new(value: f64) -> Self {
        Self { value, ramp: None }
    }

    pub fn value_at(&self, time: f64) -> f64 {
        match self.ramp {
            Some(ramp) => ramp.value_at(time),
            None => self.value,
        }
    }

    pub fn is_ramping(&self, time: f64) -> bool {
        matches!(self.ramp, Some(ramp) if time < ramp.end())
    }

    /// Cancels any in-flight ramp and glides from the live value at `now` to
    /// `target` over `duration` seconds.
    pub fn ramp_to(&mut self, target: f64, now: f64, duration: f64) {
        let from = self.value_at(now);
        self.value = from;
        self.ramp = Some(ScheduledRamp {
            from,
            to: target,
            start: now,
            duration: duration.max(0.0),
        });
    }

    /// Collapses a finished ramp into a plain value.
    pub fn settle(&mut self, now: f64) {
        if let Some(ramp) = self.ramp {
            if now >= ramp.end() {
                self.value = ramp.to;
                self.ramp = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn interpolates_linearly_inside_the_window() {
        let ramp = ScheduledRamp {
            from: 0.0,
            to: 1.0,
            start: 2.0,
            duration: 0.05,
        };
        assert_eq!(ramp.value_at(1.0), 0.0);
        assert_eq!(ramp.value_at(2.0), 0.0);
        assert!((ramp.value_at(2.025) - 0.5).abs() < EPS);
        assert_eq!(ramp.value_at(2.06), 1.0);
        assert_eq!(ramp.value_at(10.0), 1.0);
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let ramp = ScheduledRamp {
            from: 3.0,
            to: 7.0,
            start: 1.0,
            duration: 0.0,
        };
        assert_eq!(ramp.value_at(1.0), 3.0);
        assert_eq!(ramp.value_at(1.000_001), 7.0);
    }

    #[test]
    fn new_ramp_restarts_from_live_value() {
        let mut param = RampedParam::new(0.0);
        param.ramp_to(1.0, 0.0, 0.1);

        // Halfway through, retarget down to zero.
        param.ramp_to(0.0, 0.05, 0.1);
        assert!((param.value_at(0.05) - 0.5).abs() < EPS);
        assert!((param.value_at(0.10) - 0.25).abs() < EPS);
        assert!(param.value_at(0.15).abs() < EPS);
        assert_eq!(param.value_at(0.2), 0.0);
    }

    #[test]
    fn settle_collapses_finished_ramp() {
        let mut param = RampedParam::new(0.5);
        param.ramp_to(0.0, 1.0, 0.05);
        assert!(param.is_ramping(1.01));

        param.settle(1.01);
        assert!(param.is_ramping(1.01));

        param.settle(1.06);
        assert!(!param.is_ramping(1.06));
        assert_eq!(param.value_at(0.0), 0.0);
    }
}
