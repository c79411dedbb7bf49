//! Equidistant time axis for the optimization horizon.
//!
//! The model only ever sees 0-based timestep indices; the time index maps
//! those to timestamps and, more importantly, supplies the per-step duration
//! in hours (the `timeincrement`). That duration weights time-integral
//! constraints (`summed_max`/`summed_min`) and is the default objective
//! weighting, so a 12-hour step prices a unit of flow twelve times as high
//! as an hourly one.

use chrono::{Duration, NaiveDateTime};

use crate::error::{EmsolError, EmsolResult};

const NANOS_PER_HOUR: f64 = 3.6e12;

/// Equidistant timestamp axis: `periods` steps of width `step` from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIndex {
    start: NaiveDateTime,
    step: Duration,
    periods: usize,
}

impl TimeIndex {
    /// New index with an explicit step width.
    ///
    /// Fails for a non-positive step or an empty horizon; both would make
    /// the derived timeincrement meaningless.
    pub fn new(start: NaiveDateTime, step: Duration, periods: usize) -> EmsolResult<Self> {
        if step <= Duration::zero() {
            return Err(EmsolError::TimeIndex(format!(
                "time step must be positive, got {step}"
            )));
        }
        if periods == 0 {
            return Err(EmsolError::TimeIndex(
                "time index needs at least one period".into(),
            ));
        }
        Ok(Self {
            start,
            step,
            periods,
        })
    }

    /// Hourly index, the most common case.
    pub fn hourly(start: NaiveDateTime, periods: usize) -> EmsolResult<Self> {
        Self::new(start, Duration::hours(1), periods)
    }

    /// Number of timesteps in the horizon.
    #[inline]
    pub fn len(&self) -> usize {
        self.periods
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.periods == 0
    }

    /// First timestamp of the axis.
    #[inline]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Step width.
    #[inline]
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Timestamp of timestep `t` (not range-checked against the horizon).
    pub fn timestamp(&self, t: usize) -> NaiveDateTime {
        self.start + self.step * t as i32
    }

    /// All timestamps of the horizon in order.
    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.periods).map(|t| self.timestamp(t))
    }

    /// Step width in hours, derived from the step's nanosecond count.
    ///
    /// This is the `timeincrement`: the weight of one timestep in every
    /// time-integral expression.
    pub fn increment_hours(&self) -> EmsolResult<f64> {
        let nanos = self.step.num_nanoseconds().ok_or_else(|| {
            EmsolError::TimeIndex(format!(
                "no valid time increment: step {} overflows the nanosecond range",
                self.step
            ))
        })?;
        Ok(nanos as f64 / NANOS_PER_HOUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn jan1() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_hourly_increment() {
        let idx = TimeIndex::hourly(jan1(), 24).unwrap();
        assert_eq!(idx.len(), 24);
        assert_eq!(idx.increment_hours().unwrap(), 1.0);
    }

    #[test]
    fn test_coarse_and_fine_steps() {
        let three_h = TimeIndex::new(jan1(), Duration::hours(3), 8).unwrap();
        assert_eq!(three_h.increment_hours().unwrap(), 3.0);

        let twelve_h = TimeIndex::new(jan1(), Duration::hours(12), 4).unwrap();
        assert_eq!(twelve_h.increment_hours().unwrap(), 12.0);

        let quarter = TimeIndex::new(jan1(), Duration::minutes(15), 96).unwrap();
        assert_eq!(quarter.increment_hours().unwrap(), 0.25);
    }

    #[test]
    fn test_invalid_steps_rejected() {
        assert!(TimeIndex::new(jan1(), Duration::zero(), 4).is_err());
        assert!(TimeIndex::new(jan1(), Duration::hours(-1), 4).is_err());
        assert!(TimeIndex::new(jan1(), Duration::hours(1), 0).is_err());
    }

    #[test]
    fn test_timestamps_are_equidistant() {
        let idx = TimeIndex::new(jan1(), Duration::hours(6), 4).unwrap();
        let stamps: Vec<_> = idx.timestamps().collect();
        assert_eq!(stamps.len(), 4);
        assert_eq!(stamps[0], jan1());
        for pair in stamps.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(6));
        }
    }
}
