//! Excursion Detector
//!
//! Adaptive noise-floor tracker with an N-point trigger and a post-alarm
//! cool-down. The noise floor `diff_avg` estimates the typical absolute
//! sample-to-sample change via an EMA-like smoother; a sample counts
//! toward an alarm when its absolute difference exceeds
//! `threshold_factor * diff_avg`. Once `points_to_alarm` consecutive
//! samples count, the alarm raises and the detector enters a wait state
//! for `wait_usec` microseconds of stream time (extended for as long as
//! a window capture is in progress).
//!
//! The noise floor is only amended while the detector is neither
//! waiting nor counting toward an alarm, so excursions do not inflate
//! their own threshold.
//!
//! ## Example
//!
//! ```rust
//! use wavemark_core::detector::{DetectorConfig, ExcursionDetector};
//! use wavemark_core::types::MicroTime;
//!
//! let mut det = ExcursionDetector::new(DetectorConfig {
//!     initial_avg_diff: 10.0,
//!     smoothing_points: 500,
//!     points_to_alarm: 2,
//!     threshold_factor: 2.0,
//!     wait_usec: 1_000_000,
//! });
//!
//! let t = |s| MicroTime::from_parts(s, 0);
//! assert!(!det.step(t(0), 900.0, false)); // first excursion: counting
//! assert!(det.step(t(1), 900.0, false));  // second: alarm raised
//! assert!(det.is_alarm() && det.is_wait());
//! ```

use crate::types::MicroTime;

/// Detector tuning, immutable after construction.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Seed for the noise floor; should match the real average absolute
    /// difference of the quiescent signal.
    pub initial_avg_diff: f64,
    /// EMA-like smoothing constant `N`: each amendment is
    /// `(avg * (N - 1) + diff) / N`.
    pub smoothing_points: u32,
    /// Consecutive above-threshold samples required to raise an alarm.
    pub points_to_alarm: u32,
    /// Threshold factor applied to the noise floor.
    pub threshold_factor: f64,
    /// Cool-down after an alarm, in microseconds of stream time.
    pub wait_usec: i64,
}

/// The streaming detector state machine.
#[derive(Debug, Clone)]
pub struct ExcursionDetector {
    config: DetectorConfig,
    diff_avg: f64,
    /// Counts down from `points_to_alarm`; hitting zero raises the alarm.
    countdown: u32,
    is_alarm: bool,
    is_wait: bool,
    alarm_raised_at: MicroTime,
}

impl ExcursionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let countdown = config.points_to_alarm;
        let diff_avg = config.initial_avg_diff;
        Self {
            config,
            diff_avg,
            countdown,
            is_alarm: false,
            is_wait: false,
            alarm_raised_at: MicroTime::EPOCH,
        }
    }

    /// Advance the state machine by one sample.
    ///
    /// `abs_diff` is the absolute difference to the previous sample;
    /// `collecting` reports whether a window capture is currently in
    /// progress (it pins the wait flag). Returns `true` exactly when
    /// this sample raises a new alarm.
    pub fn step(&mut self, now: MicroTime, abs_diff: f64, collecting: bool) -> bool {
        let mut raised = false;

        if self.is_wait {
            // The alarm flag is only ever observable on its raising sample.
            self.is_alarm = false;
            if now.micros_since(self.alarm_raised_at) > self.config.wait_usec {
                self.is_wait = false;
            }
            if collecting {
                self.is_wait = true;
            }
        } else {
            // A collapsed noise floor would turn every sample into an
            // excursion; treat it as "not above threshold" instead.
            let above =
                self.diff_avg > 0.0 && abs_diff >= self.config.threshold_factor * self.diff_avg;
            if !above {
                self.countdown = self.config.points_to_alarm;
            } else {
                self.countdown -= 1;
                if self.countdown == 0 {
                    self.is_alarm = true;
                    self.is_wait = true;
                    self.alarm_raised_at = now;
                    self.countdown = self.config.points_to_alarm;
                    raised = true;
                }
            }
        }

        // Amend the noise floor only in the quiescent state.
        if !self.is_wait && self.countdown == self.config.points_to_alarm {
            let n = f64::from(self.config.smoothing_points);
            self.diff_avg = (self.diff_avg * (n - 1.0) + abs_diff) / n;
        }

        raised
    }

    /// Current noise floor estimate.
    pub fn diff_avg(&self) -> f64 {
        self.diff_avg
    }

    /// True on the sample that raised an alarm.
    pub fn is_alarm(&self) -> bool {
        self.is_alarm
    }

    /// True while in the post-alarm cool-down (or a capture pins it).
    pub fn is_wait(&self) -> bool {
        self.is_wait
    }

    /// True while consecutive excursions are being counted.
    pub fn is_detecting(&self) -> bool {
        self.countdown != self.config.points_to_alarm
    }

    /// Remaining above-threshold samples before an alarm raises.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Restore the initial state.
    pub fn reset(&mut self) {
        self.diff_avg = self.config.initial_avg_diff;
        self.countdown = self.config.points_to_alarm;
        self.is_alarm = false;
        self.is_wait = false;
        self.alarm_raised_at = MicroTime::EPOCH;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(points_to_alarm: u32, wait_usec: i64) -> DetectorConfig {
        DetectorConfig {
            initial_avg_diff: 10.0,
            smoothing_points: 500,
            points_to_alarm,
            threshold_factor: 2.0,
            wait_usec,
        }
    }

    fn t(s: i64) -> MicroTime {
        MicroTime::from_parts(s, 0)
    }

    #[test]
    fn test_quiet_stream_never_alarms() {
        let mut det = ExcursionDetector::new(config(3, 1_000_000));
        for i in 0..100 {
            assert!(!det.step(t(i), 0.0, false));
            assert!(!det.is_alarm());
            assert!(!det.is_wait());
            assert!(!det.is_detecting());
        }
        // EMA decays the seed toward the observed zero diffs
        assert!(det.diff_avg() < 10.0);
        assert!(det.diff_avg() > 0.0);
    }

    #[test]
    fn test_alarm_after_n_points() {
        let mut det = ExcursionDetector::new(config(3, 1_000_000));
        assert!(!det.step(t(0), 500.0, false));
        assert_eq!(det.countdown(), 2);
        assert!(det.is_detecting());
        assert!(!det.step(t(1), 500.0, false));
        assert_eq!(det.countdown(), 1);
        assert!(det.step(t(2), 500.0, false));
        assert!(det.is_alarm());
        assert!(det.is_wait());
        // Countdown rearms immediately
        assert_eq!(det.countdown(), 3);
    }

    #[test]
    fn test_countdown_resets_on_quiet_sample() {
        let mut det = ExcursionDetector::new(config(3, 0));
        det.step(t(0), 500.0, false);
        det.step(t(1), 500.0, false);
        assert_eq!(det.countdown(), 1);
        det.step(t(2), 0.0, false);
        assert_eq!(det.countdown(), 3);
        assert!(!det.is_detecting());
    }

    #[test]
    fn test_countdown_stays_in_range() {
        let mut det = ExcursionDetector::new(config(4, 0));
        for i in 0..50 {
            let diff = if i % 3 == 0 { 500.0 } else { 0.0 };
            det.step(t(i), diff, false);
            let c = det.countdown();
            assert!((1..=4).contains(&c), "countdown {c} escaped [1, 4]");
        }
    }

    #[test]
    fn test_alarm_clears_next_sample_but_wait_holds() {
        let mut det = ExcursionDetector::new(config(1, 10_000_000));
        assert!(det.step(t(0), 500.0, false));
        assert!(det.is_alarm());
        det.step(t(1), 500.0, false);
        assert!(!det.is_alarm());
        assert!(det.is_wait());
    }

    #[test]
    fn test_cooldown_expires() {
        let mut det = ExcursionDetector::new(config(1, 2_000_000));
        det.step(t(0), 500.0, false);
        assert!(det.is_wait());
        // Within the cool-down: excursions are ignored
        assert!(!det.step(t(1), 500.0, false));
        assert!(det.is_wait());
        // Past the cool-down the wait clears and detection resumes
        assert!(!det.step(t(3), 0.0, false));
        assert!(!det.is_wait());
        assert!(det.step(t(4), 500.0, false));
    }

    #[test]
    fn test_collection_pins_wait() {
        let mut det = ExcursionDetector::new(config(1, 1_000_000));
        det.step(t(0), 500.0, false);
        // Cool-down has long expired, but a capture is in progress
        det.step(t(100), 0.0, true);
        assert!(det.is_wait());
        det.step(t(101), 0.0, false);
        assert!(!det.is_wait());
    }

    #[test]
    fn test_noise_floor_frozen_while_counting_and_waiting() {
        let mut det = ExcursionDetector::new(config(3, 10_000_000));
        let initial = det.diff_avg();
        // Counting toward an alarm: floor untouched
        det.step(t(0), 500.0, false);
        assert_eq!(det.diff_avg(), initial);
        det.step(t(1), 500.0, false);
        det.step(t(2), 500.0, false); // alarm, wait begins
        assert_eq!(det.diff_avg(), initial);
        // Waiting: still untouched
        det.step(t(3), 700.0, false);
        assert_eq!(det.diff_avg(), initial);
    }

    #[test]
    fn test_noise_floor_ema() {
        let mut det = ExcursionDetector::new(DetectorConfig {
            initial_avg_diff: 10.0,
            smoothing_points: 2,
            points_to_alarm: 5,
            threshold_factor: 100.0,
            wait_usec: 0,
        });
        det.step(t(0), 4.0, false);
        assert!((det.diff_avg() - 7.0).abs() < 1e-12); // (10*1 + 4)/2
        det.step(t(1), 1.0, false);
        assert!((det.diff_avg() - 4.0).abs() < 1e-12); // (7*1 + 1)/2
    }

    #[test]
    fn test_zero_floor_guard() {
        let mut det = ExcursionDetector::new(DetectorConfig {
            initial_avg_diff: 1.0,
            smoothing_points: 1, // floor follows the last diff exactly
            points_to_alarm: 1,
            threshold_factor: 2.0,
            wait_usec: 0,
        });
        det.step(t(0), 0.0, false);
        assert_eq!(det.diff_avg(), 0.0);
        // With a zero floor every diff would be "above"; the guard
        // keeps the detector quiet instead.
        assert!(!det.step(t(1), 0.0, false));
        assert!(!det.is_detecting());
    }

    #[test]
    fn test_reset() {
        let mut det = ExcursionDetector::new(config(2, 1_000_000));
        det.step(t(0), 500.0, false);
        det.step(t(1), 500.0, false);
        assert!(det.is_wait());
        det.reset();
        assert!(!det.is_wait());
        assert!(!det.is_alarm());
        assert_eq!(det.countdown(), 2);
        assert_eq!(det.diff_avg(), 10.0);
    }
}
