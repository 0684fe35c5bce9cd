//! Engine Configuration
//!
//! Every tunable of the pipeline, with the same names and defaults the
//! original deployment used. A config can be built programmatically,
//! parsed from YAML (any missing key falls back to its default), or
//! assembled by the CLI front end from flags.
//!
//! Before an [`crate::engine::Engine`] accepts a config it must be
//! [`normalize`](EngineConfig::normalize)d — the fingerprint length is
//! coerced to the largest power of two below it and the match index
//! ends are clamped to the window, both logged as warnings — and then
//! [`validate`](EngineConfig::validate)d against the option domains.
//!
//! ## Example
//!
//! ```rust
//! use wavemark_core::config::EngineConfig;
//!
//! let mut config = EngineConfig::parse_yaml("
//! fingerprint_length: 1000
//! matches_evaluation_logic: 2
//! ").unwrap();
//! config.normalize();
//! assert_eq!(config.fingerprint_length, 512);
//! config.validate().unwrap();
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::distance::DistanceMode;
use crate::matcher::MatchPolicy;
use crate::wavelet::DaubechiesOrder;

/// Configuration failures; all fatal before processing starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{option} {message}")]
    Invalid {
        option: &'static str,
        message: String,
    },
}

fn invalid(option: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        option,
        message: message.into(),
    }
}

/// The full engine parameterization. Immutable once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Keep every n-th input line (1 = no decimation).
    pub sample_each: u32,
    /// Seed of the adaptive noise floor; must match the quiescent
    /// signal's typical absolute difference.
    pub initial_avg_diff: f64,
    /// Smoothing constant of the noise-floor EMA; higher is slower.
    pub n_amend_avgdiff: u32,
    /// Consecutive above-threshold points needed to raise an alarm.
    pub number_of_points_to_alarm: u32,
    /// Threshold factor over the noise floor.
    pub multiplicator_to_detect: f64,
    /// Post-alarm cool-down, in microseconds of stream time.
    pub wait_state_usec: i64,
    /// Window / fingerprint length; coerced down to a power of two.
    pub fingerprint_length: usize,
    /// Inclusive coefficient window for positive comparisons.
    pub fingerprint_match_positives_from: usize,
    pub fingerprint_match_positives_to: usize,
    /// Inclusive coefficient window for negative comparisons.
    pub fingerprint_match_negatives_from: usize,
    pub fingerprint_match_negatives_to: usize,
    /// Daubechies order: 2, 4, ..., 20.
    pub wavelet_function: u32,
    /// Distance mode selector: 1 per-index, 2 band-averaged.
    pub distance_calculation_type: u32,
    /// Accept threshold for positive comparisons, in `[0, 1]`.
    pub matching_distance_positives_max: f64,
    /// Accept threshold for negative comparisons, in `[0, 1]`.
    pub matching_distance_negatives_max: f64,
    /// Match evaluation policy selector, 0..=4.
    pub matches_evaluation_logic: u32,
    /// Capture first differences instead of raw values.
    pub use_diff_value: bool,
    /// 0 = never persist fingerprints, 1 = persist every window,
    /// 2 = persist only unmatched windows.
    pub generate_fingerprints: u32,
    /// Cap on persisted fingerprints per rolling hour (0 = unlimited).
    pub genpattern_hour_limit: u32,
    /// Output the match distance instead of the continuous value.
    pub matchdistance_to_output: bool,
    /// Lines containing this substring are dropped (header filter);
    /// empty disables the filter.
    pub skip_if_contains: String,
    /// Directory holding the fingerprint bank and receiving generated
    /// fingerprints.
    pub fingerprints_directory: PathBuf,
    /// 0 = warnings only, 1 = narrated run, 2 = per-comparison detail.
    pub debug_level: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_each: 1,
            initial_avg_diff: 10_000.0,
            n_amend_avgdiff: 500,
            number_of_points_to_alarm: 5,
            multiplicator_to_detect: 10.0,
            wait_state_usec: 1_000_000,
            fingerprint_length: 1024,
            fingerprint_match_positives_from: 0,
            fingerprint_match_positives_to: 511,
            fingerprint_match_negatives_from: 0,
            fingerprint_match_negatives_to: 511,
            wavelet_function: 2,
            distance_calculation_type: 1,
            matching_distance_positives_max: 0.5,
            matching_distance_negatives_max: 0.5,
            matches_evaluation_logic: 1,
            use_diff_value: false,
            generate_fingerprints: 0,
            genpattern_hour_limit: 0,
            matchdistance_to_output: false,
            skip_if_contains: "m".to_string(),
            fingerprints_directory: PathBuf::from("./"),
            debug_level: 0,
        }
    }
}

/// Largest power of two less than or equal to `n` (`n >= 1`).
fn floor_power_of_two(n: usize) -> usize {
    1 << (usize::BITS - 1 - n.leading_zeros())
}

impl EngineConfig {
    /// Load from a YAML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_yaml(&content)
    }

    /// Parse from a YAML string; missing keys take their defaults.
    pub fn parse_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Coerce dependent options into range, warning about each change:
    /// the fingerprint length drops to the nearest power of two and the
    /// match window ends are clamped to the last coefficient index.
    pub fn normalize(&mut self) {
        if self.fingerprint_length >= 1 && !self.fingerprint_length.is_power_of_two() {
            let coerced = floor_power_of_two(self.fingerprint_length);
            warn!(
                requested = self.fingerprint_length,
                coerced, "fingerprint_length amended to a power of two"
            );
            self.fingerprint_length = coerced;
        }
        let last = self.fingerprint_length.saturating_sub(1);
        if self.fingerprint_match_positives_to > last {
            warn!(
                requested = self.fingerprint_match_positives_to,
                coerced = last,
                "fingerprint_match_positives_to clamped to the window"
            );
            self.fingerprint_match_positives_to = last;
        }
        if self.fingerprint_match_negatives_to > last {
            warn!(
                requested = self.fingerprint_match_negatives_to,
                coerced = last,
                "fingerprint_match_negatives_to clamped to the window"
            );
            self.fingerprint_match_negatives_to = last;
        }
    }

    /// Check every option against its domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_each < 1 {
            return Err(invalid("sample_each", "must be >= 1"));
        }
        if !(self.initial_avg_diff > 0.0) {
            return Err(invalid("initial_avg_diff", "must be > 0"));
        }
        if self.n_amend_avgdiff < 1 {
            return Err(invalid("n_amend_avgdiff", "must be >= 1"));
        }
        if self.number_of_points_to_alarm < 1 {
            return Err(invalid("number_of_points_to_alarm", "must be >= 1"));
        }
        if !(self.multiplicator_to_detect > 0.0) {
            return Err(invalid("multiplicator_to_detect", "must be > 0"));
        }
        if self.wait_state_usec < 0 {
            return Err(invalid("wait_state_usec", "must be >= 0"));
        }
        if self.fingerprint_length < 8 {
            return Err(invalid("fingerprint_length", "must be >= 8"));
        }
        if self.wavelet_order().is_none() {
            return Err(invalid(
                "wavelet_function",
                "must be one of 2, 4, 6, 8, 10, 12, 14, 16, 18, 20",
            ));
        }
        if self.distance_mode().is_none() {
            return Err(invalid("distance_calculation_type", "must be 1 or 2"));
        }
        if self.match_policy().is_none() {
            return Err(invalid("matches_evaluation_logic", "must be within 0..4"));
        }
        let last = self.fingerprint_length - 1;
        if self.fingerprint_match_positives_from > self.fingerprint_match_positives_to
            || self.fingerprint_match_positives_to > last
        {
            return Err(invalid(
                "fingerprint_match_positives_from/to",
                format!("must satisfy 0 <= from <= to <= {last}"),
            ));
        }
        if self.fingerprint_match_negatives_from > self.fingerprint_match_negatives_to
            || self.fingerprint_match_negatives_to > last
        {
            return Err(invalid(
                "fingerprint_match_negatives_from/to",
                format!("must satisfy 0 <= from <= to <= {last}"),
            ));
        }
        if !(0.0..=1.0).contains(&self.matching_distance_positives_max) {
            return Err(invalid(
                "matching_distance_positives_max",
                "must be within 0..1",
            ));
        }
        if !(0.0..=1.0).contains(&self.matching_distance_negatives_max) {
            return Err(invalid(
                "matching_distance_negatives_max",
                "must be within 0..1",
            ));
        }
        if self.generate_fingerprints > 2 {
            return Err(invalid("generate_fingerprints", "must be 0, 1 or 2"));
        }
        if self.debug_level > 2 {
            return Err(invalid("debug_level", "must be 0, 1 or 2"));
        }
        Ok(())
    }

    /// The configured wavelet order, if valid.
    pub fn wavelet_order(&self) -> Option<DaubechiesOrder> {
        DaubechiesOrder::from_order(self.wavelet_function)
    }

    /// The configured distance mode, if valid.
    pub fn distance_mode(&self) -> Option<DistanceMode> {
        DistanceMode::from_selector(self.distance_calculation_type)
    }

    /// The configured match policy, if valid.
    pub fn match_policy(&self) -> Option<MatchPolicy> {
        MatchPolicy::from_selector(self.matches_evaluation_logic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let mut config = EngineConfig::default();
        config.normalize();
        config.validate().unwrap();
    }

    #[test]
    fn test_floor_power_of_two() {
        assert_eq!(floor_power_of_two(8), 8);
        assert_eq!(floor_power_of_two(1000), 512);
        assert_eq!(floor_power_of_two(1024), 1024);
        assert_eq!(floor_power_of_two(9), 8);
        assert_eq!(floor_power_of_two(1), 1);
    }

    #[test]
    fn test_length_coercion() {
        let mut config = EngineConfig {
            fingerprint_length: 1000,
            ..Default::default()
        };
        config.normalize();
        assert_eq!(config.fingerprint_length, 512);
        // The default match ends (511) still fit the coerced window
        config.validate().unwrap();
    }

    #[test]
    fn test_match_end_clamped() {
        let mut config = EngineConfig {
            fingerprint_length: 16,
            ..Default::default()
        };
        config.normalize();
        assert_eq!(config.fingerprint_match_positives_to, 15);
        assert_eq!(config.fingerprint_match_negatives_to, 15);
        config.validate().unwrap();
    }

    #[test]
    fn test_domain_rejections() {
        let cases: Vec<(&str, Box<dyn Fn(&mut EngineConfig)>)> = vec![
            ("sample_each", Box::new(|c| c.sample_each = 0)),
            ("initial_avg_diff", Box::new(|c| c.initial_avg_diff = 0.0)),
            ("n_amend_avgdiff", Box::new(|c| c.n_amend_avgdiff = 0)),
            (
                "number_of_points_to_alarm",
                Box::new(|c| c.number_of_points_to_alarm = 0),
            ),
            (
                "multiplicator_to_detect",
                Box::new(|c| c.multiplicator_to_detect = -1.0),
            ),
            ("wait_state_usec", Box::new(|c| c.wait_state_usec = -1)),
            ("fingerprint_length", Box::new(|c| c.fingerprint_length = 4)),
            ("wavelet_function", Box::new(|c| c.wavelet_function = 3)),
            (
                "distance_calculation_type",
                Box::new(|c| c.distance_calculation_type = 0),
            ),
            (
                "matches_evaluation_logic",
                Box::new(|c| c.matches_evaluation_logic = 5),
            ),
            (
                "matching_distance_positives_max",
                Box::new(|c| c.matching_distance_positives_max = 1.5),
            ),
            (
                "matching_distance_negatives_max",
                Box::new(|c| c.matching_distance_negatives_max = -0.1),
            ),
            (
                "generate_fingerprints",
                Box::new(|c| c.generate_fingerprints = 3),
            ),
            ("debug_level", Box::new(|c| c.debug_level = 3)),
        ];
        for (option, break_it) in cases {
            let mut config = EngineConfig::default();
            config.normalize();
            break_it(&mut config);
            assert!(config.validate().is_err(), "{option} should be rejected");
        }
    }

    #[test]
    fn test_from_must_not_exceed_to() {
        let mut config = EngineConfig {
            fingerprint_length: 64,
            fingerprint_match_positives_from: 40,
            fingerprint_match_positives_to: 10,
            ..Default::default()
        };
        config.normalize();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_partial_parse() {
        let config = EngineConfig::parse_yaml(
            "
sample_each: 3
matches_evaluation_logic: 2
skip_if_contains: '#'
",
        )
        .unwrap();
        assert_eq!(config.sample_each, 3);
        assert_eq!(config.matches_evaluation_logic, 2);
        assert_eq!(config.skip_if_contains, "#");
        // Untouched keys keep their defaults
        assert_eq!(config.fingerprint_length, 1024);
        assert_eq!(config.initial_avg_diff, 10_000.0);
    }

    #[test]
    fn test_yaml_bad_key_type() {
        assert!(EngineConfig::parse_yaml("sample_each: lots").is_err());
    }

    #[test]
    fn test_enum_accessors() {
        let config = EngineConfig {
            wavelet_function: 12,
            distance_calculation_type: 2,
            matches_evaluation_logic: 3,
            ..Default::default()
        };
        assert_eq!(config.wavelet_order(), Some(DaubechiesOrder::D12));
        assert_eq!(config.distance_mode(), Some(DistanceMode::BandAveraged));
        assert_eq!(config.match_policy(), Some(MatchPolicy::PositiveNoNegative));
    }

    #[test]
    fn test_roundtrip_serialization() {
        let config = EngineConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = EngineConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(parsed.fingerprint_length, config.fingerprint_length);
        assert_eq!(parsed.skip_if_contains, config.skip_if_contains);
    }
}
