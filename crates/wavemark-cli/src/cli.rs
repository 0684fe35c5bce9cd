//! Command Line Interface for the wavemark engine
//!
//! Every engine option is exposed as a flag; the short letters follow
//! the historical deployment so existing invocations keep working.
//! Flags override values from an optional `--config` YAML file, which
//! in turn overrides the built-in defaults.

use clap::Parser;
use std::path::PathBuf;

use wavemark_core::config::EngineConfig;

/// Fingerprint-based excursion alarm for timestamped measurement
/// streams. Reads `timestamp ; value` lines from standard input and
/// writes one semicolon-delimited record per processed sample to
/// standard output.
#[derive(Parser, Debug)]
#[command(name = "wavemark", version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file; explicit flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep every n-th input line (1 = no sampling)
    #[arg(short = 's', long)]
    pub sample_each: Option<u32>,

    /// Initial average absolute difference representing noise
    #[arg(short = 'i', long)]
    pub initial_avg_diff: Option<f64>,

    /// Smoothing constant for noise floor amendments (higher = slower)
    #[arg(short = 'n', long)]
    pub n_amend_avgdiff: Option<u32>,

    /// Consecutive above-threshold points needed to raise an alarm
    #[arg(short = 'a', long)]
    pub number_of_points_to_alarm: Option<u32>,

    /// Threshold factor over the noise floor
    #[arg(short = 'm', long)]
    pub multiplicator_to_detect: Option<f64>,

    /// Cool-down between alarms, in microseconds of stream time
    #[arg(short = 'u', long)]
    pub wait_state_usec: Option<i64>,

    /// Window and fingerprint length; coerced down to a power of two
    #[arg(short = 'l', long)]
    pub fingerprint_length: Option<usize>,

    /// First coefficient index compared against positive exemplars
    #[arg(short = 'e', long)]
    pub fingerprint_match_positives_from: Option<usize>,

    /// Last coefficient index compared against positive exemplars
    #[arg(short = 'f', long)]
    pub fingerprint_match_positives_to: Option<usize>,

    /// First coefficient index compared against negative exemplars
    #[arg(short = 'j', long)]
    pub fingerprint_match_negatives_from: Option<usize>,

    /// Last coefficient index compared against negative exemplars
    #[arg(short = 'k', long)]
    pub fingerprint_match_negatives_to: Option<usize>,

    /// Daubechies wavelet order: 2, 4, 6, 8, 10, 12, 14, 16, 18 or 20
    #[arg(short = 'w', long)]
    pub wavelet_function: Option<u32>,

    /// Distance mode: 1 = per index, 2 = dyadic band averages
    #[arg(short = 'c', long)]
    pub distance_calculation_type: Option<u32>,

    /// Accept threshold for positive comparisons (0..1)
    #[arg(short = 'y', long)]
    pub matching_distance_positives_max: Option<f64>,

    /// Accept threshold for negative comparisons (0..1)
    #[arg(short = 'z', long)]
    pub matching_distance_negatives_max: Option<f64>,

    /// Match policy: 0 unconditional, 1 no-negative, 2 first positive,
    /// 3 positive without negative, 4 all positives
    #[arg(short = 'r', long)]
    pub matches_evaluation_logic: Option<u32>,

    /// Capture first differences instead of raw values
    #[arg(short = 'b', long)]
    pub use_diff_value: bool,

    /// Fingerprint persistence: 0 never, 1 every window, 2 unmatched only
    #[arg(short = 'g', long)]
    pub generate_fingerprints: Option<u32>,

    /// Cap on persisted fingerprints per rolling hour (0 = unlimited)
    #[arg(short = 't', long)]
    pub genpattern_hour_limit: Option<u32>,

    /// Output the match distance instead of the continuous value
    #[arg(short = 'o', long)]
    pub matchdistance_to_output: bool,

    /// Drop lines containing this substring (header filter)
    #[arg(short = 'x', long)]
    pub skip_if_contains: Option<String>,

    /// Directory holding the fingerprint bank and generated files
    #[arg(short = 'p', long)]
    pub fingerprints_directory: Option<PathBuf>,

    /// 0 = warnings only, 1 = narrated run, 2 = per-comparison detail
    #[arg(short = 'd', long)]
    pub debug_level: Option<u32>,
}

impl Cli {
    /// Overlay every explicitly given flag onto `config`.
    pub fn apply(&self, config: &mut EngineConfig) {
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field.clone() {
                    config.$field = value;
                })*
            };
        }
        overlay!(
            sample_each,
            initial_avg_diff,
            n_amend_avgdiff,
            number_of_points_to_alarm,
            multiplicator_to_detect,
            wait_state_usec,
            fingerprint_length,
            fingerprint_match_positives_from,
            fingerprint_match_positives_to,
            fingerprint_match_negatives_from,
            fingerprint_match_negatives_to,
            wavelet_function,
            distance_calculation_type,
            matching_distance_positives_max,
            matching_distance_negatives_max,
            matches_evaluation_logic,
            generate_fingerprints,
            genpattern_hour_limit,
            skip_if_contains,
            fingerprints_directory,
            debug_level,
        );
        if self.use_diff_value {
            config.use_diff_value = true;
        }
        if self.matchdistance_to_output {
            config.matchdistance_to_output = true;
        }
    }
}
