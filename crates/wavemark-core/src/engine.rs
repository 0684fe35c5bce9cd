//! Pipeline Engine
//!
//! The top-level per-sample loop tying the blocks together. For every
//! input line the engine sequences:
//!
//! ```text
//! decimation -> header skip -> parse -> collector step -> matcher
//!     -> detector step -> noise floor -> record out -> persistence
//! ```
//!
//! Data flows strictly forward; the engine owns all mutable state
//! (detector, collector, matcher buffers, generation quota) so a single
//! instance drives the whole process. Output ordering equals input
//! ordering.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wavemark_core::bank::Bank;
//! use wavemark_core::config::EngineConfig;
//! use wavemark_core::engine::Engine;
//!
//! let mut config = EngineConfig::default();
//! config.normalize();
//! let bank = Bank::load(&config.fingerprints_directory, config.fingerprint_length).unwrap();
//! let mut engine = Engine::new(config, bank).unwrap();
//!
//! let stdin = std::io::stdin();
//! let stdout = std::io::stdout();
//! engine.run(stdin.lock(), stdout.lock()).unwrap();
//! ```

use std::fmt;
use std::io::{self, BufRead, Write};

use tracing::{error, info};

use crate::bank::Bank;
use crate::collector::{CollectorStep, WindowCollector};
use crate::config::{ConfigError, EngineConfig};
use crate::detector::{DetectorConfig, ExcursionDetector};
use crate::fingerprint::write_generated;
use crate::matcher::{MatchOutcome, MatchWindows, Matcher, NO_MATCH_DISTANCE};
use crate::parse::parse_line;
use crate::types::{MicroTime, RawSample};
use crate::wavelet::WaveletTransform;

/// One output record per processed sample, semicolon-delimited:
///
/// `lineid;timestamp;meas;diff;diffavg;isdetect;isalarm;iswait;patternid;isfinalmatch;matchdistance;contivalue;outputvalue`
#[derive(Debug, Clone)]
pub struct Record {
    /// 1-based index of the processed sample.
    pub line_id: u64,
    /// Timestamp field exactly as read.
    pub timestamp: String,
    /// Measured value.
    pub meas: f64,
    /// Signed difference to the previous sample (0 on the first).
    pub diff: f64,
    /// Noise floor after this sample.
    pub diff_avg: f64,
    /// True while consecutive excursions are being counted.
    pub is_detect: bool,
    /// True only on the sample that raised an alarm.
    pub is_alarm: bool,
    /// True during cool-down and window capture.
    pub is_wait: bool,
    /// Id of the window in progress, 0 otherwise.
    pub pattern_id: u64,
    /// Final match decision of a window completed on this sample.
    pub is_final_match: bool,
    /// Match distance, -1 when no final match.
    pub match_distance: f64,
    /// Continuous suspicion score.
    pub conti_value: f64,
    /// `match_distance` or `conti_value` per configuration.
    pub output_value: f64,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |b: bool| u8::from(b);
        write!(
            f,
            "{};{};{:.6};{:.6};{:.6};{};{};{};{};{};{:.6};{:.6};{:.6}",
            self.line_id,
            self.timestamp,
            self.meas,
            self.diff,
            self.diff_avg,
            flag(self.is_detect),
            flag(self.is_alarm),
            flag(self.is_wait),
            self.pattern_id,
            flag(self.is_final_match),
            self.match_distance,
            self.conti_value,
            self.output_value,
        )
    }
}

/// Rolling-hour cap on generated fingerprint files.
#[derive(Debug, Clone)]
struct HourlyQuota {
    /// 0 means unlimited.
    limit: u32,
    window_start: MicroTime,
    count: u32,
}

impl HourlyQuota {
    fn new(limit: u32) -> Self {
        Self {
            limit,
            window_start: MicroTime::EPOCH,
            count: 0,
        }
    }

    /// Consume one write slot at stream time `now`.
    fn try_acquire(&mut self, now: MicroTime) -> bool {
        if now.micros_since(self.window_start) > 3_600_000_000 {
            self.window_start = now;
            self.count = 0;
        }
        if self.limit == 0 || self.count < self.limit {
            self.count += 1;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.window_start = MicroTime::EPOCH;
        self.count = 0;
    }
}

/// The assembled pipeline. See the module docs for the per-sample
/// sequencing.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    bank: Bank,
    detector: ExcursionDetector,
    collector: WindowCollector,
    matcher: Matcher,
    quota: HourlyQuota,
    /// Decimation cursor; a sample is taken when it reaches 1.
    cursample: u32,
    /// 1-based count of processed samples.
    line_id: u64,
    last_val: f64,
}

impl Engine {
    /// Build an engine from a normalized configuration and a loaded
    /// bank. The configuration is validated here; pass it through
    /// [`EngineConfig::normalize`] first so coercions are applied.
    pub fn new(config: EngineConfig, bank: Bank) -> Result<Self, ConfigError> {
        config.validate()?;

        let order = config.wavelet_order().ok_or(ConfigError::Invalid {
            option: "wavelet_function",
            message: "unsupported order".to_string(),
        })?;
        let mode = config.distance_mode().ok_or(ConfigError::Invalid {
            option: "distance_calculation_type",
            message: "unsupported selector".to_string(),
        })?;
        let policy = config.match_policy().ok_or(ConfigError::Invalid {
            option: "matches_evaluation_logic",
            message: "unsupported selector".to_string(),
        })?;

        let detector = ExcursionDetector::new(DetectorConfig {
            initial_avg_diff: config.initial_avg_diff,
            smoothing_points: config.n_amend_avgdiff,
            points_to_alarm: config.number_of_points_to_alarm,
            threshold_factor: config.multiplicator_to_detect,
            wait_usec: config.wait_state_usec,
        });
        let collector = WindowCollector::new(config.fingerprint_length, config.use_diff_value);
        let matcher = Matcher::new(
            policy,
            MatchWindows {
                positive_from: config.fingerprint_match_positives_from,
                positive_to: config.fingerprint_match_positives_to,
                positive_max_distance: config.matching_distance_positives_max,
                negative_from: config.fingerprint_match_negatives_from,
                negative_to: config.fingerprint_match_negatives_to,
                negative_max_distance: config.matching_distance_negatives_max,
            },
            mode,
            config.fingerprint_length,
            WaveletTransform::new(order),
        );
        let quota = HourlyQuota::new(config.genpattern_hour_limit);
        let cursample = config.sample_each;

        Ok(Self {
            config,
            bank,
            detector,
            collector,
            matcher,
            quota,
            cursample,
            line_id: 0,
            last_val: 0.0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    /// Count of samples processed so far.
    pub fn samples_processed(&self) -> u64 {
        self.line_id
    }

    /// Handle one raw input line. Returns `None` when the line was
    /// decimated away, matched the header filter, or failed to parse.
    pub fn process_line(&mut self, line: &str) -> Option<Record> {
        // Decimation counts raw lines, headers included.
        if self.cursample > 1 {
            self.cursample -= 1;
            return None;
        }
        self.cursample = self.config.sample_each;

        let skip = &self.config.skip_if_contains;
        if !skip.is_empty() && line.contains(skip.as_str()) {
            return None;
        }

        let sample = parse_line(line)?;
        Some(self.process_sample(&sample))
    }

    /// Advance the pipeline by one parsed sample.
    pub fn process_sample(&mut self, sample: &RawSample) -> Record {
        self.line_id += 1;
        if self.line_id == 1 {
            self.last_val = sample.value;
        }
        let diff = sample.value - self.last_val;
        let abs_diff = diff.abs();

        // Collector runs first: a window begun on an earlier sample
        // consumes this one, and its completion is observable on this
        // record. The alarm sample itself is pushed by begin() below.
        let mut outcome: Option<MatchOutcome> = None;
        if self.collector.is_active()
            && self.collector.step(sample.value, diff) == CollectorStep::Complete
        {
            let result = self.matcher.classify(self.collector.window(), &self.bank);
            self.report_match(&result, sample);
            self.maybe_persist(&result, sample);
            outcome = Some(result);
        }

        let alarm_raised = self
            .detector
            .step(sample.time, abs_diff, self.collector.is_active());
        if alarm_raised {
            let pattern_id = self.collector.begin(sample.value, diff);
            info!(
                pattern = pattern_id,
                at = %sample.time_text,
                "alarm detected, collecting measurements pattern"
            );
        }

        self.last_val = sample.value;

        let is_final_match = outcome.as_ref().is_some_and(|o| o.is_match);
        let match_distance = outcome
            .as_ref()
            .map_or(NO_MATCH_DISTANCE, |o| o.match_distance);
        let conti_value = outcome.as_ref().map_or(0.0, |o| o.conti_value);
        let output_value = if self.config.matchdistance_to_output {
            match_distance
        } else {
            conti_value
        };

        Record {
            line_id: self.line_id,
            timestamp: sample.time_text.clone(),
            meas: sample.value,
            diff,
            diff_avg: self.detector.diff_avg(),
            is_detect: self.detector.is_detecting(),
            is_alarm: self.detector.is_alarm(),
            is_wait: self.detector.is_wait(),
            pattern_id: if self.collector.is_active() {
                self.collector.pattern_id()
            } else {
                0
            },
            is_final_match,
            match_distance,
            conti_value,
            output_value,
        }
    }

    fn report_match(&self, outcome: &MatchOutcome, sample: &RawSample) {
        if !outcome.is_match {
            return;
        }
        match &outcome.matched_positive {
            Some(name) => info!(
                pattern = self.collector.pattern_id(),
                at = %sample.time_text,
                policy = self.matcher.policy().selector(),
                exemplar = name.as_str(),
                "final match raised"
            ),
            None => info!(
                pattern = self.collector.pattern_id(),
                at = %sample.time_text,
                policy = self.matcher.policy().selector(),
                "final match raised"
            ),
        }
    }

    /// Persist the freshly computed coefficients when the generation
    /// mode and the hourly quota allow it. Failures are logged and
    /// never fatal.
    fn maybe_persist(&mut self, outcome: &MatchOutcome, sample: &RawSample) {
        let wanted = match self.config.generate_fingerprints {
            1 => true,
            2 => !outcome.is_match,
            _ => false,
        };
        if !wanted {
            return;
        }

        if !self.quota.try_acquire(sample.time) {
            info!(
                limit = self.quota.limit,
                "fingerprint generation limit within hour reached, fingerprint not saved"
            );
            return;
        }

        match write_generated(
            &self.config.fingerprints_directory,
            self.collector.pattern_id(),
            &sample.time_text,
            self.matcher.wavelet_order(),
            self.matcher.coefficients(),
        ) {
            Ok(filename) => info!(file = %filename, "fingerprint saved"),
            Err(e) => error!(
                pattern = self.collector.pattern_id(),
                "cannot save fingerprint: {e}"
            ),
        }
    }

    /// Drive the pipeline over a whole input stream, writing one record
    /// per processed sample. Returns the number of processed samples.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<u64> {
        for line in input.lines() {
            let line = line?;
            if let Some(record) = self.process_line(&line) {
                writeln!(output, "{record}")?;
            }
        }
        output.flush()?;
        Ok(self.line_id)
    }

    /// Restore the initial runtime state, keeping config and bank.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.collector.reset();
        self.quota.reset();
        self.cursample = self.config.sample_each;
        self.line_id = 0;
        self.last_val = 0.0;
    }
}
