//! Fingerprint Matcher
//!
//! Turns a completed sample window into a fingerprint (via the wavelet
//! transform) and evaluates it against the bank under the configured
//! policy. Each policy combines the per-bank minimum distances and
//! match counts into a binary decision plus a continuous score:
//!
//! | policy | decision |
//! |--------|----------|
//! | `Unconditional`       | every window is a final match (no distances computed) |
//! | `NoNegative`          | match when no negative exemplar is close |
//! | `FirstPositive`       | match when any positive exemplar is close; scan stops at the first hit |
//! | `PositiveNoNegative`  | match when a positive is close and no negative is |
//! | `AllPositives`        | like `FirstPositive` but every positive is scanned, so the match count is meaningful |
//!
//! The continuous score is oriented so that higher means "more
//! suspicious": policies driven by positives report `1 - min_distance`,
//! the negative-rejection policy reports the raw minimum negative
//! distance.

use tracing::debug;

use crate::bank::Bank;
use crate::distance::{normalized_distance, DistanceMode};
use crate::fingerprint::FingerprintKind;
use crate::wavelet::{DaubechiesOrder, WaveletTransform};

/// Sentinel reported in the `matchdistance` output field when no final
/// match was raised.
pub const NO_MATCH_DISTANCE: f64 = -1.0;

/// How per-bank distances combine into the final decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Every completed window is a final match; the bank is ignored.
    Unconditional,
    /// Match when no negative exemplar is within its threshold.
    NoNegative,
    /// Match when any positive exemplar is within its threshold,
    /// stopping the scan at the first hit.
    FirstPositive,
    /// Match when a positive is within threshold and no negative is.
    PositiveNoNegative,
    /// Match when any positive is within threshold, scanning all of
    /// them so `positives_matched` counts every hit.
    AllPositives,
}

impl MatchPolicy {
    /// Parse from the numeric selector (0..=4).
    pub fn from_selector(selector: u32) -> Option<Self> {
        match selector {
            0 => Some(Self::Unconditional),
            1 => Some(Self::NoNegative),
            2 => Some(Self::FirstPositive),
            3 => Some(Self::PositiveNoNegative),
            4 => Some(Self::AllPositives),
            _ => None,
        }
    }

    /// The numeric selector this policy was parsed from.
    pub fn selector(&self) -> u32 {
        match self {
            Self::Unconditional => 0,
            Self::NoNegative => 1,
            Self::FirstPositive => 2,
            Self::PositiveNoNegative => 3,
            Self::AllPositives => 4,
        }
    }

    fn scans_positives(&self) -> bool {
        matches!(
            self,
            Self::FirstPositive | Self::PositiveNoNegative | Self::AllPositives
        )
    }

    fn scans_negatives(&self) -> bool {
        matches!(self, Self::NoNegative | Self::PositiveNoNegative)
    }

    fn breaks_on_first_positive(&self) -> bool {
        matches!(self, Self::FirstPositive | Self::PositiveNoNegative)
    }
}

/// Index windows and accept thresholds for the two bank sides.
#[derive(Debug, Clone)]
pub struct MatchWindows {
    pub positive_from: usize,
    pub positive_to: usize,
    pub positive_max_distance: f64,
    pub negative_from: usize,
    pub negative_to: usize,
    pub negative_max_distance: f64,
}

/// Result of evaluating one window against the bank.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// The binary decision under the configured policy.
    pub is_match: bool,
    /// Distance reported for the match; [`NO_MATCH_DISTANCE`] when
    /// `is_match` is false.
    pub match_distance: f64,
    /// Continuous suspicion score in `[0, 1]`.
    pub conti_value: f64,
    /// Positives compared before the scan ended.
    pub positives_scanned: usize,
    /// Positives within their accept threshold.
    pub positives_matched: usize,
    /// Negatives compared.
    pub negatives_scanned: usize,
    /// Negatives within their accept threshold.
    pub negatives_matched: usize,
    /// Smallest positive distance seen (1.0 when none scanned).
    pub min_positive: f64,
    /// Smallest negative distance seen (1.0 when none scanned).
    pub min_negative: f64,
    /// Name of the last positive exemplar that matched.
    pub matched_positive: Option<String>,
}

impl MatchOutcome {
    fn no_match() -> Self {
        Self {
            is_match: false,
            match_distance: NO_MATCH_DISTANCE,
            conti_value: 0.0,
            positives_scanned: 0,
            positives_matched: 0,
            negatives_scanned: 0,
            negatives_matched: 0,
            min_positive: 1.0,
            min_negative: 1.0,
            matched_positive: None,
        }
    }
}

/// Applies the wavelet transform and the bank comparison to completed
/// windows. Owns the coefficient buffer so repeated windows do not
/// reallocate.
#[derive(Debug)]
pub struct Matcher {
    policy: MatchPolicy,
    windows: MatchWindows,
    mode: DistanceMode,
    fingerprint_len: usize,
    wavelet: WaveletTransform,
    coeffs: Vec<f64>,
}

impl Matcher {
    pub fn new(
        policy: MatchPolicy,
        windows: MatchWindows,
        mode: DistanceMode,
        fingerprint_len: usize,
        wavelet: WaveletTransform,
    ) -> Self {
        Self {
            policy,
            windows,
            mode,
            fingerprint_len,
            wavelet,
            coeffs: Vec::with_capacity(fingerprint_len),
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// The wavelet order fingerprints are produced with.
    pub fn wavelet_order(&self) -> DaubechiesOrder {
        self.wavelet.order()
    }

    /// Coefficients of the most recently classified window, for
    /// fingerprint persistence.
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// Transform `window` and evaluate it against `bank`.
    pub fn classify(&mut self, window: &[f64], bank: &Bank) -> MatchOutcome {
        let len = self.fingerprint_len;
        debug_assert_eq!(window.len(), len);

        // Keep the coefficients around even under Unconditional: the
        // engine may still persist them.
        let coeffs = {
            self.wavelet.transform_to(window, &mut self.coeffs);
            &self.coeffs
        };

        let mut out = MatchOutcome::no_match();

        if self.policy.scans_positives() {
            for fp in bank.iter() {
                if fp.kind != FingerprintKind::Positive {
                    continue;
                }
                out.positives_scanned += 1;
                let d = normalized_distance(
                    coeffs,
                    &fp.coeffs,
                    self.windows.positive_from,
                    self.windows.positive_to,
                    len,
                    self.mode,
                );
                if d < out.min_positive {
                    out.min_positive = d;
                }
                let hit = d <= self.windows.positive_max_distance;
                debug!(
                    exemplar = %fp.name,
                    distance = d,
                    threshold = self.windows.positive_max_distance,
                    hit,
                    "positive comparison"
                );
                if hit {
                    out.positives_matched += 1;
                    out.matched_positive = Some(fp.name.clone());
                    if self.policy.breaks_on_first_positive() {
                        break;
                    }
                }
            }
        }

        if self.policy.scans_negatives() {
            for fp in bank.iter() {
                if fp.kind != FingerprintKind::Negative {
                    continue;
                }
                out.negatives_scanned += 1;
                let d = normalized_distance(
                    coeffs,
                    &fp.coeffs,
                    self.windows.negative_from,
                    self.windows.negative_to,
                    len,
                    self.mode,
                );
                if d < out.min_negative {
                    out.min_negative = d;
                }
                let hit = d <= self.windows.negative_max_distance;
                debug!(
                    exemplar = %fp.name,
                    distance = d,
                    threshold = self.windows.negative_max_distance,
                    hit,
                    "negative comparison"
                );
                if hit {
                    out.negatives_matched += 1;
                }
            }
        }

        match self.policy {
            MatchPolicy::Unconditional => {
                out.is_match = true;
                out.conti_value = 1.0;
            }
            MatchPolicy::NoNegative => {
                out.conti_value = out.min_negative;
                if out.negatives_matched == 0 {
                    out.is_match = true;
                    out.match_distance = out.min_negative;
                }
            }
            MatchPolicy::FirstPositive | MatchPolicy::AllPositives => {
                out.conti_value = 1.0 - out.min_positive;
                if out.positives_matched > 0 {
                    out.is_match = true;
                    out.match_distance = out.min_positive;
                }
            }
            MatchPolicy::PositiveNoNegative => {
                let closest = out.min_positive.min(out.min_negative);
                out.conti_value = 1.0 - closest;
                if out.negatives_matched == 0 && out.positives_matched > 0 {
                    out.is_match = true;
                    out.match_distance = closest;
                }
            }
        }

        out
    }
}
