//! Normalized Euclidean Distance
//!
//! Similarity measure between two coefficient vectors, normalized into
//! `[0, 1]`: 0 means identical direction, 1 means maximally dissimilar.
//! Two modes are supported:
//!
//! - **Per-index**: the squared differences and squared magnitudes are
//!   accumulated over the inclusive index window `from..=to`.
//! - **Band-averaged**: the coefficient vector is first reduced to one
//!   arithmetic mean per dyadic scale band (`[0,0]`, `[1,1]`, `[2,3]`,
//!   `[4,7]`, ...); the per-index formula is then applied to the mean
//!   vectors. Only bands fully contained in `from..=to` participate,
//!   so the index window acts as a band-pass on the comparison.
//!
//! The result is clamped to `[0, 1]` to absorb rounding error, and a
//! zero denominator (both windows identically zero) reports 0.
//!
//! ## Example
//!
//! ```rust
//! use wavemark_core::distance::{normalized_distance, DistanceMode};
//!
//! let a = vec![1.0, 2.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0];
//! let b = vec![1.0, 2.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0];
//! let d = normalized_distance(&a, &b, 0, 7, 8, DistanceMode::PerIndex);
//! assert_eq!(d, 0.0);
//! ```

/// How the distance between two coefficient vectors is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMode {
    /// Element-wise over the index window.
    PerIndex,
    /// Over per-band arithmetic means of the dyadic scale bands.
    BandAveraged,
}

impl DistanceMode {
    /// Parse from the numeric selector (1 or 2).
    pub fn from_selector(selector: u32) -> Option<Self> {
        match selector {
            1 => Some(Self::PerIndex),
            2 => Some(Self::BandAveraged),
            _ => None,
        }
    }
}

/// Inclusive index range of dyadic scale band `level`.
///
/// Level 0 is the single scaling coefficient `[0, 0]`; level `k > 0`
/// covers `[2^(k-1), 2^k - 1]`.
fn dyadic_band(level: u32) -> (usize, usize) {
    if level == 0 {
        (0, 0)
    } else {
        (1 << (level - 1), (1 << level) - 1)
    }
}

fn ratio_clamped(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        return 0.0;
    }
    (num / den).clamp(0.0, 1.0)
}

/// Normalized Euclidean distance between `v1` and `v2` over the
/// inclusive index window `from..=to` of a length-`len` fingerprint.
///
/// `len` is the configured fingerprint length (a power of two); in the
/// band-averaged mode it bounds the number of dyadic levels considered
/// (`0..=log2(len)`). The measure is symmetric and
/// `normalized_distance(v, v, ..) == 0`. Vectors shorter than the
/// window are treated as zero-padded, matching bank fingerprints stored
/// with fewer than `len` coefficients.
pub fn normalized_distance(
    v1: &[f64],
    v2: &[f64],
    from: usize,
    to: usize,
    len: usize,
    mode: DistanceMode,
) -> f64 {
    debug_assert!(from <= to && to < len);
    let at = |v: &[f64], i: usize| v.get(i).copied().unwrap_or(0.0);

    match mode {
        DistanceMode::PerIndex => {
            let mut num = 0.0;
            let mut den1 = 0.0;
            let mut den2 = 0.0;
            for i in from..=to {
                let (a, b) = (at(v1, i), at(v2, i));
                num += (a - b) * (a - b);
                den1 += a * a;
                den2 += b * b;
            }
            ratio_clamped(num, den1 + den2)
        }
        DistanceMode::BandAveraged => {
            // log2(len), truncated for safety although len is a power
            // of two whenever the engine calls in here
            let levels = usize::BITS - 1 - len.leading_zeros();

            let mut num = 0.0;
            let mut den1 = 0.0;
            let mut den2 = 0.0;
            for level in 0..=levels {
                let (bfrom, bto) = dyadic_band(level);
                if bfrom < from || bto > to {
                    continue;
                }
                let width = (bto - bfrom + 1) as f64;
                let mut m1 = 0.0;
                let mut m2 = 0.0;
                for i in bfrom..=bto {
                    m1 += at(v1, i) / width;
                    m2 += at(v2, i) / width;
                }
                num += (m1 - m2) * (m1 - m2);
                den1 += m1 * m1;
                den2 += m2 * m2;
            }
            ratio_clamped(num, den1 + den2)
        }
    }
}
