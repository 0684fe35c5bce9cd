//! Fingerprint Representation and File Format
//!
//! A fingerprint is a vector of wavelet coefficients derived from a
//! captured sample window, stored on disk as one real number per line.
//! The filename carries all metadata:
//!
//! ```text
//! p_ringdown.fpr12_len1024      positive exemplar, loaded into the bank
//! n_doorslam.fpr12_len1024      negative exemplar (suppression)
//! w_0007_10_03_2016....fpr2_len512   generated by the engine, id 7
//! ```
//!
//! The leading character of the name decides the kind (`p` positive,
//! `n` negative); the name itself is the filename up to the first dot.
//! Generated files use the `w_` prefix and are renamed by the operator
//! to `p_`/`n_` once triaged into the bank.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::wavelet::DaubechiesOrder;

/// Whether a bank fingerprint represents an event of interest or a
/// known benign excursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintKind {
    /// Match means "event of interest".
    Positive,
    /// Match means "known benign, suppress".
    Negative,
}

impl FingerprintKind {
    /// Derive the kind from a fingerprint name (`p...` or `n...`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.as_bytes().first() {
            Some(b'p') => Some(Self::Positive),
            Some(b'n') => Some(Self::Negative),
            _ => None,
        }
    }
}

/// A named coefficient vector loaded from the bank.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    /// Filename up to (excluding) the first dot, e.g. `p_ringdown`.
    pub name: String,
    pub kind: FingerprintKind,
    pub coeffs: Vec<f64>,
}

impl Fingerprint {
    /// Fingerprint name for a bank filename: everything before the
    /// first dot.
    pub fn name_from_filename(filename: &str) -> &str {
        filename.split('.').next().unwrap_or(filename)
    }

    /// Read a fingerprint file: one real number per line, surrounding
    /// whitespace tolerated.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let name = Self::name_from_filename(filename).to_string();
        let kind = FingerprintKind::from_name(&name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("fingerprint name '{name}' must start with 'p' or 'n'"),
            )
        })?;

        let reader = BufReader::new(File::open(path)?);
        let mut coeffs = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let text = line.trim();
            let value: f64 = text.parse().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: '{}' is not a number", idx + 1, text),
                )
            })?;
            coeffs.push(value);
        }

        Ok(Self { name, kind, coeffs })
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }
}

/// Replace characters that are awkward in filenames (`:`, `-`, `.` and
/// space) with underscores.
fn sanitize_for_filename(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ':' | '-' | '.' | ' ' => '_',
            other => other,
        })
        .collect()
}

/// Filename for a generated fingerprint:
/// `w_NNNN_<sanitized timestamp>.fpr<order>_len<length>` with the
/// pattern id zero-padded to four digits.
pub fn generated_filename(
    pattern_id: u64,
    timestamp_text: &str,
    order: DaubechiesOrder,
    length: usize,
) -> String {
    format!(
        "w_{:04}_{}.fpr{}_len{}",
        pattern_id,
        sanitize_for_filename(timestamp_text),
        order.order(),
        length
    )
}

/// Write the coefficient vector of a freshly captured window into the
/// fingerprint directory. Returns the generated filename.
///
/// Values are written in fixed notation with 17 fractional digits so a
/// later bank load reproduces them within one ulp.
pub fn write_generated(
    directory: &Path,
    pattern_id: u64,
    timestamp_text: &str,
    order: DaubechiesOrder,
    coeffs: &[f64],
) -> io::Result<String> {
    let filename = generated_filename(pattern_id, timestamp_text, order, coeffs.len());
    let path: PathBuf = directory.join(&filename);

    let mut writer = BufWriter::new(File::create(&path)?);
    for value in coeffs {
        writeln!(writer, "{value:.17}")?;
    }
    writer.flush()?;
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!(
            FingerprintKind::from_name("p_spike"),
            Some(FingerprintKind::Positive)
        );
        assert_eq!(
            FingerprintKind::from_name("n_flat"),
            Some(FingerprintKind::Negative)
        );
        assert_eq!(FingerprintKind::from_name("w_0001"), None);
        assert_eq!(FingerprintKind::from_name(""), None);
    }

    #[test]
    fn test_name_from_filename() {
        assert_eq!(
            Fingerprint::name_from_filename("p_ringdown.fpr12_len1024"),
            "p_ringdown"
        );
        assert_eq!(Fingerprint::name_from_filename("n_flat"), "n_flat");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(
            sanitize_for_filename("10-03-2016 15:19:20.729915"),
            "10_03_2016_15_19_20_729915"
        );
    }

    #[test]
    fn test_generated_filename() {
        let name = generated_filename(7, "10-03-2016 15:19:20.729915", DaubechiesOrder::D12, 512);
        assert_eq!(name, "w_0007_10_03_2016_15_19_20_729915.fpr12_len512");
        // Four-wide id keeps sorting stable past 999
        let name = generated_filename(1234, "t", DaubechiesOrder::D2, 8);
        assert!(name.starts_with("w_1234_"));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = std::env::temp_dir();
        let coeffs = vec![1.5, -0.25, 1e-9, 12345.678901234567];
        let filename =
            write_generated(&dir, 3, "01-01-2020 00:00:00.000001", DaubechiesOrder::D4, &coeffs)
                .unwrap();
        assert!(filename.starts_with("w_0003_"));

        // Rename to a positive name so the loader accepts it
        let generated = dir.join(&filename);
        let positive = dir.join(format!("p_{filename}"));
        std::fs::rename(&generated, &positive).unwrap();

        let fp = Fingerprint::from_file(&positive).unwrap();
        assert_eq!(fp.kind, FingerprintKind::Positive);
        assert_eq!(fp.len(), coeffs.len());
        for (read, orig) in fp.coeffs.iter().zip(coeffs.iter()) {
            assert!((read - orig).abs() <= orig.abs() * 1e-15);
        }
        std::fs::remove_file(&positive).ok();
    }

    #[test]
    fn test_bad_value_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("p_badvalue.fpr2_len8");
        std::fs::write(&path, "1.0\nnot-a-number\n3.0\n").unwrap();
        let err = Fingerprint::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("x_unknown.fpr2_len8");
        std::fs::write(&path, "1.0\n").unwrap();
        assert!(Fingerprint::from_file(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
