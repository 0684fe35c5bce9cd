//! Fingerprint Bank
//!
//! In-memory catalog of the positive and negative exemplar fingerprints
//! loaded at startup. Candidate files are found by name shape
//! (`p_*.fpr*` / `n_*.fpr*`) in the configured directory, loaded in
//! directory-read order, and never touched again: the bank is read-only
//! for the lifetime of the process.
//!
//! A fingerprint longer than the configured window length is accepted
//! but logged, since only its first `L` coefficients can ever take part
//! in a comparison.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fingerprint::{Fingerprint, FingerprintKind};

/// Upper bound on candidate fingerprint files per directory.
pub const MAX_BANK: usize = 500;

/// Errors raised while building the bank. All of them are fatal at
/// startup.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("cannot open fingerprint directory '{path}': {source}")]
    Directory {
        path: PathBuf,
        source: io::Error,
    },

    #[error("too many fingerprint files in '{path}': {count} exceeds the limit of {max}")]
    TooManyFiles {
        path: PathBuf,
        count: usize,
        max: usize,
    },

    #[error("cannot read fingerprint file '{path}': {source}")]
    File {
        path: PathBuf,
        source: io::Error,
    },
}

/// The loaded fingerprint catalog, ordered as read from the directory.
#[derive(Debug, Default)]
pub struct Bank {
    fingerprints: Vec<Fingerprint>,
}

/// True for filenames shaped like bank entries: `p_*.fpr*` or `n_*.fpr*`.
fn is_bank_filename(name: &str) -> bool {
    (name.starts_with("p_") || name.starts_with("n_")) && name.contains(".fpr")
}

impl Bank {
    /// An empty bank (matching runs without exemplars).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan `directory` for bank files and load every one of them.
    ///
    /// `window_len` is only used to flag over-length fingerprints; they
    /// are loaded regardless.
    pub fn load(directory: &Path, window_len: usize) -> Result<Self, BankError> {
        let entries = std::fs::read_dir(directory).map_err(|source| BankError::Directory {
            path: directory.to_path_buf(),
            source,
        })?;

        info!(directory = %directory.display(), "searching for fingerprint patterns");

        let mut candidates: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| BankError::Directory {
                path: directory.to_path_buf(),
                source,
            })?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if is_bank_filename(name) {
                debug!(file = name, "bank candidate found");
                candidates.push(entry.path());
            }
        }

        if candidates.len() > MAX_BANK {
            return Err(BankError::TooManyFiles {
                path: directory.to_path_buf(),
                count: candidates.len(),
                max: MAX_BANK,
            });
        }

        let mut fingerprints = Vec::with_capacity(candidates.len());
        for path in candidates {
            let fp = Fingerprint::from_file(&path).map_err(|source| BankError::File {
                path: path.clone(),
                source,
            })?;
            if fp.len() > window_len {
                warn!(
                    name = %fp.name,
                    length = fp.len(),
                    window_len,
                    "fingerprint is longer than the configured window length"
                );
            }
            fingerprints.push(fp);
        }

        let bank = Self { fingerprints };
        info!(
            loaded = bank.len(),
            positives = bank.count(FingerprintKind::Positive),
            negatives = bank.count(FingerprintKind::Negative),
            "fingerprint bank loaded"
        );
        Ok(bank)
    }

    /// All fingerprints in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.fingerprints.iter()
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Number of fingerprints of one kind.
    pub fn count(&self, kind: FingerprintKind) -> usize {
        self.fingerprints.iter().filter(|f| f.kind == kind).count()
    }

    /// Build a bank directly from fingerprints, preserving order.
    /// Intended for tests and embedding.
    pub fn from_fingerprints(fingerprints: Vec<Fingerprint>) -> Self {
        Self { fingerprints }
    }
}
