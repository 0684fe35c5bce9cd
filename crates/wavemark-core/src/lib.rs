//! # Wavemark Core
//!
//! Streaming excursion detection and wavelet fingerprint matching for
//! univariate time series.
//!
//! The engine reads timestamped measurements one line at a time,
//! watches for sudden excursions against an adaptive noise floor,
//! captures a fixed-length window around each excursion, reduces the
//! window to a **fingerprint** with a Daubechies wavelet transform, and
//! classifies the fingerprint against a bank of stored positive and
//! negative exemplars.
//!
//! ## Signal Flow
//!
//! ```text
//! line in -> decimate -> parse -> detector -> collector -> wavelet
//!          -> bank distance scan -> match policy -> record out
//!                                 `-> optional fingerprint file
//! ```
//!
//! ## Example
//!
//! ```rust
//! use wavemark_core::bank::Bank;
//! use wavemark_core::config::EngineConfig;
//! use wavemark_core::engine::Engine;
//!
//! let mut config = EngineConfig {
//!     initial_avg_diff: 10.0,
//!     number_of_points_to_alarm: 2,
//!     multiplicator_to_detect: 2.0,
//!     fingerprint_length: 8,
//!     ..Default::default()
//! };
//! config.normalize();
//!
//! let mut engine = Engine::new(config, Bank::empty()).unwrap();
//! let record = engine
//!     .process_line("10-03-2016 15:19:20.729915 ; 68998")
//!     .unwrap();
//! assert_eq!(record.line_id, 1);
//! assert_eq!(record.diff, 0.0);
//! ```

pub mod bank;
pub mod collector;
pub mod config;
pub mod detector;
pub mod distance;
pub mod engine;
pub mod fingerprint;
pub mod matcher;
pub mod parse;
pub mod types;
pub mod wavelet;

pub use crate::bank::{Bank, BankError, MAX_BANK};
pub use crate::config::{ConfigError, EngineConfig};
pub use crate::engine::{Engine, Record};
pub use crate::matcher::{MatchOutcome, MatchPolicy};
pub use crate::types::MicroTime;
pub use crate::wavelet::DaubechiesOrder;
