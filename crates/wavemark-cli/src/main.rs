//! wavemark — fingerprint-based excursion alarm
//!
//! Reads a measurement stream from standard input, one
//! `timestamp ; value` line at a time, and writes one record per
//! processed sample to standard output:
//!
//! ```text
//! lineid;timestamp;meas;diff;diffavg;isdetect;isalarm;iswait;patternid;isfinalmatch;matchdistance;contivalue;outputvalue
//! ```
//!
//! Typical runs:
//!
//! ```text
//! wavemark -s 1 -p fingerprints -d 1 < testdata.csv
//! wavemark --config wavemark.yaml -r 2 < testdata.csv
//! ```
//!
//! Startup failures (bad options, unreadable bank) exit with status 1;
//! unparsable input lines are skipped and fingerprint write failures
//! are logged without stopping the stream.

mod cli;

use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use wavemark_core::bank::Bank;
use wavemark_core::config::EngineConfig;
use wavemark_core::engine::Engine;

use crate::cli::Cli;

fn log_level(debug_level: u32) -> tracing::Level {
    match debug_level {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => EngineConfig::default(),
    };
    args.apply(&mut config);

    // Logs go to stderr; stdout carries only output records.
    tracing_subscriber::fmt()
        .with_max_level(log_level(config.debug_level))
        .with_writer(io::stderr)
        .init();

    config.normalize();
    config.validate().context("invalid configuration")?;

    info!(
        sample_each = config.sample_each,
        initial_avg_diff = config.initial_avg_diff,
        n_amend_avgdiff = config.n_amend_avgdiff,
        number_of_points_to_alarm = config.number_of_points_to_alarm,
        multiplicator_to_detect = config.multiplicator_to_detect,
        wait_state_usec = config.wait_state_usec,
        fingerprint_length = config.fingerprint_length,
        wavelet_function = config.wavelet_function,
        distance_calculation_type = config.distance_calculation_type,
        matches_evaluation_logic = config.matches_evaluation_logic,
        matching_distance_positives_max = config.matching_distance_positives_max,
        matching_distance_negatives_max = config.matching_distance_negatives_max,
        use_diff_value = config.use_diff_value,
        generate_fingerprints = config.generate_fingerprints,
        genpattern_hour_limit = config.genpattern_hour_limit,
        fingerprints_directory = %config.fingerprints_directory.display(),
        "starting wavemark"
    );

    let bank = Bank::load(&config.fingerprints_directory, config.fingerprint_length)
        .context("loading fingerprint bank")?;

    let mut engine = Engine::new(config, bank).context("assembling engine")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let processed = engine
        .run(stdin.lock(), io::BufWriter::new(stdout.lock()))
        .context("processing input stream")?;

    info!(processed, "end of input");
    Ok(())
}
