// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tillscan — receipt price extractor.
//
// Entry point. Initialises logging, merges configuration, picks the region
// detector and text recognizer, runs one scan, and prints the results.

mod cli;
mod output;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tillscan_core::ScanConfig;
use tillscan_core::TillscanError;
use tillscan_core::human_errors::humanize_error;
use tillscan_document::{
    ContourFileDetector, ReceiptScanner, RegionDetector, TesseractRecognizer,
    TextRecognizer, ThresholdContourDetector,
};
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<TillscanError>() {
                Some(scan_err) => {
                    tracing::debug!(error = %err, "Scan failed");
                    eprintln!("error: {}", humanize_error(scan_err));
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.scan_config()?;
    tracing::info!(image = %cli.image.display(), "tillscan starting");

    let detector = build_detector(cli, &config)?;
    let recognizer = build_recognizer(cli, &config)?;
    let scanner = ReceiptScanner::new(config, detector, recognizer)?;

    let report = scanner
        .scan_path(&cli.image)
        .with_context(|| format!("failed to scan {}", cli.image.display()))?;

    let mut stdout = io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut stdout, &report.summary())?;
        writeln!(stdout)?;
    } else {
        let text = output::render_sections(&report.raw_text, report.priced_lines());
        stdout.write_all(text.as_bytes())?;
    }
    Ok(())
}

fn build_detector(cli: &Cli, config: &ScanConfig) -> Result<Box<dyn RegionDetector>> {
    match &cli.contours {
        Some(path) => {
            let detector = ContourFileDetector::open(path, config.detection.min_confidence)?;
            Ok(Box::new(detector))
        }
        None => Ok(Box::new(ThresholdContourDetector::new(&config.detection))),
    }
}

fn build_recognizer(cli: &Cli, config: &ScanConfig) -> Result<Box<dyn TextRecognizer>> {
    #[cfg(feature = "ocrs")]
    if let Some(dir) = &cli.ocrs_models {
        let recognizer = tillscan_document::OcrsRecognizer::from_model_dir(dir)?;
        return Ok(Box::new(recognizer));
    }
    #[cfg(feature = "leptess")]
    if cli.libtesseract {
        let recognizer = tillscan_document::LeptessRecognizer::new(config.recognizer.clone());
        return Ok(Box::new(recognizer));
    }
    let _ = cli;
    Ok(Box::new(TesseractRecognizer::new(config.recognizer.clone())))
}
