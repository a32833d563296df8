//! wayfinder-bench: CLI tool for analyzer parameter experimentation and
//! diagnostics.
//!
//! Runs the direction analysis on a given mask image with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Tuning `min_branch_length` against real road masks
//! - Measuring per-stage durations to identify bottlenecks
//! - Comparing anchor placements on the same mask
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin wayfinder-bench -- [OPTIONS] <MASK_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use wayfinder_pipeline::diagnostics::{analyze_staged_with_diagnostics, AnalysisDiagnostics, Clock};
use wayfinder_pipeline::{AnalyzerConfig, GrayImage, GridPoint};

/// Analyzer parameter experimentation and diagnostics for wayfinder.
///
/// Runs the direction analysis on a given mask image with configurable
/// parameters and prints detailed per-stage timing and count
/// diagnostics.
#[derive(Parser)]
#[command(name = "wayfinder-bench", version)]
struct Cli {
    /// Path to the input mask image (PNG, JPEG, BMP, WebP).
    mask_path: PathBuf,

    /// Anchor x coordinate. Defaults to the grid center when omitted.
    #[arg(long, requires = "anchor_y")]
    anchor_x: Option<u32>,

    /// Anchor y coordinate. Defaults to the grid center when omitted.
    #[arg(long, requires = "anchor_x")]
    anchor_y: Option<u32>,

    /// Minimum branch length in pixels.
    #[arg(long, default_value_t = AnalyzerConfig::DEFAULT_MIN_BRANCH_LENGTH, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    min_branch_length: u32,

    /// Grayscale threshold for binarizing the loaded mask (0-255).
    /// Pixels at or above the threshold count as road surface.
    #[arg(long, default_value_t = 128)]
    threshold: u8,

    /// Confidence cutoff for listing detected directions (0.0-1.0).
    #[arg(long, default_value_t = 0.2)]
    cutoff: f64,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match image::open(&cli.mask_path) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.mask_path.display());
            return ExitCode::FAILURE;
        }
    };
    let mask = binarize(&loaded.to_luma8(), cli.threshold);

    let anchor = match (cli.anchor_x, cli.anchor_y) {
        (Some(x), Some(y)) => Some(GridPoint::new(x, y)),
        _ => None,
    };

    let config = AnalyzerConfig {
        min_branch_length: cli.min_branch_length,
        ..AnalyzerConfig::default()
    };

    eprintln!(
        "Mask: {} ({}x{})",
        cli.mask_path.display(),
        mask.width(),
        mask.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match analyze_staged_with_diagnostics(&mask, anchor, &config, &StdClock) {
            Ok((staged, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                    println!();
                    print_scores(&staged, cli.cutoff);
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Analysis error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Threshold a grayscale image into a strict 0/255 mask.
fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (src, dst) in gray.pixels().zip(mask.pixels_mut()) {
        dst.0[0] = if src.0[0] >= threshold { 255 } else { 0 };
    }
    mask
}

/// Print the per-direction score table and the detected direction list.
fn print_scores(staged: &wayfinder_pipeline::StagedAnalysis, cutoff: f64) {
    println!(
        "Direction scores (anchor ({}, {}))\n{}",
        staged.anchor.x,
        staged.anchor.y,
        "-".repeat(40),
    );
    for (direction, score) in staged.scores.iter() {
        println!("{:<12} {score:>8.4}", direction.label());
    }

    let detected = staged.scores.detected(cutoff);
    if detected.is_empty() {
        println!("\nNo directions at or above cutoff {cutoff}");
    } else {
        let labels: Vec<&str> = detected.iter().map(|d| d.label()).collect();
        println!("\nDetected (cutoff {cutoff}): {}", labels.join(", "));
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&AnalysisDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[AnalysisDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Skeletonize", |d| d.skeletonize.duration),
        ("Endpoint Scan", |d| d.endpoint_scan.duration),
        ("Branch Tracing", |d| d.branch_tracing.duration),
        ("Anchor Snap", |d| d.anchor_snap.duration),
        ("Scoring", |d| d.scoring.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
