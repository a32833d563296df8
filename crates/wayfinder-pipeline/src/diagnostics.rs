//! Analysis diagnostics: timing and counts for each stage.
//!
//! Permanent instrumentation intended for parameter tuning (how does
//! `min_branch_length` change the retained branch set?) and for spotting
//! pathological inputs: skeletonization and the brute-force anchor snap
//! are both unbounded in iteration count relative to mask size, and the
//! per-stage durations make a slow mask easy to attribute.
//!
//! Timestamps are captured through the [`Clock`] trait so callers control
//! the time source; durations are serialized as fractional seconds
//! (`f64`) for JSON compatibility, since `std::time::Duration` does not
//! implement serde traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{
    AnalysisError, AnalyzerConfig, Direction, GrayImage, GridPoint, StagedAnalysis,
};
use crate::{branches, endpoints, morphology, nearest, resolve_requested_anchor, score, skeleton};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
///
/// Bench tooling supplies a wall-clock implementation backed by
/// [`std::time::Instant`]; tests can supply a fixed clock for
/// reproducible reports.
pub trait Clock {
    /// Opaque instant type produced by this clock.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Stage 1: skeleton extraction.
    pub skeletonize: StageDiagnostics,
    /// Stage 2: endpoint scan.
    pub endpoint_scan: StageDiagnostics,
    /// Stage 3: branch tracing.
    pub branch_tracing: StageDiagnostics,
    /// Stage 4: anchor snap to nearest skeleton pixel.
    pub anchor_snap: StageDiagnostics,
    /// Stage 5: direction scoring.
    pub scoring: StageDiagnostics,
    /// Total wall-clock duration of the entire analysis (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: AnalysisSummary,
}

/// Diagnostics for a single analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Skeleton extraction metrics.
    Skeletonize {
        /// Set pixels in the input mask.
        mask_pixels: u64,
        /// Set pixels in the skeleton.
        skeleton_pixels: u64,
    },
    /// Endpoint scan metrics.
    EndpointScan {
        /// Number of topological endpoints found.
        endpoint_count: usize,
    },
    /// Branch tracing metrics.
    BranchTracing {
        /// Minimum branch length applied.
        min_branch_length: u32,
        /// Number of retained branches.
        branch_count: usize,
        /// Total points across all retained branches.
        total_branch_points: usize,
        /// Points in the longest retained branch.
        longest_branch_points: usize,
    },
    /// Anchor snap metrics.
    AnchorSnap {
        /// The anchor before snapping (caller-supplied or grid center).
        requested: GridPoint,
        /// The anchor after snapping to the skeleton.
        snapped: GridPoint,
        /// Euclidean distance moved by the snap, in pixels.
        offset_px: f64,
    },
    /// Direction scoring metrics.
    Scoring {
        /// Directions with a nonzero confidence score.
        scored_directions: usize,
    },
}

/// High-level summary counts for the entire analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Mask width in pixels.
    pub mask_width: u32,
    /// Mask height in pixels.
    pub mask_height: u32,
    /// Set pixels in the input mask.
    pub mask_pixels: u64,
    /// Set pixels in the skeleton.
    pub skeleton_pixels: u64,
    /// Number of retained branches.
    pub branch_count: usize,
}

impl AnalysisDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Analysis Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Mask: {}x{} ({} set pixels)",
            self.summary.mask_width, self.summary.mask_height, self.summary.mask_pixels,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<18} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages: [(&str, &StageDiagnostics); 5] = [
            ("Skeletonize", &self.skeletonize),
            ("Endpoint Scan", &self.endpoint_scan),
            ("Branch Tracing", &self.branch_tracing),
            ("Anchor Snap", &self.anchor_snap),
            ("Scoring", &self.scoring),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<18} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Skeleton pixels: {}  |  Branches: {}",
            self.summary.skeleton_pixels, self.summary.branch_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Skeletonize {
            mask_pixels,
            skeleton_pixels,
        } => format!("{mask_pixels} mask px -> {skeleton_pixels} skeleton px"),
        StageMetrics::EndpointScan { endpoint_count } => {
            format!("{endpoint_count} endpoints")
        }
        StageMetrics::BranchTracing {
            min_branch_length,
            branch_count,
            total_branch_points,
            longest_branch_points,
        } => {
            format!(
                "min_len={min_branch_length} {branch_count} branches, {total_branch_points} pts (longest={longest_branch_points})",
            )
        }
        StageMetrics::AnchorSnap {
            requested,
            snapped,
            offset_px,
        } => {
            format!(
                "({}, {}) -> ({}, {}) ({offset_px:.1}px)",
                requested.x, requested.y, snapped.x, snapped.y,
            )
        }
        StageMetrics::Scoring { scored_directions } => {
            format!("{scored_directions}/8 directions scored")
        }
    }
}

/// Run the full analysis, collecting per-stage diagnostics alongside the
/// staged result.
///
/// Produces the same [`StagedAnalysis`] as
/// [`analyze_staged`](crate::analyze_staged) run with the same inputs.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] when the configuration fails
/// validation and [`AnalysisError::AnchorOutOfBounds`] when a
/// caller-supplied anchor lies outside the mask grid.
pub fn analyze_staged_with_diagnostics<C: Clock>(
    mask: &GrayImage,
    anchor: Option<GridPoint>,
    config: &AnalyzerConfig,
    clock: &C,
) -> Result<(StagedAnalysis, AnalysisDiagnostics), AnalysisError> {
    config.validate()?;
    let requested = resolve_requested_anchor(mask, anchor)?;
    let (mask_width, mask_height) = mask.dimensions();
    let mask_pixels = morphology::count_set(mask);

    let total_start = clock.now();

    let stage_start = clock.now();
    let skeleton = skeleton::skeletonize(mask);
    let skeleton_pixels = morphology::count_set(&skeleton);
    let skeletonize_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::Skeletonize {
            mask_pixels,
            skeleton_pixels,
        },
    };

    let stage_start = clock.now();
    let endpoints = endpoints::find_endpoints(&skeleton);
    let endpoint_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::EndpointScan {
            endpoint_count: endpoints.len(),
        },
    };

    let stage_start = clock.now();
    let branches = branches::trace_branches(&skeleton, &endpoints, config.min_branch_length);
    let branch_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::BranchTracing {
            min_branch_length: config.min_branch_length,
            branch_count: branches.len(),
            total_branch_points: branches.iter().map(crate::Branch::len).sum(),
            longest_branch_points: branches.iter().map(crate::Branch::len).max().unwrap_or(0),
        },
    };

    let stage_start = clock.now();
    let snapped = nearest::nearest_on_skeleton(&skeleton, requested);
    let anchor_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::AnchorSnap {
            requested,
            snapped,
            offset_px: requested.distance(snapped),
        },
    };

    let stage_start = clock.now();
    let scores = score::score_directions(&branches, snapped, config);
    let scoring_stage = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::Scoring {
            scored_directions: Direction::ALL
                .into_iter()
                .filter(|d| scores.get(*d) > 0.0)
                .count(),
        },
    };

    let diagnostics = AnalysisDiagnostics {
        skeletonize: skeletonize_stage,
        endpoint_scan: endpoint_stage,
        branch_tracing: branch_stage,
        anchor_snap: anchor_stage,
        scoring: scoring_stage,
        total_duration: clock.elapsed(&total_start),
        summary: AnalysisSummary {
            mask_width,
            mask_height,
            mask_pixels,
            skeleton_pixels,
            branch_count: branches.len(),
        },
    };

    let staged = StagedAnalysis {
        skeleton,
        endpoints,
        branches,
        anchor: snapped,
        scores,
    };

    Ok((staged, diagnostics))
}
