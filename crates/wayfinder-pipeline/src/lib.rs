//! Road-network direction analysis over binary raster masks.
//!
//! Given a grayscale mask where nonzero pixels mark road surface, the
//! pipeline reduces the mask to a one-pixel-wide skeleton, finds the
//! skeleton's dead ends, traces the branch walks between them, snaps an
//! anchor point onto the skeleton, and scores the eight compass
//! directions by how strongly the branches radiate from that anchor.
//!
//! The pipeline is pure and deterministic: no I/O, no threads, no
//! randomness. Identical inputs produce identical outputs, down to
//! tie-break order in every stage. Callers that need image decoding,
//! timing, or a CLI wrap this crate; see the bench binary for one such
//! wrapper.
//!
//! # Stages
//!
//! 1. [`skeleton::skeletonize`]: morphological thinning to a skeleton.
//! 2. [`endpoints::find_endpoints`]: pixels with exactly one neighbor.
//! 3. [`branches::trace_branches`]: greedy walks from each endpoint.
//! 4. [`nearest::nearest_on_skeleton`]: snap the anchor to the skeleton.
//! 5. [`score::score_directions`]: per-direction confidence in `[0, 1]`.
//!
//! [`analyze`] runs all five and returns just the score map;
//! [`analyze_staged`] also returns every intermediate product, which is
//! what visual debugging and the tests here lean on.

pub mod branches;
pub mod diagnostics;
pub mod endpoints;
pub mod morphology;
pub mod nearest;
pub mod score;
pub mod skeleton;
pub mod types;

pub use types::{
    AnalysisError, AnalyzerConfig, Branch, Direction, DirectionScores, GrayImage, GridPoint,
    StagedAnalysis,
};

/// Run the full analysis and return only the direction score map.
///
/// `anchor` is the point the directions radiate from; `None` selects the
/// grid center `(width / 2, height / 2)`. Either way the point is
/// snapped to the nearest skeleton pixel before scoring.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] when the configuration fails
/// validation and [`AnalysisError::AnchorOutOfBounds`] when a
/// caller-supplied anchor lies outside the mask grid.
pub fn analyze(
    mask: &GrayImage,
    anchor: Option<GridPoint>,
    config: &AnalyzerConfig,
) -> Result<DirectionScores, AnalysisError> {
    analyze_staged(mask, anchor, config).map(|staged| staged.scores)
}

/// Run the full analysis and return every intermediate product.
///
/// Same contract as [`analyze`], plus the skeleton, endpoints, branches,
/// and snapped anchor for inspection.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] when the configuration fails
/// validation and [`AnalysisError::AnchorOutOfBounds`] when a
/// caller-supplied anchor lies outside the mask grid.
pub fn analyze_staged(
    mask: &GrayImage,
    anchor: Option<GridPoint>,
    config: &AnalyzerConfig,
) -> Result<StagedAnalysis, AnalysisError> {
    config.validate()?;
    let requested = resolve_requested_anchor(mask, anchor)?;

    let skeleton = skeleton::skeletonize(mask);
    let endpoints = endpoints::find_endpoints(&skeleton);
    let branches = branches::trace_branches(&skeleton, &endpoints, config.min_branch_length);
    let snapped = nearest::nearest_on_skeleton(&skeleton, requested);
    let scores = score::score_directions(&branches, snapped, config);

    Ok(StagedAnalysis {
        skeleton,
        endpoints,
        branches,
        anchor: snapped,
        scores,
    })
}

/// Validate a caller-supplied anchor against the mask bounds, or pick
/// the grid center when none was supplied.
pub(crate) fn resolve_requested_anchor(
    mask: &GrayImage,
    anchor: Option<GridPoint>,
) -> Result<GridPoint, AnalysisError> {
    let (width, height) = mask.dimensions();
    match anchor {
        Some(point) if point.x >= width || point.y >= height => {
            Err(AnalysisError::AnchorOutOfBounds {
                x: point.x,
                y: point.y,
                width,
                height,
            })
        }
        Some(point) => Ok(point),
        None => Ok(GridPoint::new(width / 2, height / 2)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use image::Luma;

    const EPS: f64 = 1e-9;

    /// A 5-pixel-thick horizontal bar on a 200x200 grid. Thick enough to
    /// survive thinning: its skeleton is the single row y=100, x 12..=188.
    fn bar_mask() -> GrayImage {
        let mut mask = GrayImage::new(200, 200);
        for y in 98..=102 {
            for x in 10..=190 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    fn config(min_branch_length: u32) -> AnalyzerConfig {
        AnalyzerConfig {
            min_branch_length,
            ..AnalyzerConfig::default()
        }
    }

    #[test]
    fn horizontal_bar_reads_as_east_from_its_center() {
        let mask = bar_mask();
        let staged =
            analyze_staged(&mask, Some(GridPoint::new(100, 100)), &config(50)).unwrap();

        // The single walk starts at the west tip and ends at the east
        // tip, so the far terminus sits due east of the anchor.
        assert_eq!(staged.branches.len(), 1);
        assert_eq!(staged.branches[0].len(), 177);
        assert_eq!(staged.anchor, GridPoint::new(100, 100));
        assert!((staged.scores.get(Direction::East) - 1.0).abs() < EPS);
        assert!(staged.scores.get(Direction::West).abs() < EPS);
        assert!(staged.scores.get(Direction::North).abs() < EPS);
    }

    #[test]
    fn empty_mask_yields_empty_stages_and_zero_scores() {
        let mask = GrayImage::new(64, 64);
        let staged = analyze_staged(&mask, None, &config(10)).unwrap();

        assert!(staged.endpoints.is_empty());
        assert!(staged.branches.is_empty());
        // No skeleton pixel to snap to: the anchor stays at the center.
        assert_eq!(staged.anchor, GridPoint::new(32, 32));
        assert!((staged.scores.max_score() - 0.0).abs() < EPS);
    }

    #[test]
    fn default_anchor_is_grid_center() {
        let mask = bar_mask();
        let explicit = analyze(&mask, Some(GridPoint::new(100, 100)), &config(50)).unwrap();
        let defaulted = analyze(&mask, None, &config(50)).unwrap();
        assert_eq!(explicit, defaulted);
    }

    #[test]
    fn off_skeleton_anchor_snaps_before_scoring() {
        let mask = bar_mask();
        let staged =
            analyze_staged(&mask, Some(GridPoint::new(100, 140)), &config(50)).unwrap();

        assert_eq!(staged.anchor, GridPoint::new(100, 100));
        assert!((staged.scores.get(Direction::East) - 1.0).abs() < EPS);
    }

    #[test]
    fn anchor_outside_mask_is_rejected() {
        let mask = bar_mask();
        let result = analyze(&mask, Some(GridPoint::new(200, 10)), &config(50));

        match result {
            Err(AnalysisError::AnchorOutOfBounds {
                x,
                y,
                width,
                height,
            }) => {
                assert_eq!((x, y, width, height), (200, 10, 200, 200));
            }
            other => panic!("expected AnchorOutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_any_work() {
        let mask = bar_mask();
        let result = analyze(&mask, None, &config(0));
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn analysis_is_deterministic() {
        let mask = bar_mask();
        let first = analyze_staged(&mask, None, &config(50)).unwrap();
        let second = analyze_staged(&mask, None, &config(50)).unwrap();

        assert_eq!(first.endpoints, second.endpoints);
        assert_eq!(first.branches, second.branches);
        assert_eq!(first.anchor, second.anchor);
        assert_eq!(first.scores, second.scores);
    }

    #[test]
    fn scores_stay_within_unit_interval() {
        let mask = bar_mask();
        let scores = analyze(&mask, None, &config(50)).unwrap();
        for (direction, score) in scores.iter() {
            assert!(
                (0.0..=1.0).contains(&score),
                "{direction:?} score {score} out of bounds",
            );
        }
    }

    #[test]
    fn staged_analysis_serializes_to_json() {
        let mask = bar_mask();
        let staged = analyze_staged(&mask, None, &config(50)).unwrap();

        let json = serde_json::to_string(&staged).unwrap();
        let round_tripped: StagedAnalysis = serde_json::from_str(&json).unwrap();

        assert_eq!(round_tripped.anchor, staged.anchor);
        assert_eq!(round_tripped.scores, staged.scores);
        assert_eq!(round_tripped.skeleton.dimensions(), (200, 200));
    }
}
