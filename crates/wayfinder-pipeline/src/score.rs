//! Direction scoring: accumulate per-compass confidence from branches.
//!
//! Each branch is reduced to the displacement from the anchor to its far
//! end. A branch contributes to every canonical direction within the
//! angular acceptance window of that displacement, weighted by how close
//! the angles match, how near the branch terminus is, and how long the
//! branch runs relative to the configured minimum. Per direction, the
//! best-matching branch wins; the rest are ignored for that direction.
//!
//! The final map is rescaled so the strongest direction reads exactly
//! 1.0. When no branch falls inside any window the map stays all-zero;
//! the rescale guard is the only thing standing between that case and a
//! division by zero, so it must remain.

use std::f64::consts::PI;

use crate::types::{AnalyzerConfig, Branch, Direction, DirectionScores, GridPoint};

/// Score the eight canonical directions from `anchor` given the retained
/// branches.
///
/// `config.min_branch_length` is assumed validated (nonzero); it is the
/// denominator of each branch's length factor.
#[must_use = "returns the direction score map"]
#[allow(clippy::cast_precision_loss)]
pub fn score_directions(
    branches: &[Branch],
    anchor: GridPoint,
    config: &AnalyzerConfig,
) -> DirectionScores {
    let mut scores = DirectionScores::default();

    for branch in branches {
        let Some(&end) = branch.last() else {
            continue;
        };

        let dx = f64::from(end.x) - f64::from(anchor.x);
        let dy = f64::from(end.y) - f64::from(anchor.y);
        let branch_angle = dy.atan2(dx);

        let distance = dx.hypot(dy);
        let distance_weight = 1.0 / (1.0 + distance / config.distance_decay);
        let length_factor = branch.len() as f64 / f64::from(config.min_branch_length);

        for direction in Direction::ALL {
            let angle_diff = angular_difference(branch_angle, direction.angle());
            if angle_diff < config.angular_window {
                let candidate =
                    (1.0 - angle_diff / config.angular_window) * distance_weight * length_factor;
                scores.max_combine(direction, candidate);
            }
        }
    }

    scores.rescale_to_unit_max();
    scores
}

/// Absolute angular difference between two angles, in `[0, pi]`.
///
/// The raw difference is wrapped into `[-pi, pi]` by repeated full-turn
/// adjustment before taking the absolute value.
#[must_use]
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let mut diff = a - b;
    while diff > PI {
        diff -= 2.0 * PI;
    }
    while diff < -PI {
        diff += 2.0 * PI;
    }
    diff.abs()
}
