//! Nearest-point search: snap an arbitrary query onto the skeleton.
//!
//! Brute force over every set skeleton pixel. Iteration count grows with
//! image size and pixel density, so callers wrapping the analysis in a
//! service layer are responsible for imposing time budgets.

use image::GrayImage;

use crate::morphology::is_set;
use crate::types::GridPoint;

/// The skeleton pixel closest to `query` by Euclidean distance.
///
/// Ties break by row-major scan order: the first minimum encountered
/// wins. If the skeleton has no set pixels, the query point is returned
/// unchanged; that is a documented fallback, not an error.
#[must_use = "returns the snapped point"]
pub fn nearest_on_skeleton(skeleton: &GrayImage, query: GridPoint) -> GridPoint {
    let (width, height) = skeleton.dimensions();
    let mut nearest = query;
    let mut min_distance = f64::INFINITY;

    for y in 0..height {
        for x in 0..width {
            if !is_set(skeleton, x, y) {
                continue;
            }
            let candidate = GridPoint::new(x, y);
            let distance = query.distance(candidate);
            if distance < min_distance {
                min_distance = distance;
                nearest = candidate;
            }
        }
    }

    nearest
}
