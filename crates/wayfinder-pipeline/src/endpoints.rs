//! Endpoint detection: find skeleton pixels with exactly one neighbor.
//!
//! An endpoint is a dead end of the road network. Its 3x3 neighborhood,
//! clipped at grid boundaries, contains exactly 2 set pixels: the pixel
//! itself plus one neighbor. Isolated pixels (count 1) and interior or
//! junction pixels (count 3+) are not endpoints.

use image::GrayImage;

use crate::morphology::is_set;
use crate::types::GridPoint;

/// Find all topological endpoints of a skeleton grid.
///
/// Returned in row-major scan order (top to bottom, left to right).
/// That order is the iteration order of
/// [`trace_branches`](crate::branches::trace_branches), so it is part of
/// the deterministic contract, not an incidental detail.
#[must_use = "returns the detected endpoints"]
pub fn find_endpoints(skeleton: &GrayImage) -> Vec<GridPoint> {
    let (width, height) = skeleton.dimensions();
    let mut endpoints = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if is_set(skeleton, x, y) && neighborhood_count(skeleton, x, y) == 2 {
                endpoints.push(GridPoint::new(x, y));
            }
        }
    }

    endpoints
}

/// Count set pixels in the clipped 3x3 neighborhood of `(x, y)`,
/// including the center pixel itself.
fn neighborhood_count(skeleton: &GrayImage, x: u32, y: u32) -> u32 {
    let (width, height) = skeleton.dimensions();
    let x1 = (x + 1).min(width - 1);
    let y1 = (y + 1).min(height - 1);

    let mut count = 0;
    for ny in y.saturating_sub(1)..=y1 {
        for nx in x.saturating_sub(1)..=x1 {
            if is_set(skeleton, nx, ny) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn skeleton_from_coords(width: u32, height: u32, coords: &[(u32, u32)]) -> GrayImage {
        let mut grid = GrayImage::new(width, height);
        for &(x, y) in coords {
            grid.put_pixel(x, y, Luma([255]));
        }
        grid
    }

    #[test]
    fn empty_skeleton_has_no_endpoints() {
        let skeleton = GrayImage::new(20, 20);
        assert!(find_endpoints(&skeleton).is_empty());
    }

    #[test]
    fn straight_line_has_exactly_two_endpoints() {
        let coords: Vec<(u32, u32)> = (3..=15).map(|x| (x, 8)).collect();
        let skeleton = skeleton_from_coords(20, 20, &coords);

        let endpoints = find_endpoints(&skeleton);
        assert_eq!(endpoints, vec![GridPoint::new(3, 8), GridPoint::new(15, 8)]);
    }

    #[test]
    fn isolated_pixel_is_not_an_endpoint() {
        let skeleton = skeleton_from_coords(10, 10, &[(5, 5)]);
        assert!(find_endpoints(&skeleton).is_empty());
    }

    #[test]
    fn diagonal_line_endpoints() {
        let coords: Vec<(u32, u32)> = (2..=9).map(|i| (i, i)).collect();
        let skeleton = skeleton_from_coords(12, 12, &coords);

        let endpoints = find_endpoints(&skeleton);
        assert_eq!(endpoints, vec![GridPoint::new(2, 2), GridPoint::new(9, 9)]);
    }

    #[test]
    fn line_touching_grid_border_still_has_endpoints() {
        // Clipped neighborhood at (0, 0) is 2x2; the count rule works
        // unchanged.
        let coords: Vec<(u32, u32)> = (0..=6).map(|x| (x, 0)).collect();
        let skeleton = skeleton_from_coords(8, 8, &coords);

        let endpoints = find_endpoints(&skeleton);
        assert_eq!(endpoints, vec![GridPoint::new(0, 0), GridPoint::new(6, 0)]);
    }

    #[test]
    fn cross_has_four_endpoints_and_no_junction_endpoint() {
        let mut coords: Vec<(u32, u32)> = (2..=18).map(|x| (x, 10)).collect();
        coords.extend((2..=18).map(|y| (10, y)));
        let skeleton = skeleton_from_coords(21, 21, &coords);

        let endpoints = find_endpoints(&skeleton);
        assert_eq!(
            endpoints,
            vec![
                GridPoint::new(10, 2),
                GridPoint::new(2, 10),
                GridPoint::new(18, 10),
                GridPoint::new(10, 18),
            ],
        );
    }

    #[test]
    fn two_pixel_segment_yields_both_as_endpoints() {
        let skeleton = skeleton_from_coords(10, 10, &[(4, 4), (5, 4)]);
        let endpoints = find_endpoints(&skeleton);
        assert_eq!(endpoints, vec![GridPoint::new(4, 4), GridPoint::new(5, 4)]);
    }
}
