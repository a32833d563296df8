//! Skeleton extraction: reduce a binary mask to a thin centerline grid.
//!
//! Iteratively erodes the mask one 3x3 step at a time. At each level the
//! pixels that a morphological opening would remove (the locally thin,
//! extremal pixels of that erosion front) are unioned into an
//! accumulator. The loop stops when the working grid is fully unset; the
//! accumulator is the skeleton.
//!
//! This extracts successive erosion fronts' extremal pixels rather than a
//! classical medial axis. Downstream endpoint and branch logic is tuned
//! to the shape this produces, so the procedure must not be swapped for a
//! different thinning algorithm.

use image::{GrayImage, Luma};

use crate::morphology::{self, SET};

/// Compute the skeleton of a binary mask.
///
/// The output has the same dimensions as the input, contains only 0/255
/// values, and every set skeleton pixel is set in the input mask. An
/// empty mask yields an empty skeleton.
///
/// Erosion treats out-of-bounds neighbors as unset, so every pass strips
/// at least the outermost pixel layer and the loop terminates after at
/// most `min(width, height) / 2 + 1` iterations.
#[must_use = "returns the skeleton grid"]
pub fn skeletonize(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut skeleton = GrayImage::new(width, height);
    let mut working = binarize(mask);

    while morphology::count_set(&working) > 0 {
        let eroded = morphology::erode(&working);
        let opened = morphology::open(&eroded);
        union_difference(&mut skeleton, &eroded, &opened);
        working = eroded;
    }

    skeleton
}

/// Copy of `mask` with every nonzero cell mapped to 255.
fn binarize(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if morphology::is_set(mask, x, y) {
            Luma([SET])
        } else {
            Luma([0])
        }
    })
}

/// Union the set-difference `eroded minus opened` into the accumulator.
fn union_difference(accumulator: &mut GrayImage, eroded: &GrayImage, opened: &GrayImage) {
    let (width, height) = eroded.dimensions();
    for y in 0..height {
        for x in 0..width {
            if morphology::is_set(eroded, x, y) && !morphology::is_set(opened, x, y) {
                accumulator.put_pixel(x, y, Luma([SET]));
            }
        }
    }
}
