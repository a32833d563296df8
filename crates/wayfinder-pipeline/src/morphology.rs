//! 3x3 binary morphology on grayscale grids.
//!
//! Pixels are treated as binary with threshold `> 0`. Outputs are 0 or
//! 255. Out-of-bounds neighbors count as unset, so erosion always strips
//! the outermost pixel layer, including pixels on the grid border.

use image::{GrayImage, Luma};

/// Pixel value for a set cell in stage outputs.
pub(crate) const SET: u8 = 255;

/// Whether the cell at `(x, y)` is set (nonzero).
#[inline]
pub(crate) fn is_set(grid: &GrayImage, x: u32, y: u32) -> bool {
    grid.get_pixel(x, y).0[0] != 0
}

/// Number of set cells in the grid.
#[must_use]
pub fn count_set(grid: &GrayImage) -> u64 {
    grid.pixels().map(|p| u64::from(u8::from(p.0[0] != 0))).sum()
}

/// Erode by one 3x3 structuring-element step.
///
/// A pixel survives only if its full 3x3 neighborhood is in bounds and
/// set, so the output border is always unset and a nonempty grid always
/// shrinks.
#[must_use = "returns the eroded grid"]
pub fn erode(src: &GrayImage) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut out = GrayImage::new(width, height);
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        'pixels: for x in 1..width - 1 {
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    if !is_set(src, nx, ny) {
                        continue 'pixels;
                    }
                }
            }
            out.put_pixel(x, y, Luma([SET]));
        }
    }
    out
}

/// Dilate by one 3x3 structuring-element step.
///
/// A pixel is set when any cell of its clipped 3x3 neighborhood is set.
#[must_use = "returns the dilated grid"]
pub fn dilate(src: &GrayImage) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    for y in 0..height {
        for x in 0..width {
            let x1 = (x + 1).min(width - 1);
            let y1 = (y + 1).min(height - 1);
            let mut any_set = false;
            'scan: for ny in y.saturating_sub(1)..=y1 {
                for nx in x.saturating_sub(1)..=x1 {
                    if is_set(src, nx, ny) {
                        any_set = true;
                        break 'scan;
                    }
                }
            }
            if any_set {
                out.put_pixel(x, y, Luma([SET]));
            }
        }
    }
    out
}

/// Morphological opening: erosion followed by dilation.
///
/// Removes structures too thin to survive erosion while restoring the
/// extent of everything that did.
#[must_use = "returns the opened grid"]
pub fn open(src: &GrayImage) -> GrayImage {
    dilate(&erode(src))
}
