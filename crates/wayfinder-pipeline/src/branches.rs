//! Branch tracing: materialize ordered walks from skeleton endpoints.
//!
//! Starting at each endpoint, the tracer greedily follows the first
//! unvisited skeleton neighbor in a fixed row-major scan over the 3x3
//! window. There is no backtracking and no lookahead: at a junction the
//! walk takes whichever arm scans first, not the geometrically
//! straightest one. This order dependence is part of the contract;
//! "fixing" it changes downstream direction scores.
//!
//! Visited state is a single grid scoped to one `trace_branches` call,
//! shared across all branches of that call. Discarded short branches
//! keep their pixels marked, so no later branch can reuse them, and an
//! endpoint consumed by an earlier walk starts no branch of its own.

use image::GrayImage;

use crate::morphology::is_set;
use crate::types::{Branch, GridPoint};

/// The eight neighbor offsets in row-major scan order over the 3x3
/// window. The tracer's tie-break rule at junctions is exactly this
/// order.
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Per-call bookkeeping of which skeleton pixels a walk has consumed.
struct Visited {
    width: u32,
    cells: Vec<bool>,
}

impl Visited {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            cells: vec![false; width as usize * height as usize],
        }
    }

    fn get(&self, p: GridPoint) -> bool {
        self.cells[p.y as usize * self.width as usize + p.x as usize]
    }

    fn mark(&mut self, p: GridPoint) {
        self.cells[p.y as usize * self.width as usize + p.x as usize] = true;
    }
}

/// Trace branches from each endpoint of a skeleton.
///
/// Endpoints are processed in slice order, which
/// [`find_endpoints`](crate::endpoints::find_endpoints) guarantees to be
/// row-major discovery order. Branches with fewer than
/// `min_branch_length` points are discarded but still consume their
/// pixels. Endpoints lying outside the skeleton grid are ignored.
#[must_use = "returns the retained branches"]
pub fn trace_branches(
    skeleton: &GrayImage,
    endpoints: &[GridPoint],
    min_branch_length: u32,
) -> Vec<Branch> {
    let (width, height) = skeleton.dimensions();
    let min_len = usize::try_from(min_branch_length).unwrap_or(usize::MAX);
    let mut visited = Visited::new(width, height);
    let mut branches = Vec::new();

    for &endpoint in endpoints {
        if endpoint.x >= width || endpoint.y >= height || visited.get(endpoint) {
            continue;
        }

        let mut points = Vec::new();
        let mut current = endpoint;
        loop {
            points.push(current);
            visited.mark(current);
            match first_unvisited_neighbor(skeleton, &visited, current) {
                Some(next) => current = next,
                None => break,
            }
        }

        if points.len() >= min_len {
            branches.push(Branch::new(points));
        }
    }

    branches
}

/// The first set, unvisited neighbor of `p` in fixed scan order, if any.
fn first_unvisited_neighbor(
    skeleton: &GrayImage,
    visited: &Visited,
    p: GridPoint,
) -> Option<GridPoint> {
    let (width, height) = skeleton.dimensions();

    for (dx, dy) in NEIGHBOR_OFFSETS {
        let Ok(nx) = u32::try_from(i64::from(p.x) + dx) else {
            continue;
        };
        let Ok(ny) = u32::try_from(i64::from(p.y) + dy) else {
            continue;
        };
        if nx >= width || ny >= height {
            continue;
        }

        let neighbor = GridPoint::new(nx, ny);
        if is_set(skeleton, nx, ny) && !visited.get(neighbor) {
            return Some(neighbor);
        }
    }

    None
}
