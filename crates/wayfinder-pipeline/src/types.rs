//! Shared types for the wayfinder direction-analysis pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference mask and
/// skeleton grids without depending on `image` directly.
///
/// A grid cell is "set" when its value is nonzero; stage outputs use
/// 0/255.
pub use image::GrayImage;

/// An integer pixel coordinate on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// Horizontal position (pixels from left edge).
    pub x: u32,
    /// Vertical position (pixels from top edge, y grows downward).
    pub y: u32,
}

impl GridPoint {
    /// Create a new grid point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An ordered, non-repeating walk of 8-connected skeleton pixels,
/// starting from a topological endpoint.
///
/// The first point is the endpoint the branch was traced from; the last
/// point is its far end. A branch's length is its point count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch(Vec<GridPoint>);

impl Branch {
    /// Create a new branch from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<GridPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the branch has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the branch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the endpoint the branch was traced from, if any.
    #[must_use]
    pub fn first(&self) -> Option<&GridPoint> {
        self.0.first()
    }

    /// Returns the far end of the branch, if any.
    #[must_use]
    pub fn last(&self) -> Option<&GridPoint> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[GridPoint] {
        &self.0
    }

    /// Consumes the branch and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<GridPoint> {
        self.0
    }
}

/// One of the eight canonical compass directions.
///
/// Each direction is bound to a fixed angle in radians measured from the
/// positive x-axis, clockwise-positive in image coordinates (y grows
/// downward). See [`angle`](Self::angle) for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    Northeast,
    North,
    Northwest,
    West,
    Southwest,
    South,
    Southeast,
}

impl Direction {
    /// All eight directions, in the order used to index
    /// [`DirectionScores`].
    pub const ALL: [Self; 8] = [
        Self::East,
        Self::Northeast,
        Self::North,
        Self::Northwest,
        Self::West,
        Self::Southwest,
        Self::South,
        Self::Southeast,
    ];

    /// The direction's angle in radians.
    ///
    /// Image coordinates: East = 0, angles toward North are negative
    /// (y grows downward), West = π.
    #[must_use]
    pub const fn angle(self) -> f64 {
        use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
        match self {
            Self::East => 0.0,
            Self::Northeast => -FRAC_PI_4,
            Self::North => -FRAC_PI_2,
            Self::Northwest => -3.0 * FRAC_PI_4,
            Self::West => PI,
            Self::Southwest => 3.0 * FRAC_PI_4,
            Self::South => FRAC_PI_2,
            Self::Southeast => FRAC_PI_4,
        }
    }

    /// Human-readable compass label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::East => "East",
            Self::Northeast => "Northeast",
            Self::North => "North",
            Self::Northwest => "Northwest",
            Self::West => "West",
            Self::Southwest => "Southwest",
            Self::South => "South",
            Self::Southeast => "Southeast",
        }
    }

    /// Index of this direction in [`Self::ALL`].
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::East => 0,
            Self::Northeast => 1,
            Self::North => 2,
            Self::Northwest => 3,
            Self::West => 4,
            Self::Southwest => 5,
            Self::South => 6,
            Self::Southeast => 7,
        }
    }
}

/// Normalized confidence per compass direction, each in `[0, 1]`.
///
/// All eight directions are always present. After a successful analysis
/// the strongest direction reads exactly 1.0; when no branch qualifies,
/// every score is 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DirectionScores([f64; 8]);

impl DirectionScores {
    /// The score for a single direction.
    #[must_use]
    pub const fn get(self, direction: Direction) -> f64 {
        self.0[direction.index()]
    }

    /// Iterate over all `(direction, score)` pairs in [`Direction::ALL`]
    /// order.
    pub fn iter(self) -> impl Iterator<Item = (Direction, f64)> {
        Direction::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    /// The largest score across all directions.
    #[must_use]
    pub fn max_score(self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    /// Directions whose score exceeds `cutoff`, in [`Direction::ALL`]
    /// order.
    #[must_use]
    pub fn detected(self, cutoff: f64) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.get(*d) > cutoff)
            .collect()
    }

    /// Raise a direction's score to `candidate` if it beats the current
    /// value. Branches compete per direction; the best match wins.
    pub(crate) fn max_combine(&mut self, direction: Direction, candidate: f64) {
        let current = self.0[direction.index()];
        if candidate > current {
            self.0[direction.index()] = candidate;
        }
    }

    /// Rescale so the strongest direction reads 1.0.
    ///
    /// Skipped when every score is zero, so an all-zero map stays
    /// all-zero.
    pub(crate) fn rescale_to_unit_max(&mut self) {
        let max = self.max_score();
        if max > 0.0 {
            for score in &mut self.0 {
                *score /= max;
            }
        }
    }
}

/// Serde-compatible proxy for `DirectionScores`.
///
/// Serializes as a map with one named field per compass direction rather
/// than a bare array, so JSON consumers see labels instead of positions.
#[derive(Serialize, Deserialize)]
struct DirectionScoresProxy {
    east: f64,
    northeast: f64,
    north: f64,
    northwest: f64,
    west: f64,
    southwest: f64,
    south: f64,
    southeast: f64,
}

impl Serialize for DirectionScores {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = DirectionScoresProxy {
            east: self.get(Direction::East),
            northeast: self.get(Direction::Northeast),
            north: self.get(Direction::North),
            northwest: self.get(Direction::Northwest),
            west: self.get(Direction::West),
            southwest: self.get(Direction::Southwest),
            south: self.get(Direction::South),
            southeast: self.get(Direction::Southeast),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DirectionScores {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = DirectionScoresProxy::deserialize(deserializer)?;
        Ok(Self([
            proxy.east,
            proxy.northeast,
            proxy.north,
            proxy.northwest,
            proxy.west,
            proxy.southwest,
            proxy.south,
            proxy.southeast,
        ]))
    }
}

/// Configuration for the direction analysis.
///
/// All parameters have defaults matching the reference behavior. The
/// angular window and distance decay are fixed policy in practice but
/// stay configurable for testability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Minimum branch pixel count to retain. Shorter branches are
    /// discarded, but their pixels stay consumed by the tracer.
    ///
    /// Expressed in pixels, not a resolution-independent unit; masks of
    /// very different sizes may want a different value.
    pub min_branch_length: u32,

    /// Half-width of the angular acceptance window in radians. A branch
    /// contributes to a direction only when its angle differs by less
    /// than this. Must lie in `(0, π]`.
    pub angular_window: f64,

    /// Distance decay constant in pixels. A branch terminus at distance
    /// `d` from the anchor is weighted by `1 / (1 + d / decay)`.
    /// Must be finite and positive.
    pub distance_decay: f64,
}

impl AnalyzerConfig {
    /// Default minimum branch length in pixels.
    pub const DEFAULT_MIN_BRANCH_LENGTH: u32 = 100;
    /// Default angular acceptance window (45 degrees).
    pub const DEFAULT_ANGULAR_WINDOW: f64 = std::f64::consts::FRAC_PI_4;
    /// Default distance decay constant in pixels.
    pub const DEFAULT_DISTANCE_DECAY: f64 = 100.0;

    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] when `min_branch_length`
    /// is zero, `angular_window` is outside `(0, π]`, or
    /// `distance_decay` is not finite and positive.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.min_branch_length == 0 {
            return Err(AnalysisError::InvalidConfig(
                "min_branch_length must be at least 1".to_string(),
            ));
        }
        if !(self.angular_window > 0.0 && self.angular_window <= std::f64::consts::PI) {
            return Err(AnalysisError::InvalidConfig(format!(
                "angular_window must be in (0, pi], got {}",
                self.angular_window,
            )));
        }
        if !(self.distance_decay.is_finite() && self.distance_decay > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "distance_decay must be finite and positive, got {}",
                self.distance_decay,
            )));
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_branch_length: Self::DEFAULT_MIN_BRANCH_LENGTH,
            angular_window: Self::DEFAULT_ANGULAR_WINDOW,
            distance_decay: Self::DEFAULT_DISTANCE_DECAY,
        }
    }
}

/// Result of a full analysis with all intermediate stage outputs
/// preserved.
///
/// External visualizers need the skeleton grid and branch geometry
/// alongside the scores to draw overlays; callers that only need the
/// score map should prefer [`analyze`](crate::analyze).
///
/// Uses custom `Serialize`/`Deserialize` implementations because
/// `GrayImage` (from the `image` crate) does not implement serde traits.
/// The skeleton is serialized as a `(width, height, raw_pixels)` tuple.
#[derive(Debug, Clone)]
pub struct StagedAnalysis {
    /// Thinned 1-pixel-wide centerline grid (0/255).
    pub skeleton: GrayImage,
    /// Topological endpoints, in row-major discovery order.
    pub endpoints: Vec<GridPoint>,
    /// Retained branches, in tracing order.
    pub branches: Vec<Branch>,
    /// The anchor after snapping to the nearest skeleton pixel.
    pub anchor: GridPoint,
    /// Normalized per-direction confidence scores.
    pub scores: DirectionScores,
}

/// Serde-compatible proxy for `StagedAnalysis`.
///
/// The skeleton grid is represented as `(width, height, raw_pixel_bytes)`
/// since `image::ImageBuffer` does not implement serde traits.
#[derive(Serialize, Deserialize)]
struct StagedAnalysisProxy {
    skeleton: (u32, u32, Vec<u8>),
    endpoints: Vec<GridPoint>,
    branches: Vec<Branch>,
    anchor: GridPoint,
    scores: DirectionScores,
}

impl Serialize for StagedAnalysis {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = StagedAnalysisProxy {
            skeleton: (
                self.skeleton.width(),
                self.skeleton.height(),
                self.skeleton.as_raw().clone(),
            ),
            endpoints: self.endpoints.clone(),
            branches: self.branches.clone(),
            anchor: self.anchor,
            scores: self.scores,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StagedAnalysis {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = StagedAnalysisProxy::deserialize(deserializer)?;
        let skeleton = GrayImage::from_raw(proxy.skeleton.0, proxy.skeleton.1, proxy.skeleton.2)
            .ok_or_else(|| serde::de::Error::custom("invalid skeleton image dimensions"))?;
        Ok(Self {
            skeleton,
            endpoints: proxy.endpoints,
            branches: proxy.branches,
            anchor: proxy.anchor,
            scores: proxy.scores,
        })
    }
}

/// Errors that can occur during direction analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Analyzer configuration is invalid.
    #[error("invalid analyzer configuration: {0}")]
    InvalidConfig(String),

    /// A caller-supplied anchor point lies outside the mask grid.
    #[error("anchor ({x}, {y}) is outside the {width}x{height} mask")]
    AnchorOutOfBounds {
        /// Anchor x coordinate.
        x: u32,
        /// Anchor y coordinate.
        y: u32,
        /// Mask width in pixels.
        width: u32,
        /// Mask height in pixels.
        height: u32,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    // --- GridPoint tests ---

    #[test]
    fn grid_point_distance() {
        let a = GridPoint::new(0, 0);
        let b = GridPoint::new(3, 4);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grid_point_distance_is_symmetric() {
        let a = GridPoint::new(1, 9);
        let b = GridPoint::new(7, 2);
        assert!((a.distance(b) - b.distance(a)).abs() < f64::EPSILON);
    }

    #[test]
    fn grid_point_distance_to_self_is_zero() {
        let p = GridPoint::new(11, 7);
        assert!(p.distance(p).abs() < f64::EPSILON);
    }

    // --- Branch tests ---

    #[test]
    fn branch_first_and_last() {
        let branch = Branch::new(vec![
            GridPoint::new(1, 2),
            GridPoint::new(2, 2),
            GridPoint::new(3, 3),
        ]);
        assert_eq!(branch.len(), 3);
        assert_eq!(branch.first(), Some(&GridPoint::new(1, 2)));
        assert_eq!(branch.last(), Some(&GridPoint::new(3, 3)));
    }

    #[test]
    fn branch_empty() {
        let branch = Branch::new(vec![]);
        assert!(branch.is_empty());
        assert!(branch.first().is_none());
        assert!(branch.last().is_none());
    }

    // --- Direction tests ---

    #[test]
    fn direction_all_has_eight_unique_variants() {
        let mut seen = std::collections::HashSet::new();
        for d in Direction::ALL {
            assert!(seen.insert(d), "duplicate direction {d:?}");
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn direction_angles_match_table() {
        assert!((Direction::East.angle() - 0.0).abs() < f64::EPSILON);
        assert!((Direction::Northeast.angle() + FRAC_PI_4).abs() < f64::EPSILON);
        assert!((Direction::North.angle() + FRAC_PI_2).abs() < f64::EPSILON);
        assert!((Direction::West.angle() - PI).abs() < f64::EPSILON);
        assert!((Direction::South.angle() - FRAC_PI_2).abs() < f64::EPSILON);
        assert!((Direction::Southwest.angle() - 3.0 * FRAC_PI_4).abs() < f64::EPSILON);
    }

    #[test]
    fn direction_index_matches_all_order() {
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
        }
    }

    #[test]
    fn direction_labels() {
        assert_eq!(Direction::Northwest.label(), "Northwest");
        assert_eq!(Direction::East.label(), "East");
    }

    // --- DirectionScores tests ---

    #[test]
    fn scores_default_to_zero() {
        let scores = DirectionScores::default();
        for (_, score) in scores.iter() {
            assert!((score - 0.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn max_combine_keeps_best() {
        let mut scores = DirectionScores::default();
        scores.max_combine(Direction::North, 0.5);
        scores.max_combine(Direction::North, 0.3);
        assert!((scores.get(Direction::North) - 0.5).abs() < f64::EPSILON);
        scores.max_combine(Direction::North, 0.8);
        assert!((scores.get(Direction::North) - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn rescale_makes_max_exactly_one() {
        let mut scores = DirectionScores::default();
        scores.max_combine(Direction::East, 2.0);
        scores.max_combine(Direction::South, 1.0);
        scores.rescale_to_unit_max();
        assert!((scores.get(Direction::East) - 1.0).abs() < f64::EPSILON);
        assert!((scores.get(Direction::South) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rescale_leaves_all_zero_untouched() {
        let mut scores = DirectionScores::default();
        scores.rescale_to_unit_max();
        assert!((scores.max_score() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detected_filters_by_cutoff() {
        let mut scores = DirectionScores::default();
        scores.max_combine(Direction::East, 1.0);
        scores.max_combine(Direction::West, 0.15);
        assert_eq!(scores.detected(0.2), vec![Direction::East]);
        assert_eq!(scores.detected(0.1), vec![Direction::East, Direction::West]);
    }

    #[test]
    fn scores_serde_round_trip() {
        let mut scores = DirectionScores::default();
        scores.max_combine(Direction::Northwest, 0.75);
        scores.max_combine(Direction::South, 1.0);
        let json = serde_json::to_string(&scores).unwrap();
        let deserialized: DirectionScores = serde_json::from_str(&json).unwrap();
        assert_eq!(scores, deserialized);
        assert!(json.contains("\"northwest\""));
    }

    // --- AnalyzerConfig tests ---

    #[test]
    fn config_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.min_branch_length, 100);
        assert!((config.angular_window - FRAC_PI_4).abs() < f64::EPSILON);
        assert!((config.distance_decay - 100.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_zero_min_branch_length() {
        let config = AnalyzerConfig {
            min_branch_length: 0,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_rejects_bad_angular_window() {
        for window in [0.0, -1.0, 4.0, f64::NAN] {
            let config = AnalyzerConfig {
                angular_window: window,
                ..AnalyzerConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))),
                "window {window} should be rejected",
            );
        }
    }

    #[test]
    fn config_rejects_bad_distance_decay() {
        for decay in [0.0, -5.0, f64::INFINITY, f64::NAN] {
            let config = AnalyzerConfig {
                distance_decay: decay,
                ..AnalyzerConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))),
                "decay {decay} should be rejected",
            );
        }
    }

    #[test]
    fn config_serde_round_trip() {
        let config = AnalyzerConfig {
            min_branch_length: 42,
            angular_window: 0.5,
            distance_decay: 250.0,
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    // --- StagedAnalysis serde ---

    #[test]
    fn staged_analysis_serde_round_trip() {
        let mut skeleton = GrayImage::new(4, 4);
        skeleton.put_pixel(1, 1, image::Luma([255]));
        skeleton.put_pixel(2, 1, image::Luma([255]));

        let staged = StagedAnalysis {
            skeleton,
            endpoints: vec![GridPoint::new(1, 1), GridPoint::new(2, 1)],
            branches: vec![Branch::new(vec![GridPoint::new(1, 1), GridPoint::new(2, 1)])],
            anchor: GridPoint::new(1, 1),
            scores: DirectionScores::default(),
        };

        let json = serde_json::to_string(&staged).unwrap();
        let deserialized: StagedAnalysis = serde_json::from_str(&json).unwrap();

        assert_eq!(staged.skeleton.as_raw(), deserialized.skeleton.as_raw());
        assert_eq!(staged.endpoints, deserialized.endpoints);
        assert_eq!(staged.branches, deserialized.branches);
        assert_eq!(staged.anchor, deserialized.anchor);
        assert_eq!(staged.scores, deserialized.scores);
    }

    // --- AnalysisError tests ---

    #[test]
    fn error_invalid_config_display() {
        let err = AnalysisError::InvalidConfig("min_branch_length must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid analyzer configuration: min_branch_length must be at least 1",
        );
    }

    #[test]
    fn error_anchor_out_of_bounds_display() {
        let err = AnalysisError::AnchorOutOfBounds {
            x: 300,
            y: 10,
            width: 200,
            height: 200,
        };
        assert_eq!(err.to_string(), "anchor (300, 10) is outside the 200x200 mask");
    }
}
