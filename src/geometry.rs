//! Point and segment algebra.
//!
//! Every operation is total: invalid input (a NaN coordinate, a degenerate
//! segment, parallel lines) yields [`Point::INVALID`] or NaN instead of an
//! error, so a bad scale step or a badly fanned neck only blanks out the
//! affected geometry.

use std::fmt;

use glam::DVec2;
use serde::Serialize;

use crate::types::{DISPLAY_PRECISION, round_float};

/// Geometric tolerance in instrument units.
pub const THRESHOLD: f64 = 1e-10;

/// A 2D coordinate in instrument units
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The canonical "no such point" sentinel.
    pub const INVALID: Point = Point {
        x: f64::NAN,
        y: f64::NAN,
    };

    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// True unless either coordinate is NaN.
    pub fn is_valid(self) -> bool {
        !self.x.is_nan() && !self.y.is_nan()
    }

    #[inline]
    pub(crate) fn to_vec(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub(crate) fn from_vec(v: DVec2) -> Self {
        Point { x: v.x, y: v.y }
    }

    /// Move this point in place.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn translated(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Point halfway between `self` and `other`.
    pub fn midway(self, other: Point) -> Point {
        Point::from_vec((self.to_vec() + other.to_vec()) * 0.5)
    }

    /// Euclidean distance.
    pub fn distance(self, other: Point) -> f64 {
        self.to_vec().distance(other.to_vec())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})",
            round_float(self.x, DISPLAY_PRECISION),
            round_float(self.y, DISPLAY_PRECISION)
        )
    }
}

/// A directed segment `end1 -> end2`.
///
/// Used both as a bounded segment (length, ratios) and as the infinite line
/// through its endpoints ([`Segment::intersect`], [`Segment::distance_to_point`]).
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Segment {
    pub end1: Point,
    pub end2: Point,
}

impl Segment {
    pub const INVALID: Segment = Segment {
        end1: Point::INVALID,
        end2: Point::INVALID,
    };

    pub const fn new(end1: Point, end2: Point) -> Self {
        Segment { end1, end2 }
    }

    /// Zero-length segment at `p`.
    pub const fn at(p: Point) -> Self {
        Segment { end1: p, end2: p }
    }

    #[inline]
    fn delta(&self) -> DVec2 {
        self.end2.to_vec() - self.end1.to_vec()
    }

    pub fn delta_x(&self) -> f64 {
        self.end2.x - self.end1.x
    }

    pub fn delta_y(&self) -> f64 {
        self.end2.y - self.end1.y
    }

    /// Rise over run; NaN for vertical or invalid segments.
    pub fn slope(&self) -> f64 {
        let dx = self.delta_x();
        if dx == 0.0 || dx.is_nan() {
            return f64::NAN;
        }
        self.delta_y() / dx
    }

    /// y-intercept of the infinite line; NaN when the slope is.
    pub fn intercept(&self) -> f64 {
        let s = self.slope();
        if s.is_nan() {
            return f64::NAN;
        }
        self.end2.y - self.end2.x * s
    }

    pub fn length(&self) -> f64 {
        self.delta().length()
    }

    /// Direction in degrees, `atan2` convention.
    pub fn angle(&self) -> f64 {
        self.delta_y().atan2(self.delta_x()).to_degrees()
    }

    pub fn midpoint(&self) -> Point {
        self.point_at_ratio(0.5)
    }

    /// Linear interpolation from `end1` (0) to `end2` (1). Ratios outside
    /// 0..=1 extrapolate along the line.
    pub fn point_at_ratio(&self, ratio: f64) -> Point {
        Point::from_vec(self.end1.to_vec() + self.delta() * ratio)
    }

    /// Point at distance `len` from `end1` toward `end2`.
    pub fn point_at_length(&self, len: f64) -> Point {
        if len.is_nan() {
            return Point::INVALID;
        }
        let current = self.length();
        if current == 0.0 {
            return if len == 0.0 { self.end1 } else { Point::INVALID };
        }
        self.point_at_ratio(len / current)
    }

    /// Segment from `point` with the same direction vector as `self`.
    pub fn create_parallel(&self, point: Point) -> Segment {
        Segment::new(point, Point::from_vec(point.to_vec() + self.delta()))
    }

    /// Crossing point of the infinite lines through `self` and `other`.
    ///
    /// Returns [`Point::INVALID`] for parallel or collinear lines and for any
    /// NaN endpoint.
    pub fn intersect(&self, other: &Segment) -> Point {
        let p1 = self.end1.to_vec();
        let d1 = self.delta();
        let p3 = other.end1.to_vec();
        let d2 = other.delta();

        let denom = d1.perp_dot(d2);
        if denom == 0.0 || denom.is_nan() {
            return Point::INVALID;
        }

        let ua = d2.perp_dot(p1 - p3) / denom;
        let hit = Point::from_vec(p1 + d1 * ua);
        if hit.is_valid() { hit } else { Point::INVALID }
    }

    /// Perpendicular distance from `point` to the infinite line through this
    /// segment. A zero-length segment measures straight to its endpoint.
    pub fn distance_to_point(&self, point: Point) -> f64 {
        let len = self.length();
        if len == 0.0 {
            return self.end1.distance(point);
        }
        self.delta()
            .perp_dot(self.end1.to_vec() - point.to_vec())
            .abs()
            / len
    }

    /// Move both endpoints in place. NaN offsets are ignored.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        if dx.is_nan() || dy.is_nan() {
            return;
        }
        self.end1.translate(dx, dy);
        self.end2.translate(dx, dy);
    }

    /// Both endpoints coincide exactly.
    pub fn is_degenerate(&self) -> bool {
        self.end1 == self.end2
    }

    /// True when either endpoint is invalid.
    pub fn is_invalid(&self) -> bool {
        !self.end1.is_valid() || !self.end2.is_valid()
    }

    /// SVG path data `M x1 y1L x2 y2`, rounded for display.
    pub fn to_svg_path(&self) -> String {
        if self.is_invalid() {
            return "M0 0L0 0".to_string();
        }
        let r = |v: f64| round_float(v, DISPLAY_PRECISION);
        format!(
            "M{} {}L{} {}",
            r(self.end1.x),
            r(self.end1.y),
            r(self.end2.x),
            r(self.end2.y)
        )
    }
}

/// Segments are equal when they share endpoints in either order.
impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        (self.end1 == other.end1 && self.end2 == other.end2)
            || (self.end1 == other.end2 && self.end2 == other.end1)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.end1, self.end2)
    }
}
