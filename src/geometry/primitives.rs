//! Planar geometry primitives: coordinates, envelopes, lines and polygons.
//!
//! Coordinates are 2D with an optional elevation carried in `z`; a missing
//! elevation is `NaN`. All measures (length, area, envelopes) are planar and
//! ignore `z`.

use std::cmp::Ordering;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A vertex with optional elevation (`z` is `NaN` when unknown).
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coord {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A coordinate without elevation.
    #[inline]
    pub const fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: f64::NAN }
    }

    #[inline]
    pub fn has_z(&self) -> bool {
        !self.z.is_nan()
    }

    #[inline]
    pub fn equals_2d(&self, other: &Coord) -> bool {
        self.x == other.x && self.y == other.y
    }

    #[inline]
    pub fn distance(&self, other: &Coord) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Lexicographic order on `(x, y)`.
    pub fn compare_2d(&self, other: &Coord) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

/// Equality on all three ordinates, where two unknown elevations are equal.
impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.equals_2d(other) && (self.z == other.z || (self.z.is_nan() && other.z.is_nan()))
    }
}

// -----------------------------------------------------------------------------
// Envelope
// -----------------------------------------------------------------------------

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn of_point(c: &Coord) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    /// Envelope of a coordinate sequence; `None` when it is empty.
    pub fn of(coords: &[Coord]) -> Option<Self> {
        let (first, rest) = coords.split_first()?;
        let mut env = Self::of_point(first);
        for c in rest {
            env.expand_to_include(c);
        }
        Some(env)
    }

    pub fn expand_to_include(&mut self, c: &Coord) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    #[inline]
    pub fn intersects(&self, other: &Envelope) -> bool {
        !(other.min_x > self.max_x
            || other.max_x < self.min_x
            || other.min_y > self.max_y
            || other.max_y < self.min_y)
    }

    /// `true` if `other` lies inside `self`, boundary included.
    #[inline]
    pub fn contains(&self, other: &Envelope) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    #[inline]
    pub fn contains_point(&self, c: &Coord) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }
}

// -----------------------------------------------------------------------------
// LineString
// -----------------------------------------------------------------------------

/// An ordered polyline. Its orientation is the digitized flow direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineString(pub Vec<Coord>);

impl LineString {
    pub fn new(coords: Vec<Coord>) -> Self {
        Self(coords)
    }

    /// Builds a 2D line from `(x, y)` pairs.
    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self(points.iter().map(|&(x, y)| Coord::xy(x, y)).collect())
    }

    /// Builds a line from `(x, y, z)` triples.
    pub fn from_xyz(points: &[(f64, f64, f64)]) -> Self {
        Self(points.iter().map(|&(x, y, z)| Coord::new(x, y, z)).collect())
    }

    #[inline]
    pub fn coords(&self) -> &[Coord] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn first(&self) -> Option<&Coord> {
        self.0.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&Coord> {
        self.0.last()
    }

    /// Planar length.
    pub fn length(&self) -> f64 {
        self.0
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.distance(b))
            .sum()
    }

    pub fn envelope(&self) -> Option<Envelope> {
        Envelope::of(&self.0)
    }

    pub fn reversed(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }

    /// Canonical orientation: the line is reversed if its first vertex that
    /// differs from its mirror vertex compares greater in `(x, y)` order.
    pub fn normalized(&self) -> Self {
        let n = self.0.len();
        for i in 0..n / 2 {
            let j = n - 1 - i;
            if !self.0[i].equals_2d(&self.0[j]) {
                if self.0[i].compare_2d(&self.0[j]) == Ordering::Greater {
                    return self.reversed();
                }
                break;
            }
        }
        self.clone()
    }
}

// -----------------------------------------------------------------------------
// Polygon and Geometry
// -----------------------------------------------------------------------------

/// A polygon with closed rings: the exterior is counter-clockwise, holes are
/// clockwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Coord>,
    pub holes: Vec<Vec<Coord>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Coord>, holes: Vec<Vec<Coord>>) -> Self {
        Self { exterior, holes }
    }

    pub fn envelope(&self) -> Option<Envelope> {
        Envelope::of(&self.exterior)
    }
}

/// Geometry carried by a feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Coord),
    LineString(LineString),
    Polygon(Polygon),
}

impl Geometry {
    pub fn envelope(&self) -> Option<Envelope> {
        match self {
            Geometry::Point(c) => Some(Envelope::of_point(c)),
            Geometry::LineString(l) => l.envelope(),
            Geometry::Polygon(p) => p.envelope(),
        }
    }

    pub fn as_line(&self) -> Option<&LineString> {
        match self {
            Geometry::LineString(l) => Some(l),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
        }
    }
}

impl From<Coord> for Geometry {
    fn from(c: Coord) -> Self {
        Geometry::Point(c)
    }
}

impl From<LineString> for Geometry {
    fn from(l: LineString) -> Self {
        Geometry::LineString(l)
    }
}

impl From<Polygon> for Geometry {
    fn from(p: Polygon) -> Self {
        Geometry::Polygon(p)
    }
}
