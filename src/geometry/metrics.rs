//! Planar measures and predicates for rings, polygons and lines.
//!
//! Rings are closed coordinate sequences (first == last). Signed areas are
//! positive for counter-clockwise rings. Predicates are evaluated with plain
//! `f64` arithmetic; inputs are expected to be noded, so touching and
//! crossing configurations are exact in practice.

use std::f64::consts::PI;

use itertools::Itertools;

use super::primitives::{Coord, Geometry, Polygon};

/// Where a point lies relative to an areal geometry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Interior,
    Boundary,
    Exterior,
}

/// Shoelace area, positive when `ring` is counter-clockwise.
pub fn signed_ring_area(ring: &[Coord]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    // shifted to the first vertex to keep large coordinates precise
    let (x0, y0) = (ring[0].x, ring[0].y);
    let sum: f64 = ring
        .iter()
        .tuple_windows()
        .map(|(a, b)| (a.x - x0) * (b.y - y0) - (b.x - x0) * (a.y - y0))
        .sum();
    sum / 2.0
}

pub fn ring_length(ring: &[Coord]) -> f64 {
    ring.iter().tuple_windows().map(|(a, b)| a.distance(b)).sum()
}

/// Exterior area minus hole areas.
pub fn polygon_area(polygon: &Polygon) -> f64 {
    let holes: f64 = polygon
        .holes
        .iter()
        .map(|h| signed_ring_area(h).abs())
        .sum();
    signed_ring_area(&polygon.exterior).abs() - holes
}

/// Length of the exterior ring plus the lengths of all holes.
pub fn polygon_perimeter(polygon: &Polygon) -> f64 {
    ring_length(&polygon.exterior) + polygon.holes.iter().map(|h| ring_length(h)).sum::<f64>()
}

/// Isoperimetric quotient scaled to `0..=100` and floored.
///
/// A disc scores 100, a square 78, a long sliver close to 0.
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    (100.0 * area * 4.0 * PI / (perimeter * perimeter)).floor()
}

/// `true` if the polygon has no hole and no reflex exterior vertex.
pub fn is_convex(polygon: &Polygon) -> bool {
    if !polygon.holes.is_empty() {
        return false;
    }
    let mut ring: Vec<Coord> = polygon
        .exterior
        .iter()
        .copied()
        .dedup_by(|a, b| a.equals_2d(b))
        .collect();
    if ring.len() > 1 && ring[0].equals_2d(&ring[ring.len() - 1]) {
        ring.pop();
    }
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let orientation = signed_ring_area(&polygon.exterior).signum();
    (0..n).all(|i| {
        let turn = cross(&ring[(i + n - 1) % n], &ring[i], &ring[(i + 1) % n]);
        turn * orientation >= 0.0
    })
}

#[inline]
fn cross(a: &Coord, b: &Coord, c: &Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// `true` if `p` lies on the closed segment `a`-`b`.
pub fn point_on_segment(p: &Coord, a: &Coord, b: &Coord) -> bool {
    cross(a, b, p) == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Ray-crossing location of `p` with respect to a closed ring.
pub fn locate_in_ring(p: &Coord, ring: &[Coord]) -> Location {
    let mut crossings = 0usize;
    for (a, b) in ring.iter().tuple_windows() {
        if point_on_segment(p, a, b) {
            return Location::Boundary;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                crossings += 1;
            }
        }
    }
    if crossings % 2 == 1 {
        Location::Interior
    } else {
        Location::Exterior
    }
}

pub fn locate_in_polygon(p: &Coord, polygon: &Polygon) -> Location {
    match locate_in_ring(p, &polygon.exterior) {
        Location::Interior => {}
        other => return other,
    }
    for hole in &polygon.holes {
        match locate_in_ring(p, hole) {
            Location::Interior => return Location::Exterior,
            Location::Boundary => return Location::Boundary,
            Location::Exterior => {}
        }
    }
    Location::Interior
}

/// Closed-segment intersection test, touching and collinear overlap included.
pub fn segments_intersect(a1: &Coord, a2: &Coord, b1: &Coord, b2: &Coord) -> bool {
    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    point_on_segment(a1, b1, b2)
        || point_on_segment(a2, b1, b2)
        || point_on_segment(b1, a1, a2)
        || point_on_segment(b2, a1, a2)
}

/// `true` if the polyline shares at least one point with the polygon.
pub fn line_intersects_polygon(line: &[Coord], polygon: &Polygon) -> bool {
    if line
        .iter()
        .any(|c| locate_in_polygon(c, polygon) != Location::Exterior)
    {
        return true;
    }
    let rings = std::iter::once(&polygon.exterior).chain(polygon.holes.iter());
    for ring in rings {
        for (a1, a2) in line.iter().tuple_windows() {
            if ring
                .iter()
                .tuple_windows()
                .any(|(b1, b2)| segments_intersect(a1, a2, b1, b2))
            {
                return true;
            }
        }
    }
    false
}

/// Intersection test between a feature geometry and a polygon.
///
/// Areal features are compared through their exterior ring only, which is
/// enough for the boundary-adjacency queries this crate performs.
pub fn intersects_polygon(geometry: &Geometry, polygon: &Polygon) -> bool {
    let (Some(a), Some(b)) = (geometry.envelope(), polygon.envelope()) else {
        return false;
    };
    if !a.intersects(&b) {
        return false;
    }
    match geometry {
        Geometry::Point(c) => locate_in_polygon(c, polygon) != Location::Exterior,
        Geometry::LineString(l) => line_intersects_polygon(l.coords(), polygon),
        Geometry::Polygon(p) => {
            line_intersects_polygon(&p.exterior, polygon)
                || polygon
                    .exterior
                    .first()
                    .is_some_and(|c| locate_in_ring(c, &p.exterior) != Location::Exterior)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<Coord> {
        points.iter().map(|&(x, y)| Coord::xy(x, y)).collect()
    }

    fn square(x0: f64, y0: f64, side: f64) -> Vec<Coord> {
        ring(&[
            (x0, y0),
            (x0 + side, y0),
            (x0 + side, y0 + side),
            (x0, y0 + side),
            (x0, y0),
        ])
    }

    #[test]
    fn signed_area_follows_orientation() {
        let ccw = square(0.0, 0.0, 10.0);
        let cw: Vec<Coord> = ccw.iter().rev().copied().collect();
        assert_eq!(signed_ring_area(&ccw), 100.0);
        assert_eq!(signed_ring_area(&cw), -100.0);
    }

    #[test]
    fn polygon_measures_include_holes() {
        let hole: Vec<Coord> = square(4.0, 4.0, 2.0).into_iter().rev().collect();
        let p = Polygon::new(square(0.0, 0.0, 10.0), vec![hole]);
        assert_eq!(polygon_area(&p), 96.0);
        assert_eq!(polygon_perimeter(&p), 48.0);
        assert!(!is_convex(&p));
    }

    #[test]
    fn circularity_of_square_is_78() {
        assert_eq!(circularity(100.0, 40.0), 78.0);
        assert_eq!(circularity(0.0, 0.0), 0.0);
    }

    #[test]
    fn convexity_detects_reflex_vertex() {
        let convex = Polygon::new(square(0.0, 0.0, 4.0), vec![]);
        assert!(is_convex(&convex));
        let notch = Polygon::new(
            ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 1.0), (0.0, 4.0), (0.0, 0.0)]),
            vec![],
        );
        assert!(!is_convex(&notch));
        // collinear vertices do not make a polygon concave
        let collinear = Polygon::new(
            ring(&[(0.0, 0.0), (2.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]),
            vec![],
        );
        assert!(is_convex(&collinear));
    }

    #[test]
    fn locate_point_in_polygon() {
        let hole: Vec<Coord> = square(4.0, 4.0, 2.0).into_iter().rev().collect();
        let p = Polygon::new(square(0.0, 0.0, 10.0), vec![hole]);
        assert_eq!(locate_in_polygon(&Coord::xy(1.0, 1.0), &p), Location::Interior);
        assert_eq!(locate_in_polygon(&Coord::xy(5.0, 5.0), &p), Location::Exterior);
        assert_eq!(locate_in_polygon(&Coord::xy(10.0, 5.0), &p), Location::Boundary);
        assert_eq!(locate_in_polygon(&Coord::xy(4.0, 5.0), &p), Location::Boundary);
        assert_eq!(locate_in_polygon(&Coord::xy(11.0, 5.0), &p), Location::Exterior);
    }

    #[test]
    fn line_touching_a_corner_intersects() {
        let p = Polygon::new(square(0.0, 0.0, 10.0), vec![]);
        let touching = ring(&[(10.0, 10.0), (20.0, 20.0)]);
        let crossing = ring(&[(-5.0, 5.0), (15.0, 5.0)]);
        let apart = ring(&[(11.0, 0.0), (20.0, 20.0)]);
        assert!(line_intersects_polygon(&touching, &p));
        assert!(line_intersects_polygon(&crossing, &p));
        assert!(!line_intersects_polygon(&apart, &p));
    }
}
