//! Face extraction from a set of noded lines.
//!
//! Lines are joined at their endpoints into a planar graph of half-edges.
//! Dangling edges and cut edges bound no face and are removed; the remaining
//! half-edges are traced into rings by always turning to the next edge in
//! clockwise order around the arrival node. Counter-clockwise rings become
//! polygon shells, clockwise rings become holes and are attached to the
//! smallest shell that contains them.
//!
//! Input lines are assumed to be noded: they meet only at endpoints.

use hashbrown::HashMap;

use super::metrics::{Location, locate_in_ring, signed_ring_area};
use super::primitives::{Coord, Envelope, LineString, Polygon};

const NONE: usize = usize::MAX;

/// Collects lines and extracts the polygons they enclose.
#[derive(Clone, Debug, Default)]
pub struct Polygonizer {
    edges: Vec<Vec<Coord>>,
}

impl Polygonizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one line. Repeated consecutive vertices are collapsed; lines with
    /// fewer than two distinct vertices are ignored.
    pub fn add(&mut self, line: &LineString) {
        let mut coords: Vec<Coord> = Vec::with_capacity(line.coords().len());
        for c in line.coords() {
            if coords.last().is_none_or(|last| !last.equals_2d(c)) {
                coords.push(*c);
            }
        }
        if coords.len() >= 2 {
            self.edges.push(coords);
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Extracts all faces bounded by the added lines.
    pub fn polygons(&self) -> Vec<Polygon> {
        let graph = HalfEdges::build(&self.edges);
        let mut alive = vec![true; self.edges.len()];
        loop {
            graph.prune_dangles(&mut alive);
            let (rings, ring_of) = graph.trace(&alive);
            let mut cut = false;
            for h in 0..graph.origin.len() {
                if alive[h / 2] && ring_of[h] == ring_of[h ^ 1] {
                    alive[h / 2] = false;
                    cut = true;
                }
            }
            if !cut {
                return self.assemble(&rings);
            }
            log::debug!("polygonize: removed cut edges, re-tracing");
        }
    }

    fn ring_coords(&self, ring: &[usize]) -> Vec<Coord> {
        let mut out = Vec::new();
        for (i, &h) in ring.iter().enumerate() {
            let coords = &self.edges[h / 2];
            let skip = usize::from(i > 0);
            if h % 2 == 0 {
                out.extend(coords.iter().skip(skip).copied());
            } else {
                out.extend(coords.iter().rev().skip(skip).copied());
            }
        }
        out
    }

    fn assemble(&self, rings: &[Vec<usize>]) -> Vec<Polygon> {
        let mut shells: Vec<(Vec<Coord>, Envelope, Vec<Vec<Coord>>)> = Vec::new();
        let mut holes: Vec<(Vec<Coord>, Envelope)> = Vec::new();
        for ring in rings {
            let coords = self.ring_coords(ring);
            let Some(env) = Envelope::of(&coords) else {
                continue;
            };
            let area = signed_ring_area(&coords);
            if area > 0.0 {
                shells.push((coords, env, Vec::new()));
            } else if area < 0.0 {
                holes.push((coords, env));
            }
        }
        for (hole, hole_env) in holes {
            if let Some(i) = enclosing_shell(&hole, &hole_env, &shells) {
                shells[i].2.push(hole);
            }
        }
        shells
            .into_iter()
            .map(|(exterior, _, holes)| Polygon::new(exterior, holes))
            .collect()
    }
}

/// Smallest shell whose envelope strictly contains the hole's and whose ring
/// contains a hole vertex it does not share.
fn enclosing_shell(
    hole: &[Coord],
    hole_env: &Envelope,
    shells: &[(Vec<Coord>, Envelope, Vec<Vec<Coord>>)],
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, (shell, env, _)) in shells.iter().enumerate() {
        if env == hole_env || !env.contains(hole_env) {
            continue;
        }
        let Some(sample) = hole
            .iter()
            .find(|c| !shell.iter().any(|s| s.equals_2d(c)))
        else {
            continue;
        };
        if locate_in_ring(sample, shell) == Location::Exterior {
            continue;
        }
        if best.is_none_or(|b| shells[b].1.contains(env)) {
            best = Some(i);
        }
    }
    best
}

fn node_key(c: &Coord) -> (u64, u64) {
    let bits = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
    (bits(c.x), bits(c.y))
}

/// Half-edge `h` runs along edge `h / 2`, forward when `h` is even.
struct HalfEdges {
    origin: Vec<usize>,
    angle: Vec<f64>,
    node_count: usize,
}

impl HalfEdges {
    fn build(edges: &[Vec<Coord>]) -> Self {
        let mut nodes: HashMap<(u64, u64), usize> = HashMap::new();
        let mut origin = Vec::with_capacity(edges.len() * 2);
        let mut angle = Vec::with_capacity(edges.len() * 2);
        for coords in edges {
            let n = coords.len();
            let mut node = |c: &Coord| {
                let next = nodes.len();
                *nodes.entry(node_key(c)).or_insert(next)
            };
            origin.push(node(&coords[0]));
            origin.push(node(&coords[n - 1]));
            angle.push(direction(&coords[0], &coords[1]));
            angle.push(direction(&coords[n - 1], &coords[n - 2]));
        }
        Self {
            origin,
            angle,
            node_count: nodes.len(),
        }
    }

    fn outgoing(&self, alive: &[bool]) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.node_count];
        for h in 0..self.origin.len() {
            if alive[h / 2] {
                out[self.origin[h]].push(h);
            }
        }
        out
    }

    /// Iteratively removes edges with an endpoint of degree one.
    fn prune_dangles(&self, alive: &mut [bool]) {
        let out = self.outgoing(alive);
        let mut degree: Vec<usize> = out.iter().map(Vec::len).collect();
        let mut stack: Vec<usize> = (0..self.node_count).filter(|&n| degree[n] == 1).collect();
        while let Some(n) = stack.pop() {
            if degree[n] != 1 {
                continue;
            }
            let Some(&h) = out[n].iter().find(|&&h| alive[h / 2]) else {
                continue;
            };
            alive[h / 2] = false;
            let other = self.origin[h ^ 1];
            degree[n] -= 1;
            degree[other] -= 1;
            if degree[other] == 1 {
                stack.push(other);
            }
        }
    }

    /// Traces every alive half-edge into a ring; returns the rings and the
    /// ring index of each half-edge.
    fn trace(&self, alive: &[bool]) -> (Vec<Vec<usize>>, Vec<usize>) {
        let mut out = self.outgoing(alive);
        let mut pos = vec![NONE; self.origin.len()];
        for star in &mut out {
            star.sort_by(|&a, &b| self.angle[a].total_cmp(&self.angle[b]).then(a.cmp(&b)));
            for (i, &h) in star.iter().enumerate() {
                pos[h] = i;
            }
        }
        // the outgoing half-edge preceding the twin in counter-clockwise order
        let next = |h: usize| {
            let twin = h ^ 1;
            let star = &out[self.origin[twin]];
            star[(pos[twin] + star.len() - 1) % star.len()]
        };
        let mut ring_of = vec![NONE; self.origin.len()];
        let mut rings = Vec::new();
        for start in 0..self.origin.len() {
            if !alive[start / 2] || ring_of[start] != NONE {
                continue;
            }
            let id = rings.len();
            let mut ring = Vec::new();
            let mut h = start;
            loop {
                ring_of[h] = id;
                ring.push(h);
                h = next(h);
                if h == start || ring_of[h] != NONE {
                    break;
                }
            }
            rings.push(ring);
        }
        (rings, ring_of)
    }
}

fn direction(from: &Coord, to: &Coord) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::metrics::polygon_area;

    fn lines(polygonizer: &mut Polygonizer, segments: &[[(f64, f64); 2]]) {
        for s in segments {
            polygonizer.add(&LineString::from_xy(s));
        }
    }

    fn square_edges(x0: f64, y0: f64, side: f64) -> Vec<[(f64, f64); 2]> {
        let (x1, y1) = (x0 + side, y0 + side);
        vec![
            [(x0, y0), (x1, y0)],
            [(x1, y0), (x1, y1)],
            [(x1, y1), (x0, y1)],
            [(x0, y1), (x0, y0)],
        ]
    }

    #[test]
    fn single_square_yields_one_ccw_face() {
        let mut p = Polygonizer::new();
        lines(&mut p, &square_edges(0.0, 0.0, 10.0));
        let faces = p.polygons();
        assert_eq!(faces.len(), 1);
        assert_eq!(signed_ring_area(&faces[0].exterior), 100.0);
        assert!(faces[0].holes.is_empty());
    }

    #[test]
    fn adjacent_squares_yield_two_faces() {
        let mut p = Polygonizer::new();
        lines(&mut p, &square_edges(0.0, 0.0, 10.0));
        lines(
            &mut p,
            &[
                [(10.0, 0.0), (20.0, 0.0)],
                [(20.0, 0.0), (20.0, 10.0)],
                [(20.0, 10.0), (10.0, 10.0)],
            ],
        );
        let faces = p.polygons();
        assert_eq!(faces.len(), 2);
        assert!(faces.iter().all(|f| polygon_area(f) == 100.0));
    }

    #[test]
    fn dangles_and_bridges_are_ignored() {
        let mut p = Polygonizer::new();
        lines(&mut p, &square_edges(0.0, 0.0, 10.0));
        lines(&mut p, &square_edges(30.0, 0.0, 10.0));
        // bridge between the squares and a dangle off the first one
        lines(&mut p, &[[(10.0, 10.0), (30.0, 10.0)], [(0.0, 0.0), (-5.0, -5.0)]]);
        let faces = p.polygons();
        assert_eq!(faces.len(), 2);
        assert!(faces.iter().all(|f| polygon_area(f) == 100.0));
    }

    #[test]
    fn nested_ring_becomes_hole_and_face() {
        let mut p = Polygonizer::new();
        lines(&mut p, &square_edges(0.0, 0.0, 10.0));
        lines(&mut p, &square_edges(4.0, 4.0, 2.0));
        let mut areas: Vec<f64> = p.polygons().iter().map(polygon_area).collect();
        areas.sort_by(f64::total_cmp);
        assert_eq!(areas, vec![4.0, 96.0]);
    }

    #[test]
    fn closed_line_is_a_face() {
        let mut p = Polygonizer::new();
        p.add(&LineString::from_xy(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 3.0),
            (0.0, 0.0),
        ]));
        let faces = p.polygons();
        assert_eq!(faces.len(), 1);
        assert_eq!(polygon_area(&faces[0]), 6.0);
    }

    #[test]
    fn degenerate_lines_are_skipped() {
        let mut p = Polygonizer::new();
        p.add(&LineString::from_xy(&[(1.0, 1.0), (1.0, 1.0)]));
        p.add(&LineString::from_xy(&[]));
        assert_eq!(p.edge_count(), 0);
        assert!(p.polygons().is_empty());
    }
}
