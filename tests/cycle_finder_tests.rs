use line_network::algs::cycle_finder::{
    Convexity, CycleFinderConfig, CycleRecord, CycleTag, FORK, HeterogeneousMode, Homogeneity,
    ISOLATED, JUNCTION, PENDANT, find_cycles, find_cycles_into,
};
use line_network::data::{Feature, FeatureId};
use line_network::geometry::{Coord, LineString, Polygon};
use line_network::network_error::NetworkError;
use line_network::progress::{CancelFlag, NoopMonitor};

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn seg(id: u64, a: (f64, f64), b: (f64, f64)) -> Feature {
    Feature::new(id, LineString::from_xy(&[a, b]))
}

/// Closed chain of segments through `pts`, ids starting at `first_id`.
fn ring(first_id: u64, pts: &[(f64, f64)]) -> Vec<Feature> {
    (0..pts.len())
        .map(|i| seg(first_id + i as u64, pts[i], pts[(i + 1) % pts.len()]))
        .collect()
}

fn diamond() -> Vec<Feature> {
    ring(0, &[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0), (10.0, -10.0)])
}

fn square() -> Vec<Feature> {
    ring(0, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
}

/// Two triangles touching at (10, 5).
fn bowtie() -> Vec<Feature> {
    let mut f = ring(0, &[(0.0, 0.0), (0.0, 10.0), (10.0, 5.0)]);
    f.extend(ring(3, &[(10.0, 5.0), (20.0, 0.0), (20.0, 10.0)]));
    f
}

fn with_filter(mask: i32) -> CycleFinderConfig {
    CycleFinderConfig {
        degree_filter: mask,
        ..Default::default()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[test]
fn isolated_diamond_is_measured() {
    let report = find_cycles(&diamond(), &CycleFinderConfig::default(), &mut NoopMonitor).unwrap();
    assert_eq!(report.faces, 1);
    assert_eq!(report.homogeneous.len(), 1);
    assert!(report.heterogeneous.is_empty());

    let c = &report.homogeneous[0];
    assert_eq!(c.edge_count, 4);
    assert_eq!(c.incident_edges, 0);
    assert_eq!(c.tag, Some(CycleTag::Isolated));
    assert_eq!(c.homogeneity, Homogeneity::Homogeneous);
    assert_eq!(c.convexity, Convexity::Convex);
    assert!((c.area - 200.0).abs() < 1e-9);
    assert!((c.perimeter - 4.0 * 200f64.sqrt()).abs() < 1e-9);
    assert_eq!(c.circularity, 78.0);
    let mut ids = c.features.clone();
    ids.sort();
    assert_eq!(ids, (0..4).map(FeatureId).collect::<Vec<_>>());
}

#[test]
fn square_with_a_tail_is_pendant() {
    let mut features = square();
    features.push(seg(9, (10.0, 10.0), (20.0, 20.0)));
    let report = find_cycles(&features, &CycleFinderConfig::default(), &mut NoopMonitor).unwrap();
    assert_eq!(report.homogeneous.len(), 1);
    assert_eq!(report.homogeneous[0].tag, Some(CycleTag::Pendant));
    assert_eq!(report.homogeneous[0].incident_edges, 1);

    let isolated_only = find_cycles(&features, &with_filter(ISOLATED), &mut NoopMonitor).unwrap();
    assert!(isolated_only.homogeneous.is_empty());
    let pendant_or_fork =
        find_cycles(&features, &with_filter(PENDANT | FORK), &mut NoopMonitor).unwrap();
    assert_eq!(pendant_or_fork.homogeneous.len(), 1);
}

#[test]
fn touching_triangles_are_junctions() {
    let features = bowtie();
    let none = find_cycles(&features, &with_filter(ISOLATED), &mut NoopMonitor).unwrap();
    assert!(none.homogeneous.is_empty());

    let junctions = find_cycles(&features, &with_filter(JUNCTION), &mut NoopMonitor).unwrap();
    assert_eq!(junctions.homogeneous.len(), 2);
    assert!(
        junctions
            .homogeneous
            .iter()
            .all(|c| c.tag == Some(CycleTag::Junction) && c.edge_count == 3)
    );
}

#[test]
fn edge_count_bounds_filter_faces() {
    let cfg = CycleFinderConfig {
        max_edges: 3,
        ..Default::default()
    };
    let report = find_cycles(&square(), &cfg, &mut NoopMonitor).unwrap();
    assert!(report.homogeneous.is_empty());

    let cfg = CycleFinderConfig {
        max_length: 30.0,
        ..Default::default()
    };
    let report = find_cycles(&square(), &cfg, &mut NoopMonitor).unwrap();
    assert_eq!(report.faces, 0);
}

#[test]
fn duplicate_lines_do_not_create_faces() {
    let mut features = square();
    features.push(seg(7, (10.0, 0.0), (0.0, 0.0)));
    let report = find_cycles(&features, &CycleFinderConfig::default(), &mut NoopMonitor).unwrap();
    assert_eq!(report.faces, 1);
}

#[test]
fn square_with_three_tails_is_a_fork() {
    let mut features = square();
    features.push(seg(4, (0.0, 0.0), (-5.0, -5.0)));
    features.push(seg(5, (10.0, 0.0), (15.0, -5.0)));
    features.push(seg(6, (10.0, 10.0), (15.0, 15.0)));

    let forks = find_cycles(&features, &with_filter(FORK), &mut NoopMonitor).unwrap();
    assert_eq!(forks.homogeneous.len(), 1);
    let cycle = &forks.homogeneous[0];
    assert_eq!(cycle.tag, Some(CycleTag::Fork));
    assert_eq!(cycle.incident_edges, 3);
    assert_eq!(cycle.edge_count, 4);

    let junctions = find_cycles(&features, &with_filter(JUNCTION), &mut NoopMonitor).unwrap();
    assert!(junctions.homogeneous.is_empty());
}

#[test]
fn polygon_rings_close_faces_for_lines() {
    let lines = vec![
        seg(1, (0.0, 0.0), (10.0, 0.0)),
        seg(2, (10.0, 0.0), (10.0, 10.0)),
    ];
    let open = find_cycles(&lines, &CycleFinderConfig::default(), &mut NoopMonitor).unwrap();
    assert_eq!(open.faces, 0);

    let outline: Vec<Coord> = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]
        .iter()
        .map(|&(x, y)| Coord::xy(x, y))
        .collect();
    let mut features = lines;
    features.push(Feature::new(9, Polygon::new(outline, vec![])));

    let report = find_cycles(&features, &CycleFinderConfig::default(), &mut NoopMonitor).unwrap();
    assert_eq!(report.faces, 1);
    assert_eq!(report.homogeneous.len(), 1);
    let mut ids = report.homogeneous[0].features.clone();
    ids.sort();
    assert_eq!(ids, vec![FeatureId(1), FeatureId(2)]);
    assert_eq!(report.homogeneous[0].area, 100.0);

    // rings longer than the limit add no linework
    let cfg = CycleFinderConfig {
        max_length: 35.0,
        ..Default::default()
    };
    let report = find_cycles(&features, &cfg, &mut NoopMonitor).unwrap();
    assert_eq!(report.faces, 0);
}

#[test]
fn mixed_boundary_with_aab_abb_nodes_is_tagged() {
    let corners = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
    let values = ["x", "y", "y", "x"];
    let mut features: Vec<Feature> = ring(0, &corners)
        .into_iter()
        .zip(values)
        .map(|(f, v)| f.with_attribute("kind", v))
        .collect();
    features.push(seg(4, (10.0, 0.0), (20.0, 0.0)).with_attribute("kind", "x"));
    features.push(seg(5, (0.0, 10.0), (-10.0, 10.0)).with_attribute("kind", "y"));

    let base = CycleFinderConfig {
        attribute: Some("kind".into()),
        ..Default::default()
    };
    let dropped = find_cycles(&features, &base, &mut NoopMonitor).unwrap();
    assert!(dropped.homogeneous.is_empty());
    assert!(dropped.heterogeneous.is_empty());

    let cfg = CycleFinderConfig {
        heterogeneous: HeterogeneousMode::AabAbbOnly,
        ..base.clone()
    };
    let tagged = find_cycles(&features, &cfg, &mut NoopMonitor).unwrap();
    assert_eq!(tagged.heterogeneous.len(), 1);
    let c = &tagged.heterogeneous[0];
    assert_eq!(c.tag, Some(CycleTag::AabAbb));
    assert_eq!(c.homogeneity, Homogeneity::Heterogeneous);

    let cfg = CycleFinderConfig {
        heterogeneous: HeterogeneousMode::All,
        ..base
    };
    let all = find_cycles(&features, &cfg, &mut NoopMonitor).unwrap();
    assert_eq!(all.heterogeneous.len(), 1);
    assert_eq!(all.heterogeneous[0].tag, None);
}

#[test]
fn records_stream_into_sinks() {
    let mut homogeneous: Vec<CycleRecord> = Vec::new();
    let mut heterogeneous: Vec<CycleRecord> = Vec::new();
    let (faces, completion) = find_cycles_into(
        &bowtie(),
        &CycleFinderConfig::default(),
        &mut homogeneous,
        &mut heterogeneous,
        &mut NoopMonitor,
    )
    .unwrap();
    assert_eq!(faces, 2);
    assert!(!completion.is_cancelled());
    assert_eq!(homogeneous.len(), 2);
}

#[test]
fn classification_is_idempotent() {
    let features = bowtie();
    let cfg = CycleFinderConfig::default();
    let first = find_cycles(&features, &cfg, &mut NoopMonitor).unwrap();
    let second = find_cycles(&features, &cfg, &mut NoopMonitor).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unknown_attribute_is_rejected() {
    let cfg = CycleFinderConfig {
        attribute: Some("nope".into()),
        ..Default::default()
    };
    let err = find_cycles(&square(), &cfg, &mut NoopMonitor).unwrap_err();
    assert_eq!(err, NetworkError::UnknownAttribute("nope".into()));
}

#[test]
fn cancellation_stops_before_the_first_face() {
    let mut flag = CancelFlag::new();
    flag.cancel();
    let report = find_cycles(&bowtie(), &CycleFinderConfig::default(), &mut flag).unwrap();
    assert!(report.completion.is_cancelled());
    assert!(report.homogeneous.is_empty());
}
