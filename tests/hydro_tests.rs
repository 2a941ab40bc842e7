use line_network::algs::hydro::{
    AnomalyKind, HydroConfig, apply_repair, detect_anomalies, detect_on, is_sink, is_source,
    repair_anomalies, repair_on,
};
use line_network::data::{Feature, FeatureId};
use line_network::geometry::{Geometry, LineString};
use line_network::network_error::NetworkError;
use line_network::progress::NoopMonitor;
use line_network::topology::cycles::simple_cycles;
use line_network::topology::{Dimension, Directedness, NetworkGraph};

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn seg(id: u64, a: (f64, f64), b: (f64, f64)) -> Feature {
    Feature::new(id, LineString::from_xy(&[a, b]))
}

fn seg3(id: u64, a: (f64, f64, f64), b: (f64, f64, f64)) -> Feature {
    Feature::new(id, LineString::from_xyz(&[a, b]))
}

fn topology_only() -> HydroConfig {
    HydroConfig {
        use_elevation: false,
        ..Default::default()
    }
}

/// s -> a -> b -> c -> a, c -> t
fn looped() -> Vec<Feature> {
    let (s, a, b, c, t) = ((0.0, 0.0), (10.0, 0.0), (15.0, 10.0), (20.0, 0.0), (30.0, 0.0));
    vec![seg(0, s, a), seg(1, a, b), seg(2, b, c), seg(3, c, a), seg(4, c, t)]
}

fn undirected_edges(features: &[Feature]) -> Vec<((u64, u64), (u64, u64))> {
    let mut v: Vec<_> = features
        .iter()
        .filter_map(|f| {
            let l = f.line()?;
            let a = l.first()?;
            let b = l.last()?;
            let (p, q) = ((a.x.to_bits(), a.y.to_bits()), (b.x.to_bits(), b.y.to_bits()));
            Some(if p <= q { (p, q) } else { (q, p) })
        })
        .collect();
    v.sort();
    v
}

// ----------------------------------------------------------------------------
// Detection
// ----------------------------------------------------------------------------

#[test]
fn upward_edge_is_reported_with_its_elevations() {
    let features = vec![
        seg3(1, (0.0, 0.0, 5.0), (10.0, 0.0, 10.0)),
        seg3(2, (10.0, 0.0, 10.0), (20.0, 0.0, 2.0)),
    ];
    let report = detect_anomalies(&features, &HydroConfig::default(), &mut NoopMonitor).unwrap();
    assert_eq!(report.upward_edges.len(), 1);
    let r = &report.upward_edges[0];
    assert_eq!(r.kind, AnomalyKind::UpwardEdge);
    assert_eq!(r.feature, Some(FeatureId(1)));
    assert_eq!(r.comment, "[5.0;10.0]");
}

#[test]
fn tolerance_hides_small_climbs() {
    let features = vec![seg3(1, (0.0, 0.0, 5.0), (10.0, 0.0, 5.5))];
    let cfg = HydroConfig {
        elevation_tolerance: 1.0,
        ..Default::default()
    };
    let report = detect_anomalies(&features, &cfg, &mut NoopMonitor).unwrap();
    assert!(report.upward_edges.is_empty());
}

#[test]
fn sources_and_sinks_are_listed_in_node_order() {
    // S splits into P and Q; P also receives R
    let features = vec![
        seg(0, (0.0, 0.0), (10.0, 0.0)),
        seg(1, (0.0, 0.0), (0.0, 10.0)),
        seg(2, (20.0, 0.0), (10.0, 0.0)),
    ];
    let report = detect_anomalies(&features, &topology_only(), &mut NoopMonitor).unwrap();
    let kinds: Vec<_> = report.nodes.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![AnomalyKind::Source, AnomalyKind::Sink]);
    assert_eq!(report.nodes[0].comment, "in=0 out=2");
    assert!(matches!(report.nodes[1].geometry, Geometry::Point(c) if c.x == 10.0));
}

#[test]
fn cycle_edges_are_reported_once() {
    let report = detect_anomalies(&looped(), &topology_only(), &mut NoopMonitor).unwrap();
    let mut ids: Vec<_> = report.cycles.iter().filter_map(|r| r.feature).collect();
    ids.sort();
    assert_eq!(ids, vec![FeatureId(1), FeatureId(2), FeatureId(3)]);
}

#[test]
fn detection_needs_a_directed_graph() {
    let features = looped();
    let (g, _) = NetworkGraph::from_features(&features, Directedness::Undirected, Dimension::Xy);
    let err = detect_on(&g, &features, &topology_only(), &mut NoopMonitor).unwrap_err();
    assert_eq!(err, NetworkError::UndirectedGraph("anomaly detection"));
}

// ----------------------------------------------------------------------------
// Repair
// ----------------------------------------------------------------------------

#[test]
fn repaired_cycle_is_gone_and_edges_are_preserved() {
    let features = looped();
    let report = repair_anomalies(&features, &topology_only(), &mut NoopMonitor).unwrap();
    assert_eq!(report.reversed, vec![FeatureId(3)]);

    let mut fixed = features.clone();
    apply_repair(&mut fixed, &report);
    assert_eq!(undirected_edges(&fixed), undirected_edges(&features));

    let (g, _) = NetworkGraph::from_features(&fixed, Directedness::Directed, Dimension::Xy);
    assert!(simple_cycles(&g).is_empty());
    assert!(g.node_ids().all(|n| !is_source(&g, n) && !is_sink(&g, n)));
}

#[test]
fn repair_on_mutates_the_given_graph() {
    let features = looped();
    let (mut g, _) = NetworkGraph::from_features(&features, Directedness::Directed, Dimension::Xy);
    let report = repair_on(&mut g, &features, &topology_only(), &mut NoopMonitor).unwrap();
    assert_eq!(report.stats.cycles, 1);
    assert_eq!(g.reversed_edges().len(), 1);
    assert!(simple_cycles(&g).is_empty());
}

#[test]
fn disabled_stages_change_nothing() {
    let cfg = HydroConfig {
        sources: false,
        sinks: false,
        cycles: false,
        use_elevation: false,
        ..Default::default()
    };
    let report = repair_anomalies(&looped(), &cfg, &mut NoopMonitor).unwrap();
    assert!(report.reversed.is_empty());
    assert_eq!(report.stats, Default::default());
}

#[test]
fn elevation_guides_which_cycle_edge_flips() {
    // c -> a climbs, every other cycle edge descends
    let features = vec![
        seg3(0, (0.0, 0.0, 20.0), (10.0, 0.0, 10.0)),
        seg3(1, (10.0, 0.0, 10.0), (15.0, 10.0, 8.0)),
        seg3(2, (15.0, 10.0, 8.0), (20.0, 0.0, 6.0)),
        seg3(3, (20.0, 0.0, 6.0), (10.0, 0.0, 10.0)),
        seg3(4, (20.0, 0.0, 6.0), (30.0, 0.0, 1.0)),
    ];
    let report = repair_anomalies(&features, &HydroConfig::default(), &mut NoopMonitor).unwrap();
    assert_eq!(report.stats.upward_edges, 1);
    assert_eq!(report.stats.cycles, 0);
    assert_eq!(report.reversed, vec![FeatureId(3)]);
}
