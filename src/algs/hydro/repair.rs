use hashbrown::HashSet;

use super::{HydroConfig, RepairReport, RepairStats};
use crate::data::Feature;
use crate::geometry::Geometry;
use crate::network_error::NetworkError;
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::cycles::{is_intact, simple_cycles};
use crate::topology::traversal::{FlowView, bfs_path_to, lies_on_cycle};
use crate::topology::{Directedness, EdgeId, NetworkGraph, NodeId};

/// Builds the directed network of `features` and repairs it.
///
/// The input is not modified; pass the report to [`apply_repair`] to write
/// the reversed geometries back.
pub fn repair_anomalies(
    features: &[Feature],
    config: &HydroConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<RepairReport, NetworkError> {
    config.validate()?;
    let (mut graph, _) =
        NetworkGraph::from_features(features, Directedness::Directed, config.dimension);
    repair_on(&mut graph, features, config, monitor)
}

/// Repairs an existing directed graph built from `features` in place.
///
/// Stages run in order: upward edges, sources, sinks, cycles. Each stage
/// sees the orientation left by the previous ones. On cancellation the
/// remaining stages are skipped and the report covers what was done.
pub fn repair_on(
    graph: &mut NetworkGraph,
    features: &[Feature],
    config: &HydroConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<RepairReport, NetworkError> {
    config.validate()?;
    if !graph.is_directed() {
        return Err(NetworkError::UndirectedGraph("anomaly repair"));
    }
    let mut stats = RepairStats::default();
    let mut completion = Completion::Finished;

    if config.use_elevation {
        completion = repair_upward_edges(graph, features, config, &mut stats, monitor)?;
    }
    if config.sources && !completion.is_cancelled() {
        completion = repair_terminals(graph, FlowView::Downstream, config, &mut stats, monitor)?;
    }
    if config.sinks && !completion.is_cancelled() {
        completion = repair_terminals(graph, FlowView::Upstream, config, &mut stats, monitor)?;
    }
    if config.cycles && !completion.is_cancelled() {
        completion = repair_cycles(graph, features, config, &mut stats, monitor)?;
    }

    let mut reversed_indices: Vec<usize> = graph
        .reversed_edges()
        .into_iter()
        .map(|e| graph.edge(e).feature_index())
        .collect();
    reversed_indices.sort_unstable();
    let reversed = reversed_indices.iter().map(|&i| features[i].id).collect();
    let reversed_features = reversed_indices
        .iter()
        .map(|&i| reversed_copy(&features[i]))
        .collect();
    log::info!("anomaly repair: {stats:?}, {} features reversed", reversed_indices.len());
    Ok(RepairReport {
        reversed,
        reversed_indices,
        reversed_features,
        stats,
        completion,
    })
}

/// Reverses the geometry of every feature listed in `report`.
pub fn apply_repair(features: &mut [Feature], report: &RepairReport) {
    for &i in &report.reversed_indices {
        if let Some(feature) = features.get_mut(i) {
            feature.geometry = reversed_geometry(&feature.geometry);
        }
    }
}

fn reversed_geometry(geometry: &Geometry) -> Geometry {
    match geometry {
        Geometry::LineString(l) => Geometry::LineString(l.reversed()),
        other => other.clone(),
    }
}

fn reversed_copy(feature: &Feature) -> Feature {
    Feature {
        geometry: reversed_geometry(&feature.geometry),
        ..feature.clone()
    }
}

/// Elevations at the current start and end of `e`.
fn endpoint_z(graph: &NetworkGraph, features: &[Feature], e: EdgeId) -> (f64, f64) {
    let edge = graph.edge(e);
    let (first, last) = features[edge.feature_index()]
        .line()
        .and_then(|l| Some((l.first()?.z, l.last()?.z)))
        .unwrap_or((f64::NAN, f64::NAN));
    if edge.is_reversed() {
        (last, first)
    } else {
        (first, last)
    }
}

fn repair_upward_edges(
    graph: &mut NetworkGraph,
    features: &[Feature],
    config: &HydroConfig,
    stats: &mut RepairStats,
    monitor: &mut dyn ProgressMonitor,
) -> Result<Completion, NetworkError> {
    let total = graph.edge_count();
    for (done, e) in graph.edge_ids().enumerate() {
        if checkpoint(monitor, done, total, "upward edges") {
            return Ok(Completion::Cancelled);
        }
        let (z0, z1) = endpoint_z(graph, features, e);
        if config.is_inverted(z0, z1) {
            graph.reverse_edge(e)?;
            stats.upward_edges += 1;
        }
    }
    Ok(Completion::Finished)
}

/// Removes sources (`Downstream`) or sinks (`Upstream`).
///
/// From each terminal node, walks the view breadth-first to the nearest node
/// where flows meet or end and whose elevation allows the flip, then reverses
/// the path in between.
fn repair_terminals(
    graph: &mut NetworkGraph,
    view: FlowView,
    config: &HydroConfig,
    stats: &mut RepairStats,
    monitor: &mut dyn ProgressMonitor,
) -> Result<Completion, NetworkError> {
    let stage = match view {
        FlowView::Downstream => "sources",
        FlowView::Upstream => "sinks",
    };
    let total = graph.node_count();
    for (done, n) in graph.node_ids().enumerate() {
        if checkpoint(monitor, done, total, stage) {
            return Ok(Completion::Cancelled);
        }
        if !(view.in_degree(graph, n) == 0 && view.out_degree(graph, n) > 1) {
            continue;
        }
        let start_z = graph.coord(n).z;
        let g: &NetworkGraph = graph;
        let found = bfs_path_to(g, n, view, |m| {
            let meets = view.in_degree(g, m) > 1 || view.out_degree(g, m) == 0;
            meets && elevation_allows(config, view, start_z, g.coord(m).z)
        });
        let Some((stop, path)) = found else {
            continue;
        };
        if path.is_empty() {
            continue;
        }
        if reverse_path_guarded(graph, n, stop, &path)? {
            match view {
                FlowView::Downstream => stats.sources += 1,
                FlowView::Upstream => stats.sinks += 1,
            }
        } else {
            stats.rolled_back += 1;
        }
    }
    Ok(Completion::Finished)
}

/// Reversing a path from a source must make water run down to it, and from
/// a sink must make water run down from it.
fn elevation_allows(config: &HydroConfig, view: FlowView, start_z: f64, z: f64) -> bool {
    if !config.use_elevation || start_z.is_nan() || z.is_nan() {
        return true;
    }
    let floor = start_z - config.elevation_tolerance;
    match view {
        FlowView::Downstream => z > floor,
        FlowView::Upstream => z < floor,
    }
}

/// Reverses `path`, then undoes it if any node along it ends up on a
/// directed cycle. Returns whether the reversal was kept.
fn reverse_path_guarded(
    graph: &mut NetworkGraph,
    start: NodeId,
    stop: NodeId,
    path: &[EdgeId],
) -> Result<bool, NetworkError> {
    for &e in path {
        graph.reverse_edge(e)?;
    }
    let g: &NetworkGraph = graph;
    let cyclic = lies_on_cycle(g, start)
        || lies_on_cycle(g, stop)
        || path
            .iter()
            .any(|&e| lies_on_cycle(g, g.source(e)) || lies_on_cycle(g, g.target(e)));
    if cyclic {
        for &e in path {
            graph.reverse_edge(e)?;
        }
        log::debug!("path {start} -> {stop} would close a cycle, rolled back");
        return Ok(false);
    }
    Ok(true)
}

fn repair_cycles(
    graph: &mut NetworkGraph,
    features: &[Feature],
    config: &HydroConfig,
    stats: &mut RepairStats,
    monitor: &mut dyn ProgressMonitor,
) -> Result<Completion, NetworkError> {
    let cycles = simple_cycles(graph);
    for (done, cycle) in cycles.iter().enumerate() {
        if checkpoint(monitor, done, cycles.len(), "cycles") {
            return Ok(Completion::Cancelled);
        }
        // an earlier reversal may already have broken this one
        if !is_intact(graph, cycle) {
            continue;
        }
        let nodes: HashSet<NodeId> = cycle.iter().copied().collect();
        let mut best: Option<EdgeId> = None;
        let mut best_score = 0.0f64;
        for e in graph.induced_edges(&nodes) {
            let score = reversal_score(graph, features, config, e);
            if score > best_score {
                best_score = score;
                best = Some(e);
            }
        }
        match best {
            Some(e) => {
                graph.reverse_edge(e)?;
                stats.cycles += 1;
            }
            None => log::warn!("cycle through {} nodes has no safe edge to reverse", cycle.len()),
        }
    }
    Ok(Completion::Finished)
}

/// How desirable reversing `e` is, without reversing it.
///
/// 0 if the flip turns either endpoint into a source or a sink. Otherwise 1
/// without elevations; with elevations 1 if `e` currently climbs, 0.25 if it
/// descends and 0.5 if an elevation is unknown.
fn reversal_score(graph: &NetworkGraph, features: &[Feature], config: &HydroConfig, e: EdgeId) -> f64 {
    let (s, t) = (graph.source(e), graph.target(e));
    if s == t {
        return 0.0;
    }
    let terminal = |inn: usize, out: usize| (inn == 0 && out > 1) || (out == 0 && inn > 1);
    if terminal(graph.in_degree(s) + 1, graph.out_degree(s) - 1)
        || terminal(graph.in_degree(t) - 1, graph.out_degree(t) + 1)
    {
        return 0.0;
    }
    if !config.use_elevation {
        return 1.0;
    }
    let (z0, z1) = endpoint_z(graph, features, e);
    if z0.is_nan() || z1.is_nan() {
        0.5
    } else if config.is_inverted(z0, z1) {
        1.0
    } else {
        0.25
    }
}
