use hashbrown::HashSet;

use super::{AnomalyKind, AnomalyRecord, AnomalyReport, HydroConfig, is_sink, is_source};
use crate::data::Feature;
use crate::geometry::Geometry;
use crate::network_error::NetworkError;
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::cycles::simple_cycles;
use crate::topology::{Directedness, EdgeId, NetworkGraph, NodeId};

/// Builds the directed network of `features` and reports its anomalies.
pub fn detect_anomalies(
    features: &[Feature],
    config: &HydroConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<AnomalyReport, NetworkError> {
    config.validate()?;
    let (graph, _) = NetworkGraph::from_features(features, Directedness::Directed, config.dimension);
    detect_on(&graph, features, config, monitor)
}

/// Reports the anomalies of an existing directed graph built from `features`.
pub fn detect_on(
    graph: &NetworkGraph,
    features: &[Feature],
    config: &HydroConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<AnomalyReport, NetworkError> {
    config.validate()?;
    if !graph.is_directed() {
        return Err(NetworkError::UndirectedGraph("anomaly detection"));
    }
    let mut report = AnomalyReport {
        upward_edges: Vec::new(),
        cycles: Vec::new(),
        nodes: Vec::new(),
        completion: Completion::Finished,
    };

    if config.use_elevation {
        report.upward_edges = upward_edges(features, config);
    }

    if config.cycles {
        let cycles = simple_cycles(graph);
        let mut seen: HashSet<EdgeId> = HashSet::new();
        for (done, cycle) in cycles.iter().enumerate() {
            if checkpoint(monitor, done, cycles.len(), "cycles") {
                report.completion = Completion::Cancelled;
                return Ok(report);
            }
            let nodes: HashSet<NodeId> = cycle.iter().copied().collect();
            for e in graph.induced_edges(&nodes) {
                if !seen.insert(e) {
                    continue;
                }
                let feature = &features[graph.edge(e).feature_index()];
                report.cycles.push(AnomalyRecord {
                    kind: AnomalyKind::Cycle,
                    geometry: feature.geometry.clone(),
                    feature: Some(feature.id),
                    node: None,
                    comment: String::new(),
                });
            }
        }
    }

    if config.sources || config.sinks {
        let total = graph.node_count();
        for (done, n) in graph.node_ids().enumerate() {
            if checkpoint(monitor, done, total, "nodes") {
                report.completion = Completion::Cancelled;
                return Ok(report);
            }
            let kind = if config.sources && is_source(graph, n) {
                AnomalyKind::Source
            } else if config.sinks && is_sink(graph, n) {
                AnomalyKind::Sink
            } else {
                continue;
            };
            report.nodes.push(AnomalyRecord {
                kind,
                geometry: Geometry::Point(graph.coord(n)),
                feature: None,
                node: Some(n),
                comment: format!("in={} out={}", graph.in_degree(n), graph.out_degree(n)),
            });
        }
    }

    log::info!(
        "anomaly detection: {} upward edges, {} cycle edges, {} sources/sinks",
        report.upward_edges.len(),
        report.cycles.len(),
        report.nodes.len()
    );
    Ok(report)
}

/// Lines whose end is higher than their start, with both elevations known.
fn upward_edges(features: &[Feature], config: &HydroConfig) -> Vec<AnomalyRecord> {
    features
        .iter()
        .filter_map(|feature| {
            let line = feature.line()?;
            let (z0, z1) = (line.first()?.z, line.last()?.z);
            config.is_inverted(z0, z1).then(|| AnomalyRecord {
                kind: AnomalyKind::UpwardEdge,
                geometry: feature.geometry.clone(),
                feature: Some(feature.id),
                node: None,
                comment: format!("[{z0:?};{z1:?}]"),
            })
        })
        .collect()
}
