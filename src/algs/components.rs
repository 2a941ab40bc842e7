//! Connected parts of a line network.
//!
//! Features are grouped by attribute value, each group becomes an undirected
//! graph, and every weakly connected subgraph is reported with its size,
//! length and number of pendant (degree 1) vertices. A summary row per group
//! adds those up.

use serde::{Deserialize, Serialize};

use crate::data::{AttributeKey, Feature, FeatureId, group_by_attribute, require_attribute};
use crate::geometry::LineString;
use crate::network_error::NetworkError;
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::traversal::connected_components;
use crate::topology::{Dimension, Directedness, NetworkGraph};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentsConfig {
    pub dimension: Dimension,
    pub attribute: Option<String>,
    pub ignore_empty: bool,
    /// Return each line as a single segment from its start to its end.
    pub simplify: bool,
}

/// One connected subgraph of a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub group: AttributeKey,
    /// `"j/n"`: the j-th of the group's n subgraphs, from 1.
    pub label: String,
    pub features: Vec<FeatureId>,
    pub feature_count: usize,
    pub pendant_vertices: usize,
    pub length: f64,
    pub lines: Vec<LineString>,
}

/// Totals over all subgraphs of a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub group: AttributeKey,
    pub components: usize,
    pub feature_count: usize,
    pub pendant_vertices: usize,
    pub length: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComponentsReport {
    pub graphs: Vec<GraphSummary>,
    pub components: Vec<ComponentRecord>,
    pub completion: Completion,
}

pub fn graph_components(
    features: &[Feature],
    config: &ComponentsConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<ComponentsReport, NetworkError> {
    let attribute = config.attribute.as_deref();
    if let Some(name) = attribute {
        require_attribute(features, name)?;
    }
    let groups = group_by_attribute(features, attribute, config.ignore_empty);
    let mut report = ComponentsReport {
        graphs: Vec::with_capacity(groups.len()),
        components: Vec::new(),
        completion: Completion::Finished,
    };
    let total = groups.len();
    for (done, group) in groups.into_iter().enumerate() {
        if checkpoint(monitor, done, total, "groups") {
            report.completion = Completion::Cancelled;
            return Ok(report);
        }
        let (graph, _) = NetworkGraph::from_indexed(
            features,
            group.members,
            Directedness::Undirected,
            config.dimension,
        );
        let parts = split_components(&graph, features, &group.key, config);
        report.graphs.push(GraphSummary {
            group: group.key,
            components: parts.len(),
            feature_count: parts.iter().map(|c| c.feature_count).sum(),
            pendant_vertices: parts.iter().map(|c| c.pendant_vertices).sum(),
            length: parts.iter().map(|c| c.length).sum(),
        });
        report.components.extend(parts);
    }
    monitor.report(total, total, "groups");
    log::info!(
        "components: {} subgraphs in {} groups",
        report.components.len(),
        report.graphs.len()
    );
    Ok(report)
}

fn split_components(
    graph: &NetworkGraph,
    features: &[Feature],
    group: &AttributeKey,
    config: &ComponentsConfig,
) -> Vec<ComponentRecord> {
    let node_sets = connected_components(graph);
    let n = node_sets.len();
    let mut part_of = vec![0usize; graph.node_count()];
    let mut records: Vec<ComponentRecord> = Vec::with_capacity(n);
    for (j, nodes) in node_sets.iter().enumerate() {
        for &v in nodes {
            part_of[v.index()] = j;
        }
        records.push(ComponentRecord {
            group: group.clone(),
            label: format!("{}/{}", j + 1, n),
            features: Vec::new(),
            feature_count: 0,
            pendant_vertices: nodes.iter().filter(|&&v| graph.degree(v) == 1).count(),
            length: 0.0,
            lines: Vec::new(),
        });
    }
    for e in graph.edge_ids() {
        let edge = graph.edge(e);
        let record = &mut records[part_of[edge.source().index()]];
        let Some(line) = features[edge.feature_index()].line() else {
            continue;
        };
        record.features.push(edge.feature_id());
        record.feature_count += 1;
        record.length += line.length();
        record.lines.push(if config.simplify {
            simplified(line)
        } else {
            line.clone()
        });
    }
    records
}

/// The segment joining the ends of `line`.
fn simplified(line: &LineString) -> LineString {
    match (line.first(), line.last()) {
        (Some(&a), Some(&b)) => LineString::new(vec![a, b]),
        _ => line.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopMonitor;

    #[test]
    fn simplified_keeps_only_the_ends() {
        let l = LineString::from_xy(&[(0.0, 0.0), (1.0, 5.0), (2.0, 0.0)]);
        assert_eq!(simplified(&l), LineString::from_xy(&[(0.0, 0.0), (2.0, 0.0)]));
    }

    #[test]
    fn two_separate_chains() {
        let features = vec![
            Feature::new(1, LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)])),
            Feature::new(2, LineString::from_xy(&[(1.0, 0.0), (2.0, 0.0)])),
            Feature::new(3, LineString::from_xy(&[(10.0, 0.0), (10.0, 3.0)])),
        ];
        let report =
            graph_components(&features, &ComponentsConfig::default(), &mut NoopMonitor).unwrap();
        assert_eq!(report.graphs.len(), 1);
        let summary = &report.graphs[0];
        assert_eq!(summary.group, AttributeKey::NoAttribute);
        assert_eq!(summary.components, 2);
        assert_eq!(summary.feature_count, 3);
        assert_eq!(summary.pendant_vertices, 4);
        assert_eq!(summary.length, 5.0);

        let labels: Vec<&str> = report.components.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["1/2", "2/2"]);
        assert_eq!(report.components[0].features, vec![FeatureId(1), FeatureId(2)]);
        assert_eq!(report.components[1].length, 3.0);
    }
}
