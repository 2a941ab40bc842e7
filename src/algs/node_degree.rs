//! Node listing filtered by degree.
//!
//! Features are grouped by attribute value and each group gets its own
//! directed graph, so two lines with different values never share a node.
//! A node is emitted when its total degree falls in an enabled class and it
//! passes the optional in-degree-0 / out-degree-0 restriction.

use serde::{Deserialize, Serialize};

use crate::data::{AttributeKey, Feature, ResultSink, group_by_attribute, require_attribute};
use crate::geometry::Coord;
use crate::network_error::NetworkError;
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::{Dimension, Directedness, NetworkGraph, NodeId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDegreeConfig {
    pub dimension: Dimension,
    /// Build one graph per value of this attribute.
    pub attribute: Option<String>,
    /// Leave out features whose attribute value is null or blank.
    pub ignore_empty: bool,
    pub degree0: bool,
    pub degree1: bool,
    pub degree2: bool,
    pub degree3_plus: bool,
    /// Keep only nodes nothing flows into.
    pub in_degree0: bool,
    /// Keep only nodes nothing flows out of. With `in_degree0` as well,
    /// either condition is enough.
    pub out_degree0: bool,
}

impl Default for NodeDegreeConfig {
    fn default() -> Self {
        Self {
            dimension: Dimension::Xy,
            attribute: None,
            ignore_empty: false,
            degree0: false,
            degree1: true,
            degree2: false,
            degree3_plus: false,
            in_degree0: false,
            out_degree0: false,
        }
    }
}

impl NodeDegreeConfig {
    pub fn validate(&self) -> Result<(), NetworkError> {
        if !(self.degree0 || self.degree1 || self.degree2 || self.degree3_plus) {
            return Err(NetworkError::InvalidConfig(
                "no degree class selected".to_string(),
            ));
        }
        Ok(())
    }

    fn accepts(&self, in_degree: usize, out_degree: usize) -> bool {
        let degree = in_degree + out_degree;
        let class = match degree {
            0 => self.degree0,
            1 => self.degree1,
            2 => self.degree2,
            _ => self.degree3_plus,
        };
        if !class {
            return false;
        }
        match (self.in_degree0, self.out_degree0) {
            (true, true) => in_degree == 0 || out_degree == 0,
            (true, false) => in_degree == 0,
            (false, true) => out_degree == 0,
            (false, false) => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub point: Coord,
    pub group: AttributeKey,
    pub in_degree: usize,
    pub out_degree: usize,
    pub degree: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDegreeReport {
    /// Matching nodes, group by group, in node order within a group.
    pub nodes: Vec<NodeRecord>,
    pub completion: Completion,
}

pub fn graph_nodes(
    features: &[Feature],
    config: &NodeDegreeConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<NodeDegreeReport, NetworkError> {
    let mut nodes = Vec::new();
    let completion = graph_nodes_into(features, config, &mut nodes, monitor)?;
    Ok(NodeDegreeReport { nodes, completion })
}

/// Like [`graph_nodes`], pushing each record into `sink`.
pub fn graph_nodes_into<S>(
    features: &[Feature],
    config: &NodeDegreeConfig,
    sink: &mut S,
    monitor: &mut dyn ProgressMonitor,
) -> Result<Completion, NetworkError>
where
    S: ResultSink<NodeRecord> + ?Sized,
{
    config.validate()?;
    let attribute = config.attribute.as_deref();
    if let Some(name) = attribute {
        require_attribute(features, name)?;
    }
    let groups = group_by_attribute(features, attribute, config.ignore_empty);
    let total = groups.len();
    let mut emitted = 0usize;
    for (done, group) in groups.into_iter().enumerate() {
        if checkpoint(monitor, done, total, "groups") {
            return Ok(Completion::Cancelled);
        }
        let (graph, _) = NetworkGraph::from_indexed(
            features,
            group.members,
            Directedness::Directed,
            config.dimension,
        );
        for n in graph.node_ids() {
            if let Some(record) = node_record(&graph, n, &group.key, config) {
                sink.accept(record);
                emitted += 1;
            }
        }
    }
    monitor.report(total, total, "groups");
    log::info!("node degree: {emitted} nodes in {total} groups");
    Ok(Completion::Finished)
}

fn node_record(
    graph: &NetworkGraph,
    n: NodeId,
    group: &AttributeKey,
    config: &NodeDegreeConfig,
) -> Option<NodeRecord> {
    let (in_degree, out_degree) = (graph.in_degree(n), graph.out_degree(n));
    config.accepts(in_degree, out_degree).then(|| NodeRecord {
        point: graph.coord(n),
        group: group.clone(),
        in_degree,
        out_degree,
        degree: in_degree + out_degree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_and_out_restrictions_combine_as_either() {
        let cfg = NodeDegreeConfig {
            degree1: true,
            degree2: true,
            in_degree0: true,
            out_degree0: true,
            ..Default::default()
        };
        assert!(cfg.accepts(0, 1));
        assert!(cfg.accepts(1, 0));
        assert!(!cfg.accepts(1, 1));

        let only_in = NodeDegreeConfig {
            out_degree0: false,
            ..cfg.clone()
        };
        assert!(only_in.accepts(0, 1));
        assert!(!only_in.accepts(1, 0));
    }

    #[test]
    fn degree_classes_select_by_total_degree() {
        let cfg = NodeDegreeConfig {
            degree1: false,
            degree3_plus: true,
            ..Default::default()
        };
        assert!(!cfg.accepts(1, 0));
        assert!(cfg.accepts(2, 1));
        assert!(cfg.accepts(0, 7));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let cfg = NodeDegreeConfig {
            degree1: false,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(NetworkError::InvalidConfig(_))));
    }
}
