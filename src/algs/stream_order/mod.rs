//! Stream ordering of directed line networks.
//!
//! Every edge of a directed network receives a Strahler order and,
//! optionally, a Shreve magnitude, accumulated length metrics, a Horton
//! order and Hack orders. The passes run in that order over one
//! [`NetworkGraph`], each visiting edges in input order and resolving
//! upstream (Strahler, metrics) or downstream (Horton, Hack) dependencies
//! with explicit stacks.
//!
//! Edges that lie on a directed cycle, or downstream of one, get no
//! Strahler order. The other passes skip what they cannot resolve.
//!
//! ```
//! use line_network::prelude::*;
//!
//! let features = vec![
//!     Feature::new(1, LineString::from_xy(&[(-1.0, 1.0), (0.0, 0.0)])),
//!     Feature::new(2, LineString::from_xy(&[(1.0, 1.0), (0.0, 0.0)])),
//!     Feature::new(3, LineString::from_xy(&[(0.0, 0.0), (0.0, -1.0)])),
//! ];
//! let report =
//!     compute_stream_orders(&features, &StreamOrderConfig::default(), &mut NoopMonitor).unwrap();
//! let orders: Vec<_> = report.records.iter().map(|r| r.strahler).collect();
//! assert_eq!(orders, vec![Some(1), Some(1), Some(2)]);
//! ```

mod accumulation;
mod hack;
mod horton;
mod strahler;

use serde::{Deserialize, Serialize};

use crate::data::{AttributeValue, Feature, FeatureId, require_attribute};
use crate::network_error::NetworkError;
use crate::progress::{Completion, ProgressMonitor};
use crate::topology::{Dimension, Directedness, EdgeId, NetworkGraph, NodeId};

use hack::HackColumns;

/// Attribute names written by [`augment_features`].
pub mod columns {
    pub const STRAHLER: &str = "Strahler";
    pub const SEGMENT_ORIGIN: &str = "SegOrigin";
    pub const SHREVE: &str = "Shreve";
    pub const MAX_DISTANCE: &str = "MaxDist";
    pub const FLOW_ACCUMULATION: &str = "FlowAcc";
    pub const HORTON: &str = "Horton";
    pub const HACK_DISTANCE_ORDER: &str = "HackDistO";
    pub const HACK_DISTANCE: &str = "HackDist";
    pub const HACK_FLOW_ORDER: &str = "HackFlowO";
    pub const HACK_FLOW: &str = "HackFlow";
    pub const HACK_DF_ORDER: &str = "HackDFO";
    pub const HACK_DF: &str = "HackDF";
    pub const MOUTH_DISTANCE: &str = "MouthDist";
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrahlerAlgorithm {
    /// Ties count only between branches rising at different nodes.
    #[default]
    SegmentOrigin,
    /// Ties count only between branches with disjoint upstream edge sets.
    Legacy,
}

/// Where an edge's length comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthSource {
    #[default]
    Geometry,
    /// A numeric attribute; missing or non-numeric values count as 0.
    Attribute(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOrderConfig {
    pub dimension: Dimension,
    pub algorithm: StrahlerAlgorithm,
    pub shreve: bool,
    /// Max distance to source and flow accumulation.
    pub metrics: bool,
    pub length: LengthSource,
    /// Requires `metrics`.
    pub horton: bool,
    /// Requires `metrics`.
    pub hack: bool,
}

impl StreamOrderConfig {
    pub fn validate(&self) -> Result<(), NetworkError> {
        if (self.horton || self.hack) && !self.metrics {
            return Err(NetworkError::InvalidConfig(
                "Horton and Hack orders need metrics to be computed".into(),
            ));
        }
        Ok(())
    }
}

/// Orders computed for one edge. `None` means undefined.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamOrderRecord {
    pub feature: FeatureId,
    /// Index of the feature in the input slice.
    pub feature_index: usize,
    pub strahler: Option<u32>,
    /// Node where the edge's current Strahler order started. Only tracked by
    /// [`StrahlerAlgorithm::SegmentOrigin`].
    pub segment_origin: Option<NodeId>,
    pub shreve: Option<f64>,
    pub max_distance: Option<f64>,
    pub flow_accumulation: Option<f64>,
    pub horton: Option<u32>,
    pub hack_distance_order: Option<u32>,
    pub hack_distance: Option<f64>,
    pub hack_flow_order: Option<u32>,
    pub hack_flow: Option<f64>,
    pub hack_df_order: Option<u32>,
    pub hack_df: Option<f64>,
    pub mouth_distance: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StreamOrderReport {
    /// One record per linear feature, in input order.
    pub records: Vec<StreamOrderRecord>,
    /// Features that could not become edges.
    pub skipped: Vec<FeatureId>,
    pub completion: Completion,
}

/// Builds a directed graph from `features` and orders it.
pub fn compute_stream_orders(
    features: &[Feature],
    config: &StreamOrderConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<StreamOrderReport, NetworkError> {
    config.validate()?;
    if let LengthSource::Attribute(name) = &config.length {
        require_attribute(features, name)?;
    }
    let (graph, build) =
        NetworkGraph::from_features(features, Directedness::Directed, config.dimension);
    let (records, completion) = stream_orders_on(&graph, features, config, monitor)?;
    Ok(StreamOrderReport {
        records,
        skipped: build.skipped,
        completion,
    })
}

/// Orders an existing directed graph whose edges index into `features`.
pub fn stream_orders_on(
    graph: &NetworkGraph,
    features: &[Feature],
    config: &StreamOrderConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<(Vec<StreamOrderRecord>, Completion), NetworkError> {
    config.validate()?;
    if !graph.is_directed() {
        return Err(NetworkError::UndirectedGraph("stream order"));
    }
    let lengths = edge_lengths(graph, features, &config.length);
    let mut sweep = Sweep::new(graph, lengths);

    let mut completion = sweep.strahler_pass(config.algorithm, config.shreve, monitor);
    if config.metrics && !completion.is_cancelled() {
        completion = sweep.accumulation_pass(monitor);
    }
    if config.horton && !completion.is_cancelled() {
        completion = sweep.horton_pass(monitor);
    }
    if config.hack && !completion.is_cancelled() {
        completion = sweep.hack_pass(monitor);
    }
    log::info!(
        "stream order: {} edges, {:?}, {} without Strahler order",
        graph.edge_count(),
        completion,
        sweep.strahler.iter().filter(|s| s.order().is_none()).count()
    );
    Ok((sweep.into_records(config), completion))
}

/// Copies `features` and writes the computed orders as attributes.
///
/// Only the columns enabled in `config` are written; features that did not
/// become edges get `Null` in every written column.
pub fn augment_features(
    features: &[Feature],
    records: &[StreamOrderRecord],
    config: &StreamOrderConfig,
) -> Vec<Feature> {
    let mut out = features.to_vec();
    let empty = StreamOrderRecord::default();
    let mut by_index: Vec<Option<&StreamOrderRecord>> = vec![None; features.len()];
    for r in records {
        if let Some(slot) = by_index.get_mut(r.feature_index) {
            *slot = Some(r);
        }
    }
    for (feature, record) in out.iter_mut().zip(by_index) {
        let r = record.unwrap_or(&empty);
        let mut set = |name: &str, value: AttributeValue| feature.set_attribute(name, value);
        set(columns::STRAHLER, r.strahler.into());
        set(
            columns::SEGMENT_ORIGIN,
            r.segment_origin.map(|n| n.index() as i64).into(),
        );
        if config.shreve {
            set(columns::SHREVE, r.shreve.into());
        }
        if config.metrics {
            set(columns::MAX_DISTANCE, r.max_distance.into());
            set(columns::FLOW_ACCUMULATION, r.flow_accumulation.into());
        }
        if config.horton {
            set(columns::HORTON, r.horton.into());
        }
        if config.hack {
            set(columns::HACK_DISTANCE_ORDER, r.hack_distance_order.into());
            set(columns::HACK_DISTANCE, r.hack_distance.into());
            set(columns::HACK_FLOW_ORDER, r.hack_flow_order.into());
            set(columns::HACK_FLOW, r.hack_flow.into());
            set(columns::HACK_DF_ORDER, r.hack_df_order.into());
            set(columns::HACK_DF, r.hack_df.into());
            set(columns::MOUTH_DISTANCE, r.mouth_distance.into());
        }
    }
    out
}

fn edge_lengths(graph: &NetworkGraph, features: &[Feature], source: &LengthSource) -> Vec<f64> {
    graph
        .edge_ids()
        .map(|e| {
            let feature = &features[graph.edge(e).feature_index()];
            match source {
                LengthSource::Geometry => feature.line().map_or(0.0, |l| l.length()),
                LengthSource::Attribute(name) => {
                    match feature.attribute(name).and_then(AttributeValue::as_f64) {
                        Some(v) => v,
                        None => {
                            log::warn!(
                                "feature {}: no numeric `{name}`, length taken as 0",
                                feature.id
                            );
                            0.0
                        }
                    }
                }
            }
        })
        .collect()
}

/// Strahler resolution state of one edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum OrderState {
    #[default]
    Unset,
    /// On the resolution stack, or found to depend on a cycle.
    Pending,
    Order(u32),
}

impl OrderState {
    #[inline]
    pub(crate) fn order(self) -> Option<u32> {
        match self {
            OrderState::Order(o) => Some(o),
            _ => None,
        }
    }
}

/// Per-edge columns shared by all passes, indexed by `EdgeId`.
pub(crate) struct Sweep<'g> {
    graph: &'g NetworkGraph,
    lengths: Vec<f64>,
    strahler: Vec<OrderState>,
    origin: Vec<Option<NodeId>>,
    shreve: Vec<Option<f64>>,
    max_distance: Vec<Option<f64>>,
    flow: Vec<Option<f64>>,
    horton: Vec<Option<u32>>,
    hack: HackColumns,
}

impl<'g> Sweep<'g> {
    fn new(graph: &'g NetworkGraph, lengths: Vec<f64>) -> Self {
        let n = graph.edge_count();
        Self {
            graph,
            lengths,
            strahler: vec![OrderState::Unset; n],
            origin: vec![None; n],
            shreve: vec![None; n],
            max_distance: vec![None; n],
            flow: vec![None; n],
            horton: vec![None; n],
            hack: HackColumns::new(n),
        }
    }

    #[inline]
    fn strahler_of(&self, e: EdgeId) -> Option<u32> {
        self.strahler[e.index()].order()
    }

    fn into_records(self, config: &StreamOrderConfig) -> Vec<StreamOrderRecord> {
        let graph = self.graph;
        graph
            .edge_ids()
            .map(|e| {
                let i = e.index();
                let edge = graph.edge(e);
                let strahler = self.strahler[i].order();
                let hack = self.hack.row(i);
                StreamOrderRecord {
                    feature: edge.feature_id(),
                    feature_index: edge.feature_index(),
                    strahler,
                    segment_origin: strahler.and(self.origin[i]),
                    shreve: if config.shreve { self.shreve[i] } else { None },
                    max_distance: self.max_distance[i],
                    flow_accumulation: self.flow[i],
                    horton: self.horton[i],
                    hack_distance_order: hack.distance_order,
                    hack_distance: hack.distance,
                    hack_flow_order: hack.flow_order,
                    hack_flow: hack.flow,
                    hack_df_order: hack.df_order,
                    hack_df: hack.df,
                    mouth_distance: hack.mouth,
                }
            })
            .collect()
    }
}
