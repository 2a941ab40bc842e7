//! Anomaly detection and repair for directed hydrographic networks.
//!
//! In a well-formed river network every line is digitized downstream, water
//! only splits where it really does, and no flow path loops back on itself.
//! Four kinds of anomaly break that:
//!
//! - an *upward edge* whose first vertex is lower than its last;
//! - a *source*: a node nothing flows into but several edges leave;
//! - a *sink*: a node nothing leaves but several edges enter;
//! - a directed *cycle*.
//!
//! [`detect_anomalies`] reports them without touching anything.
//! [`repair_anomalies`] reverses edges to remove them (elevation first, then
//! sources, sinks and cycles), undoing any path reversal that would create a
//! new cycle. It returns the features to reverse; [`apply_repair`] writes the
//! reversed geometries back.

mod detect;
mod repair;

pub use detect::{detect_anomalies, detect_on};
pub use repair::{apply_repair, repair_anomalies, repair_on};

use serde::{Deserialize, Serialize};

use crate::data::{Feature, FeatureId};
use crate::geometry::Geometry;
use crate::network_error::NetworkError;
use crate::progress::Completion;
use crate::topology::{Dimension, NetworkGraph, NodeId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydroConfig {
    pub dimension: Dimension,
    pub sources: bool,
    pub sinks: bool,
    pub cycles: bool,
    /// Check and repair edge orientation against vertex elevations.
    pub use_elevation: bool,
    /// Elevation differences within this tolerance are not inversions.
    pub elevation_tolerance: f64,
}

impl Default for HydroConfig {
    fn default() -> Self {
        Self {
            dimension: Dimension::Xy,
            sources: true,
            sinks: true,
            cycles: true,
            use_elevation: true,
            elevation_tolerance: 0.0,
        }
    }
}

impl HydroConfig {
    pub fn validate(&self) -> Result<(), NetworkError> {
        if !self.elevation_tolerance.is_finite() || self.elevation_tolerance < 0.0 {
            return Err(NetworkError::InvalidConfig(format!(
                "elevation_tolerance must be finite and >= 0, got {}",
                self.elevation_tolerance
            )));
        }
        Ok(())
    }

    /// `true` if going from `z0` to `z1` climbs by more than the tolerance.
    pub(crate) fn is_inverted(&self, z0: f64, z1: f64) -> bool {
        !z0.is_nan() && !z1.is_nan() && z0 - z1 < -self.elevation_tolerance
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    Source,
    Sink,
    Cycle,
    UpwardEdge,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub kind: AnomalyKind,
    pub geometry: Geometry,
    /// Offending feature, for edge anomalies.
    pub feature: Option<FeatureId>,
    /// Offending node, for source and sink anomalies.
    pub node: Option<NodeId>,
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnomalyReport {
    pub upward_edges: Vec<AnomalyRecord>,
    pub cycles: Vec<AnomalyRecord>,
    /// Sources and sinks, in node order.
    pub nodes: Vec<AnomalyRecord>,
    pub completion: Completion,
}

/// Counts of repairs performed, per stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairStats {
    pub upward_edges: usize,
    pub sources: usize,
    pub sinks: usize,
    pub cycles: usize,
    /// Path reversals undone because they closed a cycle.
    pub rolled_back: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RepairReport {
    /// Features whose orientation ends up reversed, in input order.
    pub reversed: Vec<FeatureId>,
    /// Input indices matching `reversed`.
    pub reversed_indices: Vec<usize>,
    /// Copies of the reversed features with their geometry flipped.
    pub reversed_features: Vec<Feature>,
    pub stats: RepairStats,
    pub completion: Completion,
}

/// `true` if nothing flows into `n` but several edges leave it.
pub fn is_source(g: &NetworkGraph, n: NodeId) -> bool {
    g.in_degree(n) == 0 && g.out_degree(n) > 1
}

/// `true` if nothing leaves `n` but several edges enter it.
pub fn is_sink(g: &NetworkGraph, n: NodeId) -> bool {
    g.out_degree(n) == 0 && g.in_degree(n) > 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inversion_respects_tolerance_and_unknown_z() {
        let cfg = HydroConfig {
            elevation_tolerance: 0.5,
            ..Default::default()
        };
        assert!(cfg.is_inverted(1.0, 2.0));
        assert!(!cfg.is_inverted(1.0, 1.4));
        assert!(!cfg.is_inverted(2.0, 1.0));
        assert!(!cfg.is_inverted(f64::NAN, 2.0));
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let cfg = HydroConfig {
            elevation_tolerance: -1.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(NetworkError::InvalidConfig(_))));
        assert!(HydroConfig::default().validate().is_ok());
    }
}
