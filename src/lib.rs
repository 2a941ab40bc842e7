//! # line-network
//!
//! line-network builds a topological multigraph from linear features (road
//! or river lines, each with an attribute map) and runs network analyses on
//! it:
//!
//! - closed cycle detection and classification
//!   ([`algs::cycle_finder`]);
//! - Strahler, Shreve, Horton and Hack stream orders on directed networks,
//!   tolerant of cycles ([`algs::stream_order`]);
//! - detection and guarded repair of hydrographic anomalies: edges flowing
//!   uphill, sources, sinks and directed cycles ([`algs::hydro`]);
//! - node degree listing and connected component statistics
//!   ([`algs::node_degree`], [`algs::components`]).
//!
//! ## Inputs and outputs
//!
//! Every analysis takes an ordered slice of [`data::Feature`] and a config
//! struct, and returns a report of owned records. Features are never
//! modified; graph edges refer back to them by input index and
//! [`data::FeatureId`]. Configs derive `Default` and serde traits and are
//! checked by `validate()` before any graph work.
//!
//! ## Progress and cancellation
//!
//! Analyses poll a [`progress::ProgressMonitor`] between units of work. A
//! cancelled run returns what it has produced so far, flagged with
//! [`progress::Completion::Cancelled`].
//!
//! ## Logging
//!
//! Stage boundaries and skipped data are logged through the `log` facade.
//! The library installs no logger.

pub mod algs;
pub mod data;
pub mod geometry;
pub mod network_error;
pub mod progress;
pub mod topology;

/// A convenient prelude to import the most-used types and entry points:
pub mod prelude {
    pub use crate::algs::components::{ComponentsConfig, graph_components};
    pub use crate::algs::cycle_finder::{CycleFinderConfig, CycleRecord, find_cycles};
    pub use crate::algs::hydro::{
        HydroConfig, apply_repair, detect_anomalies, repair_anomalies,
    };
    pub use crate::algs::node_degree::{NodeDegreeConfig, graph_nodes};
    pub use crate::algs::stream_order::{
        StrahlerAlgorithm, StreamOrderConfig, augment_features, compute_stream_orders,
    };
    pub use crate::data::{AttributeKey, AttributeValue, Feature, FeatureId, ResultSink};
    pub use crate::geometry::{Coord, Geometry, LineString, Polygon};
    pub use crate::network_error::NetworkError;
    pub use crate::progress::{CancelFlag, Completion, NoopMonitor, ProgressMonitor};
    pub use crate::topology::{Dimension, Directedness, NetworkGraph};
}
