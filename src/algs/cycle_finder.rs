//! Closed-cycle detection in undirected line networks.
//!
//! The network's lines are polygonized into faces. Each face is a candidate
//! cycle; the features touching it form a small local multigraph, and the
//! edges whose both endpoints lie on the face are its boundary. A cycle is
//! classified by how many other edges hang off its boundary (isolated,
//! pendant, junction, fork) and, when an attribute is configured, by
//! whether its boundary edges all share one attribute value.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::data::{AttributeKey, Feature, FeatureId, ResultSink};
use crate::geometry::index::EnvelopeIndex;
use crate::geometry::metrics::{
    Location, circularity, intersects_polygon, is_convex, locate_in_polygon, polygon_area,
    polygon_perimeter,
};
use crate::geometry::polygonize::Polygonizer;
use crate::geometry::{Geometry, LineString, Polygon};
use crate::network_error::NetworkError;
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::{Dimension, Directedness, EdgeId, NetworkGraph, NodeId};

pub const ISOLATED: i32 = 1;
pub const PENDANT: i32 = 2;
pub const JUNCTION: i32 = 4;
pub const FORK: i32 = 8;

/// What to do with cycles whose boundary carries several attribute values.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeterogeneousMode {
    /// Drop them.
    #[default]
    None,
    /// Emit all of them, untagged.
    All,
    /// Emit only those with an `AAB`/`ABB` node pair.
    AabAbbOnly,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleFinderConfig {
    pub dimension: Dimension,
    pub min_edges: usize,
    pub max_edges: usize,
    /// Lines and faces longer than this are ignored.
    pub max_length: f64,
    /// Bitmask of [`ISOLATED`], [`PENDANT`], [`JUNCTION`], [`FORK`];
    /// zero or negative keeps every homogeneous cycle.
    pub degree_filter: i32,
    pub attribute: Option<String>,
    pub ignore_empty: bool,
    pub heterogeneous: HeterogeneousMode,
}

impl Default for CycleFinderConfig {
    fn default() -> Self {
        Self {
            dimension: Dimension::Xy,
            min_edges: 1,
            max_edges: 12,
            max_length: f64::MAX,
            degree_filter: 0,
            attribute: None,
            ignore_empty: false,
            heterogeneous: HeterogeneousMode::None,
        }
    }
}

impl CycleFinderConfig {
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.min_edges > self.max_edges {
            return Err(NetworkError::InvalidConfig(format!(
                "min_edges ({}) > max_edges ({})",
                self.min_edges, self.max_edges
            )));
        }
        if self.max_length.is_nan() || self.max_length <= 0.0 {
            return Err(NetworkError::InvalidConfig(format!(
                "max_length must be positive, got {}",
                self.max_length
            )));
        }
        Ok(())
    }

    fn accepts(&self, class: DegreeClass) -> bool {
        self.degree_filter <= 0 || self.degree_filter & class.bit() != 0
    }
}

/// Classification by the number of non-boundary edges touching a cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DegreeClass {
    Isolated,
    Pendant,
    Junction,
    Fork,
}

impl DegreeClass {
    pub fn from_incident(incident: usize) -> Self {
        match incident {
            0 => DegreeClass::Isolated,
            1 => DegreeClass::Pendant,
            2 => DegreeClass::Junction,
            _ => DegreeClass::Fork,
        }
    }

    pub fn bit(self) -> i32 {
        match self {
            DegreeClass::Isolated => ISOLATED,
            DegreeClass::Pendant => PENDANT,
            DegreeClass::Junction => JUNCTION,
            DegreeClass::Fork => FORK,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Convexity {
    Convex,
    Concave,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Homogeneity {
    Homogeneous,
    Heterogeneous,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CycleTag {
    Isolated,
    Pendant,
    Junction,
    Fork,
    AabAbb,
}

impl From<DegreeClass> for CycleTag {
    fn from(c: DegreeClass) -> Self {
        match c {
            DegreeClass::Isolated => CycleTag::Isolated,
            DegreeClass::Pendant => CycleTag::Pendant,
            DegreeClass::Junction => CycleTag::Junction,
            DegreeClass::Fork => CycleTag::Fork,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub polygon: Polygon,
    pub edge_count: usize,
    pub incident_edges: usize,
    pub perimeter: f64,
    pub area: f64,
    pub convexity: Convexity,
    pub circularity: f64,
    pub homogeneity: Homogeneity,
    pub tag: Option<CycleTag>,
    /// Features forming the cycle boundary.
    pub features: Vec<FeatureId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    pub homogeneous: Vec<CycleRecord>,
    pub heterogeneous: Vec<CycleRecord>,
    /// Faces examined after the perimeter filter.
    pub faces: usize,
    pub completion: Completion,
}

/// Runs cycle detection and collects both record streams.
pub fn find_cycles(
    features: &[Feature],
    config: &CycleFinderConfig,
    monitor: &mut dyn ProgressMonitor,
) -> Result<CycleReport, NetworkError> {
    let mut homogeneous = Vec::new();
    let mut heterogeneous = Vec::new();
    let (faces, completion) =
        find_cycles_into(features, config, &mut homogeneous, &mut heterogeneous, monitor)?;
    Ok(CycleReport {
        homogeneous,
        heterogeneous,
        faces,
        completion,
    })
}

/// Runs cycle detection, pushing records into the given sinks.
///
/// Returns the number of faces examined and whether the run finished.
pub fn find_cycles_into<H, X>(
    features: &[Feature],
    config: &CycleFinderConfig,
    homogeneous: &mut H,
    heterogeneous: &mut X,
    monitor: &mut dyn ProgressMonitor,
) -> Result<(usize, Completion), NetworkError>
where
    H: ResultSink<CycleRecord> + ?Sized,
    X: ResultSink<CycleRecord> + ?Sized,
{
    config.validate()?;
    let attribute = config.attribute.as_deref();
    if let Some(name) = attribute {
        crate::data::require_attribute(features, name)?;
    }

    let kept: Vec<usize> = (0..features.len())
        .filter(|&i| {
            !(config.ignore_empty
                && attribute.is_some_and(|name| {
                    features[i].attribute(name).is_none_or(|v| v.is_blank())
                }))
        })
        .collect();
    let lines: Vec<usize> = kept
        .iter()
        .copied()
        .filter(|&i| features[i].line().is_some_and(|l| !l.is_empty()))
        .collect();

    let index = EnvelopeIndex::build(
        lines
            .iter()
            .filter_map(|&i| features[i].geometry.envelope().map(|env| (env, i))),
    );

    let faces: Vec<Polygon> = polygonize_unique(features, &kept, config.max_length)
        .into_iter()
        .filter(|p| polygon_perimeter(p) <= config.max_length)
        .collect();
    log::info!(
        "cycle finder: {} candidate faces from {} lines",
        faces.len(),
        lines.len()
    );

    let total = faces.len();
    for (done, face) in faces.into_iter().enumerate() {
        if checkpoint(monitor, done, total, "faces") {
            return Ok((total, Completion::Cancelled));
        }
        let Some(candidate) = examine_face(features, &index, face, config) else {
            continue;
        };
        match candidate {
            Classified::Homogeneous(record) => homogeneous.accept(record),
            Classified::Heterogeneous(record) => heterogeneous.accept(record),
        }
    }
    monitor.report(total, total, "faces");
    Ok((total, Completion::Finished))
}

/// Extracts faces from the kept features. Lines are deduplicated by
/// normalized geometry; polygon rings are added as they are.
fn polygonize_unique(features: &[Feature], kept: &[usize], max_length: f64) -> Vec<Polygon> {
    let mut seen: HashSet<Vec<(u64, u64)>> = HashSet::new();
    let mut polygonizer = Polygonizer::new();
    for &i in kept {
        match &features[i].geometry {
            Geometry::LineString(line) => {
                if line.is_empty() || line.length() > max_length {
                    continue;
                }
                let normalized: LineString = line.normalized();
                let key: Vec<(u64, u64)> = normalized
                    .coords()
                    .iter()
                    .map(|c| ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()))
                    .collect();
                if seen.insert(key) {
                    polygonizer.add(&normalized);
                }
            }
            Geometry::Polygon(polygon) => {
                if polygon_perimeter(polygon) > max_length {
                    continue;
                }
                polygonizer.add(&LineString::new(polygon.exterior.clone()));
                for hole in &polygon.holes {
                    polygonizer.add(&LineString::new(hole.clone()));
                }
            }
            Geometry::Point(_) => {}
        }
    }
    polygonizer.polygons()
}

enum Classified {
    Homogeneous(CycleRecord),
    Heterogeneous(CycleRecord),
}

fn examine_face(
    features: &[Feature],
    index: &EnvelopeIndex,
    face: Polygon,
    config: &CycleFinderConfig,
) -> Option<Classified> {
    let envelope = face.envelope()?;
    let touching: Vec<usize> = index
        .query(&envelope)
        .into_iter()
        .filter(|&i| intersects_polygon(&features[i].geometry, &face))
        .collect();
    let (local, _) = NetworkGraph::from_indexed(
        features,
        touching,
        Directedness::Undirected,
        config.dimension,
    );

    let on_face: HashSet<NodeId> = local
        .node_ids()
        .filter(|&n| locate_in_polygon(&local.coord(n), &face) != Location::Exterior)
        .collect();
    let boundary = local.induced_edges(&on_face);
    if boundary.len() < config.min_edges || boundary.len() > config.max_edges {
        return None;
    }

    let attribute = config.attribute.as_deref();
    let key_of = |e: EdgeId| AttributeKey::of(&features[local.edge(e).feature_index()], attribute);
    let keys: HashSet<AttributeKey> = boundary.iter().map(|&e| key_of(e)).collect();

    let area = polygon_area(&face);
    let perimeter = polygon_perimeter(&face);
    let record = |incident: usize, homogeneity, tag| CycleRecord {
        edge_count: boundary.len(),
        incident_edges: incident,
        perimeter,
        area,
        convexity: if is_convex(&face) {
            Convexity::Convex
        } else {
            Convexity::Concave
        },
        circularity: circularity(area, perimeter),
        homogeneity,
        tag,
        features: boundary
            .iter()
            .map(|&e| local.edge(e).feature_id())
            .collect(),
        polygon: face.clone(),
    };

    if keys.len() == 1 {
        let key = keys.iter().next()?;
        let same = local.edge_ids().filter(|&e| &key_of(e) == key).count();
        let incident = same - boundary.len();
        let class = DegreeClass::from_incident(incident);
        if !config.accepts(class) {
            return None;
        }
        return Some(Classified::Homogeneous(record(
            incident,
            Homogeneity::Homogeneous,
            Some(class.into()),
        )));
    }

    let incident = local.edge_count() - boundary.len();
    match config.heterogeneous {
        HeterogeneousMode::None => None,
        HeterogeneousMode::All => Some(Classified::Heterogeneous(record(
            incident,
            Homogeneity::Heterogeneous,
            None,
        ))),
        HeterogeneousMode::AabAbbOnly => {
            let mut nodes: Vec<NodeId> = on_face.iter().copied().collect();
            nodes.sort_unstable();
            has_aab_abb_pair(&local, &nodes, &key_of).then(|| {
                Classified::Heterogeneous(record(
                    incident,
                    Homogeneity::Heterogeneous,
                    Some(CycleTag::AabAbb),
                ))
            })
        }
    }
}

/// `true` if two boundary nodes of degree three carry the same two values
/// with different multiplicities (`a, a, b` against `a, b, b`).
fn has_aab_abb_pair<F>(local: &NetworkGraph, nodes: &[NodeId], key_of: &F) -> bool
where
    F: Fn(EdgeId) -> AttributeKey,
{
    let profiles: Vec<HashMap<AttributeKey, usize>> = nodes
        .iter()
        .map(|&n| {
            let incident = local.incident_edges(n);
            if incident.len() != 3 {
                return HashMap::new();
            }
            let mut counts = HashMap::new();
            for e in incident {
                *counts.entry(key_of(e)).or_insert(0) += 1;
            }
            counts
        })
        .collect();
    let eligible: Vec<&HashMap<AttributeKey, usize>> =
        profiles.iter().filter(|p| p.len() == 2).collect();
    for (i, a) in eligible.iter().enumerate() {
        for (j, b) in eligible.iter().enumerate() {
            if i == j {
                continue;
            }
            let same_values = a.len() == b.len() && a.keys().all(|k| b.contains_key(k));
            if same_values && a != b {
                return true;
            }
        }
    }
    false
}
