//! `NodeId` / `EdgeId`: dense handles into a [`NetworkGraph`], and the
//! coordinate registry that maps line endpoints to nodes.
//!
//! Two endpoints are the same node when their `x` and `y` are bit-identical
//! (after folding `-0.0` into `0.0`). In [`Dimension::Xyz`] mode `z` takes
//! part in the identity as well, with all unknown elevations (`NaN`) equal to
//! each other.
//!
//! [`NetworkGraph`]: crate::topology::graph::NetworkGraph

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::geometry::Coord;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a dense index.
            ///
            /// # Panics
            ///
            /// Panics if `index` does not fit in 32 bits.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(u32::try_from(index).expect(concat!(stringify!($name), " overflow")))
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

dense_id!(
    /// Handle of a node; nodes are numbered in order of first appearance.
    NodeId
);
dense_id!(
    /// Handle of an edge; edges are numbered in input feature order.
    EdgeId
);

/// Which ordinates take part in node identity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    Xy,
    Xyz,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeKey {
    x: u64,
    y: u64,
    z: Option<u64>,
}

#[inline]
fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

/// Interns endpoint coordinates as nodes.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    dimension: Dimension,
    lookup: HashMap<NodeKey, NodeId>,
    coords: Vec<Coord>,
}

impl NodeRegistry {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn key(&self, c: &Coord) -> NodeKey {
        NodeKey {
            x: canonical_bits(c.x),
            y: canonical_bits(c.y),
            z: match self.dimension {
                Dimension::Xy => None,
                Dimension::Xyz => Some(canonical_bits(c.z)),
            },
        }
    }

    /// Returns the node at `c`, creating it on first sight. The node keeps
    /// the coordinate it was first seen with.
    pub fn resolve(&mut self, c: &Coord) -> NodeId {
        let key = self.key(c);
        if let Some(&id) = self.lookup.get(&key) {
            return id;
        }
        let id = NodeId::new(self.coords.len());
        self.coords.push(*c);
        self.lookup.insert(key, id);
        id
    }

    pub fn get(&self, c: &Coord) -> Option<NodeId> {
        self.lookup.get(&self.key(c)).copied()
    }

    pub fn coord(&self, id: NodeId) -> Option<&Coord> {
        self.coords.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}
