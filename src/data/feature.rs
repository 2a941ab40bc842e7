//! Input features and result sinks.
//!
//! A [`Feature`] is a geometry with a stable identifier and a map of named
//! attributes. Analyses read slices of features and never mutate them; they
//! return records (or push them into a [`ResultSink`]) that refer back to
//! features through their [`FeatureId`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::attribute::AttributeValue;
use crate::geometry::{Geometry, LineString};
use crate::network_error::NetworkError;

/// Named attribute values, ordered by name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Stable identifier of an input feature.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FeatureId(pub u64);

impl fmt::Debug for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FeatureId").field(&self.0).finish()
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(id: u64, geometry: impl Into<Geometry>) -> Self {
        Self {
            id: FeatureId(id),
            geometry: geometry.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// The feature's line, if its geometry is linear.
    pub fn line(&self) -> Option<&LineString> {
        self.geometry.as_line()
    }
}

/// Destination for analysis records.
pub trait ResultSink<R> {
    fn accept(&mut self, record: R);
}

impl<R> ResultSink<R> for Vec<R> {
    fn accept(&mut self, record: R) {
        self.push(record);
    }
}

/// Fails with [`NetworkError::UnknownAttribute`] if no feature carries
/// `name`. An empty input is accepted.
pub fn require_attribute(features: &[Feature], name: &str) -> Result<(), NetworkError> {
    if features.is_empty() || features.iter().any(|f| f.attributes.contains_key(name)) {
        Ok(())
    } else {
        Err(NetworkError::UnknownAttribute(name.to_owned()))
    }
}
