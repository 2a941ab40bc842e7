//! Feature attribute values and grouping keys.

use std::fmt;
use std::hash::{Hash, Hasher};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::feature::Feature;

/// A single attribute value.
///
/// Values hash and compare structurally; reals compare by bit pattern so
/// they can key hash maps (`NaN` equals `NaN`, `0.0` equals `-0.0`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl AttributeValue {
    /// `Null`, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Numeric view of `Int` and `Real` values.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AttributeValue::Int(i) => Some(i as f64),
            AttributeValue::Real(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            AttributeValue::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn real_bits(r: f64) -> u64 {
        if r == 0.0 {
            0.0f64.to_bits()
        } else if r.is_nan() {
            f64::NAN.to_bits()
        } else {
            r.to_bits()
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        use AttributeValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Real(a), Real(b)) => Self::real_bits(*a) == Self::real_bits(*b),
            (Text(a), Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttributeValue::Null => {}
            AttributeValue::Bool(b) => b.hash(state),
            AttributeValue::Int(i) => i.hash(state),
            AttributeValue::Real(r) => Self::real_bits(*r).hash(state),
            AttributeValue::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Real(r) => write!(f, "{r}"),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Int(i64::from(i))
    }
}

impl From<u32> for AttributeValue {
    fn from(i: u32) -> Self {
        AttributeValue::Int(i64::from(i))
    }
}

impl From<f64> for AttributeValue {
    fn from(r: f64) -> Self {
        AttributeValue::Real(r)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(AttributeValue::Null, Into::into)
    }
}

/// Grouping key of a feature: its value for the grouping attribute, or
/// `NoAttribute` when no attribute is configured (every feature shares it).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKey {
    NoAttribute,
    Value(AttributeValue),
}

impl AttributeKey {
    /// Key of `feature` under `attribute`; a missing attribute reads as `Null`.
    pub fn of(feature: &Feature, attribute: Option<&str>) -> Self {
        match attribute {
            None => AttributeKey::NoAttribute,
            Some(name) => AttributeKey::Value(feature.attribute(name).cloned().unwrap_or_default()),
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKey::NoAttribute => f.write_str("*"),
            AttributeKey::Value(v) => write!(f, "{v}"),
        }
    }
}

/// Features sharing one grouping key, by index into the input slice.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureGroup {
    pub key: AttributeKey,
    pub members: Vec<usize>,
}

/// Partitions `features` by their value for `attribute`.
///
/// Groups appear in first-occurrence order and keep input order inside.
/// With `ignore_blank`, features whose value is null or blank are left out.
/// Without an attribute every feature lands in one `NoAttribute` group.
pub fn group_by_attribute(
    features: &[Feature],
    attribute: Option<&str>,
    ignore_blank: bool,
) -> Vec<FeatureGroup> {
    let mut slot: HashMap<AttributeKey, usize> = HashMap::new();
    let mut groups: Vec<FeatureGroup> = Vec::new();
    for (i, feature) in features.iter().enumerate() {
        let key = AttributeKey::of(feature, attribute);
        if ignore_blank && matches!(&key, AttributeKey::Value(v) if v.is_blank()) {
            continue;
        }
        let g = *slot.entry(key.clone()).or_insert_with(|| {
            groups.push(FeatureGroup {
                key,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[g].members.push(i);
    }
    groups
}
