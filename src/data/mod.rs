//! Feature data: identifiers, attributes, grouping and result sinks.

pub mod attribute;
pub mod feature;

pub use attribute::{AttributeKey, AttributeValue, FeatureGroup, group_by_attribute};
pub use feature::{Attributes, Feature, FeatureId, ResultSink, require_attribute};
