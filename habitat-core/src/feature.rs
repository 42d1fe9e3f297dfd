//! Features and layers flowing through the ingestion pipeline.

use std::collections::BTreeMap;
use std::fmt;

use geo::Geometry;

use crate::layer::LayerKind;

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttributeValue {
    /// Missing value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// Free text, including dates as the sources encode them.
    Text(String),
}

impl AttributeValue {
    /// Whether the value is [`AttributeValue::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One spatial feature: attributes plus exactly one geometry.
///
/// # Examples
/// ```
/// use geo::{Geometry, point};
/// use habitat_core::{AttributeValue, Feature};
///
/// let feature = Feature::new(Geometry::Point(point!(x: 1.0, y: 2.0)))
///     .with_attribute("NAME", "marsh");
/// assert_eq!(feature.attributes.get("NAME"), Some(&AttributeValue::from("marsh")));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Attribute values keyed by column name.
    pub attributes: BTreeMap<String, AttributeValue>,
    /// The feature geometry.
    pub geometry: Geometry<f64>,
}

impl Feature {
    /// Construct a feature without attributes.
    pub const fn new(geometry: Geometry<f64>) -> Self {
        Self {
            attributes: BTreeMap::new(),
            geometry,
        }
    }

    /// Add or replace an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Features as returned by a reader or catalog client, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLayer {
    /// The geometry column name used by the source.
    pub geometry_column: String,
    /// Source features, in source order.
    pub features: Vec<Feature>,
}

impl RawLayer {
    /// Geometry column assumed when a source does not name one.
    pub const DEFAULT_GEOMETRY_COLUMN: &'static str = "geometry";

    /// Construct a raw layer.
    pub fn new(geometry_column: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            geometry_column: geometry_column.into(),
            features,
        }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the layer holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A layer that satisfies the canonical output contract for its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLayer {
    /// Kind the layer was ingested as.
    pub kind: LayerKind,
    /// Canonical geometry column name.
    pub geometry_column: &'static str,
    /// Normalized features.
    pub features: Vec<Feature>,
}

impl NormalizedLayer {
    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the layer holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;

    #[test]
    fn display_renders_payload() {
        assert_eq!(AttributeValue::Integer(4).to_string(), "4");
        assert_eq!(AttributeValue::from("PL").to_string(), "PL");
        assert_eq!(AttributeValue::Null.to_string(), "null");
    }

    #[test]
    fn with_attribute_replaces_existing() {
        let feature = Feature::new(Geometry::Point(point!(x: 0.0, y: 0.0)))
            .with_attribute("A", 1_i64)
            .with_attribute("A", 2_i64);
        assert_eq!(feature.attributes.get("A"), Some(&AttributeValue::Integer(2)));
    }

    #[test]
    fn as_text_only_matches_text() {
        assert_eq!(AttributeValue::from("x").as_text(), Some("x"));
        assert!(AttributeValue::Bool(true).as_text().is_none());
        assert!(AttributeValue::Null.is_null());
    }
}
