//! Conversion between GeoJSON documents and layers.
//!
//! The source geometry column name travels as the `geometry_name` foreign
//! member, which is how GeoServer labels it in WFS responses.

use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};
use habitat_core::{AttributeValue, Feature, NormalizedLayer, RawLayer};
use log::warn;

use crate::error::RetrievalError;

/// Foreign member naming the geometry column.
pub const GEOMETRY_NAME_MEMBER: &str = "geometry_name";

/// Parse a GeoJSON document into a raw layer.
///
/// A lone feature or geometry is treated as a one-feature collection.
/// Features without geometry are skipped.
///
/// # Examples
/// ```
/// use habitat_data::convert::parse_layer;
///
/// let text = r#"{
///     "type": "FeatureCollection",
///     "features": [{
///         "type": "Feature",
///         "geometry_name": "SHAPE",
///         "properties": {"HARVEST_YEAR": 1998},
///         "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}
///     }]
/// }"#;
/// let layer = parse_layer(text, "inline")?;
/// assert_eq!(layer.geometry_column, "SHAPE");
/// assert_eq!(layer.len(), 1);
/// # Ok::<(), habitat_data::RetrievalError>(())
/// ```
pub fn parse_layer(text: &str, origin: &str) -> Result<RawLayer, RetrievalError> {
    let collection = parse_collection(text).map_err(|source| geojson_error(origin, source))?;
    collection_to_layer(collection, origin)
}

pub(crate) fn parse_collection(text: &str) -> Result<FeatureCollection, geojson::Error> {
    let document: GeoJson = text.parse()?;
    Ok(match document {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(feature) => std::iter::once(feature).collect(),
        GeoJson::Geometry(geometry) => std::iter::once(geojson::Feature::from(geometry)).collect(),
    })
}

/// Render a normalized layer as a feature collection.
///
/// The canonical geometry column is recorded as a `geometry_name` member.
pub fn to_feature_collection(layer: &NormalizedLayer) -> FeatureCollection {
    let features = layer
        .features
        .iter()
        .map(|feature| {
            let properties: JsonObject = feature
                .attributes
                .iter()
                .map(|(key, value)| (key.clone(), attribute_to_json(value)))
                .collect();
            geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&feature.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut members = JsonObject::new();
    members.insert(
        GEOMETRY_NAME_MEMBER.to_owned(),
        JsonValue::from(layer.geometry_column),
    );
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(members),
    }
}

pub(crate) fn collection_to_layer(
    collection: FeatureCollection,
    origin: &str,
) -> Result<RawLayer, RetrievalError> {
    let geometry_column = geometry_column(&collection);
    let mut features = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!("{origin}: skipping feature {index} without geometry");
            continue;
        };
        let shape =
            geo::Geometry::<f64>::try_from(geometry).map_err(|source| geojson_error(origin, source))?;
        let attributes = feature
            .properties
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, attribute_from_json(value)))
            .collect();
        features.push(Feature {
            attributes,
            geometry: shape,
        });
    }
    Ok(RawLayer::new(geometry_column, features))
}

fn geometry_column(collection: &FeatureCollection) -> String {
    collection
        .foreign_members
        .iter()
        .chain(
            collection
                .features
                .first()
                .and_then(|feature| feature.foreign_members.as_ref()),
        )
        .find_map(|members| members.get(GEOMETRY_NAME_MEMBER).and_then(JsonValue::as_str))
        .unwrap_or(RawLayer::DEFAULT_GEOMETRY_COLUMN)
        .to_owned()
}

fn geojson_error(origin: &str, source: geojson::Error) -> RetrievalError {
    RetrievalError::GeoJson {
        origin: origin.to_owned(),
        source: Box::new(source),
    }
}

fn attribute_from_json(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(flag) => AttributeValue::Bool(flag),
        JsonValue::Number(number) => number.as_i64().map_or_else(
            || number.as_f64().map_or(AttributeValue::Null, AttributeValue::Float),
            AttributeValue::Integer,
        ),
        JsonValue::String(text) => AttributeValue::Text(text),
        // Nested values have no scalar form; keep their JSON text.
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => AttributeValue::Text(nested.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(flag) => JsonValue::Bool(*flag),
        AttributeValue::Integer(number) => JsonValue::from(*number),
        AttributeValue::Float(number) => serde_json::Number::from_f64(*number)
            .map_or(JsonValue::Null, JsonValue::Number),
        AttributeValue::Text(text) => JsonValue::String(text.clone()),
    }
}
