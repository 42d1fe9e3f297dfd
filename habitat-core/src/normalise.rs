//! The normalization pass that turns a raw layer into a canonical one.
//!
//! Per feature, in order:
//! 1. attribute renames for the kind,
//! 2. geometry column renamed to the canonical name,
//! 3. validity repair,
//! 4. coercion to the kind's forced type,
//! 5. for clipping kinds with an AOI, intersection with the AOI followed by
//!    a second coercion. Features left empty by the clip are dropped.

use log::debug;
use thiserror::Error;

use crate::aoi::Aoi;
use crate::feature::{Feature, NormalizedLayer, RawLayer};
use crate::geometry::{GeometryEngine, GeometryError, is_empty};
use crate::layer::{AoiBehaviour, LayerConfig, LayerKind};
use crate::rename::rename_attributes;

/// A geometry failure tied to the feature that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature {index}: {source}")]
pub struct NormaliseError {
    /// Position of the feature in the raw layer.
    pub index: usize,
    /// Engine failure.
    #[source]
    pub source: GeometryError,
}

/// Normalize `raw` into the canonical contract for `kind`.
///
/// # Examples
/// ```
/// use geo::{Geometry, polygon};
/// use habitat_core::{
///     Feature, GeoEngine, GeometryType, LayerKind, RawLayer, normalise_layer,
/// };
///
/// # fn main() -> Result<(), habitat_core::NormaliseError> {
/// let square = polygon![
///     (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
/// ];
/// let raw = RawLayer::new(
///     "SHAPE",
///     vec![Feature::new(Geometry::Polygon(square)).with_attribute("CROWN_CLOSURE", 35_i64)],
/// );
/// let layer = normalise_layer(LayerKind::Vri, raw, None, &GeoEngine)?;
///
/// assert_eq!(layer.geometry_column, "Shape");
/// assert!(layer.features[0].attributes.contains_key("CR_CLOSURE"));
/// assert_eq!(
///     GeometryType::of(&layer.features[0].geometry),
///     GeometryType::MultiPolygon
/// );
/// # Ok(())
/// # }
/// ```
pub fn normalise_layer(
    kind: LayerKind,
    raw: RawLayer,
    aoi: Option<&Aoi>,
    engine: &dyn GeometryEngine,
) -> Result<NormalizedLayer, NormaliseError> {
    let config = kind.config();
    let clip = aoi.filter(|_| config.aoi_behaviour == AoiBehaviour::Clip);
    let input_count = raw.features.len();
    if raw.geometry_column != config.geometry_column {
        debug!(
            "{kind}: renaming geometry column {:?} to {:?}",
            raw.geometry_column, config.geometry_column
        );
    }

    let mut features = Vec::with_capacity(input_count);
    let mut renamed = 0;
    for (index, feature) in raw.features.into_iter().enumerate() {
        let (normalised, count) = normalise_feature(config, feature, clip, engine)
            .map_err(|source| NormaliseError { index, source })?;
        renamed += count;
        if let Some(kept) = normalised {
            features.push(kept);
        }
    }

    debug!(
        "{kind}: normalised {input_count} features into {} ({renamed} attributes renamed)",
        features.len()
    );
    Ok(NormalizedLayer {
        kind,
        geometry_column: config.geometry_column,
        features,
    })
}

fn normalise_feature(
    config: &LayerConfig,
    feature: Feature,
    clip: Option<&Aoi>,
    engine: &dyn GeometryEngine,
) -> Result<(Option<Feature>, usize), GeometryError> {
    let Feature {
        mut attributes,
        geometry,
    } = feature;
    let renamed = rename_attributes(&mut attributes, config.attribute_renames);
    // The geometry is carried out of band; a same-named attribute would shadow it.
    attributes.remove(config.geometry_column);

    let mut shaped = engine.make_valid(geometry)?;
    if let Some(target) = config.forced_type {
        shaped = engine.cast(shaped, target)?;
    }
    if let Some(aoi) = clip {
        shaped = engine.intersect(&shaped, aoi.geometry())?;
        if let Some(target) = config.forced_type {
            shaped = engine.cast(shaped, target)?;
        }
        if is_empty(&shaped) {
            return Ok((None, renamed));
        }
    }

    Ok((
        Some(Feature {
            attributes,
            geometry: shaped,
        }),
        renamed,
    ))
}
