//! Core domain types for habitat layer ingestion.
//!
//! Responsibilities:
//! - Enumerate the layer kinds and hold their static configuration.
//! - Model raw and normalized layers.
//! - Encode the normalization rules: attribute renames, geometry repair,
//!   type coercion and AOI clipping.
//!
//! Boundaries:
//! - No I/O. Readers and catalog clients live in `habitat-data`.
//! - Geometry operations go through the [`GeometryEngine`] trait.

#![forbid(unsafe_code)]

pub mod aoi;
pub mod feature;
pub mod geometry;
pub mod layer;
pub mod normalise;
pub mod rename;

pub use aoi::{Aoi, AoiError};
pub use feature::{AttributeValue, Feature, NormalizedLayer, RawLayer};
pub use geometry::{GeoEngine, GeometryEngine, GeometryError, GeometryType};
pub use layer::{AoiBehaviour, CatalogBinding, LayerConfig, LayerKind, VRI_PROJECTION};
pub use normalise::{NormaliseError, normalise_layer};
pub use rename::{VRI_ATTRIBUTE_RENAMES, rename_attributes};
