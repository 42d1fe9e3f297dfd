//! Facade crate for habitat layer ingestion.
//!
//! This crate re-exports the core domain types and, behind the `data`
//! feature, the ingestor with its GeoJSON and WFS adapters.

#![forbid(unsafe_code)]

pub use habitat_core::{
    Aoi, AoiError, AttributeValue, Feature, GeoEngine, GeometryEngine, GeometryError,
    GeometryType, LayerConfig, LayerKind, NormalizedLayer, RawLayer, normalise_layer,
};

#[cfg(feature = "data")]
pub use habitat_data::catalog::{CatalogClient, WfsCatalogClient, WfsCatalogClientConfig};
#[cfg(feature = "data")]
pub use habitat_data::local::{GeoJsonReader, VectorReader};
#[cfg(feature = "data")]
pub use habitat_data::{IngestError, LayerIngestor, LayerRequest, RetrievalError};
