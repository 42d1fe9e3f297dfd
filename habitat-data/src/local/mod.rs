//! Local vector dataset readers.
//!
//! [`VectorReader`] is the seam the ingestor reads local sources through.
//! [`GeoJsonReader`] understands two dataset layouts:
//!
//! - a single GeoJSON file, which is the only layer it holds;
//! - a directory of layers stored as `<layer>.geojson` or `<layer>.json`.

use camino::Utf8Path;
use geo::Rect;
use habitat_core::RawLayer;

use crate::error::RetrievalError;

mod geojson;

#[doc(hidden)]
pub mod test_support;

pub use self::geojson::GeoJsonReader;

/// Read one layer from a local dataset.
///
/// `bbox` is a coarse pre-filter: implementations keep features whose
/// bounding rectangle intersects it and may return more than strictly
/// overlaps. Geometries are returned as stored, without repair.
pub trait VectorReader: Send + Sync {
    /// Read `layer_name` from `source`.
    fn read(
        &self,
        source: &Utf8Path,
        layer_name: &str,
        bbox: Option<Rect<f64>>,
    ) -> Result<RawLayer, RetrievalError>;
}
