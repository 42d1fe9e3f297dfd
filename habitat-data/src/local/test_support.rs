//! Test utilities for local readers.
//!
//! [`StubVectorReader`] returns a fixed layer and records every read so tests
//! can assert on the arguments the ingestor passed.

use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use geo::Rect;
use habitat_core::RawLayer;

use super::VectorReader;
use crate::error::RetrievalError;

/// Arguments of one [`VectorReader::read`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRead {
    /// Dataset locator.
    pub source: Utf8PathBuf,
    /// Requested layer name.
    pub layer_name: String,
    /// Pre-filter rectangle, if any.
    pub bbox: Option<Rect<f64>>,
}

/// Stub `VectorReader` returning a pre-configured layer.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use habitat_core::RawLayer;
/// use habitat_data::local::VectorReader;
/// use habitat_data::local::test_support::StubVectorReader;
///
/// let reader = StubVectorReader::with_layer(RawLayer::new("SHAPE", Vec::new()));
/// let layer = reader.read(Utf8Path::new("bem.gdb"), "BEM", None).expect("stub read");
/// assert_eq!(layer.geometry_column, "SHAPE");
/// assert_eq!(reader.reads().len(), 1);
/// ```
#[derive(Debug)]
pub struct StubVectorReader {
    layer: RawLayer,
    reads: Mutex<Vec<RecordedRead>>,
}

impl StubVectorReader {
    /// Create a reader that always returns `layer`.
    #[must_use]
    pub const fn with_layer(layer: RawLayer) -> Self {
        Self {
            layer,
            reads: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn reads(&self) -> Vec<RecordedRead> {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl VectorReader for StubVectorReader {
    fn read(
        &self,
        source: &Utf8Path,
        layer_name: &str,
        bbox: Option<Rect<f64>>,
    ) -> Result<RawLayer, RetrievalError> {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRead {
                source: source.to_path_buf(),
                layer_name: layer_name.to_owned(),
                bbox,
            });
        Ok(self.layer.clone())
    }
}
