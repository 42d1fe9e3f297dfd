//! Source selection for a layer request.

use camino::Utf8Path;
use geo::Rect;
use habitat_core::{Aoi, CatalogBinding};

use super::LayerRequest;
use crate::error::IngestError;

/// Where a request's features come from, decided once per call.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedSource<'r> {
    /// Read a local dataset.
    LocalDataset {
        /// Dataset locator.
        path: &'r Utf8Path,
        /// Layer inside the dataset.
        layer_name: &'r str,
        /// AOI bounding rectangle used as a coarse pre-filter.
        bbox: Option<Rect<f64>>,
    },
    /// Query the remote catalog.
    RemoteCatalog {
        /// Catalog object and projection for the kind.
        binding: &'static CatalogBinding,
        /// AOI to intersect server-side.
        aoi: Option<&'r Aoi>,
    },
}

impl<'r> SelectedSource<'r> {
    /// Choose the source for `request`.
    ///
    /// An explicit source always wins. Without one, the kind must have a
    /// catalog binding.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingSource`] when there is neither a local
    /// source nor a remote path for the kind.
    pub fn select(request: &'r LayerRequest) -> Result<Self, IngestError> {
        if let Some(path) = request.source.as_deref() {
            return Ok(Self::LocalDataset {
                path,
                layer_name: request.layer_name(),
                bbox: request.aoi.as_ref().map(Aoi::bounds),
            });
        }
        request
            .kind
            .config()
            .catalog
            .as_ref()
            .map(|binding| Self::RemoteCatalog {
                binding,
                aoi: request.aoi.as_ref(),
            })
            .ok_or(IngestError::MissingSource { kind: request.kind })
    }
}
