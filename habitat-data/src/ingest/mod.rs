//! The layer ingestor.
//!
//! [`LayerIngestor::ingest`] turns a [`LayerRequest`] into a
//! [`NormalizedLayer`]:
//!
//! 1. choose the source ([`SelectedSource`]);
//! 2. read the local dataset, or query the catalog with the kind's
//!    projection and an `INTERSECTS` filter for the AOI;
//! 3. normalise attributes and geometry for the kind.
//!
//! Each call is independent and blocking. Collaborators are borrowed, so one
//! set of them can serve many threads.

use camino::Utf8PathBuf;
use habitat_core::{
    Aoi, AoiError, GeometryEngine, LayerKind, NormaliseError, NormalizedLayer, RawLayer,
    normalise_layer,
};
use log::{debug, info};

use crate::catalog::{CatalogClient, CatalogQueryExt, Predicate};
use crate::error::{IngestError, RetrievalError};
use crate::local::VectorReader;

mod selection;

pub use selection::SelectedSource;

/// What to ingest and from where.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRequest {
    /// Layer kind.
    pub kind: LayerKind,
    /// Local dataset; `None` means the remote catalog.
    pub source: Option<Utf8PathBuf>,
    /// Layer inside the dataset; `None` uses the kind's default.
    pub layer_name: Option<String>,
    /// Optional area of interest.
    pub aoi: Option<Aoi>,
}

impl LayerRequest {
    /// Request `kind` from the remote catalog without an AOI.
    pub const fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            source: None,
            layer_name: None,
            aoi: None,
        }
    }

    /// Read from a local dataset.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Utf8PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Override the dataset layer name.
    #[must_use]
    pub fn with_layer_name(mut self, layer_name: impl Into<String>) -> Self {
        self.layer_name = Some(layer_name.into());
        self
    }

    /// Scope the request to `aoi`.
    #[must_use]
    pub fn with_aoi(mut self, aoi: Aoi) -> Self {
        self.aoi = Some(aoi);
        self
    }

    /// Scope the request to an AOI given as WKT.
    ///
    /// # Errors
    ///
    /// Returns [`AoiError`] when the text does not describe a usable AOI.
    pub fn with_aoi_wkt(self, wkt: &str) -> Result<Self, AoiError> {
        Ok(self.with_aoi(Aoi::from_wkt(wkt)?))
    }

    /// The effective layer name: the override or the kind's default.
    pub fn layer_name(&self) -> &str {
        self.layer_name
            .as_deref()
            .unwrap_or(self.kind.config().default_layer_name)
    }
}

/// Runs the ingestion pipeline over borrowed collaborators.
///
/// # Examples
/// ```
/// use geo::{Geometry, polygon};
/// use habitat_core::{Feature, GeoEngine, LayerKind, RawLayer};
/// use habitat_data::catalog::test_support::StubCatalogClient;
/// use habitat_data::local::GeoJsonReader;
/// use habitat_data::{LayerIngestor, LayerRequest};
///
/// let square = polygon![
///     (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
/// ];
/// let catalog = StubCatalogClient::with_layer(RawLayer::new(
///     "GEOMETRY",
///     vec![Feature::new(Geometry::Polygon(square))],
/// ));
/// let ingestor = LayerIngestor::new(&GeoJsonReader, &catalog, &GeoEngine);
///
/// let rivers = ingestor.ingest(&LayerRequest::new(LayerKind::Rivers))?;
/// assert_eq!(rivers.geometry_column, "GEOMETRY");
/// assert_eq!(rivers.len(), 1);
/// # Ok::<(), habitat_data::IngestError>(())
/// ```
#[derive(Clone, Copy)]
pub struct LayerIngestor<'a> {
    reader: &'a dyn VectorReader,
    catalog: &'a dyn CatalogClient,
    engine: &'a dyn GeometryEngine,
}

impl std::fmt::Debug for LayerIngestor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerIngestor").finish_non_exhaustive()
    }
}

impl<'a> LayerIngestor<'a> {
    /// Build an ingestor over the given collaborators.
    pub const fn new(
        reader: &'a dyn VectorReader,
        catalog: &'a dyn CatalogClient,
        engine: &'a dyn GeometryEngine,
    ) -> Self {
        Self {
            reader,
            catalog,
            engine,
        }
    }

    /// Retrieve and normalise one layer.
    ///
    /// # Errors
    ///
    /// - [`IngestError::MissingSource`] when no source exists for the kind;
    /// - [`IngestError::Retrieval`] when the reader or catalog fails;
    /// - [`IngestError::Geometry`] when repair, coercion or clipping fails.
    pub fn ingest(&self, request: &LayerRequest) -> Result<NormalizedLayer, IngestError> {
        let kind = request.kind;
        let source = SelectedSource::select(request)?;
        let raw = self
            .retrieve(&source)
            .map_err(|err| IngestError::Retrieval { kind, source: err })?;
        info!("{kind}: retrieved {} features", raw.len());

        normalise_layer(kind, raw, request.aoi.as_ref(), self.engine).map_err(
            |NormaliseError { index, source }| IngestError::Geometry {
                kind,
                index,
                source,
            },
        )
    }

    fn retrieve(&self, source: &SelectedSource<'_>) -> Result<RawLayer, RetrievalError> {
        match source {
            SelectedSource::LocalDataset {
                path,
                layer_name,
                bbox,
            } => {
                debug!("reading layer {layer_name} from {path}");
                self.reader.read(path, layer_name, *bbox)
            }
            SelectedSource::RemoteCatalog { binding, aoi } => {
                debug!("querying catalog record {}", binding.record_id);
                let query = self
                    .catalog
                    .query(binding.record_id)
                    .geometry_column(binding.geometry_column)
                    .select(binding.projection.iter().copied());
                match aoi {
                    Some(area) => query.filter(Predicate::intersects(area.wkt())).collect(),
                    None => query.collect(),
                }
            }
        }
    }
}
