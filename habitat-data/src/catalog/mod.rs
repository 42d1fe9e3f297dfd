//! Remote geospatial catalog access.
//!
//! [`CatalogClient`] is the seam the ingestor queries remote records
//! through. Queries are assembled with the chainable builder from
//! [`CatalogQueryExt::query`] and sent by [`CatalogQuery::collect`].
//!
//! [`WfsCatalogClient`] speaks OGC WFS 2.0 `GetFeature` with `CQL_FILTER`, as
//! served by the BC Geographic Warehouse.
//!
//! # Example
//!
//! ```no_run
//! use habitat_data::catalog::{CatalogQueryExt, Predicate, WfsCatalogClient};
//!
//! let client = WfsCatalogClient::new("https://openmaps.gov.bc.ca/geo/pub/wfs")?;
//! let wetlands = client
//!     .query("WHSE_BASEMAPPING.FWA_WETLANDS_POLY")
//!     .filter(Predicate::intersects("POLYGON ((1200000 450000, 1210000 450000, 1210000 460000, 1200000 450000))"))
//!     .collect()?;
//! println!("{} wetlands", wetlands.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use habitat_core::RawLayer;

use crate::error::RetrievalError;

mod query;
mod wfs;

#[doc(hidden)]
pub mod test_support;

pub use query::{CatalogQuery, CatalogRequest, DEFAULT_CATALOG_GEOMETRY_COLUMN, Predicate};
pub use wfs::{
    DEFAULT_CATALOG_URL, DEFAULT_PAGE_SIZE, DEFAULT_SORT_KEY, DEFAULT_SRS_NAME,
    DEFAULT_USER_AGENT, WfsCatalogClient, WfsCatalogClientConfig,
};

/// Execute catalog requests.
///
/// Implementations return every matching record; paging is their concern.
pub trait CatalogClient: Send + Sync {
    /// Fetch all records matching `request`.
    fn execute(&self, request: &CatalogRequest) -> Result<RawLayer, RetrievalError>;
}

/// Query-builder entry point for every [`CatalogClient`], trait objects included.
pub trait CatalogQueryExt: CatalogClient {
    /// Start a query for the catalog object `record_id`.
    fn query(&self, record_id: impl Into<String>) -> CatalogQuery<'_, Self> {
        CatalogQuery::new(self, record_id)
    }
}

impl<C: CatalogClient + ?Sized> CatalogQueryExt for C {}
