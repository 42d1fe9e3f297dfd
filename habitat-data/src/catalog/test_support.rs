//! Test utilities for catalog clients.
//!
//! [`StubCatalogClient`] answers every request with a pre-configured layer or
//! error and records the requests it receives, so tests can assert on the
//! query the ingestor built without a network.

use std::sync::{Mutex, PoisonError};

use habitat_core::RawLayer;

use super::{CatalogClient, CatalogRequest};
use crate::error::RetrievalError;

type ErrorFactory = Box<dyn Fn() -> RetrievalError + Send + Sync>;

enum StubResponse {
    Layer(RawLayer),
    Error(ErrorFactory),
}

/// Stub `CatalogClient` for testing.
///
/// # Example
///
/// ```
/// use habitat_core::RawLayer;
/// use habitat_data::RetrievalError;
/// use habitat_data::catalog::CatalogQueryExt;
/// use habitat_data::catalog::test_support::StubCatalogClient;
///
/// let client = StubCatalogClient::with_error(|| RetrievalError::Network {
///     url: "https://catalog.example.com/wfs".to_owned(),
///     message: "connection refused".to_owned(),
/// });
/// let result = client.query("WHSE_BASEMAPPING.FWA_RIVERS_POLY").collect();
/// assert!(matches!(result, Err(RetrievalError::Network { .. })));
/// assert_eq!(client.requests().len(), 1);
/// ```
pub struct StubCatalogClient {
    response: StubResponse,
    requests: Mutex<Vec<CatalogRequest>>,
}

impl std::fmt::Debug for StubCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubCatalogClient")
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl StubCatalogClient {
    /// Create a client that returns `layer` for every request.
    #[must_use]
    pub const fn with_layer(layer: RawLayer) -> Self {
        Self {
            response: StubResponse::Layer(layer),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a client that fails every request with the error `make` builds.
    #[must_use]
    pub fn with_error(make: impl Fn() -> RetrievalError + Send + Sync + 'static) -> Self {
        Self {
            response: StubResponse::Error(Box::new(make)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<CatalogRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CatalogClient for StubCatalogClient {
    fn execute(&self, request: &CatalogRequest) -> Result<RawLayer, RetrievalError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        match &self.response {
            StubResponse::Layer(layer) => Ok(layer.clone()),
            StubResponse::Error(make) => Err(make()),
        }
    }
}
