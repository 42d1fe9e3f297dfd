//! Retrieval and ingestion of habitat layers.
//!
//! Responsibilities:
//! - Define the reader and catalog client traits the ingestor depends on.
//! - Provide adapters for GeoJSON datasets on disk and WFS catalogs.
//! - Run the ingestion pipeline: source selection, retrieval, normalisation.
//!
//! Boundaries:
//! - Normalisation rules live in `habitat-core`.
//! - Blocking HTTP stays inside the catalog client's own runtime.
//!
//! Invariants:
//! - Collaborators are `Send + Sync` and shared by reference.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod catalog;
pub mod convert;
mod error;
pub mod ingest;
pub mod local;

pub use error::{ClientBuildError, IngestError, RetrievalError};
pub use ingest::{LayerIngestor, LayerRequest, SelectedSource};
