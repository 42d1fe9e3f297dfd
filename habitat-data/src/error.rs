//! Error types produced while retrieving and ingesting layers.

use std::io;

use camino::Utf8PathBuf;
use habitat_core::{GeometryError, LayerKind};
use thiserror::Error;

/// Failures raised by the local reader or the remote catalog client.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The dataset path does not exist.
    #[error("dataset {path} does not exist")]
    MissingDataset {
        /// Path that was probed.
        path: Utf8PathBuf,
    },
    /// A directory dataset lacks the requested layer.
    #[error("dataset {dataset} has no layer named {layer}")]
    MissingLayer {
        /// Dataset directory.
        dataset: Utf8PathBuf,
        /// Layer name that was looked up.
        layer: String,
    },
    /// Reading a file failed.
    #[error("failed to read {path}")]
    Io {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The payload was not valid GeoJSON.
    #[error("invalid GeoJSON from {origin}")]
    GeoJson {
        /// File path or URL the payload came from.
        origin: String,
        /// Parser error.
        #[source]
        source: Box<geojson::Error>,
    },
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error details.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("network error for {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Error details.
        message: String,
    },
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Timeout that elapsed.
        timeout_secs: u64,
    },
    /// The response body could not be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL.
        url: String,
        /// Error details.
        message: String,
    },
}

/// Errors returned by [`crate::LayerIngestor::ingest`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// No local source was given and the kind has no remote path.
    #[error("{kind} has no remote catalog record; a local source is required")]
    MissingSource {
        /// Requested layer kind.
        kind: LayerKind,
    },
    /// The reader or catalog client failed.
    #[error("failed to retrieve {kind} features")]
    Retrieval {
        /// Requested layer kind.
        kind: LayerKind,
        /// Collaborator failure.
        #[source]
        source: RetrievalError,
    },
    /// Geometry repair, coercion or clipping failed.
    #[error("failed to normalise {kind} feature {index}")]
    Geometry {
        /// Requested layer kind.
        kind: LayerKind,
        /// Position of the offending feature in the retrieved layer.
        index: usize,
        /// Engine failure.
        #[source]
        source: GeometryError,
    },
}

/// Errors raised while constructing a [`crate::catalog::WfsCatalogClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The base URL did not parse.
    #[error("invalid catalog URL {url}")]
    InvalidUrl {
        /// Rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] io::Error),
}
