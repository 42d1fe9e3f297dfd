//! Error types emitted by the habitat CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use habitat_core::{AoiError, LayerKind};
use habitat_data::{ClientBuildError, IngestError};
use thiserror::Error;

/// Errors emitted by the habitat CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without the leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// Two options that exclude each other were both set.
    #[error("--{first} and --{second} cannot be combined")]
    ConflictingArguments {
        /// First flag.
        first: &'static str,
        /// Second flag.
        second: &'static str,
    },
    /// `--layers` named something that is not a layer kind.
    #[error("invalid --layers entry: {message}")]
    UnknownLayer {
        /// Parser message naming the entry.
        message: String,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// Reading the AOI file failed.
    #[error("failed to read AOI from {path:?}: {source}")]
    ReadAoiFile {
        /// AOI file path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The AOI text is not a usable area.
    #[error("invalid AOI: {0}")]
    InvalidAoi(#[from] AoiError),
    /// Constructing the catalog client failed.
    #[error("failed to build catalog client for {url:?}: {source}")]
    BuildCatalogClient {
        /// Catalog base URL.
        url: String,
        /// Underlying build error.
        #[source]
        source: ClientBuildError,
    },
    /// Ingesting a layer failed.
    #[error("failed to ingest layer: {0}")]
    Ingest(#[from] IngestError),
    /// Serialising a normalised layer failed.
    #[error("failed to serialise {kind} layer: {source}")]
    SerialiseLayer {
        /// Layer kind.
        kind: LayerKind,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Writing a normalised layer failed.
    #[error("failed to write {kind} layer to {path:?}: {source}")]
    WriteLayer {
        /// Layer kind.
        kind: LayerKind,
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A layer worker panicked.
    #[error("the {kind} worker panicked")]
    WorkerPanicked {
        /// Layer kind.
        kind: LayerKind,
    },
}
