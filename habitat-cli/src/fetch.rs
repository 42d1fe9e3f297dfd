//! Fetch command implementation for the habitat CLI.

use std::thread;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use habitat_core::{Aoi, GeoEngine, GeometryEngine, LayerKind};
use habitat_data::catalog::{CatalogClient, DEFAULT_CATALOG_URL, WfsCatalogClient};
use habitat_data::local::{GeoJsonReader, VectorReader};
use habitat_data::{LayerIngestor, LayerRequest};
use log::{error, info};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::elapsed::format_elapsed;
use crate::output::write_layer;
use crate::{
    ARG_AOI, ARG_AOI_FILE, ARG_BEM_SOURCE, ARG_CATALOG_URL, ARG_CCB_SOURCE, ARG_LAYERS,
    ARG_OUTPUT_DIR, ARG_RIVERS_SOURCE, ARG_VRI_SOURCE, ARG_WETLANDS_SOURCE, CliError,
    ENV_OUTPUT_DIR,
};

/// CLI arguments for the `fetch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch habitat layers and write them as GeoJSON. Layers with \
                 a source are read from local datasets; the others are \
                 queried from the WFS catalog. Options can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Fetch and normalise habitat layers"
)]
#[ortho_config(prefix = "HABITAT")]
pub(crate) struct FetchArgs {
    /// Comma-separated layer kinds (vri, bem, wetlands, rivers, ccb).
    #[arg(long = ARG_LAYERS, value_name = "kinds")]
    #[serde(default)]
    pub(crate) layers: Option<String>,
    /// Local dataset for VRI polygons.
    #[arg(long = ARG_VRI_SOURCE, value_name = "path")]
    #[serde(default)]
    pub(crate) vri_source: Option<Utf8PathBuf>,
    /// Local dataset for Broad Ecosystem Mapping.
    #[arg(long = ARG_BEM_SOURCE, value_name = "path")]
    #[serde(default)]
    pub(crate) bem_source: Option<Utf8PathBuf>,
    /// Local dataset for wetlands.
    #[arg(long = ARG_WETLANDS_SOURCE, value_name = "path")]
    #[serde(default)]
    pub(crate) wetlands_source: Option<Utf8PathBuf>,
    /// Local dataset for river polygons.
    #[arg(long = ARG_RIVERS_SOURCE, value_name = "path")]
    #[serde(default)]
    pub(crate) rivers_source: Option<Utf8PathBuf>,
    /// Local dataset for consolidated cutblocks.
    #[arg(long = ARG_CCB_SOURCE, value_name = "path")]
    #[serde(default)]
    pub(crate) ccb_source: Option<Utf8PathBuf>,
    /// Area of interest as WKT.
    #[arg(long = ARG_AOI, value_name = "wkt")]
    #[serde(default)]
    pub(crate) aoi: Option<String>,
    /// File holding the area of interest as WKT.
    #[arg(long = ARG_AOI_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) aoi_file: Option<Utf8PathBuf>,
    /// Directory receiving `<kind>.geojson` files.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Base URL of the WFS catalog.
    #[arg(long = ARG_CATALOG_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) catalog_url: Option<String>,
}

impl FetchArgs {
    pub(crate) fn into_config(self) -> Result<FetchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FetchConfig::try_from(merged)
    }
}

/// A local dataset supplied for one layer kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LayerSource {
    pub(crate) kind: LayerKind,
    pub(crate) field: &'static str,
    pub(crate) path: Utf8PathBuf,
}

/// Where the AOI text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AoiInput {
    Wkt(String),
    File(Utf8PathBuf),
}

/// Resolved `fetch` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchConfig {
    /// Layers to fetch, without duplicates, in request order.
    pub(crate) layers: Vec<LayerKind>,
    /// Local datasets by kind.
    pub(crate) sources: Vec<LayerSource>,
    /// Optional AOI.
    pub(crate) aoi: Option<AoiInput>,
    /// Output directory.
    pub(crate) output_dir: Utf8PathBuf,
    /// Base URL of the WFS catalog.
    pub(crate) catalog_url: String,
}

impl FetchConfig {
    pub(crate) fn source(&self, kind: LayerKind) -> Option<&Utf8Path> {
        self.sources
            .iter()
            .find(|source| source.kind == kind)
            .map(|source| source.path.as_path())
    }

    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        for source in &self.sources {
            Self::require_dataset(&source.path, source.field)?;
        }
        if let Some(AoiInput::File(path)) = &self.aoi {
            Self::require_file(path, ARG_AOI_FILE)?;
        }
        match habitat_fs::file_is_file(&self.output_dir) {
            Ok(true) => Err(CliError::OutputDirectoryNotDirectory {
                path: self.output_dir.clone(),
            }),
            Ok(false) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_OUTPUT_DIR,
                path: self.output_dir.clone(),
                source,
            }),
        }
    }

    /// Datasets may be a GeoJSON file or a directory of layer files.
    fn require_dataset(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        let exists = habitat_fs::file_is_file(path)
            .and_then(|is_file| Ok(is_file || habitat_fs::dir_is_dir(path)?));
        match exists {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) => Err(Self::inspect_error(path, field, source)),
        }
    }

    fn require_file(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match habitat_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) if habitat_fs::dir_is_dir(path).unwrap_or(false) => {
                Err(CliError::SourcePathNotFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Ok(false) => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) => Err(Self::inspect_error(path, field, source)),
        }
    }

    fn inspect_error(path: &Utf8Path, field: &'static str, source: std::io::Error) -> CliError {
        if source.kind() == std::io::ErrorKind::NotFound {
            CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }
        } else {
            CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Parse the AOI, reading it from disk when given as a file.
    pub(crate) fn load_aoi(&self) -> Result<Option<Aoi>, CliError> {
        let text = match &self.aoi {
            None => return Ok(None),
            Some(AoiInput::Wkt(wkt)) => wkt.clone(),
            Some(AoiInput::File(path)) => {
                habitat_fs::read_to_string(path).map_err(|source| CliError::ReadAoiFile {
                    path: path.clone(),
                    source,
                })?
            }
        };
        Ok(Some(Aoi::from_wkt(text.trim())?))
    }

    /// One request per layer, carrying its source and the shared AOI.
    pub(crate) fn requests(&self, aoi: Option<&Aoi>) -> Vec<LayerRequest> {
        self.layers
            .iter()
            .map(|&kind| {
                let mut request = LayerRequest::new(kind);
                if let Some(path) = self.source(kind) {
                    request = request.with_source(path);
                }
                if let Some(area) = aoi {
                    request = request.with_aoi(area.clone());
                }
                request
            })
            .collect()
    }
}

impl TryFrom<FetchArgs> for FetchConfig {
    type Error = CliError;

    fn try_from(args: FetchArgs) -> Result<Self, Self::Error> {
        let output_dir = args.output_dir.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_DIR,
            env: ENV_OUTPUT_DIR,
        })?;

        let aoi = match (args.aoi, args.aoi_file) {
            (Some(_), Some(_)) => {
                return Err(CliError::ConflictingArguments {
                    first: ARG_AOI,
                    second: ARG_AOI_FILE,
                });
            }
            (Some(wkt), None) => Some(AoiInput::Wkt(wkt)),
            (None, Some(path)) => Some(AoiInput::File(path)),
            (None, None) => None,
        };

        let sources: Vec<LayerSource> = [
            (LayerKind::Vri, ARG_VRI_SOURCE, args.vri_source),
            (LayerKind::Bem, ARG_BEM_SOURCE, args.bem_source),
            (LayerKind::Wetlands, ARG_WETLANDS_SOURCE, args.wetlands_source),
            (LayerKind::Rivers, ARG_RIVERS_SOURCE, args.rivers_source),
            (LayerKind::Ccb, ARG_CCB_SOURCE, args.ccb_source),
        ]
        .into_iter()
        .filter_map(|(kind, field, path)| path.map(|path| LayerSource { kind, field, path }))
        .collect();

        let layers = match args.layers {
            Some(list) => parse_layers(&list)?,
            None => default_layers(&sources),
        };

        Ok(Self {
            layers,
            sources,
            aoi,
            output_dir,
            catalog_url: args
                .catalog_url
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_owned()),
        })
    }
}

/// Parse a comma-separated list of kinds, dropping repeats.
pub(crate) fn parse_layers(list: &str) -> Result<Vec<LayerKind>, CliError> {
    let mut layers = Vec::new();
    for entry in list.split(',').filter(|entry| !entry.trim().is_empty()) {
        let kind: LayerKind = entry
            .parse()
            .map_err(|message| CliError::UnknownLayer { message })?;
        if !layers.contains(&kind) {
            layers.push(kind);
        }
    }
    if layers.is_empty() {
        return Err(CliError::UnknownLayer {
            message: "no layer kinds given".to_owned(),
        });
    }
    Ok(layers)
}

/// Every kind with a remote path, plus any local-only kind given a source.
fn default_layers(sources: &[LayerSource]) -> Vec<LayerKind> {
    LayerKind::ALL
        .into_iter()
        .filter(|&kind| kind.supports_remote() || sources.iter().any(|source| source.kind == kind))
        .collect()
}

/// A layer written by a fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchedLayer {
    pub(crate) kind: LayerKind,
    pub(crate) path: Utf8PathBuf,
    pub(crate) features: usize,
}

pub(crate) fn run_fetch(args: FetchArgs) -> Result<(), CliError> {
    let config = resolve_fetch_config(args)?;
    let catalog = WfsCatalogClient::new(config.catalog_url.clone()).map_err(|source| {
        CliError::BuildCatalogClient {
            url: config.catalog_url.clone(),
            source,
        }
    })?;
    let started = Instant::now();
    let fetched = run_fetch_with(&config, &GeoJsonReader, &catalog, &GeoEngine)?;
    info!(
        "fetched {} layers in {}",
        fetched.len(),
        format_elapsed(started.elapsed())
    );
    Ok(())
}

fn resolve_fetch_config(args: FetchArgs) -> Result<FetchConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Ingest every configured layer on its own scoped thread and write the
/// results.
///
/// All layers run to completion; the first failure in request order is
/// returned after the others have been logged.
pub(crate) fn run_fetch_with(
    config: &FetchConfig,
    reader: &dyn VectorReader,
    catalog: &dyn CatalogClient,
    engine: &dyn GeometryEngine,
) -> Result<Vec<FetchedLayer>, CliError> {
    let aoi = config.load_aoi()?;
    let requests = config.requests(aoi.as_ref());
    let ingestor = LayerIngestor::new(reader, catalog, engine);
    let output_dir = config.output_dir.as_path();

    let outcomes: Vec<Result<FetchedLayer, CliError>> = thread::scope(|scope| {
        let workers: Vec<_> = requests
            .iter()
            .map(|request| {
                (
                    request.kind,
                    scope.spawn(move || fetch_layer(ingestor, request, output_dir)),
                )
            })
            .collect();
        workers
            .into_iter()
            .map(|(kind, worker)| {
                worker
                    .join()
                    .unwrap_or_else(|_| Err(CliError::WorkerPanicked { kind }))
            })
            .collect()
    });

    let mut fetched = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    for outcome in outcomes {
        match outcome {
            Ok(layer) => fetched.push(layer),
            Err(err) => {
                error!("{err}");
                first_error.get_or_insert(err);
            }
        }
    }
    first_error.map_or(Ok(fetched), Err)
}

fn fetch_layer(
    ingestor: LayerIngestor<'_>,
    request: &LayerRequest,
    output_dir: &Utf8Path,
) -> Result<FetchedLayer, CliError> {
    let kind = request.kind;
    let started = Instant::now();
    match request.source.as_deref() {
        Some(path) => info!("{kind}: reading {path}"),
        None => info!("{kind}: querying the catalog"),
    }
    let layer = ingestor.ingest(request)?;
    let path = write_layer(output_dir, &layer)?;
    info!(
        "{kind}: wrote {} features to {path} in {}",
        layer.len(),
        format_elapsed(started.elapsed())
    );
    Ok(FetchedLayer {
        kind,
        path,
        features: layer.len(),
    })
}
