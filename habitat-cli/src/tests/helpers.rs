//! Test helpers for building fetch configurations over temporary workspaces.

use camino::{Utf8Path, Utf8PathBuf};
use geo::{Geometry, polygon};
use habitat_core::{Feature, LayerKind, RawLayer};
use tempfile::TempDir;

use crate::fetch::FetchConfig;

/// A temporary directory addressed through UTF-8 paths.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        habitat_fs::write_file(&path, contents.as_bytes()).expect("write workspace file");
        path
    }
}

/// A configuration fetching `layers` into `output_dir` with no sources.
pub(super) fn config_for(layers: &[LayerKind], output_dir: &Utf8Path) -> FetchConfig {
    FetchConfig {
        layers: layers.to_vec(),
        sources: Vec::new(),
        aoi: None,
        output_dir: output_dir.to_path_buf(),
        catalog_url: "https://catalog.example.com/wfs".to_owned(),
    }
}

/// A single unit-square polygon under `geometry_column`.
pub(super) fn square_layer(geometry_column: &str) -> RawLayer {
    let square = polygon![
        (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
    ];
    RawLayer::new(
        geometry_column,
        vec![Feature::new(Geometry::Polygon(square)).with_attribute("OBJECTID", 7_i64)],
    )
}

/// Parse a written GeoJSON file.
pub(super) fn read_json(path: &Utf8Path) -> serde_json::Value {
    let text = habitat_fs::read_to_string(path).expect("read output");
    serde_json::from_str(&text).expect("output is JSON")
}
