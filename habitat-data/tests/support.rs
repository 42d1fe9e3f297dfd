//! Shared helpers for the behavioural tests.

use camino::Utf8PathBuf;
use serde_json::{Value, json};
use tempfile::TempDir;

/// A dataset directory that lives as long as the value.
pub struct Dataset {
    _guard: TempDir,
    /// Dataset root.
    pub root: Utf8PathBuf,
}

/// Write each `(layer, collection)` pair as `<layer>.geojson` in a fresh directory.
pub fn write_dataset(layers: &[(&str, Value)]) -> Dataset {
    let guard = tempfile::tempdir().unwrap_or_else(|err| panic!("failed to create dataset: {err}"));
    let root = Utf8PathBuf::from_path_buf(guard.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temporary path {path:?} is not UTF-8"));
    for (layer, collection) in layers {
        let path = root.join(format!("{layer}.geojson"));
        habitat_fs::write_file(&path, collection.to_string().as_bytes())
            .unwrap_or_else(|err| panic!("failed to write {path}: {err}"));
    }
    Dataset {
        _guard: guard,
        root,
    }
}

/// A GeoJSON polygon feature from a closed ring.
pub fn polygon_feature(id: i64, species: &str, ring: &[[f64; 2]]) -> Value {
    json!({
        "type": "Feature",
        "properties": {"FEATURE_ID": id, "SPECIES_CD_1": species},
        "geometry": {"type": "Polygon", "coordinates": [ring]}
    })
}

/// A feature collection wrapping `features`.
pub fn collection(features: Vec<Value>) -> Value {
    json!({"type": "FeatureCollection", "features": features})
}
