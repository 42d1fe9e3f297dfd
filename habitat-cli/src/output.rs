//! Writing normalised layers as GeoJSON files.

use camino::{Utf8Path, Utf8PathBuf};
use habitat_core::NormalizedLayer;
use habitat_data::convert::to_feature_collection;

use crate::CliError;

/// Path of the output file for a layer inside `output_dir`.
pub(crate) fn layer_path(output_dir: &Utf8Path, layer: &NormalizedLayer) -> Utf8PathBuf {
    output_dir.join(format!("{}.geojson", layer.kind))
}

/// Serialise `layer` to `<output_dir>/<kind>.geojson`, creating the
/// directory when needed.
pub(crate) fn write_layer(
    output_dir: &Utf8Path,
    layer: &NormalizedLayer,
) -> Result<Utf8PathBuf, CliError> {
    let path = layer_path(output_dir, layer);
    let payload = serde_json::to_vec(&to_feature_collection(layer)).map_err(|source| {
        CliError::SerialiseLayer {
            kind: layer.kind,
            source,
        }
    })?;
    habitat_fs::write_file(&path, &payload).map_err(|source| CliError::WriteLayer {
        kind: layer.kind,
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
