//! GeoJSON-backed [`VectorReader`].

use camino::{Utf8Path, Utf8PathBuf};
use geo::{BoundingRect, Intersects, Rect};
use habitat_core::RawLayer;
use log::debug;

use super::VectorReader;
use crate::convert::parse_layer;
use crate::error::RetrievalError;

/// Reads layers from GeoJSON files or directories of GeoJSON files.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use habitat_data::local::{GeoJsonReader, VectorReader};
///
/// let layer = GeoJsonReader.read(Utf8Path::new("data/wetlands"), "FWA_WETLANDS_POLY", None)?;
/// println!("{} wetlands", layer.len());
/// # Ok::<(), habitat_data::RetrievalError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonReader;

impl GeoJsonReader {
    fn resolve(source: &Utf8Path, layer_name: &str) -> Result<Utf8PathBuf, RetrievalError> {
        let io_error = |err: std::io::Error| RetrievalError::Io {
            path: source.to_path_buf(),
            source: err,
        };
        if habitat_fs::dir_is_dir(source).map_err(io_error)? {
            return habitat_fs::find_layer_file(source, layer_name)
                .map_err(io_error)?
                .ok_or_else(|| RetrievalError::MissingLayer {
                    dataset: source.to_path_buf(),
                    layer: layer_name.to_owned(),
                });
        }
        // A parent directory that does not exist means the dataset is missing.
        match habitat_fs::file_is_file(source) {
            Ok(true) => {
                debug!("{source} is a single-layer dataset; ignoring layer name {layer_name}");
                Ok(source.to_path_buf())
            }
            Ok(false) => Err(RetrievalError::MissingDataset {
                path: source.to_path_buf(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(RetrievalError::MissingDataset {
                    path: source.to_path_buf(),
                })
            }
            Err(err) => Err(io_error(err)),
        }
    }
}

impl VectorReader for GeoJsonReader {
    fn read(
        &self,
        source: &Utf8Path,
        layer_name: &str,
        bbox: Option<Rect<f64>>,
    ) -> Result<RawLayer, RetrievalError> {
        let path = Self::resolve(source, layer_name)?;
        let text = habitat_fs::read_to_string(&path).map_err(|err| RetrievalError::Io {
            path: path.clone(),
            source: err,
        })?;
        let mut layer = parse_layer(&text, path.as_str())?;

        if let Some(window) = bbox {
            let before = layer.len();
            layer.features.retain(|feature| {
                feature
                    .geometry
                    .bounding_rect()
                    .is_some_and(|rect| rect.intersects(&window))
            });
            debug!(
                "{path}: bounding box kept {} of {before} features",
                layer.len()
            );
        }
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    struct Dataset {
        _guard: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn dataset() -> Dataset {
        let guard = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(guard.path().to_path_buf()).expect("utf-8 temp dir");
        let squares = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"ID": 1},
                    "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"ID": 2},
                    "geometry": {"type": "Polygon", "coordinates": [[[10, 10], [11, 10], [11, 11], [10, 11], [10, 10]]]}
                }
            ]
        });
        habitat_fs::write_file(&root.join("BEM.geojson"), squares.to_string().as_bytes())
            .expect("write layer");
        habitat_fs::write_file(&root.join("FWA_RIVERS_POLY.json"), squares.to_string().as_bytes())
            .expect("write layer");
        Dataset {
            _guard: guard,
            root,
        }
    }

    #[rstest]
    #[case("BEM")]
    #[case("FWA_RIVERS_POLY")]
    fn reads_named_layer_from_directory(dataset: Dataset, #[case] layer: &str) {
        let raw = GeoJsonReader.read(&dataset.root, layer, None).expect("read");
        assert_eq!(raw.len(), 2);
    }

    #[rstest]
    fn reads_single_file_regardless_of_layer_name(dataset: Dataset) {
        let file = dataset.root.join("BEM.geojson");
        let raw = GeoJsonReader.read(&file, "anything", None).expect("read");
        assert_eq!(raw.len(), 2);
    }

    #[rstest]
    fn bounding_box_prefilters_features(dataset: Dataset) {
        let window = Rect::new(coord! { x: -1.0, y: -1.0 }, coord! { x: 2.0, y: 2.0 });
        let raw = GeoJsonReader
            .read(&dataset.root, "BEM", Some(window))
            .expect("read");
        assert_eq!(raw.len(), 1);
        assert_eq!(
            raw.features[0].attributes.get("ID"),
            Some(&habitat_core::AttributeValue::Integer(1))
        );
    }

    #[rstest]
    fn reports_missing_layer(dataset: Dataset) {
        let err = GeoJsonReader
            .read(&dataset.root, "VEG_R1_PLY_polygon", None)
            .expect_err("absent layer");
        assert!(
            matches!(&err, RetrievalError::MissingLayer { layer, .. } if layer == "VEG_R1_PLY_polygon"),
            "got {err:?}"
        );
    }

    #[rstest]
    #[case("nowhere.geojson")]
    #[case("nowhere/deeper.geojson")]
    fn reports_missing_dataset(dataset: Dataset, #[case] relative: &str) {
        let err = GeoJsonReader
            .read(&dataset.root.join(relative), "BEM", None)
            .expect_err("absent dataset");
        assert!(matches!(err, RetrievalError::MissingDataset { .. }), "got {err:?}");
    }
}
