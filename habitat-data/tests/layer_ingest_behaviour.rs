//! Behavioural tests for [`LayerIngestor`].
//!
//! Local scenarios read GeoJSON datasets written to a temporary directory;
//! remote scenarios use [`StubCatalogClient`] instead of a live WFS service.

use std::cell::RefCell;

use geo::{BoundingRect, Geometry, Polygon, Validation, polygon};
use habitat_core::{Aoi, AttributeValue, Feature, GeoEngine, LayerKind, NormalizedLayer, RawLayer};
use habitat_data::catalog::test_support::StubCatalogClient;
use habitat_data::local::GeoJsonReader;
use habitat_data::{IngestError, LayerIngestor, LayerRequest, RetrievalError};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

mod support;

use support::{Dataset, collection, polygon_feature, write_dataset};

/// Outcome of the last ingest call.
type ResultCell = RefCell<Option<Result<NormalizedLayer, IngestError>>>;

const WESTERN_HALF: &str = "POLYGON ((0 0, 5 0, 5 4, 0 4, 0 0))";
const BOW_TIE_ID: i64 = 1;
const CATALOG_FEATURES: usize = 3;

#[fixture]
fn dataset() -> RefCell<Option<Dataset>> {
    RefCell::new(None)
}

#[fixture]
fn aoi() -> RefCell<Option<Aoi>> {
    RefCell::new(None)
}

#[fixture]
fn catalog() -> RefCell<Option<StubCatalogClient>> {
    RefCell::new(None)
}

#[fixture]
fn result() -> ResultCell {
    RefCell::new(None)
}

fn square_ring(x: f64, y: f64) -> Vec<[f64; 2]> {
    vec![[x, y], [x + 2.0, y], [x + 2.0, y + 2.0], [x, y + 2.0], [x, y]]
}

fn ingest_with(
    request: &LayerRequest,
    catalog: &RefCell<Option<StubCatalogClient>>,
) -> Result<NormalizedLayer, IngestError> {
    let fallback = StubCatalogClient::with_layer(RawLayer::new("GEOMETRY", Vec::new()));
    let guard = catalog.borrow();
    let client = guard.as_ref().unwrap_or(&fallback);
    LayerIngestor::new(&GeoJsonReader, client, &GeoEngine).ingest(request)
}

fn expect_layer(result: &ResultCell) -> NormalizedLayer {
    result
        .borrow()
        .as_ref()
        .expect("ingest was attempted")
        .as_ref()
        .expect("expected a normalised layer")
        .clone()
}

// --- Given steps ---

#[given("a local VRI dataset of ten polygons including a bow-tie")]
fn vri_dataset(#[from(dataset)] dataset: &RefCell<Option<Dataset>>) {
    let mut features = Vec::new();
    let mut id = 0;
    for row in [0.0, 2.0] {
        for column in [0.0, 2.0, 4.0, 6.0, 8.0] {
            id += 1;
            let ring = if id == BOW_TIE_ID {
                vec![[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]]
            } else {
                square_ring(column, row)
            };
            features.push(polygon_feature(id, "FDC", &ring));
        }
    }
    *dataset.borrow_mut() = Some(write_dataset(&[(
        LayerKind::Vri.config().default_layer_name,
        collection(features),
    )]));
}

#[given("an AOI covering the western half of the dataset")]
fn western_half(#[from(aoi)] aoi: &RefCell<Option<Aoi>>) {
    *aoi.borrow_mut() = Some(Aoi::from_wkt(WESTERN_HALF).expect("valid AOI"));
}

#[given("a catalog serving polygons under a GEOMETRY column")]
fn catalog_with_polygons(#[from(catalog)] catalog: &RefCell<Option<StubCatalogClient>>) {
    let features = (0..CATALOG_FEATURES)
        .map(|index| {
            let offset = f64::from(u32::try_from(index).expect("small index")) * 3.0;
            let square: Polygon<f64> = polygon![
                (x: offset, y: 0.0),
                (x: offset + 1.0, y: 0.0),
                (x: offset + 1.0, y: 1.0),
                (x: offset, y: 1.0),
                (x: offset, y: 0.0),
            ];
            Feature::new(Geometry::Polygon(square))
        })
        .collect();
    *catalog.borrow_mut() = Some(StubCatalogClient::with_layer(RawLayer::new("GEOMETRY", features)));
}

#[given("a catalog that fails with a network error")]
fn failing_catalog(#[from(catalog)] catalog: &RefCell<Option<StubCatalogClient>>) {
    *catalog.borrow_mut() = Some(StubCatalogClient::with_error(|| RetrievalError::Network {
        url: "https://catalog.example.com/wfs".to_owned(),
        message: "connection refused".to_owned(),
    }));
}

// --- When steps ---

#[when("I ingest the VRI layer from the local dataset")]
fn ingest_local_vri(
    #[from(dataset)] dataset: &RefCell<Option<Dataset>>,
    #[from(aoi)] aoi: &RefCell<Option<Aoi>>,
    #[from(catalog)] catalog: &RefCell<Option<StubCatalogClient>>,
    #[from(result)] result: &ResultCell,
) {
    let root = dataset
        .borrow()
        .as_ref()
        .expect("dataset prepared")
        .root
        .clone();
    let mut request = LayerRequest::new(LayerKind::Vri).with_source(root);
    if let Some(area) = aoi.borrow().clone() {
        request = request.with_aoi(area);
    }
    *result.borrow_mut() = Some(ingest_with(&request, catalog));
}

#[when("I ingest the BEM layer without a source")]
fn ingest_bem(
    #[from(aoi)] aoi: &RefCell<Option<Aoi>>,
    #[from(catalog)] catalog: &RefCell<Option<StubCatalogClient>>,
    #[from(result)] result: &ResultCell,
) {
    let mut request = LayerRequest::new(LayerKind::Bem).with_layer_name("BEM");
    if let Some(area) = aoi.borrow().clone() {
        request = request.with_aoi(area);
    }
    *result.borrow_mut() = Some(ingest_with(&request, catalog));
}

#[when("I ingest the Wetlands layer from the catalog")]
fn ingest_remote_wetlands(
    #[from(catalog)] catalog: &RefCell<Option<StubCatalogClient>>,
    #[from(result)] result: &ResultCell,
) {
    *result.borrow_mut() = Some(ingest_with(&LayerRequest::new(LayerKind::Wetlands), catalog));
}

#[when("I ingest the Rivers layer from the catalog")]
fn ingest_remote_rivers(
    #[from(catalog)] catalog: &RefCell<Option<StubCatalogClient>>,
    #[from(result)] result: &ResultCell,
) {
    *result.borrow_mut() = Some(ingest_with(&LayerRequest::new(LayerKind::Rivers), catalog));
}

// --- Then steps ---

#[then("no more than ten features are returned")]
fn at_most_ten(#[from(result)] result: &ResultCell) {
    let layer = expect_layer(result);
    assert!(layer.len() <= 10, "got {} features", layer.len());
    assert!(!layer.is_empty(), "the western half overlaps the dataset");
}

#[then("every geometry is a valid multipolygon")]
fn all_valid_multipolygons(#[from(result)] result: &ResultCell) {
    let layer = expect_layer(result);
    for feature in &layer.features {
        let Geometry::MultiPolygon(shape) = &feature.geometry else {
            panic!("expected a multipolygon, got {:?}", feature.geometry);
        };
        assert!(shape.is_valid(), "invalid geometry: {shape:?}");
    }
}

#[then("every geometry lies inside the AOI")]
fn inside_aoi(#[from(result)] result: &ResultCell) {
    let layer = expect_layer(result);
    for feature in &layer.features {
        let bounds = feature.geometry.bounding_rect().expect("non-empty geometry");
        assert!(bounds.max().x <= 5.0 + 1.0e-9, "feature escapes the AOI: {bounds:?}");
    }
}

#[then("the bow-tie has been repaired into two lobes")]
fn bow_tie_repaired(#[from(result)] result: &ResultCell) {
    let layer = expect_layer(result);
    let bow_tie = layer
        .features
        .iter()
        .find(|feature| feature.attributes.get("FEATURE_ID") == Some(&AttributeValue::Integer(BOW_TIE_ID)))
        .expect("bow-tie survives the clip");
    let Geometry::MultiPolygon(lobes) = &bow_tie.geometry else {
        panic!("expected a multipolygon, got {:?}", bow_tie.geometry);
    };
    assert_eq!(lobes.0.len(), 2, "a bow-tie splits at its crossing point");
    assert!(lobes.is_valid());
}

#[then("species codes use the short attribute names")]
fn renamed_species(#[from(result)] result: &ResultCell) {
    let layer = expect_layer(result);
    for feature in &layer.features {
        assert_eq!(
            feature.attributes.get("SPEC_CD_1"),
            Some(&AttributeValue::from("FDC"))
        );
        assert!(!feature.attributes.contains_key("SPECIES_CD_1"));
    }
}

#[then("the output geometry column is Shape")]
fn shape_column(#[from(result)] result: &ResultCell) {
    assert_eq!(expect_layer(result).geometry_column, "Shape");
}

#[then("the output geometry column is GEOMETRY")]
fn geometry_column(#[from(result)] result: &ResultCell) {
    assert_eq!(expect_layer(result).geometry_column, "GEOMETRY");
}

#[then("every input feature is returned")]
fn all_returned(#[from(result)] result: &ResultCell) {
    assert_eq!(expect_layer(result).len(), CATALOG_FEATURES);
}

#[then("a missing source error is returned")]
fn missing_source(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let outcome = borrowed.as_ref().expect("ingest was attempted");
    assert!(
        matches!(outcome, Err(IngestError::MissingSource { kind: LayerKind::Bem })),
        "expected MissingSource, got {outcome:?}"
    );
}

#[then("a retrieval error is returned")]
fn retrieval_error(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let outcome = borrowed.as_ref().expect("ingest was attempted");
    assert!(
        matches!(
            outcome,
            Err(IngestError::Retrieval {
                source: RetrievalError::Network { .. },
                ..
            })
        ),
        "expected a retrieval error, got {outcome:?}"
    );
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/layer_ingest.feature", name = $title)]
        fn $fn_name(
            dataset: RefCell<Option<Dataset>>,
            aoi: RefCell<Option<Aoi>>,
            catalog: RefCell<Option<StubCatalogClient>>,
            result: ResultCell,
        ) {
            let _ = (dataset, aoi, catalog, result);
        }
    };
}

register_scenario!(
    clipping_local_vri,
    "clipping a local VRI dataset to the western half"
);
register_scenario!(rejecting_bem_without_source, "rejecting BEM without a source");
register_scenario!(
    remote_wetlands_column,
    "keeping the Shape column for remote wetlands"
);
register_scenario!(
    remote_rivers_column,
    "using the GEOMETRY column for remote rivers"
);
register_scenario!(reporting_catalog_failures, "reporting catalog failures");
