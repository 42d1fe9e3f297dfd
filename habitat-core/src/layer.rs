//! Layer kinds and their static ingestion configuration.
//!
//! Every per-kind special case lives in [`LayerConfig`] values looked up
//! through [`LayerKind::config`]; the pipeline never branches on the kind
//! directly.
//!
//! # Examples
//! ```
//! use habitat_core::LayerKind;
//!
//! assert_eq!(LayerKind::Rivers.config().geometry_column, "GEOMETRY");
//! assert!(LayerKind::Bem.config().catalog.is_none());
//! assert_eq!(LayerKind::Vri.to_string(), "vri");
//! ```

use crate::geometry::GeometryType;
use crate::rename::VRI_ATTRIBUTE_RENAMES;

/// The layer families the ingestor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LayerKind {
    /// Vegetation Resource Inventory, rank 1 polygons.
    Vri,
    /// Broad Ecosystem Mapping. Local datasets only.
    Bem,
    /// Freshwater Atlas wetlands.
    Wetlands,
    /// Freshwater Atlas river polygons.
    Rivers,
    /// Consolidated cutblocks.
    Ccb,
}

impl LayerKind {
    /// All layer kinds in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Vri,
        Self::Bem,
        Self::Wetlands,
        Self::Rivers,
        Self::Ccb,
    ];

    /// Return the kind as a lowercase `&str`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vri => "vri",
            Self::Bem => "bem",
            Self::Wetlands => "wetlands",
            Self::Rivers => "rivers",
            Self::Ccb => "ccb",
        }
    }

    /// Static configuration for this kind.
    pub const fn config(self) -> &'static LayerConfig {
        match self {
            Self::Vri => &VRI,
            Self::Bem => &BEM,
            Self::Wetlands => &WETLANDS,
            Self::Rivers => &RIVERS,
            Self::Ccb => &CCB,
        }
    }

    /// Whether the kind can be fetched without an explicit source.
    pub const fn supports_remote(self) -> bool {
        self.config().catalog.is_some()
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vri" => Ok(Self::Vri),
            "bem" => Ok(Self::Bem),
            "wetlands" => Ok(Self::Wetlands),
            "rivers" => Ok(Self::Rivers),
            "ccb" | "cutblocks" => Ok(Self::Ccb),
            _ => Err(format!("unknown layer kind '{s}'")),
        }
    }
}

/// How an AOI shapes the features of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AoiBehaviour {
    /// Geometries are intersected with the AOI and re-cast.
    Clip,
    /// Features are only selected by the source's own AOI filter.
    Filter,
}

/// Remote catalog binding for a layer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogBinding {
    /// Catalog record (feature type) identifier.
    pub record_id: &'static str,
    /// Geometry column of the catalog record.
    pub geometry_column: &'static str,
    /// Attributes requested besides the geometry.
    pub projection: &'static [&'static str],
}

/// Per-kind ingestion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerConfig {
    /// Layer read from a local dataset when the caller names none.
    pub default_layer_name: &'static str,
    /// Remote binding, absent for local-only kinds.
    pub catalog: Option<CatalogBinding>,
    /// Canonical name of the geometry attribute on output.
    pub geometry_column: &'static str,
    /// Type every repaired geometry is coerced to, if any.
    pub forced_type: Option<GeometryType>,
    /// Effect of an AOI on this kind.
    pub aoi_behaviour: AoiBehaviour,
    /// Ordered `(source, canonical)` attribute renames.
    pub attribute_renames: &'static [(&'static str, &'static str)],
}

/// Attributes requested from the catalog for VRI polygons.
pub const VRI_PROJECTION: [&str; 22] = [
    "BCLCS_LEVEL_1",
    "BCLCS_LEVEL_2",
    "BCLCS_LEVEL_3",
    "BCLCS_LEVEL_4",
    "BCLCS_LEVEL_5",
    "SPECIES_CD_1",
    "SPECIES_CD_2",
    "SPECIES_CD_3",
    "SPECIES_CD_4",
    "SPECIES_CD_5",
    "SPECIES_CD_6",
    "SPECIES_PCT_1",
    "SPECIES_PCT_2",
    "SPECIES_PCT_3",
    "SPECIES_PCT_4",
    "SPECIES_PCT_5",
    "SPECIES_PCT_6",
    "PROJ_AGE_1",
    "PROJ_HEIGHT_1",
    "CROWN_CLOSURE",
    "HARVEST_DATE",
    "LINE_7B_DISTURBANCE_HISTORY",
];

const VRI: LayerConfig = LayerConfig {
    default_layer_name: "VEG_R1_PLY_polygon",
    catalog: Some(CatalogBinding {
        record_id: "WHSE_FOREST_VEGETATION.VEG_COMP_LYR_R1_POLY",
        geometry_column: "GEOMETRY",
        projection: &VRI_PROJECTION,
    }),
    geometry_column: "Shape",
    forced_type: Some(GeometryType::MultiPolygon),
    aoi_behaviour: AoiBehaviour::Clip,
    attribute_renames: &VRI_ATTRIBUTE_RENAMES,
};

const BEM: LayerConfig = LayerConfig {
    default_layer_name: "BEM",
    catalog: None,
    geometry_column: "Shape",
    forced_type: None,
    aoi_behaviour: AoiBehaviour::Filter,
    attribute_renames: &[],
};

const WETLANDS: LayerConfig = LayerConfig {
    default_layer_name: "FWA_WETLANDS_POLY",
    catalog: Some(CatalogBinding {
        record_id: "WHSE_BASEMAPPING.FWA_WETLANDS_POLY",
        geometry_column: "GEOMETRY",
        projection: &[],
    }),
    geometry_column: "Shape",
    forced_type: None,
    aoi_behaviour: AoiBehaviour::Filter,
    attribute_renames: &[],
};

const RIVERS: LayerConfig = LayerConfig {
    default_layer_name: "FWA_RIVERS_POLY",
    catalog: Some(CatalogBinding {
        record_id: "WHSE_BASEMAPPING.FWA_RIVERS_POLY",
        geometry_column: "GEOMETRY",
        projection: &[],
    }),
    geometry_column: "GEOMETRY",
    forced_type: None,
    aoi_behaviour: AoiBehaviour::Filter,
    attribute_renames: &[],
};

const CCB: LayerConfig = LayerConfig {
    default_layer_name: "CNS_CUT_BL_polygon",
    catalog: Some(CatalogBinding {
        record_id: "WHSE_FOREST_VEGETATION.VEG_CONSOLIDATED_CUT_BLOCKS_SP",
        geometry_column: "SHAPE",
        projection: &["HARVEST_YEAR"],
    }),
    geometry_column: "Shape",
    forced_type: Some(GeometryType::MultiPolygon),
    aoi_behaviour: AoiBehaviour::Filter,
    attribute_renames: &[],
};
