//! Geometry engine seam: validity repair, type casting and AOI intersection.
//!
//! The pipeline talks to [`GeometryEngine`] only; [`GeoEngine`] is the
//! implementation backed by the `geo` crate.

mod engine;
mod error;

use std::fmt;

use geo::Geometry;

pub use engine::GeoEngine;
pub use error::GeometryError;

/// OGC simple-feature geometry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeometryType {
    /// A single position.
    Point,
    /// A connected sequence of segments.
    LineString,
    /// An area with an exterior ring and optional holes.
    Polygon,
    /// Several points.
    MultiPoint,
    /// Several line strings.
    MultiLineString,
    /// Several polygons.
    MultiPolygon,
    /// A heterogeneous collection.
    GeometryCollection,
}

impl GeometryType {
    /// The simple-feature type of `geometry`.
    ///
    /// `geo` specific shapes map to their OGC equivalents: lines are line
    /// strings, rectangles and triangles are polygons.
    ///
    /// # Examples
    /// ```
    /// use geo::{Geometry, Rect, coord};
    /// use habitat_core::GeometryType;
    ///
    /// let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
    /// assert_eq!(GeometryType::of(&Geometry::Rect(rect)), GeometryType::Polygon);
    /// ```
    pub const fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => Self::Point,
            Geometry::Line(_) | Geometry::LineString(_) => Self::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => Self::Polygon,
            Geometry::MultiPoint(_) => Self::MultiPoint,
            Geometry::MultiLineString(_) => Self::MultiLineString,
            Geometry::MultiPolygon(_) => Self::MultiPolygon,
            Geometry::GeometryCollection(_) => Self::GeometryCollection,
        }
    }

    /// Upper-case OGC name, as used in WKT.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
            Self::MultiPoint => "MULTIPOINT",
            Self::MultiLineString => "MULTILINESTRING",
            Self::MultiPolygon => "MULTIPOLYGON",
            Self::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry operations the ingestion pipeline depends on.
///
/// Implementations must be shareable across threads so one engine can serve
/// concurrent layer ingestions.
pub trait GeometryEngine: Send + Sync {
    /// Repair `geometry` so it satisfies the simple-feature validity rules
    /// without materially changing its extent.
    fn make_valid(&self, geometry: Geometry<f64>) -> Result<Geometry<f64>, GeometryError>;

    /// Convert `geometry` to the `target` type.
    fn cast(
        &self,
        geometry: Geometry<f64>,
        target: GeometryType,
    ) -> Result<Geometry<f64>, GeometryError>;

    /// Intersect `geometry` with the polygonal `aoi`.
    ///
    /// An empty result is a valid outcome, not an error.
    fn intersect(
        &self,
        geometry: &Geometry<f64>,
        aoi: &Geometry<f64>,
    ) -> Result<Geometry<f64>, GeometryError>;
}

/// Whether `geometry` holds no coordinates at all.
pub fn is_empty(geometry: &Geometry<f64>) -> bool {
    use geo::CoordsIter;

    geometry.coords_iter().next().is_none()
}
