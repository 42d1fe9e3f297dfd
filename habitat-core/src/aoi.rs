//! Area-of-interest filters supplied as well-known text.

use geo::{BoundingRect, CoordsIter, Geometry, Rect, Validation};
use log::debug;
use thiserror::Error;
use wkt::{ToWkt, TryFromWkt};

use crate::geometry::{GeoEngine, GeometryEngine, GeometryError};

/// Errors returned by [`Aoi::from_wkt`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AoiError {
    /// The text was not valid WKT.
    #[error("invalid AOI well-known text: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },
    /// The geometry has no coordinates, so it cannot scope anything.
    #[error("AOI geometry is empty")]
    Empty,
    /// The geometry carried NaN or infinite coordinates.
    #[error("AOI geometry has non-finite coordinates")]
    NonFinite,
    /// The geometry was invalid and could not be repaired.
    #[error("AOI geometry could not be repaired: {0}")]
    Repair(#[source] GeometryError),
}

/// A parsed area of interest.
///
/// Keeps the geometry for clipping, its bounding rectangle for coarse
/// pre-filters, and a canonical WKT rendering for remote predicates.
///
/// # Examples
/// ```
/// use habitat_core::Aoi;
///
/// # fn main() -> Result<(), habitat_core::AoiError> {
/// let aoi = Aoi::from_wkt("POLYGON((0 0, 10 0, 10 5, 0 5, 0 0))")?;
/// assert_eq!(aoi.bounds().max().x, 10.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Aoi {
    geometry: Geometry<f64>,
    bounds: Rect<f64>,
    wkt: String,
}

impl Aoi {
    /// Parse an AOI from well-known text.
    pub fn from_wkt(text: &str) -> Result<Self, AoiError> {
        let geometry =
            Geometry::<f64>::try_from_wkt_str(text.trim()).map_err(|err| AoiError::Parse {
                message: err.to_string(),
            })?;
        Self::from_geometry(geometry)
    }

    /// Build an AOI from an existing geometry.
    ///
    /// Invalid geometries are repaired first, so a self-intersecting ring
    /// clips by its full extent rather than by even-odd parity.
    pub fn from_geometry(geometry: Geometry<f64>) -> Result<Self, AoiError> {
        if !geometry
            .coords_iter()
            .all(|coord| coord.x.is_finite() && coord.y.is_finite())
        {
            return Err(AoiError::NonFinite);
        }
        let repaired = if geometry.is_valid() {
            geometry
        } else {
            debug!("repairing invalid AOI geometry");
            GeoEngine.make_valid(geometry).map_err(AoiError::Repair)?
        };
        let bounds = repaired.bounding_rect().ok_or(AoiError::Empty)?;
        let wkt = repaired.wkt_string();
        Ok(Self {
            geometry: repaired,
            bounds,
            wkt,
        })
    }

    /// The AOI geometry.
    pub const fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Bounding rectangle of the AOI.
    pub const fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Canonical WKT of the AOI.
    pub fn wkt(&self) -> &str {
        &self.wkt
    }
}
