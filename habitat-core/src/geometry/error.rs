use thiserror::Error;

use super::GeometryType;

/// Errors from [`crate::geometry::GeometryEngine`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The geometry carried NaN or infinite coordinates.
    #[error("{geometry_type} geometry has non-finite coordinates")]
    NonFinite {
        /// Type of the offending geometry.
        geometry_type: GeometryType,
    },
    /// The engine has no conversion between the two types.
    #[error("cannot cast {from} to {to}")]
    UnsupportedCast {
        /// Type of the input geometry.
        from: GeometryType,
        /// Requested type.
        to: GeometryType,
    },
    /// Clipping requires a polygonal area of interest.
    #[error("area of interest must be polygonal, got {geometry_type}")]
    NonPolygonalAoi {
        /// Type of the supplied AOI geometry.
        geometry_type: GeometryType,
    },
    /// Repair left the geometry invalid.
    #[error("repair of {geometry_type} geometry did not produce a valid result")]
    RepairFailed {
        /// Type of the repaired geometry.
        geometry_type: GeometryType,
    },
}
