use geo::{
    BooleanOps, CoordsIter, Geometry, GeometryCollection, Intersects, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, RemoveRepeatedPoints, Validation,
};
use log::debug;

use super::{GeometryEngine, GeometryError, GeometryType};

/// [`GeometryEngine`] built on the `geo` crate's boolean operations.
///
/// Polygon repair rebuilds the polygon through a boolean union, which nodes
/// crossing rings and resolves them with the even-odd rule. Self-intersecting
/// "bow-tie" rings therefore come back as one polygon per lobe.
///
/// # Examples
/// ```
/// use geo::{Geometry, polygon};
/// use habitat_core::{GeoEngine, GeometryEngine, GeometryType};
///
/// let bow_tie = polygon![
///     (x: 0.0, y: 0.0),
///     (x: 2.0, y: 2.0),
///     (x: 2.0, y: 0.0),
///     (x: 0.0, y: 2.0),
///     (x: 0.0, y: 0.0),
/// ];
/// let repaired = GeoEngine.make_valid(Geometry::Polygon(bow_tie))?;
/// assert_eq!(GeometryType::of(&repaired), GeometryType::MultiPolygon);
/// # Ok::<(), habitat_core::GeometryError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoEngine;

impl GeometryEngine for GeoEngine {
    fn make_valid(&self, geometry: Geometry<f64>) -> Result<Geometry<f64>, GeometryError> {
        ensure_finite(&geometry)?;
        let repaired = repair(geometry);
        let polygonal = matches!(
            repaired,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_)
        );
        if polygonal && !repaired.is_valid() {
            return Err(GeometryError::RepairFailed {
                geometry_type: GeometryType::of(&repaired),
            });
        }
        Ok(repaired)
    }

    fn cast(
        &self,
        geometry: Geometry<f64>,
        target: GeometryType,
    ) -> Result<Geometry<f64>, GeometryError> {
        let from = GeometryType::of(&geometry);
        match target {
            GeometryType::MultiPolygon => to_multi_polygon(geometry).map(Geometry::MultiPolygon),
            GeometryType::MultiLineString => {
                to_multi_line_string(geometry).map(Geometry::MultiLineString)
            }
            GeometryType::MultiPoint => to_multi_point(geometry).map(Geometry::MultiPoint),
            GeometryType::Polygon => to_polygon(geometry).map(Geometry::Polygon),
            _ if from == target => Ok(geometry),
            _ => Err(GeometryError::UnsupportedCast { from, to: target }),
        }
    }

    fn intersect(
        &self,
        geometry: &Geometry<f64>,
        aoi: &Geometry<f64>,
    ) -> Result<Geometry<f64>, GeometryError> {
        ensure_finite(geometry)?;
        let clip = to_multi_polygon(aoi.clone()).map_err(|_| GeometryError::NonPolygonalAoi {
            geometry_type: GeometryType::of(aoi),
        })?;
        Ok(intersect_with(geometry, &clip))
    }
}

fn ensure_finite(geometry: &Geometry<f64>) -> Result<(), GeometryError> {
    if geometry
        .coords_iter()
        .all(|coord| coord.x.is_finite() && coord.y.is_finite())
    {
        Ok(())
    } else {
        Err(GeometryError::NonFinite {
            geometry_type: GeometryType::of(geometry),
        })
    }
}

fn repair(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Polygon(polygon) => collapse_single(resolve_rings(&polygon)),
        Geometry::Rect(rect) => collapse_single(resolve_rings(&rect.to_polygon())),
        Geometry::Triangle(triangle) => collapse_single(resolve_rings(&triangle.to_polygon())),
        Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(merge_polygons(polygons)),
        Geometry::Line(line) if line.start == line.end => Geometry::Point(Point::from(line.start)),
        Geometry::LineString(line) => repair_line(&line),
        Geometry::MultiLineString(lines) => {
            let before = lines.0.len();
            let kept: Vec<LineString<f64>> = lines
                .0
                .iter()
                .map(RemoveRepeatedPoints::remove_repeated_points)
                .filter(|line| line.0.len() > 1)
                .collect();
            if kept.len() < before {
                debug!("dropped {} degenerate line strings", before - kept.len());
            }
            Geometry::MultiLineString(MultiLineString::new(kept))
        }
        Geometry::GeometryCollection(collection) => Geometry::GeometryCollection(
            collection.0.into_iter().map(repair).collect::<GeometryCollection<f64>>(),
        ),
        other => other,
    }
}

fn resolve_rings<B>(shape: &B) -> MultiPolygon<f64>
where
    B: BooleanOps<Scalar = f64>,
{
    shape.union(&MultiPolygon::new(Vec::new()))
}

/// Repair each member on its own, then union the parts. Resolving the whole
/// set at once would apply even-odd to overlapping members.
fn merge_polygons(polygons: impl IntoIterator<Item = Polygon<f64>>) -> MultiPolygon<f64> {
    polygons
        .into_iter()
        .map(|polygon| resolve_rings(&polygon))
        .fold(MultiPolygon::new(Vec::new()), |merged, part| {
            if merged.0.is_empty() {
                part
            } else {
                merged.union(&part)
            }
        })
}

fn collapse_single(mut polygons: MultiPolygon<f64>) -> Geometry<f64> {
    if polygons.0.len() == 1
        && let Some(polygon) = polygons.0.pop()
    {
        return Geometry::Polygon(polygon);
    }
    Geometry::MultiPolygon(polygons)
}

fn repair_line(line: &LineString<f64>) -> Geometry<f64> {
    let cleaned = line.remove_repeated_points();
    match cleaned.0.as_slice() {
        [only] => Geometry::Point(Point::from(*only)),
        _ => Geometry::LineString(cleaned),
    }
}

fn to_multi_polygon(geometry: Geometry<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
    let from = GeometryType::of(&geometry);
    match geometry {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::Rect(rect) => Ok(MultiPolygon::new(vec![rect.to_polygon()])),
        Geometry::Triangle(triangle) => Ok(MultiPolygon::new(vec![triangle.to_polygon()])),
        Geometry::MultiPolygon(polygons) => Ok(polygons),
        Geometry::GeometryCollection(collection) => {
            let mut polygons = Vec::new();
            collect_polygons(collection, &mut polygons);
            Ok(merge_polygons(polygons))
        }
        _ => Err(GeometryError::UnsupportedCast {
            from,
            to: GeometryType::MultiPolygon,
        }),
    }
}

fn collect_polygons(collection: GeometryCollection<f64>, out: &mut Vec<Polygon<f64>>) {
    for member in collection {
        match member {
            Geometry::Polygon(polygon) => out.push(polygon),
            Geometry::Rect(rect) => out.push(rect.to_polygon()),
            Geometry::Triangle(triangle) => out.push(triangle.to_polygon()),
            Geometry::MultiPolygon(polygons) => out.extend(polygons),
            Geometry::GeometryCollection(nested) => collect_polygons(nested, out),
            _ => {}
        }
    }
}

fn to_polygon(geometry: Geometry<f64>) -> Result<Polygon<f64>, GeometryError> {
    let from = GeometryType::of(&geometry);
    match geometry {
        Geometry::Polygon(polygon) => Ok(polygon),
        Geometry::Rect(rect) => Ok(rect.to_polygon()),
        Geometry::Triangle(triangle) => Ok(triangle.to_polygon()),
        Geometry::MultiPolygon(mut polygons) if polygons.0.len() == 1 => {
            polygons.0.pop().ok_or(GeometryError::UnsupportedCast {
                from,
                to: GeometryType::Polygon,
            })
        }
        _ => Err(GeometryError::UnsupportedCast {
            from,
            to: GeometryType::Polygon,
        }),
    }
}

fn to_multi_line_string(geometry: Geometry<f64>) -> Result<MultiLineString<f64>, GeometryError> {
    let from = GeometryType::of(&geometry);
    match geometry {
        Geometry::Line(line) => Ok(MultiLineString::new(vec![LineString::from(line)])),
        Geometry::LineString(line) => Ok(MultiLineString::new(vec![line])),
        Geometry::MultiLineString(lines) => Ok(lines),
        Geometry::GeometryCollection(collection) => {
            let mut lines = Vec::new();
            for member in collection {
                match member {
                    Geometry::Line(line) => lines.push(LineString::from(line)),
                    Geometry::LineString(line) => lines.push(line),
                    Geometry::MultiLineString(nested) => lines.extend(nested),
                    _ => {}
                }
            }
            Ok(MultiLineString::new(lines))
        }
        _ => Err(GeometryError::UnsupportedCast {
            from,
            to: GeometryType::MultiLineString,
        }),
    }
}

fn to_multi_point(geometry: Geometry<f64>) -> Result<MultiPoint<f64>, GeometryError> {
    let from = GeometryType::of(&geometry);
    match geometry {
        Geometry::Point(point) => Ok(MultiPoint::new(vec![point])),
        Geometry::MultiPoint(points) => Ok(points),
        Geometry::GeometryCollection(collection) => {
            let mut points = Vec::new();
            for member in collection {
                match member {
                    Geometry::Point(point) => points.push(point),
                    Geometry::MultiPoint(nested) => points.extend(nested),
                    _ => {}
                }
            }
            Ok(MultiPoint::new(points))
        }
        _ => Err(GeometryError::UnsupportedCast {
            from,
            to: GeometryType::MultiPoint,
        }),
    }
}

fn intersect_with(geometry: &Geometry<f64>, clip: &MultiPolygon<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Polygon(polygon) => Geometry::MultiPolygon(polygon.intersection(clip)),
        Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(polygons.intersection(clip)),
        Geometry::Rect(rect) => Geometry::MultiPolygon(rect.to_polygon().intersection(clip)),
        Geometry::Triangle(triangle) => {
            Geometry::MultiPolygon(triangle.to_polygon().intersection(clip))
        }
        Geometry::Line(line) => Geometry::MultiLineString(
            clip.clip(&MultiLineString::new(vec![LineString::from(*line)]), false),
        ),
        Geometry::LineString(line) => Geometry::MultiLineString(
            clip.clip(&MultiLineString::new(vec![line.clone()]), false),
        ),
        Geometry::MultiLineString(lines) => Geometry::MultiLineString(clip.clip(lines, false)),
        Geometry::Point(point) => {
            if clip.intersects(point) {
                Geometry::Point(*point)
            } else {
                Geometry::MultiPoint(MultiPoint::new(Vec::new()))
            }
        }
        Geometry::MultiPoint(points) => Geometry::MultiPoint(
            points
                .iter()
                .filter(|point| clip.intersects(*point))
                .copied()
                .collect(),
        ),
        Geometry::GeometryCollection(collection) => Geometry::GeometryCollection(
            collection
                .iter()
                .map(|member| intersect_with(member, clip))
                .collect::<GeometryCollection<f64>>(),
        ),
    }
}
