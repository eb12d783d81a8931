//! Study-area and transect geometries.
//!
//! Both are expressed in the CRS of the rasters they are applied to. When
//! that CRS is geographic, lengths are geodesic (Haversine, metres);
//! otherwise they are planar in CRS units.

use geo::{BoundingRect, Distance, Euclidean, Haversine, Intersects};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};

use crate::error::{Error, Result};
use crate::source::BBox;

/// Distance between two coordinates, geodesic for lon/lat input.
pub fn distance_between(a: Coord<f64>, b: Coord<f64>, geographic: bool) -> f64 {
    if geographic {
        Haversine::distance(Point::from(a), Point::from(b))
    } else {
        Euclidean::distance(Point::from(a), Point::from(b))
    }
}

fn ring(coords: &[[f64; 2]], what: &'static str) -> Result<LineString<f64>> {
    if coords.len() < 3 {
        return Err(Error::InvalidParameter {
            name: what,
            value: format!("{} vertices", coords.len()),
            reason: "a polygon ring needs at least 3 vertices".into(),
        });
    }
    // LineString -> Polygon closes the ring
    Ok(coords.iter().map(|&[x, y]| Coord { x, y }).collect())
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Polygonal study area bounding clipping and zonal reductions.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    area: MultiPolygon<f64>,
}

impl Region {
    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self {
            area: MultiPolygon::new(vec![polygon]),
        }
    }

    /// Build from an exterior ring and optional holes of `[x, y]` pairs.
    pub fn from_rings(exterior: &[[f64; 2]], holes: &[Vec<[f64; 2]>]) -> Result<Self> {
        let exterior = ring(exterior, "region.exterior")?;
        let interiors = holes
            .iter()
            .map(|h| ring(h, "region.hole"))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_polygon(Polygon::new(exterior, interiors)))
    }

    /// Whether the point lies inside the region or on its boundary.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.area.intersects(&Point::new(x, y))
    }

    /// Envelope of the region, `None` for an empty geometry.
    pub fn bbox(&self) -> Option<BBox> {
        self.area
            .bounding_rect()
            .map(|r| BBox::new(r.min().x, r.min().y, r.max().x, r.max().y))
    }
}

// ---------------------------------------------------------------------------
// Transect
// ---------------------------------------------------------------------------

/// Ordered polyline along which a profile is sampled.
///
/// Vertex order defines traversal: distance is zero at the first vertex and
/// never decreases along the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Transect {
    line: LineString<f64>,
}

impl Transect {
    /// Build from `[x, y]` vertices; at least two are required.
    pub fn new(vertices: &[[f64; 2]]) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(Error::InvalidParameter {
                name: "transect",
                value: format!("{} vertices", vertices.len()),
                reason: "a transect needs at least 2 vertices".into(),
            });
        }
        Ok(Self {
            line: vertices.iter().map(|&[x, y]| Coord { x, y }).collect(),
        })
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    pub fn start(&self) -> Coord<f64> {
        self.line.0[0]
    }

    pub fn line(&self) -> &LineString<f64> {
        &self.line
    }

    /// Distance of every vertex from the first one, measured along the line.
    pub fn cumulative_distances(&self, geographic: bool) -> Vec<f64> {
        let mut total = 0.0;
        let mut out = Vec::with_capacity(self.line.0.len());
        out.push(0.0);
        for w in self.line.0.windows(2) {
            total += distance_between(w[0], w[1], geographic);
            out.push(total);
        }
        out
    }

    /// Total length of the polyline.
    pub fn length(&self, geographic: bool) -> f64 {
        self.cumulative_distances(geographic)
            .last()
            .copied()
            .unwrap_or(0.0)
    }

    /// Coordinate at `distance` along the line, interpolated linearly within
    /// the containing segment. Distances past the end clamp to the last vertex.
    pub fn point_at(&self, distance: f64, cumulative: &[f64]) -> Coord<f64> {
        let coords = &self.line.0;
        if distance <= 0.0 {
            return coords[0];
        }
        for i in 1..coords.len() {
            if distance <= cumulative[i] {
                let seg = cumulative[i] - cumulative[i - 1];
                if seg <= 0.0 {
                    return coords[i];
                }
                let t = (distance - cumulative[i - 1]) / seg;
                let (a, b) = (coords[i - 1], coords[i]);
                return Coord {
                    x: a.x + (b.x - a.x) * t,
                    y: a.y + (b.y - a.y) * t,
                };
            }
        }
        coords[coords.len() - 1]
    }

    /// Envelope of the polyline.
    pub fn bbox(&self) -> Option<BBox> {
        self.line
            .bounding_rect()
            .map(|r| BBox::new(r.min().x, r.min().y, r.max().x, r.max().y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_region() -> Region {
        Region::from_rings(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]], &[]).unwrap()
    }

    #[test]
    fn region_contains_interior_and_boundary() {
        let region = square_region();
        assert!(region.contains(5.0, 5.0));
        assert!(region.contains(10.0, 5.0));
        assert!(!region.contains(10.5, 5.0));
    }

    #[test]
    fn region_hole_excluded() {
        let region = Region::from_rings(
            &[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            &[vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]],
        )
        .unwrap();
        assert!(!region.contains(5.0, 5.0));
        assert!(region.contains(2.0, 2.0));
    }

    #[test]
    fn region_bbox() {
        let bbox = square_region().bbox().unwrap();
        assert_eq!(bbox, BBox::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn region_needs_three_vertices() {
        assert!(Region::from_rings(&[[0.0, 0.0], [1.0, 1.0]], &[]).is_err());
    }

    #[test]
    fn transect_planar_distances() {
        let t = Transect::new(&[[0.0, 0.0], [3.0, 4.0], [3.0, 10.0]]).unwrap();
        let cum = t.cumulative_distances(false);
        assert_eq!(cum, vec![0.0, 5.0, 11.0]);
        assert_relative_eq!(t.length(false), 11.0);

        let mid = t.point_at(2.5, &cum);
        assert_relative_eq!(mid.x, 1.5);
        assert_relative_eq!(mid.y, 2.0);
        let past = t.point_at(50.0, &cum);
        assert_eq!(past, Coord { x: 3.0, y: 10.0 });
    }

    #[test]
    fn transect_geodesic_length() {
        // One degree of longitude at the equator
        let t = Transect::new(&[[0.0, 0.0], [1.0, 0.0]]).unwrap();
        assert_relative_eq!(t.length(true), 111_195.0, epsilon = 10.0);
    }

    #[test]
    fn transect_needs_two_vertices() {
        assert!(Transect::new(&[[0.0, 0.0]]).is_err());
    }
}
