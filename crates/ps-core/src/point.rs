//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Pole locations arrive with
//! 4–6 decimal places and are reprojected to metres, so single precision
//! would already lose the round trip at the decimetre level.

use geo::{Coord, Distance, Haversine, Point};

/// Mean Earth radius in metres, as used to size query bounding boxes.
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` if both components are finite and inside the WGS84 range.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        Haversine.distance(Point::from(self), Point::from(other))
    }

    /// Approximate bounding-box check in degrees.
    #[inline]
    pub fn within_bbox(self, center: GeoPoint, half_lat: f64, half_lon: f64) -> bool {
        (self.lat - center.lat).abs() <= half_lat
            && (self.lon - center.lon).abs() <= half_lon
    }

    /// Arithmetic mean of latitudes and longitudes.
    ///
    /// Returns `None` for an empty input.  This is a plain average, not a
    /// spherical centroid, which is fine for points a few kilometres apart.
    pub fn mean<I>(points: I) -> Option<GeoPoint>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let (mut lat, mut lon, mut n) = (0.0, 0.0, 0usize);
        for p in points {
            lat += p.lat;
            lon += p.lon;
            n += 1;
        }
        (n > 0).then(|| GeoPoint::new(lat / n as f64, lon / n as f64))
    }

    /// Coordinate in `(x = lon, y = lat)` order, as GeoJSON and `geo` expect.
    #[inline]
    pub fn to_coord(self) -> Coord<f64> {
        Coord { x: self.lon, y: self.lat }
    }

    #[inline]
    pub fn from_coord(c: Coord<f64>) -> Self {
        Self { lat: c.y, lon: c.x }
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.lon, p.lat)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        p.to_coord()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
