//! Coordinate reference systems and transforms between them.
//!
//! Road networks are projected into the UTM zone that contains them so that
//! nearest-node queries measure plain Euclidean metres.  This module only
//! picks the zone and builds the PROJ definitions; the coordinate math is
//! done by `proj4rs`.
//!
//! # Zone selection
//!
//! ```text
//! zone = floor((lon + 180) / 6) + 1        (1..=60)
//! hemisphere = north if lat >= 0
//! ```
//!
//! The Norway/Svalbard exceptions are not applied: the zone is chosen once
//! from the mean longitude of the whole network.

use std::fmt;

use geo::Coord;
use proj4rs::proj::Proj;

use crate::{CoreError, CoreResult, GeoPoint};

const WGS84_DEFINITION: &str = "+proj=longlat +datum=WGS84 +no_defs";

// ── UtmZone ───────────────────────────────────────────────────────────────────

/// One of the 120 UTM zones (60 longitudinal bands × 2 hemispheres).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct UtmZone {
    number: u8,
    north:  bool,
}

impl UtmZone {
    pub fn new(number: u8, north: bool) -> CoreResult<Self> {
        if !(1..=60).contains(&number) {
            return Err(CoreError::Projection(format!(
                "UTM zone number {number} outside 1..=60"
            )));
        }
        Ok(Self { number, north })
    }

    /// The zone containing `p`.
    pub fn containing(p: GeoPoint) -> CoreResult<Self> {
        if !p.is_valid() {
            return Err(CoreError::InvalidCoordinate(p.to_string()));
        }
        // lon = 180.0 would land in zone 61.
        let number = (((p.lon + 180.0) / 6.0).floor() as u8 + 1).min(60);
        Self::new(number, p.lat >= 0.0)
    }

    pub fn number(self) -> u8 {
        self.number
    }

    pub fn is_north(self) -> bool {
        self.north
    }

    /// EPSG code of the WGS84 / UTM zone (326xx north, 327xx south).
    pub fn epsg(self) -> u32 {
        let base = if self.north { 32_600 } else { 32_700 };
        base + u32::from(self.number)
    }

    /// PROJ definition of the zone.
    pub fn proj_definition(self) -> String {
        let south = if self.north { "" } else { " +south" };
        format!("+proj=utm +zone={}{south} +datum=WGS84 +units=m +no_defs", self.number)
    }

    /// Forward transform: geographic point → `(x = easting, y = northing)` metres.
    pub fn project(self, p: GeoPoint) -> CoreResult<Coord<f64>> {
        Crs::Wgs84.transform(Crs::Utm(self), p.to_coord())
    }

    /// Inverse transform: `(easting, northing)` metres → geographic point.
    pub fn unproject(self, c: Coord<f64>) -> CoreResult<GeoPoint> {
        Crs::Utm(self).transform(Crs::Wgs84, c).map(GeoPoint::from_coord)
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, if self.north { 'N' } else { 'S' })
    }
}

// ── Crs ───────────────────────────────────────────────────────────────────────

/// The coordinate reference system a geometry is expressed in.
///
/// For `Wgs84` coordinates are `(x = lon, y = lat)` degrees; for `Utm`
/// they are `(x = easting, y = northing)` metres.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Crs {
    #[default]
    Wgs84,
    Utm(UtmZone),
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Utm(zone) => zone.epsg(),
        }
    }

    pub fn is_geographic(self) -> bool {
        matches!(self, Crs::Wgs84)
    }

    /// PROJ definition string.
    pub fn proj_definition(self) -> String {
        match self {
            Crs::Wgs84 => WGS84_DEFINITION.to_owned(),
            Crs::Utm(zone) => zone.proj_definition(),
        }
    }

    fn proj(self) -> CoreResult<Proj> {
        Proj::from_proj_string(&self.proj_definition())
            .map_err(|e| CoreError::Projection(format!("{self}: {e}")))
    }

    /// A reusable transformer from `self` into `to`.
    pub fn transformer(self, to: Crs) -> CoreResult<Transformer> {
        Ok(Transformer { from: self, to, src: self.proj()?, dst: to.proj()? })
    }

    /// Transform a single coordinate from `self` into `to`.
    ///
    /// Builds a fresh [`Transformer`]; use [`Crs::transformer`] for bulk work.
    pub fn transform(self, to: Crs, c: Coord<f64>) -> CoreResult<Coord<f64>> {
        self.transformer(to)?.transform(c)
    }
}

// ── Transformer ───────────────────────────────────────────────────────────────

/// A pair of parsed PROJ definitions.
///
/// Geographic coordinates are `(lon, lat)` degrees on both sides of the
/// API; the conversion to the radians `proj4rs` works in happens here.
pub struct Transformer {
    from: Crs,
    to:   Crs,
    src:  Proj,
    dst:  Proj,
}

impl Transformer {
    pub fn from_crs(&self) -> Crs {
        self.from
    }

    pub fn to_crs(&self) -> Crs {
        self.to
    }

    pub fn transform(&self, c: Coord<f64>) -> CoreResult<Coord<f64>> {
        if self.from == self.to {
            return Ok(c);
        }
        let mut point = if self.from.is_geographic() {
            let p = GeoPoint::from_coord(c);
            if !p.is_valid() {
                return Err(CoreError::InvalidCoordinate(p.to_string()));
            }
            (c.x.to_radians(), c.y.to_radians(), 0.0)
        } else {
            (c.x, c.y, 0.0)
        };

        proj4rs::transform::transform(&self.src, &self.dst, &mut point).map_err(|e| {
            CoreError::Projection(format!("({}, {}) from {} to {}: {e}", c.x, c.y, self.from, self.to))
        })?;

        let out = if self.to.is_geographic() {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        };
        let valid = out.x.is_finite()
            && out.y.is_finite()
            && (!self.to.is_geographic() || GeoPoint::from_coord(out).is_valid());
        if !valid {
            return Err(CoreError::Projection(format!(
                "({}, {}) has no valid image in {}",
                c.x, c.y, self.to
            )));
        }
        Ok(out)
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer").field("from", &self.from).field("to", &self.to).finish()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}
