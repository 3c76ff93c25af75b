//! `POLE_LOC` parsing and pole construction.
//!
//! `POLE_LOC` holds `"latitude, longitude"`, optionally wrapped in quote
//! characters.  Rows whose location does not parse into a valid WGS84 point
//! are dropped and counted; they never abort the run.

use log::{debug, info};

use ps_core::GeoPoint;

use crate::pole::{Pole, RawRecord};

/// Separator between latitude and longitude.
const LOC_SEPARATOR: &str = ", ";

/// Parse `"lat, lon"` into a point.
///
/// Returns `None` unless the string splits into exactly two numbers that
/// form a valid WGS84 coordinate.
pub fn parse_pole_loc(raw: &str) -> Option<GeoPoint> {
    let cleaned = raw.replace('"', "");
    let mut parts = cleaned.split(LOC_SEPARATOR);
    let (lat, lon) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let p = GeoPoint::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?);
    p.is_valid().then_some(p)
}

/// Output of [`geocode`].
#[derive(Debug, Default)]
pub struct Geocoded {
    /// Surviving poles, in input order.
    pub poles:   Vec<Pole>,
    /// Rows dropped for an unparsable location.
    pub dropped: usize,
}

impl Geocoded {
    /// Arithmetic mean of all pole coordinates; `None` if no pole survived.
    pub fn center(&self) -> Option<GeoPoint> {
        GeoPoint::mean(self.poles.iter().map(|p| p.location))
    }
}

/// Turn raw rows into located poles, dropping unparsable locations.
pub fn geocode(records: Vec<RawRecord>) -> Geocoded {
    let mut out = Geocoded { poles: Vec::with_capacity(records.len()), dropped: 0 };

    for r in records {
        let Some(location) = parse_pole_loc(&r.pole_loc) else {
            debug!("{}: dropping {}-{} with location {:?}", r.source_file, r.block, r.number, r.pole_loc);
            out.dropped += 1;
            continue;
        };
        out.poles.push(Pole {
            id: Pole::composite_id(&r.block, &r.number),
            block: r.block,
            number: r.number,
            location,
            source_file: r.source_file,
            extra: r.extra,
        });
    }

    info!("geocoded {} poles ({} rows dropped)", out.poles.len(), out.dropped);
    out
}
