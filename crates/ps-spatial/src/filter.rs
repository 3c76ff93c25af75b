//! Which OSM ways count as drivable roads.
//!
//! The same rules are sent to Overpass as a QL tag filter and re-applied in
//! Rust to data from any other source.  Overpass matches `!~` as an
//! unanchored regex; the Rust side compares whole values, which agrees for
//! every value that occurs in practice.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Road network flavour to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    /// Public drivable streets, excluding service roads.
    #[default]
    Drive,
    /// Drivable streets including service roads (alleys, driveways).
    DriveService,
}

const DRIVE_EXCLUDED_HIGHWAY: &[&str] = &[
    "abandoned", "bridleway", "bus_guideway", "construction", "corridor", "cycleway",
    "elevator", "escalator", "footway", "no", "path", "pedestrian", "planned", "platform",
    "proposed", "raceway", "razed", "service", "steps", "track",
];

const DRIVE_EXCLUDED_SERVICE: &[&str] =
    &["alley", "driveway", "emergency_access", "parking", "parking_aisle", "private"];

const DRIVE_SERVICE_EXCLUDED_SERVICE: &[&str] =
    &["emergency_access", "parking", "parking_aisle", "private"];

impl NetworkType {
    fn excluded_highway(self) -> impl Iterator<Item = &'static str> {
        DRIVE_EXCLUDED_HIGHWAY
            .iter()
            .copied()
            .filter(move |h| !(self == NetworkType::DriveService && *h == "service"))
    }

    fn excluded_service(self) -> &'static [&'static str] {
        match self {
            NetworkType::Drive => DRIVE_EXCLUDED_SERVICE,
            NetworkType::DriveService => DRIVE_SERVICE_EXCLUDED_SERVICE,
        }
    }

    /// Overpass QL tag filter to append to `way`.
    pub fn overpass_filter(self) -> String {
        let highway = self.excluded_highway().collect::<Vec<_>>().join("|");
        let service = self.excluded_service().join("|");
        format!(
            r#"["highway"]["area"!~"yes"]["access"!~"private"]["highway"!~"{highway}"]["motor_vehicle"!~"no"]["motor"!~"no"]["service"!~"{service}"]"#
        )
    }

    /// `true` if a way with these tags belongs to this network.
    pub fn admits(self, tags: &BTreeMap<String, String>) -> bool {
        let tag = |k: &str| tags.get(k).map(String::as_str);

        let Some(highway) = tag("highway") else {
            return false;
        };
        if self.excluded_highway().any(|h| h == highway) {
            return false;
        }
        if tag("area") == Some("yes")
            || tag("access") == Some("private")
            || tag("motor_vehicle") == Some("no")
            || tag("motor") == Some("no")
        {
            return false;
        }
        !tag("service").is_some_and(|s| self.excluded_service().contains(&s))
    }
}
