//! Pole record types at each stage of the pipeline.
//!
//! ```text
//! RawRecord ──geocode──▶ Pole ──snap──▶ SnappedPole
//! ```

use ps_core::GeoPoint;

/// Canonical column names.
pub const BLOCK: &str = "BLOCK";
pub const NUMBER: &str = "NUMBER";
pub const POLE_LOC: &str = "POLE_LOC";

/// One CSV row as read from a `poleblock*.csv` file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// File name the row came from (e.g. `poleblock3.csv`).
    pub source_file: String,
    pub block:       String,
    pub number:      String,
    /// Unparsed `"lat, lon"` string.
    pub pole_loc:    String,
    /// All other columns, in file order.
    pub extra:       Vec<(String, String)>,
}

/// A pole with a parsed WGS84 location.
#[derive(Debug, Clone, PartialEq)]
pub struct Pole {
    /// `BLOCK-NUMBER`.
    pub id:          String,
    pub block:       String,
    pub number:      String,
    pub location:    GeoPoint,
    pub source_file: String,
    pub extra:       Vec<(String, String)>,
}

impl Pole {
    /// Build the composite identifier `BLOCK-NUMBER`.
    pub fn composite_id(block: &str, number: &str) -> String {
        format!("{block}-{number}")
    }

    /// Attach the OSM id of the nearest road node.
    pub fn snap(self, nearest_node_id: i64, snap_distance_m: f64) -> SnappedPole {
        SnappedPole { pole: self, nearest_node_id, snap_distance_m }
    }
}

/// A pole assigned to exactly one road-network node.
#[derive(Debug, Clone, PartialEq)]
pub struct SnappedPole {
    pub pole:            Pole,
    /// OpenStreetMap id of the nearest node.
    pub nearest_node_id: i64,
    /// Straight-line distance to that node in the network's projected CRS.
    pub snap_distance_m: f64,
}
