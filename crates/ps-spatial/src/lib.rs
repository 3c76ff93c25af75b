//! `ps-spatial`: road network acquisition, graph model, and snapping.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`source`]   | `NetworkSource` trait, `NetworkQuery`, `BBox`, `OsmData`   |
//! | [`filter`]   | `NetworkType` and the drivable-way tag filter              |
//! | [`overpass`] | `OverpassSource` (blocking HTTP with timeout)              |
//! | [`osm`]      | `PbfSource` (feature = `"osm"` only)                       |
//! | [`graph`]    | `build_graph`: truncate, simplify, largest component       |
//! | [`network`]  | `RoadNetwork` (SoA + R-tree), `RoadNetworkBuilder`, CRS    |
//! | [`speeds`]   | `add_edge_speeds`, `add_edge_travel_times`                 |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                         |
//!
//! # Feature flags
//!
//! | Flag  | Effect                                                        |
//! |-------|---------------------------------------------------------------|
//! | `osm` | Enables offline loading from an OSM PBF file via `osmpbf`.    |

pub mod error;
pub mod filter;
pub mod graph;
pub mod network;
pub mod overpass;
pub mod source;
pub mod speeds;

#[cfg(feature = "osm")]
pub mod osm;


pub use error::{SpatialError, SpatialResult};
pub use filter::NetworkType;
pub use graph::{GraphOptions, build_graph, fetch_network};
pub use network::{EdgeSpec, EdgeTags, RoadNetwork, RoadNetworkBuilder, WAY_ATTRIBUTE_TAGS};
pub use overpass::{DEFAULT_OVERPASS_URL, OverpassSource};
pub use source::{BBox, NetworkQuery, NetworkSource, OsmData, OsmNode, OsmWay};
pub use speeds::{SpeedSettings, add_edge_speeds, add_edge_travel_times, clean_maxspeed};

#[cfg(feature = "osm")]
pub use osm::PbfSource;
