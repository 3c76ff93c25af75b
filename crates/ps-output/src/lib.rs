//! `ps-output`: GeoJSON export for the polesnap pipeline.
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`row`]      | `NodeRow`, `EdgeRow`, `PoleRow` flattened export records  |
//! | [`features`] | Row → `geojson::Feature` conversion                       |
//! | [`writer`]   | `OutputWriter` trait and the `export` driver              |
//! | [`files`]    | `GeoJsonWriter`, one FeatureCollection file per layer     |
//! | [`error`]    | `OutputError`, `OutputResult<T>`                          |
//!
//! # Usage
//!
//! ```rust,ignore
//! use ps_output::{GeoJsonWriter, OutputFiles, export};
//!
//! let mut writer = GeoJsonWriter::new(Path::new("OUTPUT_GEOJSON"), OutputFiles::default())?;
//! export(&mut writer, &network_wgs84, &snapped_poles)?;
//! ```

pub mod error;
pub mod features;
pub mod files;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use error::{OutputError, OutputResult};
pub use files::{GeoJsonWriter, OutputFiles};
pub use row::{EdgeRow, NodeRow, PoleRow};
pub use writer::{OutputWriter, export};
