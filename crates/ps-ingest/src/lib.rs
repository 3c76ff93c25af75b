//! `ps-ingest`: pole CSV loading and geocoding.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`loader`]  | `expected_files`, `load_directory`, `load_reader`          |
//! | [`geocode`] | `parse_pole_loc`, `geocode`                                |
//! | [`pole`]    | `RawRecord`, `Pole`, `SnappedPole`                         |
//! | [`error`]   | `IngestError`, `IngestResult<T>`                           |
//!
//! # Data flow
//!
//! ```text
//! poleblock{1..=11}.csv ──load_directory──▶ LoadedRecords
//!                        ──geocode───────▶ Geocoded { poles, dropped }
//! ```

pub mod error;
pub mod geocode;
pub mod loader;
pub mod pole;


pub use error::{IngestError, IngestResult};
pub use geocode::{Geocoded, geocode, parse_pole_loc};
pub use loader::{LoadedRecords, expected_files, load_directory, load_reader};
pub use pole::{Pole, RawRecord, SnappedPole};
