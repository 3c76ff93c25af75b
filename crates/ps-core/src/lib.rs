//! `ps-core`: foundational types for the `polesnap` pipeline.
//!
//! Every other `ps-*` crate depends on this one.  It has no `ps-*`
//! dependencies; externally it needs `geo`, `proj4rs` and `thiserror`.
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`ids`]     | `NodeId`                                              |
//! | [`point`]   | `GeoPoint`, great-circle distance, mean centre        |
//! | [`crs`]     | `Crs`, `UtmZone`, `Transformer`                       |
//! | [`error`]   | `CoreError`, `CoreResult`                             |

pub mod crs;
pub mod error;
pub mod ids;
pub mod point;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use crs::{Crs, Transformer, UtmZone};
pub use error::{CoreError, CoreResult};
pub use ids::NodeId;
pub use point::GeoPoint;
