//! `ps-pipeline`: configuration and orchestration of the four stages.
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`config`] | `PipelineConfig` and its TOML sections                      |
//! | [`run`]    | `run`, the individual stages, `make_source`, `RunSummary`   |
//! | [`error`]  | `PipelineError`, `PipelineResult<T>`                        |
//!
//! ```text
//! load_poles ──▶ fetch_projected_network ──▶ snap_poles ──▶ write_outputs
//! ```

pub mod config;
pub mod error;
pub mod run;

#[cfg(test)]
mod tests;

pub use config::{InputConfig, NetworkConfig, OutputConfig, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use run::{
    LoadedPoles, RunSummary, fetch_projected_network, load_poles, make_source, run, snap_poles,
    write_outputs,
};
