//! Parametric 2x2 MMI layouts and design-of-experiments sweeps over them.
//!
//! A sweep is described by a [`config::DoeConfig`], validated into a
//! [`plan::DoePlan`] and executed against a [`layout::LayoutBuilder`], producing
//! one GDS file per design point.

pub mod blocks;
pub mod cli;
pub mod config;
pub mod doe;
pub mod error;
pub mod layout;
pub mod paths;
pub mod plan;

pub use error::{BuildError, ConfigError, Error, Result};
