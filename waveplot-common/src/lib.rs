//! # WavePlot Common Library
//!
//! Shared code for the WavePlot crates:
//! - Error type used by configuration and I/O helpers
//! - Layered configuration loading (CLI → ENV → TOML → defaults)

pub mod config;
pub mod error;

pub use error::{Error, Result};
