//! Merge Configuration Module
//!
//! Provides merge, scoring, LAS and export settings loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `PETROMERGE_CONFIG` environment variable (path to TOML file)
//! 2. `petromerge.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! The engine holds no global state: load once and pass the config along.
//!
//! ```ignore
//! let config = MergeConfig::load()?;
//! let engine = MergeEngine::from_config(&config)?;
//! ```

mod merge_config;
pub mod defaults;
pub mod validation;

pub use merge_config::*;
