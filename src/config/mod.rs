// src/config/mod.rs

//! Configuration model and loading.
//!
//! - [`model`] mirrors the TOML layout (`RawConfigFile`) and holds the
//!   validated `ConfigFile`.
//! - [`validate`] turns raw into validated config.
//! - [`loader`] reads files from disk.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, DefaultsSection, MonitorSection, PipelineSection, RawConfigFile, StoreSection,
    WorkspaceSection,
};
