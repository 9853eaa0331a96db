//! cmake-wheel configuration resolution
//!
//! This crate implements configuration resolution for the cmake-wheel build
//! backend: a declarative option schema applied to `pyproject.toml` and its
//! override files, with cross-file overriding, profile inheritance and
//! default computation, producing the flattened `Config` consumed by the
//! build orchestration layer.

pub mod config;

pub use config::{
    load_component_config, load_config, ComponentConfig, Config, ConfigError, OverrideFiles,
};
