//! Data models, configuration, and model file assembly.

pub mod assembly;
pub mod config;
pub mod metadata;
