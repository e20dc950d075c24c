//! Configuration of the pipeline and the anchor layout

pub mod config;

pub use config::{
    AnchorConfig, ConfigError, ConfigFile, ConfigurationManager, FormatSettings, PipelineConfig,
};
