pub mod configuration;
pub mod format_writers;

pub use configuration::{AssemblerConfig, AssemblyConfig, ConfigurationManager, OutputConfig};
