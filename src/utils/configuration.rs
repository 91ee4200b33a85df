use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::alphabet::{self, MAX_SCORED_LENGTH};
use crate::core::errors::AssemblyError;

/// Prefix for environment overrides, e.g. `DBG_FORGE_ASSEMBLY__KMER_SIZE=21`
pub const ENV_PREFIX: &str = "DBG_FORGE";

/// Largest supported k-mer length
pub const MAX_KMER_SIZE: usize = 255;

/// Complete assembler configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Core assembly parameters
    pub assembly: AssemblyConfig,
    /// Output locations and formatting
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssemblyConfig {
    /// K-mer length
    pub kmer_size: usize,
    /// Signature (minimizer) length used to bucket k-mers
    pub signature_length: usize,
    /// K-mers seen in this many reads or fewer are discarded
    pub abundance_cutoff: usize,
    /// Base substituted for every symbol outside ACGT
    pub replacement_base: char,
    /// Contigs shorter than this are left out of the results
    pub min_contig_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub unitigs_file: String,
    pub contigs_file: String,
    pub branch_report_file: String,
    pub stats_file: String,
    /// Symbols per FASTA sequence line
    pub fasta_line_width: usize,
    pub write_branch_report: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            kmer_size: 31,
            signature_length: 4,
            abundance_cutoff: 1,
            replacement_base: 'C',
            min_contig_length: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            unitigs_file: "unitigs.fa".to_string(),
            contigs_file: "contigs.fa".to_string(),
            branch_report_file: "unitig_info.csv".to_string(),
            stats_file: "assembly_stats.json".to_string(),
            fasta_line_width: 80,
            write_branch_report: true,
        }
    }
}

impl AssemblerConfig {
    /// Check every parameter the assembly core depends on.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        let assembly = &self.assembly;

        if assembly.kmer_size < 3 {
            return Err(AssemblyError::validation(
                "assembly.kmer_size",
                "must be at least 3",
            ));
        }
        if assembly.kmer_size > MAX_KMER_SIZE {
            return Err(AssemblyError::validation(
                "assembly.kmer_size",
                format!("must be at most {MAX_KMER_SIZE}"),
            ));
        }
        if assembly.signature_length == 0 || assembly.signature_length >= assembly.kmer_size {
            return Err(AssemblyError::validation(
                "assembly.signature_length",
                "must be at least 1 and less than kmer_size",
            ));
        }
        if assembly.signature_length > MAX_SCORED_LENGTH {
            return Err(AssemblyError::validation(
                "assembly.signature_length",
                format!("must be at most {MAX_SCORED_LENGTH}"),
            ));
        }
        if assembly.abundance_cutoff == 0 {
            return Err(AssemblyError::validation(
                "assembly.abundance_cutoff",
                "must be at least 1",
            ));
        }
        let replacement = assembly.replacement_base;
        if !replacement.is_ascii() || alphabet::encode(replacement as u8).is_none() {
            return Err(AssemblyError::validation(
                "assembly.replacement_base",
                "must be one of A, C, G, T",
            ));
        }
        if self.output.fasta_line_width == 0 {
            return Err(AssemblyError::validation(
                "output.fasta_line_width",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Replacement base as a byte; validated configs always hold ACGT.
    pub fn replacement_byte(&self) -> u8 {
        let base = self.assembly.replacement_base;
        if base.is_ascii() {
            base as u8
        } else {
            b'C'
        }
    }
}

/// Loads, validates and persists [`AssemblerConfig`]
#[derive(Debug, Clone)]
pub struct ConfigurationManager {
    config: AssemblerConfig,
    config_path: Option<PathBuf>,
}

impl ConfigurationManager {
    /// Built-in defaults only
    pub fn new() -> Result<Self, AssemblyError> {
        Self::with_config(AssemblerConfig::default())
    }

    pub fn with_config(config: AssemblerConfig) -> Result<Self, AssemblyError> {
        config.validate()?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// Defaults, overridden by `config_path` when given, overridden by
    /// `DBG_FORGE_*` environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, AssemblyError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AssemblerConfig::default())?);

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(AssemblyError::io(path, "configuration file not found"));
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AssemblerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(?config, "configuration loaded");

        Ok(Self {
            config,
            config_path: config_path.map(Path::to_path_buf),
        })
    }

    /// Load from a specific file without environment overrides.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, AssemblyError> {
        let path = config_path.as_ref();
        let config: AssemblerConfig = Config::builder()
            .add_source(Config::try_from(&AssemblerConfig::default())?)
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AssemblerConfig {
        &mut self.config
    }

    pub fn into_config(self) -> AssemblerConfig {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write the current configuration as TOML.
    pub fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), AssemblyError> {
        let toml_string =
            toml::to_string_pretty(&self.config).map_err(|e| AssemblyError::Configuration {
                message: format!("Failed to serialize configuration: {e}"),
            })?;
        std::fs::write(path.as_ref(), toml_string)
            .map_err(|e| AssemblyError::io(path.as_ref(), e))?;

        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Write the default configuration as a starting point for users.
    pub fn save_template<P: AsRef<Path>>(path: P) -> Result<(), AssemblyError> {
        Self::new()?.save_config(path)
    }
}
