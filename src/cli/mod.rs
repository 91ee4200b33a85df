//! Command-line interface
//! ======================
//!
//! `dbg-forge assemble` runs the full pipeline on FASTQ/FASTA input;
//! `dbg-forge config-template` writes the default configuration.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::assembly::AssemblyPipeline;
use crate::utils::configuration::{AssemblerConfig, ConfigurationManager};

#[derive(Parser, Debug)]
#[command(name = "dbg-forge")]
#[command(about = "Minimizer-indexed de novo assembly of short reads")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble reads into unitigs and contigs
    Assemble {
        /// Input FASTQ or FASTA files; read ids continue across files
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// K-mer length
        #[arg(short = 'k', long)]
        kmer_size: Option<usize>,

        /// Discard k-mers supported by this many reads or fewer
        #[arg(long)]
        cutoff: Option<usize>,

        /// Signature (minimizer) length
        #[arg(long)]
        signature_length: Option<usize>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration as TOML
    ConfigTemplate {
        /// Destination file
        path: PathBuf,
    },
}

impl Cli {
    pub fn init_logging(&self) -> Result<()> {
        let level = if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(
                EnvFilter::builder()
                    .with_default_directive(level.into())
                    .from_env_lossy(),
            )
            .init();

        Ok(())
    }

    pub fn execute(self) -> Result<()> {
        self.init_logging()?;

        match self.command {
            Commands::Assemble {
                input,
                kmer_size,
                cutoff,
                signature_length,
                output,
                config,
            } => {
                let mut config = ConfigurationManager::load(config.as_deref())?.into_config();
                apply_overrides(&mut config, kmer_size, cutoff, signature_length, output);
                run_assembly(config, &input)
            }
            Commands::ConfigTemplate { path } => {
                ConfigurationManager::save_template(&path)?;
                println!("Configuration template written to {}", path.display());
                Ok(())
            }
        }
    }
}

/// Command-line values take precedence over file and environment settings.
pub fn apply_overrides(
    config: &mut AssemblerConfig,
    kmer_size: Option<usize>,
    cutoff: Option<usize>,
    signature_length: Option<usize>,
    output: Option<PathBuf>,
) {
    if let Some(k) = kmer_size {
        config.assembly.kmer_size = k;
    }
    if let Some(c) = cutoff {
        config.assembly.abundance_cutoff = c;
    }
    if let Some(m) = signature_length {
        config.assembly.signature_length = m;
    }
    if let Some(dir) = output {
        config.output.output_dir = dir;
    }
}

fn run_assembly(config: AssemblerConfig, input: &[PathBuf]) -> Result<()> {
    let pipeline = AssemblyPipeline::new(config)?;
    let results = pipeline.run_files(input)?;
    pipeline.write_outputs(&results)?;
    info!(
        "Results written to {}",
        pipeline.config().output.output_dir.display()
    );

    let stats = &results.stats;
    println!("{}", "Assembly completed".bright_green().bold());
    println!("   Reads:        {}", stats.num_reads);
    println!("   Unitigs:      {}", stats.num_unitigs);
    println!("   Contigs:      {}", stats.num_contigs);
    println!("   Total length: {} bp", stats.total_length);
    println!("   N50:          {} bp", stats.n50);
    Ok(())
}
