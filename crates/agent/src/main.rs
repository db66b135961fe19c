//! `nebula-agent`: chunk, verify and reassemble files.
//!
//! # Usage
//!
//! ```text
//! nebula-agent chunk report.pdf --save --out report.json   # chunk and cache
//! nebula-agent verify report.json --payloads               # check root and cache
//! nebula-agent assemble report.json rebuilt.pdf            # rebuild from cache
//! nebula-agent root <digest> <digest> ...                  # fold digests
//! nebula-agent -c nebula.toml --chunk-size 4096 chunk big.iso
//! ```

mod commands;
mod config;
mod telemetry;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use commands::ChunkOptions;
use config::AgentConfig;

#[derive(Parser)]
#[command(
    name = "nebula-agent",
    version,
    about = "Chunk files, fold Merkle roots and verify integrity"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the chunk size in bytes.
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Override the local chunk cache directory.
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk a file and print its metadata record as JSON.
    Chunk {
        /// File to chunk.
        path: PathBuf,

        /// Cache chunk payloads under the data directory.
        #[arg(long)]
        save: bool,

        /// Owner recorded in the metadata.
        #[arg(long)]
        owner: Option<String>,

        /// Mark the file public.
        #[arg(long)]
        public: bool,

        /// Write the record to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Rebuild a file from its record and the cached chunks.
    Assemble {
        /// Metadata record (JSON).
        metadata: PathBuf,

        /// Where to write the rebuilt file.
        output: PathBuf,
    },

    /// Recompute the Merkle root of a record and compare.
    Verify {
        /// Metadata record (JSON).
        metadata: PathBuf,

        /// Also re-hash the cached payloads.
        #[arg(long)]
        payloads: bool,
    },

    /// Fold hex digests into a Merkle root.
    Root {
        /// Digests in leaf order.
        digests: Vec<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = AgentConfig::load(cli.config.as_deref())
        .context("failed to load config")?
        .with_overrides(cli.chunk_size, cli.data_dir);

    telemetry::init(&config.log.level);
    config.validate().context("invalid configuration")?;
    debug!(?config, "configuration loaded");

    let mut stdout = io::stdout().lock();
    match cli.command {
        Commands::Chunk {
            path,
            save,
            owner,
            public,
            out,
        } => {
            let options = ChunkOptions {
                save,
                owner,
                public,
                record_path: out,
            };
            commands::chunk(&config, &path, options, &mut stdout)?;
        }
        Commands::Assemble { metadata, output } => {
            commands::assemble(&config, &metadata, &output)?;
        }
        Commands::Verify { metadata, payloads } => {
            if !commands::verify(&config, &metadata, payloads, &mut stdout)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Root { digests } => {
            commands::root(&digests, &mut stdout)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
