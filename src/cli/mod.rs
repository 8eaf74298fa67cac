use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::archive::{ArchiveOptions, ArchiveRequest, CollisionPolicy};
use crate::compress::{CompressionSettings, DEFAULT_LEVEL};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Archive a directory into a dated, checksum-named .tar.zstd file.
    #[command(alias = "c")]
    Create(CreateArgs),

    /// Check published archives against the checksum in their file name.
    #[command(alias = "v")]
    Verify {
        /// One or more .tar.zstd archives produced by `create`.
        #[arg(required = true)]
        archives: Vec<PathBuf>,
    },
}

#[derive(clap::Args, Clone, Debug)]
pub struct CreateArgs {
    /// Directory to back up.
    #[arg(short, long, env = "SNAPTAR_SOURCE", default_value = "/data")]
    pub source: PathBuf,

    /// Directory that receives the archive. Created if missing.
    #[arg(short, long, env = "SNAPTAR_TARGET", default_value = "/backups")]
    pub target: PathBuf,

    /// Log every archived entry.
    #[arg(short, long, env = "SNAPTAR_VERBOSE")]
    pub verbose: bool,

    /// Zstandard compression level (1-22). Higher levels offer better compression at the cost of speed.
    #[arg(long, env = "SNAPTAR_LEVEL", default_value_t = DEFAULT_LEVEL,
          value_parser = clap::value_parser!(i32).range(1..=22))]
    pub level: i32,

    /// Disable zstd long-distance matching (enabled by default).
    #[arg(long = "no-long-distance", action = clap::ArgAction::SetFalse, default_value_t = true)]
    pub long_distance: bool,

    /// Keep an existing archive with the same name instead of replacing it.
    #[arg(long)]
    pub keep_existing: bool,

    /// Skip the integrity check of the staged archive before publishing it.
    #[arg(long)]
    pub skip_check: bool,

    /// Print the result as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl Commands {
    pub fn verbose(&self) -> bool {
        matches!(self, Commands::Create(CreateArgs { verbose: true, .. }))
    }
}

impl CreateArgs {
    pub fn request(&self) -> ArchiveRequest {
        ArchiveRequest::new(&self.source, &self.target)
    }

    /// Maps the flags onto the run options. The date is left to the pipeline.
    pub fn options(&self) -> ArchiveOptions {
        ArchiveOptions {
            compression: CompressionSettings {
                level: self.level,
                long_distance_matching: self.long_distance,
                ..Default::default()
            },
            verbose: self.verbose,
            on_collision: if self.keep_existing { CollisionPolicy::KeepExisting } else { CollisionPolicy::Overwrite },
            skip_check: self.skip_check,
            date: None,
        }
    }
}

/// Parses command-line arguments using `clap` and returns the command to execute.
pub fn run() -> Result<Commands, clap::Error> {
    let args = Args::try_parse()?;
    Ok(args.command)
}
