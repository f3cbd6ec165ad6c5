use clap::{Parser, Subcommand};
use mediaseek_common::ContainerFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaseek")]
#[command(author, version, about = "Seekable segment indexes for fragmented MP4 and Matroska files")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the segment index of a file and print it
    Index {
        /// Fragmented MP4 or Matroska file
        #[arg(required = true)]
        file: PathBuf,

        /// Container format (mp4, matroska); inferred from the extension if omitted
        #[arg(short, long)]
        format: Option<ContainerFormat>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find the segment for a presentation time or byte offset
    Locate {
        #[arg(required = true)]
        file: PathBuf,

        /// Presentation time in seconds
        #[arg(short, long, conflicts_with = "offset", required_unless_present = "offset")]
        time: Option<f64>,

        /// Byte offset in the file
        #[arg(long)]
        offset: Option<u64>,

        /// Track index (Matroska files have a single shared track list)
        #[arg(long, default_value = "0")]
        track: usize,

        #[arg(short, long)]
        format: Option<ContainerFormat>,
    },

    /// Copy one segment's bytes to a file
    Extract {
        #[arg(required = true)]
        file: PathBuf,

        /// Extract the segment playing at this time, in seconds
        #[arg(short, long, conflicts_with = "segment", required_unless_present = "segment")]
        time: Option<f64>,

        /// Extract the segment with this index
        #[arg(short, long)]
        segment: Option<usize>,

        #[arg(long, default_value = "0")]
        track: usize,

        #[arg(short, long)]
        format: Option<ContainerFormat>,

        /// Output file
        #[arg(short, long, required = true)]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
