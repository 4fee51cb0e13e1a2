use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline on a short demo video
    Demo {
        /// Video URL (defaults to the configured demo video)
        #[arg(short, long)]
        url: Option<String>,

        /// Watermark text
        #[arg(short, long)]
        watermark: Option<String>,

        /// Download quality: 360p, 480p, 720p, 1080p or best
        #[arg(short, long)]
        quality: Option<String>,

        /// Do not burn subtitles into the video
        #[arg(long)]
        no_subtitles: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Quick test on one of the sample videos at low quality
    Quick {
        /// Watermark text (prompted for when omitted)
        #[arg(short, long)]
        watermark: Option<String>,

        /// Download quality: 360p, 480p, 720p, 1080p or best
        #[arg(short, long)]
        quality: Option<String>,
    },

    /// Run the end-to-end workflow script and report its exit status
    WorkflowTest {
        /// Video URL (defaults to the configured test video)
        #[arg(short, long)]
        url: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check external tools, project files and network access
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the pipeline does
    Info,

    /// Write the default configuration file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "vidpipe.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
