use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "artwork")]
#[command(author, version, about = "Responsive image derivatives for stored artwork")]
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

/// Options describing the record an image belongs to
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// Sub-folder of the record, usually its ID
    #[arg(short, long)]
    pub sub_folder: String,

    /// Top-level folder (defaults to artwork.folder from config)
    #[arg(short, long)]
    pub folder: Option<String>,

    /// Derivative sizes, e.g. 1200,600x400 (defaults to artwork.sizes from config)
    #[arg(long, value_delimiter = ',', conflicts_with = "no_sizes")]
    pub sizes: Option<Vec<String>>,

    /// Keep only the original, without derivatives
    #[arg(long)]
    pub no_sizes: bool,

    /// Exit with an error if any conversion or deletion failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store an image for a record and generate its derivatives
    Upload {
        /// Image file to store
        #[arg(required = true)]
        file: PathBuf,

        #[command(flatten)]
        record: RecordArgs,
    },

    /// Regenerate derivatives for a stored image
    Save {
        /// Storage name of the image, e.g. artwork/42/photo.jpg
        #[arg(required = true)]
        name: String,

        #[command(flatten)]
        record: RecordArgs,
    },

    /// Delete a stored image, its derivatives and empty folders
    Delete {
        /// Storage name of the image
        #[arg(required = true)]
        name: String,

        #[command(flatten)]
        record: RecordArgs,
    },

    /// Print derivative paths and URLs for a stored image
    Paths {
        /// Storage name of the image
        #[arg(required = true)]
        name: String,

        #[command(flatten)]
        record: RecordArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the storage name an upload would receive
    Location {
        /// Original file name
        #[arg(required = true)]
        filename: String,

        /// Sub-folder of the record
        #[arg(short, long)]
        sub_folder: String,

        /// Top-level folder (defaults to artwork.folder from config)
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Check that ImageMagick is available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config or the default locations if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
