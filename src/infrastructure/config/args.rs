//! Command-line arguments.

use super::app_config::LogLevel;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "verdant",
    version,
    about = "Adaptive image delivery for the Verdant nursery storefront",
    long_about = None
)]
#[allow(missing_docs)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Image CDN endpoint.
    #[arg(long, value_name = "URL", env = "VERDANT_CDN_ENDPOINT", global = true)]
    pub cdn_endpoint: Option<String>,

    /// Viewport trigger margin in pixels.
    #[arg(long, value_name = "PX", global = true)]
    pub root_margin: Option<u32>,

    /// Maximum simultaneous asset downloads.
    #[arg(long, value_name = "N", global = true)]
    pub max_concurrent_fetches: Option<usize>,

    /// Admin email (repeatable). Replaces the configured list.
    #[arg(long = "admin-email", value_name = "EMAIL", global = true)]
    pub admin_emails: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
#[allow(missing_docs)]
pub enum Command {
    /// Print the delivery URLs for a logical path.
    Resolve(ImageArgs),

    /// Simulate the load lifecycle of one image and print each render.
    Render {
        #[command(flatten)]
        image: ImageArgs,

        /// Simulate a failed fetch instead of a successful one.
        #[arg(long)]
        fail: bool,
    },

    /// Fetch one image over the network and print the final render.
    Fetch {
        #[command(flatten)]
        image: ImageArgs,

        /// Rendered width used to pick a responsive candidate.
        #[arg(long, value_name = "PX", default_value_t = 1024)]
        display_width: u32,
    },

    /// Seed a catalog from JSON and simulate scrolling its product grid.
    Catalog {
        /// Seed file with an array of products.
        #[arg(value_name = "FILE")]
        seed: PathBuf,

        /// Products per grid row.
        #[arg(long, default_value_t = 4)]
        columns: u32,

        /// Scroll steps to simulate, one viewport height each.
        #[arg(long, default_value_t = 3)]
        steps: u32,
    },

    /// Check whether an email has admin access.
    Access {
        #[arg(value_name = "EMAIL")]
        email: String,
    },
}

#[derive(Debug, Clone, Args)]
#[allow(missing_docs)]
pub struct ImageArgs {
    /// Logical image path, e.g. `roses/1.jpg`.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Fetch immediately and emit a preload hint.
    #[arg(long)]
    pub priority: bool,

    /// Generate responsive width candidates.
    #[arg(long)]
    pub responsive: bool,

    /// Show a blurred placeholder while loading.
    #[arg(long)]
    pub blur: bool,

    /// Display width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Display height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Aspect ratio, e.g. `4:3`.
    #[arg(long, value_name = "W:H")]
    pub aspect_ratio: Option<String>,

    /// Candidate widths, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub widths: Vec<u32>,
}
