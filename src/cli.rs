//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use cdvl_crawler::ConfigLayer;

/// Crawl and download from the CDVL research video archive.
///
/// Sweeps video and dataset ids into JSON Lines logs, downloads video files
/// with resume support, and turns the logs into CSV or a static HTML page.
#[derive(Parser, Debug)]
#[command(name = "cdvl-crawler")]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a JSON config file (defaults to ./config.json when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Accept the CDVL license terms without prompting
    #[arg(long, global = true)]
    pub accept_license: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and sweep video and dataset ids into JSONL logs
    Crawl(CrawlArgs),
    /// Download videos by id (comma-separated)
    Download(DownloadArgs),
    /// Convert a JSONL log to CSV
    Export(ExportArgs),
    /// Generate a searchable static HTML page from a JSONL log
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CrawlArgs {
    /// Directory for the JSONL logs
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// First video id to try
    #[arg(long, value_name = "N")]
    pub start_video_id: Option<u64>,

    /// First dataset id to try
    #[arg(long, value_name = "N")]
    pub start_dataset_id: Option<u64>,

    /// Concurrent detail-page requests per batch (1-100)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub max_concurrent: Option<u8>,

    /// Consecutive empty or failed ids before a sweep stops
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_failures: Option<u32>,

    /// Delay between batches in seconds
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Highest video id to try
    #[arg(long, value_name = "N")]
    pub max_video_id: Option<u64>,

    /// Highest dataset id to try
    #[arg(long, value_name = "N")]
    pub max_dataset_id: Option<u64>,
}

impl CrawlArgs {
    /// The CLI override layer; only flags that were given are set.
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            start_video_id: self.start_video_id,
            start_dataset_id: self.start_dataset_id,
            max_concurrent_requests: self.max_concurrent.map(usize::from),
            max_consecutive_failures: self.max_failures,
            request_delay: self.delay,
            max_video_id: self.max_video_id,
            max_dataset_id: self.max_dataset_id,
            ..ConfigLayer::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Video ids, comma-separated (e.g. 42 or 1,2,3)
    #[arg(value_name = "IDS")]
    pub ids: String,

    /// Resolve download links and print them without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Output file (single id only)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for downloaded files
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Ignore partial downloads and start over
    #[arg(long)]
    pub no_resume: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// JSONL log to read
    #[arg(short, long, value_name = "FILE", default_value = "videos.jsonl")]
    pub input: PathBuf,

    /// CSV file to write
    #[arg(short, long, value_name = "FILE", default_value = "videos.csv")]
    pub output: PathBuf,

    /// Columns to include, comma-separated (default: all present)
    #[arg(long, value_name = "COLS", value_delimiter = ',')]
    pub columns: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// JSONL log to read
    #[arg(short, long, value_name = "FILE", default_value = "videos.jsonl")]
    pub input: PathBuf,

    /// HTML file to write
    #[arg(short, long, value_name = "FILE", default_value = "index.html")]
    pub output: PathBuf,
}
