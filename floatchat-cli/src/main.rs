//! FloatChat CLI: run the ARGO data pipeline and inspect its cache.
//!
//! Commands:
//! - `run`: fetch, load, clean and summarize a URL or local file
//! - `fetch`: download a resource into the cache and print its path
//! - `profile`: print one parameter against depth
//! - `cache status`: list cached files and their sizes

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use floatchat_core::data::FileCache;
use floatchat_core::profile::{depth_profile, DEFAULT_DEPTH_COLUMN};
use floatchat_core::DepthProfile;
use floatchat_runner::{Pipeline, PipelineConfig, ReportFormat};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "floatchat",
    version,
    about = "FloatChat CLI: ARGO float data acquisition, cleaning and summary"
)]
struct Cli {
    /// Enable debug logging on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the dataset report.
    Run {
        /// URL (http/https) or local path of a CSV or JSON file.
        source: String,

        /// Cache file to download into, relative to the cache directory.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the summary as JSON instead of the text report.
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        settings: Settings,
    },
    /// Download a resource into the cache and print the local path.
    Fetch {
        url: String,

        /// Cache file to download into, relative to the cache directory.
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: Settings,
    },
    /// Print a parameter against depth, surface first.
    Profile {
        /// URL (http/https) or local path of a CSV or JSON file.
        source: String,

        /// Column to profile (e.g. Temperature, Salinity).
        #[arg(long)]
        parameter: String,

        #[arg(long, default_value = DEFAULT_DEPTH_COLUMN)]
        depth_column: String,

        /// Print the profile as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        settings: Settings,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached files and their sizes.
    Status {
        #[command(flatten)]
        settings: Settings,
    },
}

/// Config file plus command-line overrides.
#[derive(Args)]
struct Settings {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache directory. Defaults to ./data.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Download timeout in seconds. Defaults to 60.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Settings {
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.cache_dir {
            config.fetch.cache_dir = dir.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.fetch.timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            source,
            output,
            json,
            settings,
        } => run_pipeline_cmd(&source, output.as_deref(), json, &settings),
        Commands::Fetch {
            url,
            output,
            settings,
        } => run_fetch(&url, output.as_deref(), &settings),
        Commands::Profile {
            source,
            parameter,
            depth_column,
            json,
            settings,
        } => run_profile(&source, &parameter, &depth_column, json, &settings),
        Commands::Cache { action } => match action {
            CacheAction::Status { settings } => run_cache_status(&settings),
        },
    }
}

fn run_pipeline_cmd(
    source: &str,
    output: Option<&Path>,
    json: bool,
    settings: &Settings,
) -> Result<()> {
    let config = settings.resolve()?;
    let pipeline = Pipeline::from_config(&config)?;
    let result = pipeline.execute(source, output)?;

    let format = if json {
        ReportFormat::Json
    } else {
        config.report.format
    };
    print!("{}", result.formatted(format)?);
    Ok(())
}

fn run_fetch(url: &str, output: Option<&Path>, settings: &Settings) -> Result<()> {
    let config = settings.resolve()?;
    let pipeline = Pipeline::from_config(&config)?;
    let path = pipeline.fetcher().fetch(url, output)?;
    println!("{}", path.display());
    Ok(())
}

fn run_profile(
    source: &str,
    parameter: &str,
    depth_column: &str,
    json: bool,
    settings: &Settings,
) -> Result<()> {
    let config = settings.resolve()?;
    let pipeline = Pipeline::from_config(&config)?;
    let result = pipeline.execute(source, None)?;
    let profile = depth_profile(&result.dataset, depth_column, parameter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
    }
    Ok(())
}

fn print_profile(profile: &DepthProfile) {
    println!(
        "=== {} vs {} ({} points) ===",
        profile.parameter,
        profile.depth_column,
        profile.points.len()
    );
    if let (Some(surface), Some(deep)) = (profile.surface(), profile.deepest()) {
        println!(
            "Surface: {} at {} | Deepest: {} at {}",
            surface.value, surface.depth, deep.value, deep.depth
        );
        println!();
    }
    println!("{:>12} {:>14}", profile.depth_column, profile.parameter);
    println!("{}", "-".repeat(27));
    for point in &profile.points {
        println!("{:>12} {:>14}", point.depth, point.value);
    }
}

fn run_cache_status(settings: &Settings) -> Result<()> {
    let config = settings.resolve()?;
    let cache = FileCache::new(&config.fetch.cache_dir);
    if !cache.dir().exists() {
        println!("Cache directory does not exist: {}", cache.dir().display());
        return Ok(());
    }

    let entries = cache
        .entries()
        .with_context(|| format!("cannot list cache {}", cache.dir().display()))?;
    if entries.is_empty() {
        println!("Cache is empty: {}", cache.dir().display());
        return Ok(());
    }

    let total_size: u64 = entries.iter().map(|e| e.size_bytes).sum();
    println!("Cache: {}", cache.dir().display());
    println!("Files: {}", entries.len());
    println!("Total size: {}", format_size(total_size));
    println!();
    println!("{:<32} {:<17} {:>10}", "File", "Modified", "Size");
    println!("{}", "-".repeat(61));
    for entry in &entries {
        let modified = entry
            .modified
            .as_ref()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<32} {:<17} {:>10}",
            entry.name,
            modified,
            format_size(entry.size_bytes)
        );
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a global tracing subscriber is already installed");
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
