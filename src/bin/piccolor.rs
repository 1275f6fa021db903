use anyhow::{Context, Result};
use clap::Parser;
use piccolor::{AnalyzerConfig, ColorFormat, Grouping, analyze_image_with};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Show the dominant colors of images, with where they appear.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    inputs: Vec<PathBuf>,

    /// Maximum number of colors to report
    #[arg(short = 'k', long)]
    max_colors: Option<usize>,

    /// Minimum pixel count (in the downscaled sample) for a color to be listed
    #[arg(short = 't', long)]
    min_pixels: Option<u32>,

    /// How to group pixels: exact or kmeans
    #[arg(short, long)]
    grouping: Option<Grouping>,

    /// Color notation: hex, rgb, hsl or hsv
    #[arg(short, long, default_value = "hex")]
    format: ColorFormat,

    /// Print full results as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// JSON configuration file; flags above override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn effective_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => AnalyzerConfig::default(),
        };
        if let Some(k) = self.max_colors {
            config.max_colors = k;
        }
        if let Some(t) = self.min_pixels {
            config.min_pixel_threshold = t;
        }
        if let Some(g) = self.grouping {
            config.grouping = g;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.effective_config()?;

    if let Some(path) = &args.write_config {
        config
            .to_json_file(path)
            .with_context(|| format!("writing config {}", path.display()))?;
        println!("Saved → {}", path.display());
        return Ok(());
    }

    if args.inputs.is_empty() {
        anyhow::bail!("no input images given");
    }

    let mut failures = 0;
    for input in &args.inputs {
        let result = match analyze_image_with(input, &config) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("{}: {}", input.display(), e.user_message());
                tracing::debug!(error = ?e, "analysis failed");
                failures += 1;
                continue;
            }
        };

        if args.json {
            println!("{}", result.to_json().context("serializing result")?);
            continue;
        }

        println!("{result}");
        println!("{}", result.summary());
        for color in result.colors() {
            let position = color
                .position()
                .map(|p| format!("({}, {})", p.x, p.y))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<28} {:>6.2}%  {}",
                args.format.render(color),
                color.percentage(),
                position
            );
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} images could not be analyzed", args.inputs.len());
    }
    Ok(())
}
