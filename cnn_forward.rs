// cnn_forward.rs
// Classify one PNG with a freshly initialized CNN (forward pass only).
//
// Usage:
//   cnn_forward [IMAGE] [--config FILE] [--architecture FILE] [--seed N]
//               [--init-std S] [--log-format pretty|compact|full]
//
// Output (stdout):
//   - one shape line per spatial stage and the flattened size
//   - the final score vector and the predicted class
// Logs go to stderr, filtered by RUST_LOG or the config's log_filter.

use anyhow::{Context, Result};
use clap::Parser;
use cnn_inference::architecture::{build_network, load_architecture, ArchitectureConfig};
use cnn_inference::config::{self, load_config, InferenceConfig};
use cnn_inference::image::load_image;
use cnn_inference::init::GaussianInit;
use cnn_inference::report;
use cnn_inference::Shape;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(author, version, about = "Forward pass of a small CNN over a single PNG")]
struct Args {
    /// PNG to classify
    image: Option<PathBuf>,

    /// Run configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Architecture JSON (reference topology when omitted)
    #[arg(short, long)]
    architecture: Option<PathBuf>,

    /// Seed for weight initialization
    #[arg(short, long)]
    seed: Option<u64>,

    /// Standard deviation of the initial weights
    #[arg(long)]
    init_std: Option<f32>,

    /// Log line format
    #[arg(long, value_parser = ["pretty", "compact", "full"])]
    log_format: Option<String>,
}

/// Merge command-line flags over the config file; flags win.
fn resolve_config(args: &Args) -> Result<InferenceConfig> {
    let mut cfg = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => InferenceConfig::default(),
    };

    if let Some(ref image) = args.image {
        cfg.image_path = Some(image.clone());
    }
    if let Some(ref arch) = args.architecture {
        cfg.architecture = Some(arch.clone());
    }
    if let Some(seed) = args.seed {
        cfg.seed = Some(seed);
    }
    if let Some(std) = args.init_std {
        cfg.init_std = Some(std);
    }
    if let Some(ref format) = args.log_format {
        cfg.log_format = Some(format.clone());
    }

    config::validate_config(&cfg).context("invalid run configuration")?;
    Ok(cfg)
}

fn init_tracing(cfg: &InferenceConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cfg.log_filter_or_default()))
        .context("invalid log filter")?;

    match cfg.log_format.as_deref().unwrap_or("full") {
        "pretty" => {
            let layer = fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).init();
        }
        "compact" => {
            let layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).init();
        }
        _ => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).init();
        }
    }
    Ok(())
}

fn run(cfg: &InferenceConfig) -> Result<()> {
    let arch = match &cfg.architecture {
        Some(path) => load_architecture(path)
            .with_context(|| format!("failed to load architecture {}", path.display()))?,
        None => ArchitectureConfig::reference(),
    };

    let seed = cfg.seed.unwrap_or_else(rand::random);
    let std = cfg.init_std.unwrap_or(GaussianInit::DEFAULT_STD);
    let mut init = GaussianInit::new(seed, std)?;
    tracing::info!(seed = init.seed(), init_std = std, "initializing weights");
    let network = build_network(&arch, &mut init).context("failed to build network")?;

    let (height, width) = match network.input_shape() {
        Shape::Spatial { height, width, .. } => (height, width),
        Shape::Flat(len) => anyhow::bail!("network input must be an image, got [{}]", len),
    };
    let image_path = cfg.image_path_or_default();
    let input = load_image(&image_path, height, width)
        .with_context(|| format!("failed to load image {}", image_path.display()))?;

    let scores = network
        .forward_with(input, |stage| {
            if let Some(line) = report::report_line(stage) {
                println!("{}", line);
            }
        })
        .context("forward pass failed")?;

    println!("{}", report::format_scores(scores.as_slice()));
    if let Some(line) = report::format_prediction(scores.as_slice()) {
        println!("{}", line);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = resolve_config(&args)?;
    init_tracing(&cfg)?;
    run(&cfg)
}
