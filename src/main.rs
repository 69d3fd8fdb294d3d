use anyhow::{Context, Result};
use clap::Parser;
use photomark::codec::OutputFormat;
use photomark::config::Config;
use photomark::metrics::PipelineMetrics;
use photomark::watermark::LogoSource;
use photomark::{Upload, WatermarkService};
use std::path::PathBuf;

/// Photomark - stamp author/location attribution onto photos and re-encode them
#[derive(Parser, Debug)]
#[command(name = "photomark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Author name, rendered as "<author> ©"
    #[arg(short, long, default_value = "")]
    author: String,

    /// Location line under the author
    #[arg(short, long, default_value = "")]
    location: String,

    /// Logo file, overrides the configured one
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Output format (avif or webp)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Encoder quality (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Directory the watermarked file is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print pipeline metrics in Prometheus text format to stdout when done
    #[arg(long)]
    metrics: bool,

    /// Image to watermark
    input: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    photomark::logging::init_subscriber(args.json_logs)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(quality) = args.quality {
        config.output.quality = quality;
    }

    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    tracing::info!(
        config_file = ?args.config,
        format = config.output.format.as_str(),
        quality = config.output.quality,
        max_dimension = config.pipeline.max_dimension,
        "Configuration loaded successfully"
    );

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let service = WatermarkService::new(&config).context("Failed to start worker pool")?;

    let mut upload = Upload::new(bytes, args.author, args.location);
    upload.filename = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    if let Some(logo) = args.logo {
        upload.logo = LogoSource::Path(logo);
    }

    let result = service.process(upload).await;
    if args.metrics {
        print!("{}", PipelineMetrics::render());
    }
    let image = result?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let destination = args.output_dir.join(&image.filename);
    std::fs::write(&destination, &image.data)
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    tracing::info!(
        output = %destination.display(),
        content_type = image.content_type,
        width = image.width,
        height = image.height,
        bytes = image.data.len(),
        "Watermarked image written"
    );

    Ok(())
}
