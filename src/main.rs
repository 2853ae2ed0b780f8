use clap::{Parser, Subcommand};
use portal_crop::asset::ImageAsset;
use portal_crop::config::{self, CropConfig};
use portal_crop::imaging::calculations::rotated_canvas_size;
use portal_crop::imaging::{AspectRatio, CropBox, ImageBackend, RustBackend, clamp_rotation};
use portal_crop::jobs::{self, CropJob};
use portal_crop::registry::PortalImageRegistry;
use portal_crop::session::PortalId;
use portal_crop::{output, publish};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "portal-crop")]
#[command(about = "Crop, rotate and re-encode article images for publishing portals")]
#[command(long_about = "\
Crop, rotate and re-encode article images for publishing portals

Every upload goes through the cropper: the image is rotated about its centre
onto an expanded canvas, the crop box is cut out and encoded as JPEG
(quality 0.95), then re-encoded as WebP when possible. Uploads above 10 MB
are rejected.

Output layout:

  out/
  ├── manifest.json                # Upload manifest (featured first)
  ├── featured/Harbour-Dawn.webp   # Featured image
  ├── portal-7/Harbour-Dawn.webp   # One directory per portal
  └── portal-12/Harbour-Dawn.jpg   # WebP failed, JPEG kept

Run 'portal-crop gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print an image's type, size and dimensions
    Identify {
        input: PathBuf,
        /// Also report the canvas size after rotating by this many degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotate: f64,
    },
    /// Crop one image for the featured slot or a portal
    Crop {
        input: PathBuf,
        /// Portal to crop for (omit for the featured image)
        #[arg(long)]
        portal: Option<u64>,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f64,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        /// Rotation in degrees, -180 to 180
        #[arg(long, allow_hyphen_values = true)]
        rotate: Option<f64>,
        /// Zoom factor, 1 to 3
        #[arg(long)]
        zoom: Option<f64>,
        /// Aspect preset: free, 1:1, 4:3, 16:9, 3:4, 9:16
        #[arg(long)]
        aspect: Option<AspectRatio>,
        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Run every crop listed in a JSON job file
    Batch {
        jobs: PathBuf,
        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Identify { input, rotate } => {
            let asset = ImageAsset::from_file(&input)?;
            let dimensions = RustBackend::new().identify(asset.bytes())?;
            let degrees = clamp_rotation(rotate).unwrap_or(0.0);
            let rotated = rotated_canvas_size(dimensions.width, dimensions.height, degrees);
            output::print_identify_output(&asset, dimensions, Some((degrees, rotated)));
        }
        Command::Crop {
            input,
            portal,
            x,
            y,
            width,
            height,
            rotate,
            zoom,
            aspect,
            out,
        } => {
            let job = CropJob {
                input,
                portal: portal.map(PortalId),
                crop: Some(CropBox::new(x, y, width, height)),
                rotation: rotate,
                zoom,
                aspect,
            };
            let config = config::load_config(&cli.config_dir)?;
            run_and_publish(&config, &[job], &out)?;
        }
        Command::Batch { jobs, out } => {
            let config = config::load_config(&cli.config_dir)?;
            let file = jobs::load_job_file(&jobs)?;
            tracing::info!(jobs = file.jobs.len(), "Loaded job file");
            run_and_publish(&config, &file.jobs, &out)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run jobs through one registry, then write whatever is ready.
///
/// Images that did crop are still written when others failed; the command
/// only reports failure afterwards.
fn run_and_publish(
    config: &CropConfig,
    jobs: &[CropJob],
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let mut registry = PortalImageRegistry::new(config.registry_options());

    let results = jobs::run_jobs(&mut registry, &backend, jobs);
    output::print_job_results(&results);

    let (manifest, manifest_path) =
        publish::write_ready_assets(&registry, out, &config.output.manifest)?;
    println!();
    output::print_manifest_output(&manifest, &manifest_path);

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        return Err(format!("{failed} of {} crops failed", results.len()).into());
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("portal_crop={}", level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
