use clap::{Parser, Subcommand};
use photo_segment::service::{GalleryService, SegmentInput};
use photo_segment::{config, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "photo-segment")]
#[command(about = "Browse photo folders and segment images into color regions")]
#[command(long_about = "\
Browse photo folders and segment images into color regions

Galleries are discovered breadth-first below the root (your home directory
by default). System and cache folders are skipped; Pictures, Photos and
similar folders are searched first. Any folder holding at least one
jpg, jpeg, png, gif or webp file is a gallery.

Segmentation reduces an image to k colors with K-means and writes a PNG.

Run 'photo-segment gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Scan root, overrides [scan] root
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List galleries below the root
    Scan {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show one gallery and its images
    Browse {
        /// Gallery path relative to the root (defaults to the first gallery)
        #[arg(long)]
        folder: Option<String>,
    },
    /// Resolve a relative path against the root, refusing escapes
    Resolve { relative: String },
    /// Segment an image into k colors and write the PNG result
    Segment {
        /// Image path relative to the root
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        relative: Option<String>,
        /// Segment an arbitrary file instead of a gallery image
        #[arg(long)]
        file: Option<PathBuf>,
        /// Number of colors (clamped into [segment] k_min..=k_max)
        #[arg(short)]
        k: Option<u32>,
        /// Longer-edge cap before clustering, 0 for none
        #[arg(long)]
        max_dimension: Option<u32>,
        /// Where to write the PNG
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan { json } => {
            let service = load_service(&cli.config, cli.root.as_deref())?;
            let snapshot = service.list_galleries(false);
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot.folders)?);
            } else {
                output::print_scan_output(&snapshot.folders, service.root());
            }
        }
        Command::Browse { folder } => {
            let service = load_service(&cli.config, cli.root.as_deref())?;
            let view = service.browse(folder.as_deref(), false);
            output::print_browse_output(&view);
        }
        Command::Resolve { relative } => {
            let service = load_service(&cli.config, cli.root.as_deref())?;
            let path = service.resolve_and_guard(&relative)?;
            println!("{}", path.display());
        }
        Command::Segment {
            relative,
            file,
            k,
            max_dimension,
            out,
        } => {
            let service = load_service(&cli.config, cli.root.as_deref())?;
            let k = k.unwrap_or(service.default_k());
            let max_dimension = max_dimension.unwrap_or(service.default_max_dimension());
            let (id, source) = match (&relative, &file) {
                (_, Some(path)) => {
                    let bytes = std::fs::read(path)?;
                    let id = service.segment_image(SegmentInput::Upload(&bytes), k, max_dimension)?;
                    (id, path.display().to_string())
                }
                (Some(relative), None) => {
                    let id = service.segment_image(
                        SegmentInput::Gallery(relative),
                        k,
                        max_dimension,
                    )?;
                    (id, relative.clone())
                }
                (None, None) => return Err("either a relative path or --file is required".into()),
            };
            let png = service.fetch_segment(id.as_str())?;
            std::fs::write(&out, &png[..])?;
            output::print_segment_output(&id, &source, &out, png.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config, apply `--root`, set up logging and the thread pool.
fn load_service(
    config_path: &Path,
    root: Option<&Path>,
) -> Result<GalleryService, config::ConfigError> {
    let mut service_config = config::load_config(Some(config_path))?;
    if let Some(root) = root {
        service_config.scan.root = Some(root.to_string_lossy().into_owned());
    }
    init_logging(&service_config.logging);
    init_thread_pool();
    Ok(GalleryService::new(&service_config))
}

/// Install the stderr fmt subscriber with the configured filter.
fn init_logging(logging: &config::LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(logging.env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

/// Initialize the rayon thread pool used for K-means restarts.
///
/// Uses every available core; a pool that is already built is left alone.
fn init_thread_pool() {
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
