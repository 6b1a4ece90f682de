use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tiff2png::batch::{self, BatchConfig, CancelToken};
use tiff2png::config::{self, ConverterConfig};
use tiff2png::imaging::{
    self, ConversionSettings, ConvertError, CropBox, DitherMethod, FilterMethod, OutputColorMode,
    RustCodec, StandardResolution,
};
use tiff2png::output::EstimateSummary;
use tiff2png::{naming, output, scan};
use tracing_subscriber::EnvFilter;

/// Conversion flags shared by every command that transforms an image.
///
/// Anything left unset falls back to `tiff2png.toml`, then to the defaults.
#[derive(clap::Args, Clone)]
struct SettingsArgs {
    /// Uniform scale factor in (0, 1]
    #[arg(long)]
    scale: Option<f64>,

    /// Target width in pixels (requires --height)
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Target height in pixels (requires --width)
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Standard resolution preset; implies --fill
    #[arg(long, value_enum)]
    resolution: Option<StandardResolution>,

    /// Crop to the exact target instead of scaling to fit
    #[arg(long)]
    fill: bool,

    /// Fill-mode crop in original pixels, as LEFT,TOP,RIGHT,BOTTOM
    #[arg(long, value_parser = parse_crop)]
    crop: Option<CropBox>,

    /// Output colour mode
    #[arg(long, value_enum)]
    color_mode: Option<OutputColorMode>,

    /// Dithering for palette output
    #[arg(long, value_enum)]
    dither: Option<DitherMethod>,

    /// PNG row filter
    #[arg(long, value_enum)]
    filter: Option<FilterMethod>,

    /// Skip the PNG optimisation pass
    #[arg(long)]
    no_optimize: bool,

    /// Write Adam7 interlaced output
    #[arg(long)]
    interlace: bool,
}

fn parse_crop(value: &str) -> Result<CropBox, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid crop coordinate: {e}"))?;
    match parts.as_slice() {
        &[left, top, right, bottom] => {
            CropBox::new(left, top, right, bottom).map_err(|e| e.to_string())
        }
        _ => Err("expected LEFT,TOP,RIGHT,BOTTOM".to_string()),
    }
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "tiff2png")]
#[command(about = "Convert TIFF images to optimised PNG")]
#[command(long_about = "\
Convert TIFF images to optimised PNG

Each image goes through the same pipeline:

  decode TIFF → scale → fill-mode crop → colour conversion → PNG encode → optimise

Geometry:
  --scale 0.5                 Uniform downscale, applied first
  --width 1920 --height 1080  Target resolution (fit unless --fill)
  --resolution full-hd        Preset (4k, 2k, full-hd, hd, svga, vga); implies --fill
  --crop 100,50,2020,1130     Hand-placed fill window in original pixels

Batch output is named <root>_01.png, <root>_02.png, ... in input order.
Single files land in a PNG_Output folder beside the input unless --beside.

Settings are read from ./tiff2png.toml when present (or --config).
Run 'tiff2png gen-config' to generate a documented tiff2png.toml.

Set TIFF2PNG_LOG=debug to trace every pipeline stage on stderr.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./tiff2png.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single TIFF to PNG
    Convert {
        /// Source TIFF
        input: PathBuf,
        /// Output PNG path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write next to the input instead of into PNG_Output/
        #[arg(long)]
        beside: bool,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Convert every TIFF in a folder
    Batch {
        /// Folder containing the TIFFs
        input_dir: PathBuf,
        /// Output folder (default: <input_dir>/PNG_Output)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Root name for numbered outputs
        #[arg(long)]
        root_name: Option<String>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Report output geometry and estimated PNG size without writing
    Estimate {
        input: PathBuf,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Render the source preview with its crop overlay
    Preview {
        input: PathBuf,
        /// Preview PNG path (default: <stem>_preview.png beside the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// List the TIFFs a batch over this folder would convert
    Scan { input_dir: PathBuf },
    /// Print a stock tiff2png.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            input,
            output,
            beside,
            settings,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let conversion = resolve_settings(&config, &settings)?;
            let dest = output.unwrap_or_else(|| {
                naming::single_output_path(&input, config.batch.output_subfolder && !beside)
            });
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let dims = imaging::convert_file(&RustCodec::new(), &input, &dest, &conversion)?;
            output::print_convert_output(&input, &dest, dims);
        }
        Command::Batch {
            input_dir,
            output,
            root_name,
            settings,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(root) = root_name {
                config.batch.root_name = root;
                config.validate()?;
            }
            let conversion = resolve_settings(&config, &settings)?;
            let items = scan::scan(&input_dir)?;

            let mut batch_config = BatchConfig::new(
                output.unwrap_or_else(|| naming::default_batch_output_dir(&input_dir)),
            );
            batch_config.root_name = config.batch.root_name.trim().to_string();
            batch_config.settings = conversion;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let report = batch::run_batch(&items, &batch_config, Some(tx), &CancelToken::new())?;
            printer
                .join()
                .map_err(|_| "output printer thread panicked")?;
            if !report.summary.is_success() {
                return Err(format!(
                    "{} of {} files failed",
                    report.summary.failed,
                    report.summary.total()
                )
                .into());
            }
        }
        Command::Estimate { input, settings } => {
            let config = load_config(cli.config.as_deref())?;
            let conversion = resolve_settings(&config, &settings)?;
            let image = imaging::open(&RustCodec::new(), &input)?;
            let original = image.dimensions();
            let dims = imaging::output_dimensions(original, &conversion)?;
            let mode = conversion
                .color_mode
                .target()
                .unwrap_or_else(|| image.color_mode());
            let summary = EstimateSummary {
                source: input.clone(),
                input_bytes: std::fs::metadata(&input)?.len(),
                original,
                source_mode: image.color_mode(),
                output: dims,
                output_mode: mode,
                estimated_bytes: imaging::estimate(
                    dims.width,
                    dims.height,
                    mode,
                    conversion.optimize,
                ),
            };
            output::print_estimate(&summary, &conversion);
        }
        Command::Preview {
            input,
            output,
            settings,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let conversion = resolve_settings(&config, &settings)?;
            let codec = RustCodec::new();
            let image = imaging::open(&codec, &input)?;
            let bounds = (config.preview.max_width, config.preview.max_height);
            let derived = imaging::derive(&codec, &image, &conversion, bounds)?;

            let dest = output.unwrap_or_else(|| naming::preview_output_path(&input));
            derived.input_preview.image.save(&dest)?;
            println!("Preview \u{2192} {}", dest.display());

            let summary = EstimateSummary {
                source: input.clone(),
                input_bytes: std::fs::metadata(&input)?.len(),
                original: image.dimensions(),
                source_mode: image.color_mode(),
                output: derived.output_dimensions,
                output_mode: derived.output_mode,
                estimated_bytes: derived.estimated_bytes,
            };
            output::print_estimate(&summary, &conversion);
        }
        Command::Scan { input_dir } => {
            let items = scan::scan(&input_dir)?;
            output::print_scan_output(&items, &input_dir);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `TIFF2PNG_LOG` (default: warnings only).
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("TIFF2PNG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit `--config` must exist; otherwise `./tiff2png.toml` is optional.
fn load_config(path: Option<&Path>) -> Result<ConverterConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Layer command-line flags over the loaded config and build the settings.
fn resolve_settings(
    config: &ConverterConfig,
    args: &SettingsArgs,
) -> Result<ConversionSettings, Box<dyn std::error::Error>> {
    let mut conv = config.conversion.clone();
    if let Some(scale) = args.scale {
        conv.scale = scale;
    }
    if args.width.is_some() {
        conv.width = args.width;
        conv.height = args.height;
    } else if args.resolution.is_some() {
        conv.width = None;
        conv.height = None;
    }
    if args.resolution.is_some() {
        conv.resolution = args.resolution;
    }
    // A hand-placed crop implies fill on its own, without a target.
    if args.fill && args.crop.is_none() {
        conv.fill = true;
    }
    if let Some(mode) = args.color_mode {
        conv.color_mode = mode;
    }
    if let Some(dither) = args.dither {
        conv.dither = dither;
    }
    if let Some(filter) = args.filter {
        conv.filter = filter;
    }
    if args.no_optimize {
        conv.optimize = false;
    }
    if args.interlace {
        conv.interlace = true;
    }
    conv.validate()?;

    let mut settings = conv.to_settings();
    if let Some(crop) = args.crop {
        settings.fill_mode = true;
        settings.crop_box = Some(crop);
    }
    settings.validate().map_err(ConvertError::from)?;
    Ok(settings)
}
