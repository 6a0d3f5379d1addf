use clap::{Parser, Subcommand};
use squish::config::{self, Settings};
use squish::imaging::{ImageAsset, OutputFormat, RustBackend, UnsupportedFormat};
use squish::naming::{self, OutputKind};
use squish::output::{self, AssetReport, Report};
use squish::request::{CompressionRequest, SizeUnit, TargetSize};
use squish::session::CompressionSession;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Flags shared by every command that writes an output file.
#[derive(clap::Args, Clone)]
struct OutputArgs {
    /// Source image
    input: PathBuf,

    /// Directory for the output file (defaults to the input's directory)
    #[arg(long, short)]
    out_dir: Option<PathBuf>,

    /// Compute and report the result without writing a file
    #[arg(long)]
    dry_run: bool,
}

/// Output format, defaulting to the source's own format.
#[derive(clap::Args, Clone)]
struct FormatArg {
    /// jpeg, png, webp, gif or bmp
    #[arg(long, short)]
    format: Option<OutputFormat>,
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
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "squish")]
#[command(about = "Compress and convert images")]
#[command(long_about = "\
Compress and convert images

Four ways to shrink an image:

  squish quality photo.jpg --quality 70          # re-encode at a fixed quality
  squish resize photo.jpg -W 1200 -H 1200        # fit within bounds
  squish target photo.jpg --size 200 --unit kb   # search quality for a size
  squish convert photo.png --to webp             # change format

Compressed files are written as compressed_<name>.<ext>, converted files as
<name>.<ext>, next to the input unless --out-dir is given.

Run 'squish gen-config' to generate a documented squish.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing squish.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log search steps and state changes
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-encode at a fixed quality, keeping dimensions
    Quality {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        format: FormatArg,
        /// Quality 1-100 (defaults to [defaults] quality)
        #[arg(long, short)]
        quality: Option<u32>,
    },
    /// Shrink to fit within a bounding box
    Resize {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        format: FormatArg,
        /// Maximum width in pixels
        #[arg(long, short = 'W')]
        max_width: u32,
        /// Maximum height in pixels
        #[arg(long, short = 'H')]
        max_height: u32,
        /// Use the bounds exactly instead of preserving aspect ratio
        #[arg(long)]
        stretch: bool,
    },
    /// Search for the quality that lands near a target file size
    Target {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        format: FormatArg,
        /// Target size in --unit
        #[arg(long, short)]
        size: f64,
        /// KB or MB
        #[arg(long, short, default_value = "KB")]
        unit: SizeUnit,
    },
    /// Convert to another format at the original size
    Convert {
        #[command(flatten)]
        output: OutputArgs,
        /// Output format
        #[arg(long)]
        to: OutputFormat,
        /// Quality 1-100 for lossy formats (defaults to [defaults] conversion_quality)
        #[arg(long, short)]
        quality: Option<u32>,
    },
    /// Print format, dimensions and size of an image
    Inspect {
        /// Source image
        input: PathBuf,
    },
    /// Print a stock squish.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Inspect { input } => {
            let mut session = open_session(&cli.config_dir)?;
            let asset = load(&mut session, input)?;
            if cli.json {
                output::print_json(&AssetReport::new(input, asset))?;
            } else {
                output::print_asset(input, asset);
            }
        }
        Command::Quality {
            output,
            format,
            quality,
        } => {
            compress(&cli, output, |asset, settings| {
                let quality = quality.unwrap_or(settings.defaults.quality);
                Ok(CompressionRequest::quality(format.resolve(asset)?, quality))
            })?;
        }
        Command::Resize {
            output,
            format,
            max_width,
            max_height,
            stretch,
        } => {
            compress(&cli, output, |asset, _| {
                Ok(CompressionRequest::dimensions(
                    format.resolve(asset)?,
                    *max_width,
                    *max_height,
                    !*stretch,
                ))
            })?;
        }
        Command::Target {
            output,
            format,
            size,
            unit,
        } => {
            let target_bytes = TargetSize::new(*size, *unit).to_bytes()?;
            compress(&cli, output, |asset, _| {
                let format = format.resolve(asset)?;
                Ok(CompressionRequest::target_size(format, target_bytes))
            })?;
        }
        Command::Convert {
            output,
            to,
            quality,
        } => {
            let request = CompressionRequest::convert(*to, *quality);
            compress(&cli, output, |_, _| Ok(request))?;
        }
    }

    Ok(())
}

impl FormatArg {
    /// The requested format, else the source's own. Sources outside the
    /// output set need an explicit `--format`.
    fn resolve(&self, asset: &ImageAsset) -> Result<OutputFormat, UnsupportedFormat> {
        self.format
            .or_else(|| asset.output_format())
            .ok_or_else(|| {
                UnsupportedFormat(format!(
                    "{:?} (pass --format to pick an output format)",
                    asset.source_format()
                ))
            })
    }
}

fn open_session(config_dir: &Path) -> CliResult<CompressionSession<RustBackend>> {
    let settings = config::load_config(config_dir)?;
    let backend = RustBackend::with_max_pixels(settings.limits.max_pixels);
    Ok(CompressionSession::new(backend, settings))
}

fn load<'a>(
    session: &'a mut CompressionSession<RustBackend>,
    input: &Path,
) -> CliResult<&'a ImageAsset> {
    let bytes = std::fs::read(input)?;
    let mime_hint = input
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse::<OutputFormat>().ok())
        .map(OutputFormat::mime_type);
    Ok(session.load(&bytes, mime_hint)?)
}

/// Load `args.input`, build a request from it, compress, then write and report.
fn compress(
    cli: &Cli,
    args: &OutputArgs,
    build: impl FnOnce(&ImageAsset, &Settings) -> CliResult<CompressionRequest>,
) -> CliResult<()> {
    let mut session = open_session(&cli.config_dir)?;
    load(&mut session, &args.input)?;
    let request = match session.asset() {
        Some(asset) => build(asset, session.settings())?,
        None => return Err("no image loaded".into()),
    };

    let result = session.compress(&request)?.clone();
    let Some(asset) = session.asset() else {
        return Err("no image loaded".into());
    };

    let written = if args.dry_run {
        None
    } else {
        let path = naming::output_path(
            &args.input,
            args.out_dir.as_deref(),
            result.format(),
            OutputKind::from(&request.mode),
        );
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, result.encoded_bytes())?;
        Some(path)
    };

    if cli.json {
        output::print_json(&Report::new(&args.input, asset, &result, written.as_deref()))?;
    } else {
        output::print_result(&args.input, asset, &result, written.as_deref());
    }
    Ok(())
}
