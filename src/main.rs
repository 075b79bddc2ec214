use clap::{CommandFactory, Parser, error::ErrorKind};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use xtag::config::{self, ToolConfig};
use xtag::events::TracingObserver;
use xtag::exiftool::ExifTool;
use xtag::rename::{self, RenameOptions};
use xtag::{output, recipe};

#[derive(Parser)]
#[command(name = "xtag")]
#[command(version, about = "Tag photo filenames with film simulation and drive mode")]
#[command(long_about = "\
Tag photo filenames with film simulation and drive mode

Reads each image's metadata with exiftool and prints a new name with
bracketed tags appended to the base name:

  DSCF0042.JPG  ->  DSCF0042_[HDR][CH04][Velvia][ToyCamera].JPG

Tags, in order:
  HDR            PictureMode contains HDR
  CL/CH/EB + NN  burst or bracketing sequence number (bare NN otherwise)
  recipe name    first recipe whose settings all match, else FilmMode
  filter         AdvancedFilter
  saturation     Saturation, only when no recipe/film tag and not normal

Recipes come from the recipes file (see --gen-config) with --recipes-json
entries tried first. Without image arguments, paths are read from stdin,
one per line. Nothing is renamed unless --rename is given.")]
struct Cli {
    /// Image files to process (read from stdin when omitted)
    images: Vec<PathBuf>,

    /// Write detailed logs to the configured log file
    #[arg(short, long)]
    verbose: bool,

    /// Actually rename files
    #[arg(long)]
    rename: bool,

    /// JSON array of extra recipes, tried before the defaults
    #[arg(long, env = "user_custom_recipes")]
    recipes_json: Option<String>,

    /// Config file (defaults to ./xtag.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a stock xtag.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let tool_config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(&std::env::current_dir()?)?,
    };

    let images = resolve_images(cli.images)?;
    if images.is_empty() {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, "No input files provided")
            .exit();
    }

    init_logging(cli.verbose, &tool_config)?;
    if cli.verbose {
        eprintln!(
            "Logging enabled: details written to {}",
            tool_config.log_file
        );
    }

    let recipes = recipe::load_recipes(
        Path::new(&tool_config.recipes_file),
        cli.recipes_json.as_deref(),
    );
    init_thread_pool(&tool_config.processing);

    let outcomes = rename::run(
        &images,
        &ExifTool::with_program(&tool_config.exiftool),
        &recipes,
        RenameOptions { apply: cli.rename },
        &TracingObserver,
    )?;
    output::print_outcomes(&outcomes);

    Ok(())
}

/// Image paths from the command line, or from stdin when none were given.
fn resolve_images(args: Vec<PathBuf>) -> std::io::Result<Vec<PathBuf>> {
    if !args.is_empty() {
        return Ok(args);
    }
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(rename::parse_image_list(&input))
}

/// Route `tracing` output to the log file when verbose; stay silent otherwise.
///
/// `RUST_LOG` overrides the default `debug` filter.
fn init_logging(verbose: bool, config: &ToolConfig) -> std::io::Result<()> {
    if !verbose {
        return Ok(());
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
