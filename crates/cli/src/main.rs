mod cmd;
mod logging;
mod session;

use clap::{Args, Parser, Subcommand, ValueEnum};
use inkvar_core::config::loader::ConfigLoader;
use inkvar_core::config::types::ResolvedConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "inkvar",
    version,
    about = "Replay interactive-document variable sessions against the inkvar store"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration and print resolved settings
    Doctor,

    /// Replay a session of store actions and print the resulting variables
    Run(RunArgs),

    /// Format a number the way document widgets display it
    Format(FormatArgs),

    /// Replay a drag gesture over a draggable number and print each value
    Drag(DragArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Session file: a JSON or YAML list of actions
    pub session: PathBuf,

    /// Skip evaluating derived variables after each action
    #[arg(long)]
    pub no_eval: bool,

    /// Continue past rejected actions (exit status is still non-zero)
    #[arg(long)]
    pub keep_going: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Number to format
    #[arg(allow_negative_numbers = true)]
    pub value: f64,

    /// Format specifier, e.g. ".2f", ",d", ".0%" (defaults to display.default_format)
    #[arg(long)]
    pub spec: Option<String>,
}

#[derive(Debug, Args)]
pub struct DragArgs {
    /// Value when the drag starts
    #[arg(allow_negative_numbers = true)]
    pub start: f64,

    /// Horizontal movements in pixels, one per drag event
    #[arg(required = true, allow_negative_numbers = true)]
    pub deltas: Vec<f64>,

    /// Lower bound (defaults to range.min)
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Upper bound (defaults to range.max)
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,

    /// Snapping step (defaults to range.step)
    #[arg(long)]
    pub step: Option<f64>,

    /// Pixels per unit of value (defaults to range.sensitivity)
    #[arg(long)]
    pub sensitivity: Option<f64>,

    /// Format specifier for printed values (defaults to display.default_format)
    #[arg(long)]
    pub spec: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let loaded = ConfigLoader::load(cli.config.as_deref());
    if let Ok(ref rc) = loaded {
        logging::init(rc);
    }

    match cli.command {
        Commands::Doctor => cmd::doctor::run(cli.config.as_deref(), loaded),
        Commands::Run(args) => cmd::run::run(&require_config(loaded), &args),
        Commands::Format(args) => cmd::format::run(&require_config(loaded), &args),
        Commands::Drag(args) => cmd::drag::run(&require_config(loaded), &args),
    }
}

fn require_config(
    loaded: Result<ResolvedConfig, inkvar_core::config::loader::ConfigError>,
) -> ResolvedConfig {
    match loaded {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}
