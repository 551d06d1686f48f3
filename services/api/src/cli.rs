use crate::commands;
use crate::infra::{parse_adjustment_kind, parse_mode, parse_penalty_column};
use crate::server;
use clap::{Args, Parser, Subcommand};
use kingdom_dkp::error::AppError;
use kingdom_dkp::workflows::dkp::{AdjustmentKind, GainMode, PenaltyColumn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kingdom-dkp",
    about = "Score kingdom roster snapshots and manage DKP settings",
    version
)]
struct Cli {
    /// Settings file to use instead of DKP_SETTINGS_PATH
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score two roster exports and print the ranked results
    Run(RunArgs),
    /// Export, import, or reset stored settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Show or change the per-unit DKP weights
    Multipliers {
        #[command(subcommand)]
        command: MultipliersCommand,
    },
    /// Manage the power tiers used for minimum DKP
    Ranges {
        #[command(subcommand)]
        command: RangesCommand,
    },
    /// Show or replace the vacation list
    Vacation {
        #[command(subcommand)]
        command: VacationCommand,
    },
    /// Manage per-player penalties
    Penalty {
        #[command(subcommand)]
        command: PenaltyCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

/// Roster exports plus the switches for one engine run.
#[derive(Args, Debug)]
pub(crate) struct ScanArgs {
    /// Roster export taken at the start of the period
    #[arg(long)]
    pub(crate) start: PathBuf,
    /// Roster export taken at the end of the period
    #[arg(long)]
    pub(crate) end: PathBuf,
    /// How to read the end scan: default (difference) or lilithdata (end values)
    #[arg(long, value_parser = parse_mode, default_value = "default")]
    pub(crate) mode: GainMode,
    /// Score players regardless of city hall level
    #[arg(long = "ignore-ch")]
    pub(crate) ignore_city_hall: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub(crate) scans: ScanArgs,
    /// Only print the top N rows
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Print the full run as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SettingsCommand {
    /// Write every settings section as one JSON document
    Export {
        /// Destination file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace the sections present in a settings document
    Import {
        /// Settings document produced by `settings export`
        file: PathBuf,
    },
    /// Forget every stored min DKP baseline
    ClearMinDkp,
}

#[derive(Subcommand, Debug)]
pub(crate) enum MultipliersCommand {
    Show,
    Set {
        #[arg(long)]
        t4: f64,
        #[arg(long)]
        t5: f64,
        #[arg(long)]
        deads: f64,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum RangesCommand {
    List,
    Add {
        /// Inclusive lower bound
        #[arg(long)]
        min: i64,
        /// Exclusive upper bound; omit for an open-ended tier
        #[arg(long)]
        max: Option<i64>,
        /// Fraction of power expected as DKP, e.g. 0.6
        #[arg(long)]
        percentage: f64,
    },
    Remove {
        index: usize,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum VacationCommand {
    Show,
    /// Replace the list with comma-separated player IDs
    Set { ids: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum PenaltyCommand {
    List,
    Add(PenaltyAddArgs),
    Remove {
        #[arg(long)]
        player: String,
        index: usize,
    },
}

#[derive(Args, Debug)]
pub(crate) struct PenaltyAddArgs {
    #[arg(long)]
    pub(crate) player: String,
    /// DKP, T4 gained, T5 gained, Deads gained, or KP gained
    #[arg(long, value_parser = parse_penalty_column)]
    pub(crate) column: PenaltyColumn,
    /// percent or absolute
    #[arg(long = "type", value_parser = parse_adjustment_kind)]
    pub(crate) kind: AdjustmentKind,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) value: f64,
    /// Start export; checkpoint columns need a fresh run to capture against
    #[arg(long, requires = "end")]
    pub(crate) start: Option<PathBuf>,
    #[arg(long, requires = "start")]
    pub(crate) end: Option<PathBuf>,
    #[arg(long, value_parser = parse_mode, default_value = "default")]
    pub(crate) mode: GainMode,
    #[arg(long = "ignore-ch")]
    pub(crate) ignore_city_hall: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = cli.settings;
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args, settings).await,
        Command::Run(args) => commands::run_dkp(args, settings),
        Command::Settings { command } => commands::settings(command, settings),
        Command::Multipliers { command } => commands::multipliers(command, settings),
        Command::Ranges { command } => commands::ranges(command, settings),
        Command::Vacation { command } => commands::vacation(command, settings),
        Command::Penalty { command } => commands::penalty(command, settings),
    }
}
