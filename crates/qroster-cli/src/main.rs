#![forbid(unsafe_code)]

mod commands;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use qroster_core::RosterConfig;
use qroster_error::{Result, RosterError};
use qroster_types::{ChecklistItem, SchoolType};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_FILE: &str = "qroster.toml";

#[derive(Debug, Parser)]
#[command(name = "qroster")]
#[command(about = "Quality roster of vocational schools, synced with the hosted collection")]
struct Cli {
    /// Configuration file; `qroster.toml` in the working directory is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Machine-readable output.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    /// Never contact the remote; everything is served from the local store.
    #[arg(long, global = true, default_value_t = false)]
    offline: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and sync the roster.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the stored session.
    Logout,
    /// Session, connectivity and roster size.
    Status,
    /// Schools visible to the session.
    List {
        #[arg(long)]
        area: Option<String>,
        #[arg(long = "type", value_parser = parse_kind)]
        kind: Option<SchoolType>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// One school's checklist.
    Show { id: String },
    /// Mark checklist items done or not done.
    Edit {
        id: String,
        #[arg(long = "done", value_parser = parse_item)]
        done: Vec<ChecklistItem>,
        #[arg(long = "undo", value_parser = parse_item)]
        undo: Vec<ChecklistItem>,
    },
    /// Probe the remote and refetch the roster.
    Sync,
    /// Completion aggregates over the visible schools.
    Stats,
    /// Printable compliance report for one school.
    Report { id: String },
}

impl Command {
    const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::Status => "status",
            Self::List { .. } => "list",
            Self::Show { .. } => "show",
            Self::Edit { .. } => "edit",
            Self::Sync => "sync",
            Self::Stats => "stats",
            Self::Report { .. } => "report",
        }
    }
}

/// Accepts a wire key (`teamFormed`) or a 1-based position.
fn parse_item(raw: &str) -> std::result::Result<ChecklistItem, String> {
    if let Ok(position) = raw.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|i| ChecklistItem::ALL.get(i).copied())
            .ok_or_else(|| format!("item position must be 1..={}", ChecklistItem::ALL.len()));
    }
    ChecklistItem::from_key(raw).ok_or_else(|| {
        let keys: Vec<&str> = ChecklistItem::ALL.iter().map(|item| item.key()).collect();
        format!("unknown item `{raw}`; expected one of {}", keys.join(", "))
    })
}

fn parse_kind(raw: &str) -> std::result::Result<SchoolType, String> {
    raw.parse()
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("QROSTER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    // A second init (tests) fails harmlessly.
    let _ = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}

fn load_config(path: Option<&PathBuf>) -> Result<RosterConfig> {
    let config = match path {
        Some(path) => RosterConfig::load(path)?,
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                RosterConfig::load(&default)?
            } else {
                RosterConfig::default()
            }
        }
    }
    .with_env();
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let ctx = commands::Context {
        config,
        json: cli.json,
        offline: cli.offline,
    };
    commands::execute(&ctx, &cli.command, out)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = out.flush();
            eprintln!("qroster: {err}");
            match err {
                RosterError::InvalidCredentials | RosterError::NotSignedIn => ExitCode::from(3),
                RosterError::UnknownSchool(_) => ExitCode::from(4),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
