mod config;
mod config_cmd;
mod logging;
mod render;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError, ConfigPaths};
use log::{debug, info};
use render::OutputFormat;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tally_core::entities::{EntitySource, RosterEntities, StaticEntities};
use tally_core::{EntityError, EntitySpan, ExtractError, ExtractOptions, extract_with_source};
use thiserror::Error;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "action item extraction for meeting notes",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Command {
    Config(config_cmd::ConfigArgs),
}

#[derive(Parser, Debug, Clone, Default)]
struct RunArgs {
    /// Meeting text file; `-` or nothing reads stdin
    input: Option<PathBuf>,

    /// JSON array of pre-resolved entity spans ({text, kind, start, end})
    #[arg(long, value_name = "file")]
    entities: Option<PathBuf>,

    /// Known participant names (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "name,...")]
    participants: Option<Vec<String>>,

    /// Keep at most this many items; 0 keeps all
    #[arg(long, value_name = "n")]
    max_items: Option<usize>,

    /// Drop tasks shorter than this many characters
    #[arg(long, value_name = "n")]
    min_task_chars: Option<usize>,

    /// Output format: text or json
    #[arg(long)]
    format: Option<String>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, value_name = "level")]
    log_level: Option<String>,
}

#[derive(Debug, Clone)]
struct ResolvedRunArgs {
    input: Option<PathBuf>,
    entities_file: Option<PathBuf>,
    participants: Vec<String>,
    detect_dates: bool,
    options: ExtractOptions,
    format: OutputFormat,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Entities(#[from] EntityError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RunArgs {
    fn resolve(self, config: &Config) -> Result<ResolvedRunArgs, String> {
        self.resolve_with(config, &env_override)
    }

    fn resolve_with(
        self,
        config: &Config,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<ResolvedRunArgs, String> {
        let mut min_task_chars = config.extract.min_task_chars;
        let mut max_items = config.extract.max_items;
        let mut participants = config.entities.participants.clone();

        if let Some(value) = env("TALLY_MIN_TASK_CHARS") {
            min_task_chars = parse_count("TALLY_MIN_TASK_CHARS", &value)?;
        }
        if let Some(value) = env("TALLY_MAX_ITEMS") {
            max_items = parse_count("TALLY_MAX_ITEMS", &value)?;
        }
        if let Some(value) = env("TALLY_PARTICIPANTS") {
            participants = config_cmd::parse_participants(&value);
        }

        if let Some(value) = self.min_task_chars {
            min_task_chars = value;
        }
        if let Some(value) = self.max_items {
            max_items = value;
        }
        if let Some(values) = self.participants {
            participants = values;
        }
        if min_task_chars == 0 {
            return Err("min_task_chars must be greater than 0".to_string());
        }

        let format = OutputFormat::parse(self.format.as_deref().unwrap_or(&config.output.format))?;
        let participants = participants
            .into_iter()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();
        let input = self.input.filter(|path| path.as_os_str() != "-");

        Ok(ResolvedRunArgs {
            input,
            entities_file: self.entities,
            participants,
            detect_dates: config.entities.detect_dates,
            options: ExtractOptions {
                min_task_chars,
                max_items: (max_items > 0).then_some(max_items),
            },
            format,
        })
    }
}

/// `--log-level`, then `TALLY_LOG`, then the config file.
fn select_log_level(flag: Option<&str>, config: &Config) -> String {
    flag.map(str::to_string)
        .or_else(|| env_override("TALLY_LOG"))
        .unwrap_or_else(|| config.log.level.clone())
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_count(label: &str, value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{label} expects an unsigned integer (got {value})"))
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let paths = match ConfigPaths::from_home() {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("config paths error: {err}");
            std::process::exit(1);
        }
    };

    let config = match Config::load_or_create(&paths) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config load failed: {err}");
            std::process::exit(1);
        }
    };

    let level = select_log_level(cli.run.log_level.as_deref(), &config);
    let _logger = match logging::init_logging(&level) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("logging init failed: {err}");
            std::process::exit(1);
        }
    };

    if let Some(command) = cli.command {
        match command {
            Command::Config(args) => {
                if let Err(e) = config_cmd::run(&args, &paths) {
                    eprintln!("config failed: {e}");
                    std::process::exit(1);
                }
                return;
            }
        }
    }

    if let Err(err) = config.validate() {
        eprintln!("config invalid: {err}");
        std::process::exit(1);
    }

    let run = match cli.run.resolve(&config) {
        Ok(run) => run,
        Err(err) => {
            eprintln!("run args error: {err}");
            std::process::exit(1);
        }
    };

    match execute(&run) {
        Ok(output) => println!("{output}"),
        Err(CliError::Extract(err)) if err.is_invariant_fault() => {
            eprintln!("extraction fault (not retryable): {err}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("extract failed: {err}");
            std::process::exit(1);
        }
    }
}

fn execute(run: &ResolvedRunArgs) -> Result<String, CliError> {
    let text = read_input(run.input.as_deref())?;
    let mut source = entity_source(run)?;
    let items = extract_with_source(&text, source.as_mut(), &run.options)?;
    info!(
        "event=run module=cli status=ok source={} bytes={} items={}",
        source.name(),
        text.len(),
        items.len()
    );
    Ok(render::render(&items, run.format)?)
}

fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => {
            debug!("event=read_input module=cli path={}", path.display());
            Ok(std::fs::read_to_string(path)?)
        }
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Spans from `--entities` win; otherwise the configured roster.
fn entity_source(run: &ResolvedRunArgs) -> Result<Box<dyn EntitySource>, CliError> {
    if let Some(path) = &run.entities_file {
        let content = std::fs::read_to_string(path)?;
        let spans: Vec<EntitySpan> = serde_json::from_str(&content)?;
        return Ok(Box::new(StaticEntities::new(spans)));
    }
    let roster = RosterEntities::new(&run.participants, run.detect_dates)?;
    Ok(Box::new(roster))
}
