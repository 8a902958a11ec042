use std::path::PathBuf;
use std::time::Duration;

use adventure_engine::{
    compile_scenario, resolve_app_paths, ContentCompileError, ContentPlanRequest, Scenario,
    StartupError, DEFAULT_TICK_INTERVAL,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ENABLED_MODS_ENV_VAR: &str = "ADVENTURE_ENABLED_MODS";
const TICK_MS_ENV_VAR: &str = "ADVENTURE_TICK_MS";
const DEFAULT_METRICS_LOG_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) const USAGE: &str = "usage: adventure_game [--echo-ticks] [SCRIPT]\n\
\n\
Reads console commands from SCRIPT, or from stdin when no script is given.\n\
Type `help` at the prompt for the command list.";

#[derive(Debug, Error)]
pub(crate) enum HostError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentCompileError),
    #[error("{0}\n{usage}", usage = USAGE)]
    Usage(String),
    #[error("failed to open script {path}: {source}")]
    OpenScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn input reader thread: {0}")]
    SpawnReader(#[source] std::io::Error),
    #[error("failed to read input: {0}")]
    Input(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HostConfig {
    pub(crate) tick_interval: Duration,
    pub(crate) metrics_log_interval: Duration,
    pub(crate) script_path: Option<PathBuf>,
    pub(crate) echo_ticks: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            metrics_log_interval: DEFAULT_METRICS_LOG_INTERVAL,
            script_path: None,
            echo_ticks: false,
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) config: HostConfig,
    pub(crate) scenario: Scenario,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliRequest {
    Run(HostConfig),
    Help,
}

/// `Ok(None)` means the invocation only asked for help.
pub(crate) fn build_app(args: Vec<String>) -> Result<Option<AppWiring>, HostError> {
    info!("=== Adventure Startup ===");

    let base = HostConfig {
        tick_interval: resolve_tick_interval(std::env::var(TICK_MS_ENV_VAR).ok().as_deref()),
        ..HostConfig::default()
    };
    let config = match parse_cli_args(args, base)? {
        CliRequest::Run(config) => config,
        CliRequest::Help => return Ok(None),
    };

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "project_root_resolved");

    let request = ContentPlanRequest {
        enabled_mods: parse_enabled_mods(std::env::var(ENABLED_MODS_ENV_VAR).ok().as_deref()),
    };
    let scenario = compile_scenario(&paths, &request)?;

    info!(
        tick_ms = config.tick_interval.as_millis() as u64,
        script = ?config.script_path,
        echo_ticks = config.echo_ticks,
        "host_configured"
    );
    Ok(Some(AppWiring { config, scenario }))
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Host output owns stdout; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_cli_args(args: Vec<String>, mut config: HostConfig) -> Result<CliRequest, HostError> {
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliRequest::Help),
            "--echo-ticks" => config.echo_ticks = true,
            flag if flag.starts_with('-') => {
                return Err(HostError::Usage(format!("unknown option '{flag}'")));
            }
            path => {
                if config.script_path.is_some() {
                    return Err(HostError::Usage(format!("unexpected argument '{path}'")));
                }
                config.script_path = Some(PathBuf::from(path));
            }
        }
    }
    Ok(CliRequest::Run(config))
}

fn parse_enabled_mods(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}

fn resolve_tick_interval(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return DEFAULT_TICK_INTERVAL;
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => {
            warn!(
                var = TICK_MS_ENV_VAR,
                value = raw,
                fallback_ms = DEFAULT_TICK_INTERVAL.as_millis() as u64,
                "invalid_tick_interval"
            );
            DEFAULT_TICK_INTERVAL
        }
    }
}
