use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod interaction;

pub use app::{
    normalize_non_zero_duration, plan_tick_steps, MetricsAccumulator, TickClock,
    TickMetricsSnapshot, TickPlan, DEFAULT_MAX_CATCH_UP_TICKS, DEFAULT_TICK_INTERVAL,
};
pub use content::{
    compile_scenario, parse_scenario_str, ContentCompileError, ContentErrorCode,
    ContentPlanError, ContentPlanRequest, InventoryRemark, Scenario, SourceLocation,
};
pub use interaction::{
    compose_info_line, Entity, EntityKind, EntityRegistry, HostNotification, InputEvents,
    InteractionRule, Outcome, RecordingHost, RemarkTable, Resolution, ResolveMiss, RuleTable,
    Session, SessionSnapshot, SessionState, StateEffect, UiHost, Verb, DEFAULT_FALLBACK_LINE,
    VERB_GRID_COLUMNS,
};

pub const ROOT_ENV_VAR: &str = "ADVENTURE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub base_content_dir: PathBuf,
    pub mods_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        Self {
            base_content_dir: root.join("assets").join("base"),
            mods_dir: root.join("mods"),
            root,
        }
    }
}

/// Failure to locate the directory that holds `assets/base`.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{var} is not valid unicode: {0:?}", var = ROOT_ENV_VAR)]
    NonUnicodeEnvRoot(std::ffi::OsString),
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error(
        "{var}={} has no assets/base directory",
        .path.display(),
        var = ROOT_ENV_VAR
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "no assets/base directory found above {}; set {var} to the game root",
        .start_dir.display(),
        var = ROOT_ENV_VAR
    )]
    RootNotFound { start_dir: PathBuf },
}

/// Uses `ADVENTURE_ROOT` when set, otherwise the nearest ancestor of the
/// executable that ships base content.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => root_from_env(Path::new(&value))?,
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let start_dir = exe.parent().unwrap_or(exe.as_path());
            find_root_above(start_dir)?
        }
        Err(env::VarError::NotUnicode(raw)) => return Err(StartupError::NonUnicodeEnvRoot(raw)),
    };
    Ok(AppPaths::from_root(root))
}

fn root_from_env(value: &Path) -> Result<PathBuf, StartupError> {
    let root = canonical_or_raw(value);
    if has_base_content(&root) {
        Ok(root)
    } else {
        Err(StartupError::InvalidEnvRoot { path: root })
    }
}

fn find_root_above(start_dir: &Path) -> Result<PathBuf, StartupError> {
    start_dir
        .ancestors()
        .find(|dir| has_base_content(dir))
        .map(canonical_or_raw)
        .ok_or_else(|| StartupError::RootNotFound {
            start_dir: canonical_or_raw(start_dir),
        })
}

fn has_base_content(dir: &Path) -> bool {
    AppPaths::from_root(dir.to_path_buf()).base_content_dir.is_dir()
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn game_root_with_base() -> TempDir {
        let temp = TempDir::new().expect("temp");
        fs::create_dir_all(temp.path().join("assets").join("base")).expect("base dir");
        temp
    }

    #[test]
    fn assets_dir_alone_is_not_a_root() {
        let temp = TempDir::new().expect("temp");
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        assert!(!has_base_content(temp.path()));
    }

    #[test]
    fn walk_up_finds_nearest_base_content() {
        let root = game_root_with_base();
        let exe_dir = root.path().join("target").join("debug");
        fs::create_dir_all(&exe_dir).expect("exe dir");

        let found = find_root_above(&exe_dir).expect("root");
        assert_eq!(found, canonical_or_raw(root.path()));
    }

    #[test]
    fn walk_up_without_base_content_reports_start_dir() {
        let temp = TempDir::new().expect("temp");
        let err = find_root_above(temp.path()).expect_err("no base content");
        match err {
            StartupError::RootNotFound { start_dir } => {
                assert_eq!(start_dir, canonical_or_raw(temp.path()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn env_root_must_ship_base_content() {
        let root = game_root_with_base();
        assert_eq!(
            root_from_env(root.path()).expect("valid root"),
            canonical_or_raw(root.path())
        );

        let bare = TempDir::new().expect("temp");
        let err = root_from_env(bare.path()).expect_err("bare dir");
        assert!(err.to_string().contains("has no assets/base directory"), "{err}");
    }

    #[test]
    fn app_paths_follow_root_layout() {
        let paths = AppPaths::from_root(PathBuf::from("/game"));
        assert_eq!(paths.base_content_dir, Path::new("/game/assets/base"));
        assert_eq!(paths.mods_dir, Path::new("/game/mods"));
    }
}
