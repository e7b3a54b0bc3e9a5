#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;

use std::{
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::Local;
use eyre::{Context, Result};
use log::LevelFilter;
use regex::{Captures, Regex};

use super::{APP_NAME, Configuration, LogConfig};

/// Environment variables that win over the configuration file.
pub const ENV_GATEWAY_API_KEY: &str = "TASKPILOT_GATEWAY_API_KEY";
pub const ENV_REMOTE_URL: &str = "TASKPILOT_REMOTE_URL";
pub const ENV_REMOTE_API_KEY: &str = "TASKPILOT_REMOTE_API_KEY";

pub fn load_configuration(config_path: &str) -> Result<Configuration> {
    let raw =
        std::fs::read_to_string(config_path).wrap_err(format!("reading {}", config_path))?;
    parse_configuration(&raw)
}

pub fn parse_configuration(raw: &str) -> Result<Configuration> {
    toml::from_str(raw).wrap_err("parsing configuration")
}

/// Applies the `TASKPILOT_*` overrides found by `lookup`. Setting a remote
/// url this way also enables the remote backend. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Configuration, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = lookup(ENV_GATEWAY_API_KEY) {
        config.gateway.api_key = Some(key);
    }

    if let Some(url) = lookup(ENV_REMOTE_URL) {
        config.remote.url = url;
        config.remote.enabled = true;
    }

    if let Some(key) = lookup(ENV_REMOTE_API_KEY) {
        config.remote.api_key = Some(key);
    }
}

pub fn init_logger(config: &LogConfig) -> Result<()> {
    let path = resolve_path(&config.file.path)
        .wrap_err(format!("resolving log file path {}", config.file.path))?;
    ensure_parent_dir(&path)?;

    let mut options = std::fs::OpenOptions::new();
    options.create(true);
    if config.file.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    let log_file = options
        .open(&path)
        .wrap_err(format!("opening log file {}", path))?;

    let raw_level = config.level.as_deref().unwrap_or("info");
    let level = LevelFilter::from_str(raw_level).wrap_err(format!("log level {}", raw_level))?;

    let mut builder = env_logger::Builder::new();
    builder.filter(None, level);
    for filter in config.filters.as_deref().unwrap_or_default() {
        let module_level = filter
            .level
            .as_deref()
            .and_then(|l| LevelFilter::from_str(l).ok())
            .unwrap_or(level);
        builder.filter(filter.module.as_deref(), module_level);
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}:{} - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .try_init()
        .wrap_err("installing logger")
}

/// Expands `$VAR` and `${VAR}` (unset variables become empty) and makes the
/// result absolute.
pub fn resolve_path(path: &str) -> Result<String> {
    let re = Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").wrap_err("compiling regex")?;
    let expanded = re.replace_all(path, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    });

    let absolute = std::path::absolute(expanded.as_ref())
        .wrap_err(format!("resolving path {}", expanded))?;
    Ok(absolute.to_string_lossy().to_string())
}

/// Where a configuration file is looked for, in order.
pub fn config_candidates() -> Vec<PathBuf> {
    let xdg = env_dir("XDG_CONFIG_HOME");
    let home = env_dir("HOME");
    vec![
        xdg.join(APP_NAME).join("config.toml"),
        home.join(".config").join(APP_NAME).join("config.toml"),
        home.join(format!(".{}.toml", APP_NAME)),
    ]
}

pub fn lookup_config_path() -> Option<String> {
    config_candidates()
        .into_iter()
        .find(|path| path.exists())
        .map(|path| path.to_string_lossy().to_string())
}

/// Creates the parent directories of `path` if they are missing.
pub fn ensure_parent_dir(path: &str) -> Result<()> {
    let Some(dir) = Path::new(path).parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(dir).wrap_err(format!("creating directory {}", dir.display()))
}

fn env_dir(key: &str) -> PathBuf {
    std::env::var_os(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
