use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const APP_DIR: &str = "streamshower";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot file the dashboard reads streams from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    /// Shell command run by `:update`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_command: Option<String>,
    pub refresh_interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    pub winopen: bool,
    pub strims: bool,
    /// Extra key mappings, applied over the built-in ones.
    pub mappings: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot: None,
            update_command: None,
            refresh_interval_secs: 300,
            browser: None,
            winopen: false,
            strims: true,
            mappings: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The snapshot to read: `cli` first, then the config file, then the cache dir.
    pub fn snapshot_path(&self, cli: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = cli.or_else(|| self.snapshot.clone()) {
            return Ok(path);
        }
        let base = dirs::cache_dir().context("Could not determine cache directory")?;
        Ok(base.join(APP_DIR).join("streams.toml"))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PartialConfig {
    snapshot: Option<PathBuf>,
    update_command: Option<String>,
    refresh_interval_secs: Option<u64>,
    browser: Option<String>,
    winopen: Option<bool>,
    strims: Option<bool>,
    mappings: Option<BTreeMap<String, String>>,
}

fn or_default<T>(value: Option<T>, default: T, changed: &mut bool) -> T {
    value.unwrap_or_else(|| {
        *changed = true;
        default
    })
}

impl PartialConfig {
    /// Fills missing keys from the defaults. The flag reports whether any were missing.
    fn apply_defaults(self) -> (Config, bool) {
        let defaults = Config::default();
        let mut changed = false;

        let refresh_interval_secs = or_default(
            self.refresh_interval_secs,
            defaults.refresh_interval_secs,
            &mut changed,
        );
        let winopen = or_default(self.winopen, defaults.winopen, &mut changed);
        let strims = or_default(self.strims, defaults.strims, &mut changed);
        let mappings = or_default(self.mappings, defaults.mappings, &mut changed);

        (
            Config {
                snapshot: self.snapshot,
                update_command: self.update_command,
                refresh_interval_secs,
                browser: self.browser,
                winopen,
                strims,
                mappings,
            },
            changed,
        )
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(APP_DIR).join("config.toml"))
}

pub fn ensure_config_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Reads `path`, writing it back with defaults filled in when keys are missing.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        write_config_to(path, &cfg)?;
        return Ok(cfg);
    }

    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let partial: PartialConfig =
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))?;
    let (cfg, changed) = partial.apply_defaults();
    if changed {
        write_config_to(path, &cfg)?;
    }
    Ok(cfg)
}

pub fn write_config_to(path: &Path, cfg: &Config) -> Result<()> {
    ensure_config_dir(path)?;
    let text = toml::to_string_pretty(cfg).context("Failed to serialize config")?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn open_config_in_editor() -> Result<()> {
    let path = config_path()?;
    if !path.exists() {
        write_config_to(&path, &Config::default())?;
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "nvim".to_string());
    let mut parts = match shell_words::split(&editor) {
        Ok(p) if !p.is_empty() => p,
        _ => vec![editor],
    };
    let cmd = parts.remove(0);
    let status = Command::new(cmd)
        .args(parts)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to launch editor for {}", path.display()))?;
    if !status.success() {
        anyhow::bail!("Editor exited with status {}", status);
    }
    Ok(())
}
