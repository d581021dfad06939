/*
 *  config.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered YAML configuration, CLI overrides and reload watching
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::SystemTime;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::constants::{
    APP_NAME, DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, DEFAULT_FRAMEBUFFER, DEFAULT_POLL_INTERVAL,
    DEFAULT_UPDATE_INTERVAL,
};
use crate::display::ColorSpec;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub poll_interval: Option<f64>,    // seconds between ticks
    pub update_interval: Option<f64>,  // seconds between config file checks
    pub initial_screen: Option<String>,
    pub cache_folder: Option<PathBuf>,
    pub display: Option<DisplayConfig>,
    pub buttons: Option<ButtonsConfig>,
    /// Active theme name, a key of `themes`
    pub theme: Option<String>,
    pub themes: HashMap<String, HashMap<String, ColorSpec>>,
    /// Parameters shared by every panel of a class, keyed by class
    pub panel_params: HashMap<String, serde_yaml::Value>,
    pub screens: Vec<ScreenConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub driver: Option<DriverKind>,
    pub device: Option<PathBuf>,    // e.g. "/dev/fb1"
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub left: Option<i32>,
    pub top: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Linuxfb,
    Headless,
}

/// Button wiring and actions. Button indexes are 1-based positions in `pins`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ButtonsConfig {
    pub pins: Vec<u8>,              // BCM numbering
    pub quit: Option<usize>,
    pub poweroff: Option<usize>,
    /// button index -> screen name
    pub screens: BTreeMap<usize, String>,
    pub brightness: Option<u8>,     // 0-255
    pub brightness_pin: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScreenConfig {
    pub name: String,
    #[serde(flatten)]
    pub layout: NodeConfig,
}

/// One node of a screen layout tree.
///
/// A node with `height` (inside rows) or `width` (inside columns) takes a
/// split slot. A node without one overlays the previous sized sibling.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<NodeConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<NodeConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<PanelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub name: Option<String>,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    /// "name:size"
    pub font: Option<String>,
    pub color: Option<ColorSpec>,
    pub bg_color: Option<ColorSpec>,
    pub border_color: Option<ColorSpec>,
    /// integer, [h, v] or [l, t, r, b]
    pub margins: Option<serde_yaml::Value>,
    pub params: Option<serde_yaml::Value>,
}

impl Config {
    pub fn poll_interval(&self) -> f64 {
        self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    pub fn update_interval(&self) -> f64 {
        self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL)
    }

    /// Configured initial screen, else the first one listed
    pub fn initial_screen(&self) -> Option<&str> {
        self.initial_screen
            .as_deref()
            .or_else(|| self.screens.first().map(|s| s.name.as_str()))
    }

    pub fn screen(&self, name: &str) -> Option<&ScreenConfig> {
        self.screens.iter().find(|s| s.name == name)
    }

    pub fn display(&self) -> DisplayConfig {
        self.display.clone().unwrap_or_default()
    }

    pub fn buttons(&self) -> ButtonsConfig {
        self.buttons.clone().unwrap_or_default()
    }

    /// Colors of the active theme
    pub fn theme_colors(&self) -> Option<&HashMap<String, ColorSpec>> {
        self.themes.get(self.theme.as_deref()?)
    }
}

impl DisplayConfig {
    pub fn driver(&self) -> DriverKind {
        self.driver.unwrap_or(DriverKind::Linuxfb)
    }

    pub fn device(&self) -> PathBuf {
        self.device.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_FRAMEBUFFER))
    }

    pub fn width(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_DISPLAY_WIDTH)
    }

    pub fn height(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_DISPLAY_HEIGHT)
    }
}

/// Configuration shared between the reload watcher and configured screens
pub type SharedConfig = Rc<RefCell<Config>>;

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "lyclock", about = "LyClock - time and weather at a glance", disable_version_flag = true)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Enable debug log level
    #[arg(short = 'v', long = "debug", alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    /// Initial screen name
    #[arg(long)]
    pub screen: Option<String>,
    /// Draw to a recording display instead of the framebuffer
    #[arg(long, action = ArgAction::SetTrue)]
    pub headless: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
    /// Print version and build date
    #[arg(short = 'V', long, action = ArgAction::SetTrue)]
    pub version: bool,
}

/// Result of a layered load
#[derive(Debug, Clone)]
pub struct Loaded {
    pub config: Config,
    /// File the configuration came from, if any
    pub path: Option<PathBuf>,
}

/// Public entry point: read YAML, merge, apply CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Loaded, ConfigError> {
    let path = match cli.config.as_ref() {
        Some(p) if p.exists() => Some(p.clone()),
        Some(p) => {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        None => find_config_file(),
    };
    let config = load_layers(path.as_deref(), cli)?;
    Ok(Loaded { config, path })
}

fn load_layers(path: Option<&Path>, cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file
    if let Some(p) = path {
        merge(&mut cfg, read_yaml(p)?);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Pretty YAML of the effective config
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/lyclock/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(format!(".config/{APP_NAME}/config.yaml"));
        if p.exists() { return Some(p) }
        let p = home.join(format!(".config/{APP_NAME}.yaml"));
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["lyclock.yaml", "config.yaml", "config/lyclock.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option. Non-empty collections
/// replace.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()       { dst.log_level = src.log_level; }
    if src.poll_interval.is_some()   { dst.poll_interval = src.poll_interval; }
    if src.update_interval.is_some() { dst.update_interval = src.update_interval; }
    if src.initial_screen.is_some()  { dst.initial_screen = src.initial_screen; }
    if src.cache_folder.is_some()    { dst.cache_folder = src.cache_folder; }
    if src.theme.is_some()           { dst.theme = src.theme; }
    if !src.themes.is_empty()        { dst.themes = src.themes; }
    if !src.panel_params.is_empty()  { dst.panel_params = src.panel_params; }
    if !src.screens.is_empty()       { dst.screens = src.screens; }
    // display
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
    // buttons
    if src.buttons.is_some()         { dst.buttons = src.buttons; }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.driver.is_some()  { dst.driver = src.driver; }
    if src.device.is_some()  { dst.device = src.device; }
    if src.width.is_some()   { dst.width = src.width; }
    if src.height.is_some()  { dst.height = src.height; }
    if src.left.is_some()    { dst.left = src.left; }
    if src.top.is_some()     { dst.top = src.top; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug               { cfg.log_level = Some("debug".into()); }
    if cli.screen.is_some()    { cfg.initial_screen = cli.screen.clone(); }
    if cli.headless {
        cfg.display.get_or_insert_with(DisplayConfig::default).driver = Some(DriverKind::Headless);
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        if display.width == Some(0) || display.height == Some(0) {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
    }
    if !(cfg.poll_interval() > 0.0) {
        return Err(ConfigError::Validation("poll_interval must be > 0".into()));
    }
    if !(cfg.update_interval() > 0.0) {
        return Err(ConfigError::Validation("update_interval must be > 0".into()));
    }
    if cfg.screens.is_empty() {
        return Err(ConfigError::Validation("no screens are configured".into()));
    }
    if let Some(initial) = cfg.initial_screen.as_deref() {
        if cfg.screen(initial).is_none() {
            return Err(ConfigError::Validation(format!("initial screen \"{initial}\" is not configured")));
        }
    }
    if let Some(buttons) = cfg.buttons.as_ref() {
        let count = buttons.pins.len();
        let indexes = buttons.quit.iter().chain(buttons.poweroff.iter()).chain(buttons.screens.keys());
        for &index in indexes {
            if index == 0 || index > count {
                return Err(ConfigError::Validation(format!(
                    "button index {index} is outside 1..={count}"
                )));
            }
        }
    }
    Ok(())
}

/// Re-reads the configuration file when its modification time changes.
pub struct ConfigWatcher {
    path: Option<PathBuf>,
    cli: Cli,
    modified: Option<SystemTime>,
    config: SharedConfig,
}

impl ConfigWatcher {
    pub fn new(loaded: Loaded, cli: Cli) -> Self {
        let modified = loaded.path.as_deref().and_then(modified_time);
        Self {
            path: loaded.path,
            cli,
            modified,
            config: Rc::new(RefCell::new(loaded.config)),
        }
    }

    pub fn config(&self) -> SharedConfig {
        self.config.clone()
    }

    /// True when the file changed and the new contents were applied. A file
    /// that fails to load or validate is logged and the old config kept.
    pub fn update(&mut self) -> bool {
        let Some(path) = self.path.as_deref() else {
            return false;
        };
        let modified = modified_time(path);
        if modified == self.modified {
            return false;
        }
        self.modified = modified;
        match load_layers(Some(path), &self.cli) {
            Ok(config) => {
                info!("Reloaded configuration from {}.", path.display());
                *self.config.borrow_mut() = config;
                true
            }
            Err(e) => {
                error!("Ignoring configuration change in {}: {}", path.display(), e);
                false
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
