use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "cardex";

/// Default book file, relative to the working directory. Keeps the tool
/// usable with no configuration at all.
pub const DEFAULT_BOOK: &str = "contacts.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the configuration was read from, if a file existed.
    pub config_path: Option<PathBuf>,
    /// Path of the JSON book.
    pub book: PathBuf,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

impl Default for UiColors {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 165, 0),
            selection_bg: RgbColor::new(255, 165, 0),
            selection_fg: RgbColor::new(0, 0, 0),
            status_fg: RgbColor::new(255, 165, 0),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let (r, g, b) = match Helper::deserialize(deserializer)? {
            Helper::Array([r, g, b]) => (r, g, b),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

// Raw file shape; every key optional so a partial config stays valid.

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    book: Option<PathBuf>,
    #[serde(default)]
    ui: UiFile,
}

#[derive(Debug, Default, Deserialize)]
struct UiFile {
    #[serde(default)]
    colors: UiColorsFile,
}

#[derive(Debug, Default, Deserialize)]
struct UiColorsFile {
    border: Option<RgbColor>,
    selection_bg: Option<RgbColor>,
    selection_fg: Option<RgbColor>,
    status_fg: Option<RgbColor>,
    status_bg: Option<RgbColor>,
}

impl UiColorsFile {
    fn into_colors(self) -> UiColors {
        let defaults = UiColors::default();
        UiColors {
            border: self.border.unwrap_or(defaults.border),
            selection_bg: self.selection_bg.unwrap_or(defaults.selection_bg),
            selection_fg: self.selection_fg.unwrap_or(defaults.selection_fg),
            status_fg: self.status_fg.unwrap_or(defaults.status_fg),
            status_bg: self.status_bg.unwrap_or(defaults.status_bg),
        }
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.config_dir().join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration. A missing file is not an error: the defaults (a
/// `contacts.json` book in the working directory) apply. A present but
/// unparsable file is an error, not something to silently ignore.
pub fn load() -> Result<Config> {
    let path = config_path();
    let Some(path) = path.filter(|p| p.exists()) else {
        return Ok(Config {
            config_path: None,
            book: PathBuf::from(DEFAULT_BOOK),
            ui: UiConfig::default(),
        });
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    from_str(&raw, Some(path))
}

fn from_str(raw: &str, path: Option<PathBuf>) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).with_context(|| match &path {
        Some(p) => format!("failed to parse {} as TOML", p.display()),
        None => "failed to parse configuration as TOML".to_string(),
    })?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| "failed to deserialize configuration".to_string())?;

    let book = cfg_file
        .book
        .map(|p| expand_tilde(&p))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BOOK));

    Ok(Config {
        config_path: path,
        book,
        ui: UiConfig {
            colors: cfg_file.ui.colors.into_colors(),
        },
    })
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else { return };
    for (key, sub) in table {
        match key.as_str() {
            "book" => {}
            "ui" => {
                if let Some(ui) = sub.as_table() {
                    for (ui_key, colors) in ui {
                        if ui_key != "colors" {
                            eprintln!("warning: unknown configuration key `ui.{}`", ui_key);
                            continue;
                        }
                        if let Some(colors) = colors.as_table() {
                            for color_key in colors.keys() {
                                if !matches!(
                                    color_key.as_str(),
                                    "border"
                                        | "selection_bg"
                                        | "selection_fg"
                                        | "status_fg"
                                        | "status_bg"
                                ) {
                                    eprintln!(
                                        "warning: unknown configuration key `ui.colors.{}`",
                                        color_key
                                    );
                                }
                            }
                        }
                    }
                }
            }
            other => eprintln!("warning: unknown configuration key `{}`", other),
        }
    }
}
