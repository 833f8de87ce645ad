use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::app::Mode;
use crate::mail::DEFAULT_DATE_FORMATS;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory whose immediate subdirectories are the Maildir folders
    pub maildir_prefix: String,
    /// Folder list filter: "all", "new", or a path substring
    pub maildir_limit: String,
    /// Message list filter: "all", "new", or a substring of the display line
    pub index_limit: String,
    /// Template for one message line (FLAGS, FROM, TO, SUBJECT, DATE, YEAR, MONTH, DAY)
    pub index_format: String,
    /// Mode the front-end starts in
    pub global_mode: Mode,
    /// chrono patterns tried in order against Date: headers
    pub date_formats: Vec<String>,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub bg: String,
    pub fg: String,
    pub fg_muted: String,
    pub border: String,
    pub border_active: String,
    pub primary: String,
    pub selected_bg: String,
    pub unread: String,
    pub error: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            maildir_prefix: "~/Maildir".to_string(),
            maildir_limit: "all".to_string(),
            index_limit: "all".to_string(),
            index_format: "[FLAGS] DAY/MONTH/YEAR FROM - SUBJECT".to_string(),
            global_mode: Mode::Maildir,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            bg: "#1a1917".to_string(),
            fg: "#f7f7f5".to_string(),
            fg_muted: "#8c8985".to_string(),
            border: "#524f4c".to_string(),
            border_active: "#d4a366".to_string(),
            primary: "#d4a366".to_string(),
            selected_bg: "#393634".to_string(),
            unread: "#d4a366".to_string(),
            error: "#ff4d4f".to_string(),
        }
    }
}

impl Config {
    /// `~/.config/mailnav/config.toml`, or defaults when it is missing or
    /// unreadable.
    pub fn load() -> Self {
        let config_path = dirs::config_dir()
            .map(|p| p.join("mailnav/config.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/mailnav/config.toml"));
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), "config parse error: {}", e),
            },
            Err(e) => tracing::warn!(path = %path.display(), "config read error: {}", e),
        }
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `maildir_prefix` with `~` and `$VARS` expanded.
    pub fn prefix_path(&self) -> PathBuf {
        let expanded = shellexpand::full(&self.maildir_prefix)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| shellexpand::tilde(&self.maildir_prefix).into_owned());
        PathBuf::from(expanded)
    }

    /// The string variables, keyed by name.
    pub fn variables(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("maildir_prefix".to_string(), self.maildir_prefix.clone()),
            ("maildir_limit".to_string(), self.maildir_limit.clone()),
            ("index_limit".to_string(), self.index_limit.clone()),
            ("index_format".to_string(), self.index_format.clone()),
            ("global_mode".to_string(), self.global_mode.to_string()),
            ("date_formats".to_string(), self.date_formats.join("\n")),
        ])
    }
}

impl ThemeConfig {
    pub fn bg(&self) -> ratatui::style::Color {
        parse_color(&self.bg)
    }
    pub fn fg(&self) -> ratatui::style::Color {
        parse_color(&self.fg)
    }
    pub fn fg_muted(&self) -> ratatui::style::Color {
        parse_color(&self.fg_muted)
    }
    pub fn border(&self) -> ratatui::style::Color {
        parse_color(&self.border)
    }
    pub fn border_active(&self) -> ratatui::style::Color {
        parse_color(&self.border_active)
    }
    pub fn primary(&self) -> ratatui::style::Color {
        parse_color(&self.primary)
    }
    pub fn selected_bg(&self) -> ratatui::style::Color {
        parse_color(&self.selected_bg)
    }
    pub fn unread(&self) -> ratatui::style::Color {
        parse_color(&self.unread)
    }
    pub fn error(&self) -> ratatui::style::Color {
        parse_color(&self.error)
    }
}

/// `#RRGGBB` or a basic colour name; anything else is white.
pub fn parse_color(s: &str) -> ratatui::style::Color {
    use ratatui::style::Color;

    if let Some(hex) = s.strip_prefix('#').filter(|h| h.len() == 6) {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return Color::Rgb(r, g, b);
        }
    }

    match s.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        _ => Color::White,
    }
}
