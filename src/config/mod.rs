//! Configuration management for computer-agent
//!
//! Display geometry comes from the environment (`WIDTH`, `HEIGHT`,
//! `DISPLAY_NUM`) and is read once at startup. Everything else is an
//! optional TOML file of tunables with built-in defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scaling::Resolution;

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// Required environment variable absent, empty or zero
    MissingDimension(&'static str),
    /// Environment variable is not a valid integer
    InvalidNumber { name: &'static str, value: String },
    /// Config file could not be read
    Io(std::io::Error),
    /// Config file is not valid TOML for [`Config`]
    Parse(toml::de::Error),
    /// Semantically invalid value
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingDimension(name) => {
                write!(f, "{} must be set to a positive integer (WIDTH, HEIGHT must be set)", name)
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{} must be an integer, got {:?}", name, value)
            }
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid config file: {}", e),
            ConfigError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Display geometry of the controlled screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Physical screen size
    pub size: Resolution,
    /// X11 display number; selects `DISPLAY=:<n>` for commands and injection
    pub display_num: Option<u32>,
}

impl DisplaySettings {
    /// Read `WIDTH`, `HEIGHT` and `DISPLAY_NUM` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`DisplaySettings::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let dimension = |name: &'static str| -> Result<u32, ConfigError> {
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                None => Err(ConfigError::MissingDimension(name)),
                Some(value) => match parse_number(name, &value)? {
                    0 => Err(ConfigError::MissingDimension(name)),
                    n => Ok(n),
                },
            }
        };

        let width = dimension("WIDTH")?;
        let height = dimension("HEIGHT")?;
        let display_num = lookup("DISPLAY_NUM")
            .map(|value| parse_number("DISPLAY_NUM", &value))
            .transpose()?;

        Ok(Self {
            size: Resolution::new(width, height),
            display_num,
        })
    }

    /// `DISPLAY=:<n> ` prefix for shell commands, empty without a display number
    pub fn command_prefix(&self) -> String {
        match self.display_num {
            Some(n) => format!("DISPLAY=:{} ", n),
            None => String::new(),
        }
    }

    /// X11 display name, `None` to fall back to `$DISPLAY`
    pub fn x11_display(&self) -> Option<String> {
        self.display_num.map(|n| format!(":{}", n))
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Screenshot pipeline
    pub screenshot: ScreenshotConfig,

    /// Typing behaviour
    pub typing: TypingConfig,

    /// Coordinate scaling
    pub scaling: ScalingConfig,

    /// Shell execution
    pub shell: ShellConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    /// Directory screenshots are written to (never cleaned up)
    pub output_dir: PathBuf,

    /// Settle delay before the screenshot taken after typing, in ms
    pub delay_ms: u64,

    /// Capture command; `{path}` is replaced by the output file
    pub capture_command: String,

    /// Resize command; `{path}`, `{width}` and `{height}` are replaced
    pub resize_command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Delay between typed characters, in ms
    pub delay_ms: u64,

    /// Characters per typing chunk
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Advertise a scaled-down resolution to the agent
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Timeout for each shell command, in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter used when no override is given
    pub level: String,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/tmp/outputs"),
            delay_ms: 2000,
            capture_command: "scrot -o -p {path}".to_string(),
            resize_command: "convert {path} -resize {width}x{height}! {path}".to_string(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            delay_ms: 12,
            chunk_size: 50,
        }
    }
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ScreenshotConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl TypingConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl ShellConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.typing.chunk_size == 0 {
            return Err(ConfigError::Invalid("Typing chunk_size must be non-zero".into()));
        }

        if !self.screenshot.capture_command.contains("{path}") {
            return Err(ConfigError::Invalid("Screenshot capture_command must contain {path}".into()));
        }

        let resize = &self.screenshot.resize_command;
        if !(resize.contains("{path}") && resize.contains("{width}") && resize.contains("{height}")) {
            return Err(ConfigError::Invalid(
                "Screenshot resize_command must contain {path}, {width} and {height}".into(),
            ));
        }

        if self.shell.timeout_secs == 0 {
            return Err(ConfigError::Invalid("Shell timeout_secs must be non-zero".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Result<DisplaySettings, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        DisplaySettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn display_settings_from_env() {
        let settings = env(&[("WIDTH", "1920"), ("HEIGHT", "1080"), ("DISPLAY_NUM", "1")]).unwrap();
        assert_eq!(settings.size, Resolution::new(1920, 1080));
        assert_eq!(settings.display_num, Some(1));
        assert_eq!(settings.command_prefix(), "DISPLAY=:1 ");
        assert_eq!(settings.x11_display().as_deref(), Some(":1"));
    }

    #[test]
    fn display_number_is_optional() {
        let settings = env(&[("WIDTH", "1024"), ("HEIGHT", "768")]).unwrap();
        assert_eq!(settings.display_num, None);
        assert_eq!(settings.command_prefix(), "");
        assert_eq!(settings.x11_display(), None);
    }

    #[test]
    fn dimensions_are_required() {
        assert!(matches!(env(&[("HEIGHT", "768")]), Err(ConfigError::MissingDimension("WIDTH"))));
        assert!(matches!(env(&[("WIDTH", "1024"), ("HEIGHT", "0")]), Err(ConfigError::MissingDimension("HEIGHT"))));
        assert!(matches!(env(&[("WIDTH", ""), ("HEIGHT", "768")]), Err(ConfigError::MissingDimension("WIDTH"))));
        assert!(matches!(
            env(&[("WIDTH", "wide"), ("HEIGHT", "768")]),
            Err(ConfigError::InvalidNumber { name: "WIDTH", .. })
        ));
        assert!(matches!(
            env(&[("WIDTH", "1024"), ("HEIGHT", "768"), ("DISPLAY_NUM", ":1")]),
            Err(ConfigError::InvalidNumber { name: "DISPLAY_NUM", .. })
        ));
    }

    #[test]
    fn defaults_match_tool_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.typing.delay(), Duration::from_millis(12));
        assert_eq!(cfg.typing.chunk_size, 50);
        assert_eq!(cfg.screenshot.delay(), Duration::from_secs(2));
        assert_eq!(cfg.screenshot.output_dir, PathBuf::from("/tmp/outputs"));
        assert!(cfg.scaling.enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml(
            r#"
            [scaling]
            enabled = false

            [screenshot]
            capture_command = "import -window root {path}"
            "#,
        )
        .unwrap();
        assert!(!cfg.scaling.enabled);
        assert_eq!(cfg.screenshot.capture_command, "import -window root {path}");
        assert_eq!(cfg.screenshot.delay_ms, 2000);
        assert_eq!(cfg.typing.chunk_size, 50);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load(Path::new("/nonexistent/computer-agent.toml")).unwrap();
        assert_eq!(cfg.shell.timeout_secs, 120);
    }

    #[test]
    fn validate_rejects_zero_chunk_size() {
        let mut cfg = Config::default();
        cfg.typing.chunk_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_requires_placeholders() {
        let mut cfg = Config::default();
        cfg.screenshot.resize_command = "convert {path} -resize 50% {path}".into();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.screenshot.capture_command = "scrot -p".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_toml_is_reported() {
        assert!(matches!(Config::from_toml("[typing]\nchunk_size = \"many\""), Err(ConfigError::Parse(_))));
    }
}
