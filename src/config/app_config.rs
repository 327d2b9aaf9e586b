//! Toolkit configuration
//!
//! Display pacing, channel capacities, pointer routing policy and logging.

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Embedded default configuration file
const DEFAULT_CONFIG: &str = include_str!("../../uik.config.toml");

/// Configuration file name
const CONFIG_FILE_NAME: &str = "uik.config.toml";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UikConfig {
    /// Display surface and frame pacing
    #[serde(default)]
    pub display: DisplayConfig,
    /// Channel capacities
    #[serde(default)]
    pub channels: ChannelConfig,
    /// Pointer event routing
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl UikConfig {
    /// Load configuration from the first file found, or the embedded default
    pub fn load() -> Result<Self> {
        // Try uik.config.toml in current directory
        if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_NAME) {
            return Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse {}", CONFIG_FILE_NAME));
        }

        // Try ~/.uik/uik.config.toml
        if let Some(base_dirs) = BaseDirs::new() {
            let home_config = base_dirs.home_dir().join(".uik").join(CONFIG_FILE_NAME);
            if let Ok(content) = std::fs::read_to_string(&home_config) {
                return Self::from_toml_str(&content)
                    .with_context(|| format!("Failed to parse {}", home_config.display()));
            }
        }

        // Try environment variable UIK_CONFIG_PATH
        if let Ok(config_path) = std::env::var("UIK_CONFIG_PATH") {
            if let Ok(content) = std::fs::read_to_string(&config_path) {
                return Self::from_toml_str(&content)
                    .with_context(|| format!("Failed to parse {}", config_path));
            }
        }

        Self::from_toml_str(DEFAULT_CONFIG).context("Failed to parse embedded default config")
    }

    /// Load configuration from a specific file path
    /// If the file doesn't exist, creates it with default settings
    pub fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create directory {}", parent.display()))?;
                }
                std::fs::write(path, DEFAULT_CONFIG)
                    .with_context(|| format!("Failed to create config file at {}", path.display()))?;

                Self::from_toml_str(DEFAULT_CONFIG)
                    .context("Failed to parse embedded default config")
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read config file {}", path.display())),
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.display.frame_delay_ms == 0 {
            anyhow::bail!("display.frame_delay_ms must be greater than 0");
        }
        if self.display.width == 0 || self.display.height == 0 {
            anyhow::bail!(
                "display size must be positive, got {}x{}",
                self.display.width,
                self.display.height
            );
        }
        if self.channels.event_capacity == 0 {
            anyhow::bail!("channels.event_capacity must be greater than 0");
        }
        if self.channels.composite_capacity == 0 {
            anyhow::bail!("channels.composite_capacity must be greater than 0");
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(delay) = std::env::var("UIK_FRAME_DELAY_MS") {
            if let Ok(delay) = delay.parse::<u64>() {
                self.display.frame_delay_ms = delay;
            }
        }
        if let Ok(level) = std::env::var("UIK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(hit_test) = std::env::var("UIK_HIT_TEST") {
            match hit_test.to_lowercase().as_str() {
                "all" => self.routing.hit_test = HitTest::All,
                "first" => self.routing.hit_test = HitTest::First,
                _ => {}
            }
        }
    }

    /// Get a summary of the configuration
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("Configuration loaded:\n");
        summary.push_str(&format!(
            "Display: {}x{} @ {}ms frame delay\n",
            self.display.width, self.display.height, self.display.frame_delay_ms
        ));
        summary.push_str(&format!(
            "Channels: events {}, composites {}\n",
            self.channels.event_capacity, self.channels.composite_capacity
        ));
        summary.push_str(&format!("Hit Test: {}\n", self.routing.hit_test.as_str()));
        summary.push_str(&format!("Logging Level: {}\n", self.logging.level));
        summary
    }

    /// Minimum time between two display flushes
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.display.frame_delay_ms)
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_frame_delay_ms() -> u64 {
    16
}

fn default_width() -> u32 {
    480
}

fn default_height() -> u32 {
    320
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_delay_ms: default_frame_delay_ms(),
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Channel capacities
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default = "default_composite_capacity")]
    pub composite_capacity: usize,
}

fn default_event_capacity() -> usize {
    crate::block::DEFAULT_EVENT_CAPACITY
}

fn default_composite_capacity() -> usize {
    1
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            composite_capacity: default_composite_capacity(),
        }
    }
}

/// Which struck children receive a pointer event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HitTest {
    /// Every child whose bounds contain the point
    #[default]
    All,
    /// Only the first such child in children order
    First,
}

impl HitTest {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitTest::All => "all",
            HitTest::First => "first",
        }
    }
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RoutingConfig {
    #[serde(default)]
    pub hit_test: HitTest,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
