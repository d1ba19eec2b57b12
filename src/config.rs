use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PipConfig {
    pub capture: CaptureConfig,
    pub transform: TransformConfig,
    pub auto_flip: AutoFlipConfig,
    pub control: ControlConfig,
    pub window: WindowConfig,
    pub storage: StorageConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Delay before re-attempting a failed capture start
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Maximum start attempts in one sequence
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Conservative constraints used once when the requested ones cannot be met
    #[serde(default = "default_fallback_width")]
    pub fallback_width: u32,

    #[serde(default = "default_fallback_height")]
    pub fallback_height: u32,

    #[serde(default = "default_fallback_fps")]
    pub fallback_fps: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TransformConfig {
    /// Zoom change per nudge
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,

    /// Offset change per nudge, in pixels
    #[serde(default = "default_offset_step")]
    pub offset_step: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AutoFlipConfig {
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f64,

    #[serde(default = "default_deactivation_threshold")]
    pub deactivation_threshold: f64,

    /// Window position sampling period
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Delay before a called-for transition is re-checked and applied
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ControlConfig {
    /// Minimum spacing between accepted key presses
    #[serde(default = "default_key_debounce_ms")]
    pub key_debounce_ms: u64,

    /// Enable the terminal keyboard control surface
    #[serde(default = "default_keyboard")]
    pub keyboard: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WindowConfig {
    #[serde(default)]
    pub x: i32,

    #[serde(default)]
    pub y: i32,

    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,

    /// Width of the screen hosting the window
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Path of the persisted settings document
    #[serde(default = "default_settings_path")]
    pub settings_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Capacity of the control and presentation channels
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl CaptureConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl AutoFlipConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl ControlConfig {
    pub fn key_debounce(&self) -> Duration {
        Duration::from_millis(self.key_debounce_ms)
    }
}

impl PipConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("pipcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("capture.retry_delay_ms", default_retry_delay_ms())?
            .set_default("capture.max_attempts", default_max_attempts())?
            .set_default("capture.fallback_width", default_fallback_width())?
            .set_default("capture.fallback_height", default_fallback_height())?
            .set_default("capture.fallback_fps", default_fallback_fps())?
            .set_default("transform.zoom_step", default_zoom_step())?
            .set_default("transform.offset_step", default_offset_step())?
            .set_default(
                "auto_flip.activation_threshold",
                default_activation_threshold(),
            )?
            .set_default(
                "auto_flip.deactivation_threshold",
                default_deactivation_threshold(),
            )?
            .set_default("auto_flip.sample_interval_ms", default_sample_interval_ms())?
            .set_default("auto_flip.debounce_ms", default_debounce_ms())?
            .set_default("control.key_debounce_ms", default_key_debounce_ms())?
            .set_default("control.keyboard", default_keyboard())?
            .set_default("window.x", 0)?
            .set_default("window.y", 0)?
            .set_default("window.width", default_window_width())?
            .set_default("window.height", default_window_height())?
            .set_default("window.screen_width", default_screen_width())?
            .set_default("storage.settings_path", default_settings_path())?
            .set_default(
                "system.channel_capacity",
                default_channel_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with PIPCAM_ prefix
            .add_source(
                Environment::with_prefix("PIPCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: PipConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.max_attempts == 0 {
            return Err(ConfigError::Message(
                "Capture max_attempts must be at least 1".to_string(),
            ));
        }

        if self.capture.fallback_width == 0
            || self.capture.fallback_height == 0
            || self.capture.fallback_fps == 0
        {
            return Err(ConfigError::Message(
                "Capture fallback constraints must be greater than 0".to_string(),
            ));
        }

        if !(self.transform.zoom_step > 0.0) || self.transform.offset_step <= 0 {
            return Err(ConfigError::Message(
                "Transform steps must be greater than 0".to_string(),
            ));
        }

        let flip = &self.auto_flip;
        let in_unit = |v: f64| v > 0.0 && v < 1.0;
        if !in_unit(flip.activation_threshold) || !in_unit(flip.deactivation_threshold) {
            return Err(ConfigError::Message(
                "Auto-flip thresholds must lie strictly between 0 and 1".to_string(),
            ));
        }

        if flip.deactivation_threshold >= flip.activation_threshold {
            return Err(ConfigError::Message(
                "Auto-flip deactivation threshold must be lower than the activation threshold"
                    .to_string(),
            ));
        }

        if flip.sample_interval_ms == 0 || flip.debounce_ms == 0 {
            return Err(ConfigError::Message(
                "Auto-flip sample interval and debounce must be greater than 0".to_string(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 || self.window.screen_width == 0 {
            return Err(ConfigError::Message(
                "Window and screen sizes must be greater than 0".to_string(),
            ));
        }

        if self.storage.settings_path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Settings path must not be empty".to_string(),
            ));
        }

        if self.system.channel_capacity == 0 {
            return Err(ConfigError::Message(
                "Channel capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                retry_delay_ms: default_retry_delay_ms(),
                max_attempts: default_max_attempts(),
                fallback_width: default_fallback_width(),
                fallback_height: default_fallback_height(),
                fallback_fps: default_fallback_fps(),
            },
            transform: TransformConfig {
                zoom_step: default_zoom_step(),
                offset_step: default_offset_step(),
            },
            auto_flip: AutoFlipConfig {
                activation_threshold: default_activation_threshold(),
                deactivation_threshold: default_deactivation_threshold(),
                sample_interval_ms: default_sample_interval_ms(),
                debounce_ms: default_debounce_ms(),
            },
            control: ControlConfig {
                key_debounce_ms: default_key_debounce_ms(),
                keyboard: default_keyboard(),
            },
            window: WindowConfig {
                x: 0,
                y: 0,
                width: default_window_width(),
                height: default_window_height(),
                screen_width: default_screen_width(),
            },
            storage: StorageConfig {
                settings_path: default_settings_path(),
            },
            system: SystemConfig {
                channel_capacity: default_channel_capacity(),
            },
        }
    }
}

// Default value functions
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_fallback_width() -> u32 {
    1280
}
fn default_fallback_height() -> u32 {
    720
}
fn default_fallback_fps() -> u32 {
    30
}

fn default_zoom_step() -> f64 {
    0.1
}
fn default_offset_step() -> i32 {
    5
}

fn default_activation_threshold() -> f64 {
    0.6
}
fn default_deactivation_threshold() -> f64 {
    0.4
}
fn default_sample_interval_ms() -> u64 {
    500
}
fn default_debounce_ms() -> u64 {
    1000
}

fn default_key_debounce_ms() -> u64 {
    150
}
fn default_keyboard() -> bool {
    true
}

fn default_window_width() -> u32 {
    800
}
fn default_window_height() -> u32 {
    600
}
fn default_screen_width() -> u32 {
    1920
}

fn default_settings_path() -> String {
    "pipcam-settings.json".to_string()
}

fn default_channel_capacity() -> usize {
    64
}
