//! Configuration system
//!
//! Engine settings load from `.toml` or `.ron` files through the [`Config`]
//! trait. Every field has a default, so partial files are accepted.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How objects flagged for destruction interact with the fixed-step pass
///
/// An object flagged during its own variable update is always skipped by
/// later variable updates and always torn down at the end of the tick. The
/// policies differ only in whether it still receives fixed updates in that
/// same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FixedUpdatePolicy {
    /// Flagged objects receive no fixed updates once the flag is set
    #[default]
    SkipDestroyed,
    /// Fixed updates run over the whole live list, flagged or not
    CapturedList,
}

/// Virtual window size used for default camera projections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Default clip planes for cameras created by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDefaults {
    /// Near clip plane
    pub near_plane: f32,
    /// Far clip plane
    pub far_plane: f32,
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            near_plane: -5.0,
            far_plane: 5.0,
        }
    }
}

/// Texture atlas dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Atlas width in texels
    pub width: u32,
    /// Atlas height in texels
    pub height: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: 2048,
            height: 2048,
        }
    }
}

/// # Engine Configuration
///
/// Core engine behavior: logging, tick timing and the defaults handed to
/// cameras and the texture atlas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter passed to the logger (e.g. `"info"`, `"scene_engine=debug"`)
    pub log_level: String,
    /// Length of one fixed update step in seconds
    pub fixed_timestep: f64,
    /// Whether flagged objects still receive fixed updates in their last tick
    pub fixed_update_policy: FixedUpdatePolicy,
    /// Virtual window size
    pub window: WindowConfig,
    /// Camera clip plane defaults
    pub camera: CameraDefaults,
    /// Texture atlas size
    pub atlas: AtlasConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            fixed_timestep: 1.0 / 60.0,
            fixed_update_policy: FixedUpdatePolicy::default(),
            window: WindowConfig::default(),
            camera: CameraDefaults::default(),
            atlas: AtlasConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Set the fixed update step
    pub fn with_fixed_timestep(mut self, step: f64) -> Self {
        self.fixed_timestep = step;
        self
    }

    /// Set the fixed update policy
    pub fn with_fixed_update_policy(mut self, policy: FixedUpdatePolicy) -> Self {
        self.fixed_update_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_timestep > 0.0 && self.fixed_timestep.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be a positive number of seconds, got {}",
                self.fixed_timestep
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window dimensions must be non-zero".to_string()));
        }

        if self.atlas.width == 0 || self.atlas.height == 0 {
            return Err(ConfigError::Invalid("atlas dimensions must be non-zero".to_string()));
        }

        Ok(())
    }
}
