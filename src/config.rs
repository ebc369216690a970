//! Configuration for the gesture relay.

use crate::actions::{ActionEntry, ActionTable, ActionTableError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote controller
    pub controller_url: String,

    /// Gesture-to-command bindings, in dispatch order
    pub actions: Vec<ActionConfig>,

    /// Detector-wide pause armed after every fired action; `None` disables
    /// the cross-gesture throttle
    #[serde(with = "opt_duration_serde")]
    pub pause_after_fire: Option<Duration>,

    /// Path for storing relay stats
    pub data_path: PathBuf,
}

/// One gesture binding in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Gesture identifier as named by the classifier
    pub gesture: String,
    /// Command path on the controller; empty for the bare base URL
    pub path: String,
    /// Cooldown for this action
    #[serde(with = "duration_serde")]
    pub cooldown: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gesture-relay");

        let cooldown = Duration::from_secs(2);
        Self {
            controller_url: "http://10.2.10.14:5000".to_string(),
            actions: vec![
                ActionConfig::new("TakeOff", "", cooldown),
                ActionConfig::new("Land_Left", "/land", cooldown),
                ActionConfig::new("SwipeLeft_Right", "/left", cooldown),
                ActionConfig::new("SwipeRight_Left", "/right", cooldown),
                ActionConfig::new("Lift", "/lift", cooldown),
                ActionConfig::new("Lower", "/lower", cooldown),
            ],
            pause_after_fire: Some(Duration::from_secs(5)),
            data_path: data_dir,
        }
    }
}

impl ActionConfig {
    pub fn new(gesture: impl Into<String>, path: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            gesture: gesture.into(),
            path: path.into(),
            cooldown,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, falling back to defaults
    /// when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gesture-relay")
            .join("config.json")
    }

    /// Build the action table from the configured bindings, resolving command
    /// paths against the controller's base URL. Fails fast on duplicates.
    pub fn build_action_table(&self) -> Result<ActionTable, ConfigError> {
        let controller = crate::controller::ControllerConfig::new(self.controller_url.clone());
        let entries = self
            .actions
            .iter()
            .map(|a| {
                ActionEntry::new(a.gesture.clone(), controller.endpoint_url(&a.path), a.cooldown)
            })
            .collect();
        ActionTable::new(entries).map_err(ConfigError::InvalidActions)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidActions(ActionTableError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidActions(e) => write!(f, "Invalid action table: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| serde::de::Error::custom(format!("invalid duration {secs}: {e}")))
    }
}

/// Serde support for Option<Duration>.
mod opt_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_secs_f64()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid duration {secs}: {e}"))),
            None => Ok(None),
        }
    }
}
