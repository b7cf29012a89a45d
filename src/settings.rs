// Tunable robot settings and their persistence
//
// Settings travel as one JSON document:
// {"name": "...", "controls": {"<key>": {"displayname", "min", "max", "increment", "value"}}}

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Setting keys read by motion control and the display
pub mod keys {
    pub const LEFT_FORWARD_SPEED: &str = "leftForwardSpeed";
    pub const RIGHT_FORWARD_SPEED: &str = "rightForwardSpeed";
    pub const LEFT_BACKWARD_SPEED: &str = "leftBackwardSpeed";
    pub const RIGHT_BACKWARD_SPEED: &str = "rightBackwardSpeed";
    pub const LEFT_ZERO: &str = "leftZero";
    pub const RIGHT_ZERO: &str = "rightZero";
    pub const LINEAR_TIME: &str = "linearTime";
    pub const DRIFT: &str = "drift";
    pub const DRIFT_BOOST: &str = "driftBoost";
    pub const TURN_ANGLE: &str = "turnAngle";
    pub const ROBOT_COLOR: &str = "robotColor";
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Bad setting data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// One bounded calibration parameter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TunableSetting {
    #[serde(rename = "displayname")]
    pub display_name: String,
    pub min: i32,
    pub max: i32,
    pub increment: f32,
    pub value: f32,
}

impl TunableSetting {
    fn new(display_name: &str, min: i32, max: i32, increment: f32, value: f32) -> Self {
        Self {
            display_name: display_name.to_string(),
            min,
            max,
            increment,
            value,
        }
    }
}

/// The robot's name plus every tunable setting, keyed by identifier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub name: String,
    pub controls: BTreeMap<String, TunableSetting>,
}

impl Settings {
    /// Current value of a setting, 0.0 when the key is missing
    pub fn value(&self, key: &str) -> f32 {
        self.controls.get(key).map(|s| s.value).unwrap_or_default()
    }

    /// Replace every setting with the contents of a JSON payload.
    ///
    /// An empty payload is accepted and changes nothing. A malformed one is
    /// rejected and the current settings are kept.
    pub fn update(&mut self, payload: &str) -> Result<(), SettingsError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Ok(());
        }
        info!("New settings: {}", payload);
        match serde_json::from_str::<Settings>(payload) {
            Ok(new_settings) => {
                *self = new_settings;
                Ok(())
            }
            Err(e) => {
                warn!("Bad setting data received: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load settings from the store, falling back to (and saving) the defaults
    pub fn load_or_default(store: &dyn SettingsStore) -> Self {
        match store.load() {
            Ok(settings) => {
                info!("Settings loaded");
                settings
            }
            Err(e) => {
                warn!("Could not load settings ({}), applying defaults", e);
                let settings = Settings::default_robot();
                if let Err(e) = store.save(&settings) {
                    warn!("Failed to save default settings: {}", e);
                }
                settings
            }
        }
    }

    /// Factory calibration for the buggy
    pub fn default_robot() -> Self {
        let controls = [
            (
                keys::LEFT_FORWARD_SPEED,
                TunableSetting::new("Left Forward Speed", 90, 180, 1.0, 165.0),
            ),
            (
                keys::RIGHT_FORWARD_SPEED,
                TunableSetting::new("Right Forward Speed", 0, 90, 1.0, 15.0),
            ),
            (
                keys::LEFT_BACKWARD_SPEED,
                TunableSetting::new("Left Backward Speed", 0, 90, 1.0, 15.0),
            ),
            (
                keys::RIGHT_BACKWARD_SPEED,
                TunableSetting::new("Right Backward Speed", 90, 180, 1.0, 165.0),
            ),
            (
                keys::LEFT_ZERO,
                TunableSetting::new("Left Zero Point", 30, 150, 1.0, 90.0),
            ),
            (
                keys::RIGHT_ZERO,
                TunableSetting::new("Right Zero Point", 30, 150, 1.0, 90.0),
            ),
            (
                keys::LINEAR_TIME,
                TunableSetting::new("Linear Movement Time", 500, 2000, 10.0, 1200.0),
            ),
            (
                keys::DRIFT,
                TunableSetting::new("Drift Limit", 0, 15, 1.0, 5.0),
            ),
            (
                keys::DRIFT_BOOST,
                TunableSetting::new("Drift Boost", 0, 20, 1.0, 10.0),
            ),
            (
                keys::TURN_ANGLE,
                TunableSetting::new("Turn Angle", 60, 120, 0.5, 90.0),
            ),
            (
                keys::ROBOT_COLOR,
                TunableSetting::new("Robot Color", 0, 7, 1.0, 0.0),
            ),
        ];

        Self {
            name: "Test Bot".to_string(),
            controls: controls
                .into_iter()
                .map(|(key, setting)| (key.to_string(), setting))
                .collect(),
        }
    }
}

/// Somewhere settings survive a power cycle
pub trait SettingsStore: Send {
    fn load(&self) -> Result<Settings, SettingsError>;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept in a JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for FileStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        info!("Reading robot config file {}", self.path.display());
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        info!("Saving config to {}", self.path.display());
        fs::write(&self.path, settings.to_json()?)?;
        Ok(())
    }
}
