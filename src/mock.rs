// Test doubles for the hardware and collaborator traits

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::display::{Color, Display, Image};
use crate::motion::{AngleSensor, DriveMotors, RateGyro, WheelSpeeds};
use crate::report::{JoinReporter, MoveReporter, ReportError};
use crate::settings::{Settings, SettingsError, SettingsStore};

/// Records every speed pair written to the wheels
#[derive(Debug, Clone, Default)]
pub struct RecordingMotors {
    history: Arc<Mutex<Vec<WheelSpeeds>>>,
}

impl RecordingMotors {
    pub fn history(&self) -> Vec<WheelSpeeds> {
        self.history.lock().unwrap().clone()
    }
}

impl DriveMotors for RecordingMotors {
    fn set_speeds(&mut self, speeds: WheelSpeeds) {
        self.history.lock().unwrap().push(speeds);
    }
}

/// Gyro that always reports the same yaw rate
#[derive(Debug, Clone, Copy)]
pub struct ConstantRate(pub f32);

impl RateGyro for ConstantRate {
    fn rate(&mut self) -> f32 {
        self.0
    }
}

/// Angle sensor stuck at one reading, reset or not
#[derive(Debug, Clone, Copy)]
pub struct FixedAngle(pub f32);

impl AngleSensor for FixedAngle {
    fn reset(&mut self) {}

    fn angle(&mut self) -> f32 {
        self.0
    }
}

/// Records the images shown
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    shown: Arc<Mutex<Vec<(Image, Color)>>>,
}

impl RecordingDisplay {
    pub fn images(&self) -> Vec<Image> {
        self.shown.lock().unwrap().iter().map(|(i, _)| *i).collect()
    }

    pub fn shown(&self) -> Vec<(Image, Color)> {
        self.shown.lock().unwrap().clone()
    }
}

impl Display for RecordingDisplay {
    fn show(&mut self, image: Image, color: Color) {
        self.shown.lock().unwrap().push((image, color));
    }
}

/// In-memory settings store that can be told to fail
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Option<Settings>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn saved(&self) -> Option<Settings> {
        self.saved.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SettingsError::Io(std::io::Error::other("storage unavailable")));
        }
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        self.check()?;
        self.saved()
            .ok_or_else(|| SettingsError::Io(std::io::ErrorKind::NotFound.into()))
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        self.check()?;
        *self.saved.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}

/// Reporter that fails a set number of times before succeeding
#[derive(Debug, Clone)]
pub struct ScriptedReporter {
    failures_left: Arc<AtomicUsize>,
    delay: Duration,
    attempts: Arc<Mutex<Vec<i32>>>,
    joins: Arc<Mutex<Vec<String>>>,
}

impl ScriptedReporter {
    pub fn succeeding_after(failures: usize) -> Self {
        Self {
            failures_left: Arc::new(AtomicUsize::new(failures)),
            delay: Duration::ZERO,
            attempts: Arc::default(),
            joins: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self::succeeding_after(usize::MAX)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn attempts(&self) -> Vec<i32> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn joins(&self) -> Vec<String> {
        self.joins.lock().unwrap().clone()
    }

    async fn outcome(&self) -> Result<(), ReportError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let left = self.failures_left.load(Ordering::SeqCst);
        if left == 0 {
            return Ok(());
        }
        self.failures_left.store(left - 1, Ordering::SeqCst);
        Err(ReportError::Transport("server unreachable".to_string()))
    }
}

impl MoveReporter for ScriptedReporter {
    async fn send_done(&self, robot: i32) -> Result<(), ReportError> {
        self.attempts.lock().unwrap().push(robot);
        self.outcome().await
    }
}

impl JoinReporter for ScriptedReporter {
    async fn join_game(&self, name: &str) -> Result<(), ReportError> {
        self.joins.lock().unwrap().push(name.to_string());
        self.outcome().await
    }
}
