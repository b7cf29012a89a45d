// Simulated two-wheel base
//
// Stands in for the servos and the MPU6050 when running off the robot. The
// yaw rate follows the wheel commands: each wheel's offset from its zero
// point pushes the same way when the robot spins and cancels out when it
// drives straight, because the servos are mounted facing each other. Drift
// only shows up while the wheels turn, so a stationary calibration reads zero.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::motion::{DriveMotors, RateGyro, WheelSpeeds};

/// Degrees per second of yaw for each servo unit away from zero
pub const YAW_GAIN: f32 = 0.6;

#[derive(Debug, Default)]
struct SimState {
    speeds: WheelSpeeds,
    zero: WheelSpeeds,
    drift: f32,
}

impl SimState {
    fn yaw_rate(&self) -> f32 {
        if self.speeds == self.zero {
            return 0.0;
        }
        let left = (self.speeds.left - self.zero.left) as f32;
        let right = (self.speeds.right - self.zero.right) as f32;
        // both offsets positive is a right spin, read as positive yaw
        (left + right) * YAW_GAIN + self.drift
    }
}

/// Shared state behind the simulated motors and gyro
#[derive(Debug, Clone)]
pub struct SimulatedBase {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBase {
    /// `zero` is where the simulated servos stop; `drift` is the yaw bias in deg/s while moving
    pub fn new(zero: WheelSpeeds, drift: f32) -> Self {
        let state = SimState {
            speeds: zero,
            zero,
            drift,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn motors(&self) -> SimMotors {
        SimMotors {
            state: Arc::clone(&self.state),
        }
    }

    pub fn gyro(&self) -> SimGyro {
        SimGyro {
            state: Arc::clone(&self.state),
        }
    }

    pub fn speeds(&self) -> WheelSpeeds {
        self.state.lock().map(|s| s.speeds).unwrap_or_default()
    }
}

pub struct SimMotors {
    state: Arc<Mutex<SimState>>,
}

impl DriveMotors for SimMotors {
    fn set_speeds(&mut self, speeds: WheelSpeeds) {
        let speeds = speeds.clamped();
        debug!("Sim wheels: left={}, right={}", speeds.left, speeds.right);
        if let Ok(mut state) = self.state.lock() {
            state.speeds = speeds;
        }
    }
}

pub struct SimGyro {
    state: Arc<Mutex<SimState>>,
}

impl RateGyro for SimGyro {
    fn rate(&mut self) -> f32 {
        self.state.lock().map(|s| s.yaw_rate()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{AngleSensor, Heading, IntegratingGyro, MotionController, TurnDirection};
    use crate::settings::Settings;

    fn base(drift: f32) -> SimulatedBase {
        SimulatedBase::new(WheelSpeeds::new(90, 90), drift)
    }

    #[test]
    fn test_straight_drive_has_no_yaw() {
        let sim = base(0.0);
        sim.motors().set_speeds(WheelSpeeds::new(165, 15));
        assert_eq!(sim.gyro().rate(), 0.0);
    }

    #[test]
    fn test_spin_has_yaw() {
        let sim = base(0.0);
        sim.motors().set_speeds(WheelSpeeds::new(165, 165));
        assert!(sim.gyro().rate() > 80.0);
        sim.motors().set_speeds(WheelSpeeds::new(15, 15));
        assert!(sim.gyro().rate() < -80.0);
    }

    #[test]
    fn test_drift_only_while_moving() {
        let sim = base(5.0);
        assert_eq!(sim.gyro().rate(), 0.0);
        sim.motors().set_speeds(WheelSpeeds::new(165, 15));
        assert_eq!(sim.gyro().rate(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_calibration_leaves_drift_visible() {
        let sim = base(5.0);
        let mut sensor = IntegratingGyro::new(sim.gyro());
        sensor.calibrate().await;
        assert_eq!(sensor.offset(), 0.0);
    }

    #[test]
    fn test_commands_are_clamped() {
        let sim = base(0.0);
        sim.motors().set_speeds(WheelSpeeds::new(200, -20));
        assert_eq!(sim.speeds(), WheelSpeeds::new(180, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_on_simulated_base() {
        let sim = base(0.0);
        let mut motion = MotionController::new(sim.motors(), IntegratingGyro::new(sim.gyro()));
        motion
            .turn(&Settings::default_robot(), TurnDirection::Right, 1)
            .await;
        assert_eq!(sim.speeds(), WheelSpeeds::new(90, 90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drift_correction_engages_on_biased_base() {
        let sim = base(5.0);
        let mut motion = MotionController::new(sim.motors(), IntegratingGyro::new(sim.gyro()));
        motion
            .drive(&Settings::default_robot(), Heading::Forward, 1)
            .await;
        assert_eq!(sim.speeds(), WheelSpeeds::new(90, 90));
        // uncorrected, the drift would have reached 5.75 degrees by the stop
        let angle = motion.sensor_mut().angle();
        assert!(angle > 5.0 && angle < 5.5, "angle {}", angle);
    }
}
