// Gyro-corrected movement primitives
//
// Every primitive runs to completion before returning. The executor awaits it,
// so nothing else is processed while the robot is moving.

use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info};

use super::drive::{DriveMotors, Heading, MotionProfile, TurnDirection};
use super::gyro::AngleSensor;
use crate::config::{DIAGNOSTIC_PAUSE, DRIVE_POLL, SETTLE_PAUSE, TURN_POLL};
use crate::messages::Movement;
use crate::settings::Settings;

pub struct MotionController<M, A> {
    motors: M,
    sensor: A,
}

impl<M: DriveMotors, A: AngleSensor> MotionController<M, A> {
    pub fn new(motors: M, sensor: A) -> Self {
        Self { motors, sensor }
    }

    pub fn motors(&self) -> &M {
        &self.motors
    }

    pub fn sensor_mut(&mut self) -> &mut A {
        &mut self.sensor
    }

    /// Re-measure the gyro's stationary offset
    pub async fn calibrate_gyro(&mut self) {
        self.sensor.calibrate().await;
    }

    /// Run one move from the game. Callers reject magnitudes below one.
    pub async fn execute(&mut self, settings: &Settings, movement: Movement, magnitude: i32) {
        info!("Moving: {:?} x{}", movement, magnitude);
        match movement {
            Movement::Left => self.turn(settings, TurnDirection::Left, magnitude).await,
            Movement::Right => self.turn(settings, TurnDirection::Right, magnitude).await,
            Movement::Forward => self.drive(settings, Heading::Forward, magnitude).await,
            Movement::Backward => self.drive(settings, Heading::Backward, magnitude).await,
            Movement::LeftLateral => self.slide(settings, TurnDirection::Left, magnitude).await,
            Movement::RightLateral => self.slide(settings, TurnDirection::Right, magnitude).await,
        }
    }

    /// Spin in place until the gyro says `magnitude` turn units have been covered
    pub async fn turn(&mut self, settings: &Settings, direction: TurnDirection, magnitude: i32) {
        let profile = MotionProfile::from_settings(settings);
        let target = profile.turn_target(magnitude);
        info!("Turning {:?} to {} degrees", direction, target);

        self.sensor.reset();
        self.motors.set_speeds(profile.turning(direction));

        let mut tick = interval_at(Instant::now() + TURN_POLL, TURN_POLL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let angle = self.sensor.angle();
            if angle.abs() >= target {
                debug!("Turn finished at {:.1} degrees", angle);
                break;
            }
            tick.tick().await;
        }

        self.stop(settings);
    }

    /// Drive straight for `magnitude` cells, steering against drift every tick
    pub async fn drive(&mut self, settings: &Settings, heading: Heading, magnitude: i32) {
        let duration = MotionProfile::from_settings(settings).drive_duration(magnitude);
        info!("Moving {:?} for {:?}", heading, duration);

        self.sensor.reset();
        let start = Instant::now();
        let mut tick = interval_at(start + DRIVE_POLL, DRIVE_POLL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while start.elapsed() < duration {
            let angle = self.sensor.angle();
            // settings are read every tick so a correction always uses the live values
            let speeds = MotionProfile::from_settings(settings).corrected(heading, angle);
            debug!("Drift {:.1}, speeds {:?}", angle, speeds);
            self.motors.set_speeds(speeds);
            tick.tick().await;
        }

        self.stop(settings);
    }

    /// Sidestep: quarter turn toward the slide, drive, quarter turn back
    pub async fn slide(&mut self, settings: &Settings, direction: TurnDirection, magnitude: i32) {
        info!("Sliding {:?} {} cells", direction, magnitude);
        self.turn(settings, direction, 1).await;
        sleep(SETTLE_PAUSE).await;
        self.drive(settings, Heading::Forward, magnitude).await;
        sleep(SETTLE_PAUSE).await;
        self.turn(settings, direction.opposite(), 1).await;
    }

    /// Forward then back, to check that the robot tracks straight
    pub async fn speed_test(&mut self, settings: &Settings) {
        info!("Running speed test");
        self.drive(settings, Heading::Forward, 3).await;
        sleep(DIAGNOSTIC_PAUSE).await;
        self.drive(settings, Heading::Backward, 3).await;
    }

    /// Exercise every primitive once
    pub async fn navigation_test(&mut self, settings: &Settings) {
        info!("Running navigation test");
        self.drive(settings, Heading::Forward, 2).await;
        sleep(DIAGNOSTIC_PAUSE).await;
        self.drive(settings, Heading::Backward, 1).await;
        sleep(DIAGNOSTIC_PAUSE).await;
        self.turn(settings, TurnDirection::Right, 1).await;
        sleep(DIAGNOSTIC_PAUSE).await;
        self.turn(settings, TurnDirection::Left, 1).await;
        sleep(DIAGNOSTIC_PAUSE).await;
        self.turn(settings, TurnDirection::Right, 2).await;
    }

    fn stop(&mut self, settings: &Settings) {
        self.motors
            .set_speeds(MotionProfile::from_settings(settings).stop());
    }
}
