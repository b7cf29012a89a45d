// Yaw sensing: raw rate gyro and the per-move angle integration on top of it

use std::future::Future;

use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::info;

use crate::config::{
    GYRO_CALIBRATION_HOLD, GYRO_CALIBRATION_INTERVAL, GYRO_CALIBRATION_SAMPLES,
    GYRO_CALIBRATION_SETTLE,
};

/// A single-axis rate gyro
pub trait RateGyro: Send {
    /// Yaw rate in deg/s
    fn rate(&mut self) -> f32;
}

/// Something that reports how far the robot has turned since it was last reset
pub trait AngleSensor: Send {
    /// Start a fresh measurement at zero degrees
    fn reset(&mut self);

    /// Degrees turned since the last reset
    fn angle(&mut self) -> f32;

    /// Measure the stationary offset. The robot must be still while this runs.
    fn calibrate(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Running total for one move. Discarded when the move ends.
#[derive(Debug, Clone, Copy)]
pub struct AngleSampleSession {
    started: Instant,
    previous: Instant,
    total: f32,
}

impl AngleSampleSession {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            previous: now,
            total: 0.0,
        }
    }

    /// Fold one rate sample into the total, weighted by the time since the last sample
    pub fn integrate(&mut self, rate: f32) -> f32 {
        let now = Instant::now();
        let interval = now.duration_since(self.previous).as_secs_f32();
        self.previous = now;
        self.total += rate * interval;
        self.total
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn started(&self) -> Instant {
        self.started
    }
}

/// Turns a rate gyro into an angle sensor by integrating samples per session
pub struct IntegratingGyro<G> {
    gyro: G,
    offset: f32,
    session: AngleSampleSession,
}

impl<G: RateGyro> IntegratingGyro<G> {
    pub fn new(gyro: G) -> Self {
        Self {
            gyro,
            offset: 0.0,
            session: AngleSampleSession::start(),
        }
    }

    pub fn gyro_mut(&mut self) -> &mut G {
        &mut self.gyro
    }

    /// Stationary rate subtracted from every sample, deg/s
    pub fn offset(&self) -> f32 {
        self.offset
    }

    fn corrected_rate(&mut self) -> f32 {
        self.gyro.rate() - self.offset
    }
}

impl<G: RateGyro> AngleSensor for IntegratingGyro<G> {
    fn reset(&mut self) {
        // read once so the first integrated sample starts from a fresh reading
        let _ = self.corrected_rate();
        self.session = AngleSampleSession::start();
    }

    fn angle(&mut self) -> f32 {
        let rate = self.corrected_rate();
        self.session.integrate(rate)
    }

    async fn calibrate(&mut self) {
        info!("Calculating gyro offset, do not move the robot");
        sleep(GYRO_CALIBRATION_SETTLE).await;

        let mut tick = interval_at(
            Instant::now() + GYRO_CALIBRATION_INTERVAL,
            GYRO_CALIBRATION_INTERVAL,
        );
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sum = 0.0f32;
        for _ in 0..GYRO_CALIBRATION_SAMPLES {
            sum += self.gyro.rate();
            tick.tick().await;
        }
        self.offset = sum / GYRO_CALIBRATION_SAMPLES as f32;
        info!("Gyro offset: {:.3} deg/s", self.offset);

        sleep(GYRO_CALIBRATION_HOLD).await;
        self.reset();
    }
}
