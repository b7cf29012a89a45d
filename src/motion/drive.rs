// Wheel commands and the speed rules for driving, turning and drift correction
//
// The drive servos are continuous-rotation hobby servos: each takes a value in
// 0..=180 where its zero point (about 90) stops it. The two servos face opposite
// ways, so "forward" is above zero on the left wheel and below zero on the right.

use std::time::Duration;

use crate::config::TURN_ANGLE_OFFSET;
use crate::settings::{Settings, keys};

/// Lowest and highest value a drive servo accepts
pub const SERVO_MIN: i32 = 0;
pub const SERVO_MAX: i32 = 180;

/// The two drive servos
pub trait DriveMotors: Send {
    fn set_speeds(&mut self, speeds: WheelSpeeds);
}

/// Raw servo commands for both wheels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelSpeeds {
    pub left: i32,
    pub right: i32,
}

impl WheelSpeeds {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Clamp both wheels into the range the servos accept
    pub fn clamped(self) -> Self {
        Self {
            left: self.left.clamp(SERVO_MIN, SERVO_MAX),
            right: self.right.clamp(SERVO_MIN, SERVO_MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    pub fn opposite(self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

/// The settings motion control reads, pulled out of the settings map in one go
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    pub left_forward: f32,
    pub right_forward: f32,
    pub left_backward: f32,
    pub right_backward: f32,
    pub left_zero: f32,
    pub right_zero: f32,
    pub linear_time_ms: f32,
    pub drift: f32,
    pub drift_boost: f32,
    pub turn_angle: f32,
}

impl MotionProfile {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            left_forward: settings.value(keys::LEFT_FORWARD_SPEED),
            right_forward: settings.value(keys::RIGHT_FORWARD_SPEED),
            left_backward: settings.value(keys::LEFT_BACKWARD_SPEED),
            right_backward: settings.value(keys::RIGHT_BACKWARD_SPEED),
            left_zero: settings.value(keys::LEFT_ZERO),
            right_zero: settings.value(keys::RIGHT_ZERO),
            linear_time_ms: settings.value(keys::LINEAR_TIME),
            drift: settings.value(keys::DRIFT),
            drift_boost: settings.value(keys::DRIFT_BOOST),
            turn_angle: settings.value(keys::TURN_ANGLE),
        }
    }

    pub fn stop(&self) -> WheelSpeeds {
        WheelSpeeds::new(self.left_zero as i32, self.right_zero as i32)
    }

    pub fn nominal(&self, heading: Heading) -> WheelSpeeds {
        match heading {
            Heading::Forward => {
                WheelSpeeds::new(self.left_forward as i32, self.right_forward as i32)
            }
            Heading::Backward => {
                WheelSpeeds::new(self.left_backward as i32, self.right_backward as i32)
            }
        }
    }

    /// Spin in place: one wheel forward, the other backward
    pub fn turning(&self, direction: TurnDirection) -> WheelSpeeds {
        match direction {
            TurnDirection::Right => {
                WheelSpeeds::new(self.left_forward as i32, self.right_backward as i32)
            }
            TurnDirection::Left => {
                WheelSpeeds::new(self.left_backward as i32, self.right_forward as i32)
            }
        }
    }

    /// Wheel speeds for one drive tick given the angle turned so far.
    ///
    /// Past the drift limit one wheel is nudged by the drift boost to steer
    /// back onto the line. Which wheel, and in which direction, flips between
    /// forward and backward travel because the wheels swap roles.
    pub fn corrected(&self, heading: Heading, angle: f32) -> WheelSpeeds {
        let (left, right) = match heading {
            Heading::Forward => {
                if angle > self.drift {
                    (self.left_forward, self.right_forward - self.drift_boost)
                } else if angle < -self.drift {
                    (self.left_forward + self.drift_boost, self.right_forward)
                } else {
                    (self.left_forward, self.right_forward)
                }
            }
            Heading::Backward => {
                if angle > self.drift {
                    (self.left_backward - self.drift_boost, self.right_backward)
                } else if angle < -self.drift {
                    (self.left_backward, self.right_backward + self.drift_boost)
                } else {
                    (self.left_backward, self.right_backward)
                }
            }
        };
        WheelSpeeds::new(left as i32, right as i32)
    }

    /// Angle a turn of `magnitude` units runs until, whole degrees
    pub fn turn_target(&self, magnitude: i32) -> f32 {
        (self.turn_angle * magnitude as f32 - TURN_ANGLE_OFFSET).trunc()
    }

    /// How long a straight drive of `magnitude` cells lasts
    pub fn drive_duration(&self, magnitude: i32) -> Duration {
        let millis = (self.linear_time_ms * magnitude as f32).max(0.0);
        Duration::from_millis(millis as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> MotionProfile {
        MotionProfile::from_settings(&Settings::default_robot())
    }

    #[test]
    fn test_forward_drift_correction() {
        let p = profile();
        // drifting positive: right wheel slowed
        assert_eq!(p.corrected(Heading::Forward, 6.0), WheelSpeeds::new(165, 5));
        // drifting negative: left wheel boosted
        assert_eq!(p.corrected(Heading::Forward, -6.0), WheelSpeeds::new(175, 15));
        // inside the band, and exactly on the limit
        assert_eq!(p.corrected(Heading::Forward, 5.0), WheelSpeeds::new(165, 15));
        assert_eq!(p.corrected(Heading::Forward, -1.0), p.nominal(Heading::Forward));
    }

    #[test]
    fn test_backward_drift_correction() {
        let p = profile();
        assert_eq!(p.corrected(Heading::Backward, 6.0), WheelSpeeds::new(5, 165));
        assert_eq!(p.corrected(Heading::Backward, -6.0), WheelSpeeds::new(15, 175));
        assert_eq!(p.corrected(Heading::Backward, 0.0), WheelSpeeds::new(15, 165));
    }

    #[test]
    fn test_turn_speeds_mirror() {
        let p = profile();
        assert_eq!(p.turning(TurnDirection::Right), WheelSpeeds::new(165, 165));
        assert_eq!(p.turning(TurnDirection::Left), WheelSpeeds::new(15, 15));
        assert_eq!(TurnDirection::Left.opposite(), TurnDirection::Right);
    }

    #[test]
    fn test_turn_target_subtracts_offset() {
        let mut p = profile();
        assert_eq!(p.turn_target(1), 80.0);
        assert_eq!(p.turn_target(2), 170.0);
        p.turn_angle = 87.5;
        assert_eq!(p.turn_target(1), 77.0);
    }

    #[test]
    fn test_drive_duration_scales_with_cells() {
        let p = profile();
        assert_eq!(p.drive_duration(1), Duration::from_millis(1200));
        assert_eq!(p.drive_duration(3), Duration::from_millis(3600));
        assert_eq!(p.drive_duration(-2), Duration::ZERO);
    }

    #[test]
    fn test_clamp_to_servo_range() {
        assert_eq!(WheelSpeeds::new(190, -5).clamped(), WheelSpeeds::new(180, 0));
    }
}
