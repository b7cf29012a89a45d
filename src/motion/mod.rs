// Motion control for the two-wheel buggy
//
// Provides:
// - Drive servo speed rules (nominal, turning, drift-corrected)
// - Yaw angle integration from a rate gyro
// - Turn / drive / slide primitives and the setup diagnostics

mod controller;
pub mod drive;
pub mod gyro;

pub use controller::MotionController;
pub use drive::{DriveMotors, Heading, MotionProfile, TurnDirection, WheelSpeeds};
pub use gyro::{AngleSampleSession, AngleSensor, IntegratingGyro, RateGyro};
