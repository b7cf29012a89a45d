// Timeouts, capacities, topics, command-line options
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

// Command queue sizing
pub const COMMAND_QUEUE_CAPACITY: usize = 5;
pub const PAYLOAD_QUEUE_CAPACITY: usize = 5;

// Producers give up on a full queue after this long
pub const ENQUEUE_TIMEOUT: Duration = Duration::from_millis(10);

// Executor cadence: receive timeout plus a fixed delay between iterations
pub const RECEIVE_TIMEOUT: Duration = Duration::from_millis(10);
pub const EXECUTOR_PERIOD: Duration = Duration::from_millis(50);

// How long a Config/Setup header waits for its payload on the positional queue
pub const PAYLOAD_TIMEOUT: Duration = Duration::from_millis(500);

// Motion control ticks
pub const TURN_POLL: Duration = Duration::from_millis(20);
pub const DRIVE_POLL: Duration = Duration::from_millis(50);

// Pause between the legs of a slide
pub const SETTLE_PAUSE: Duration = Duration::from_millis(100);

// Pause between the legs of a diagnostic drive
pub const DIAGNOSTIC_PAUSE: Duration = Duration::from_millis(1000);

// How long the surprised face stays up after damage or a blocked move
pub const REACTION_HOLD: Duration = Duration::from_millis(1000);

// Gyro offset calibration: settle, average stationary samples, hold still a little longer
pub const GYRO_CALIBRATION_SETTLE: Duration = Duration::from_millis(2000);
pub const GYRO_CALIBRATION_SAMPLES: u32 = 3000;
pub const GYRO_CALIBRATION_INTERVAL: Duration = Duration::from_millis(1);
pub const GYRO_CALIBRATION_HOLD: Duration = Duration::from_millis(1000);

// Pause between join attempts while the game server is unreachable
pub const JOIN_RETRY_PAUSE: Duration = Duration::from_secs(1);

// Subtracted from every turn target; compensates for gyro overshoot on the buggy
pub const TURN_ANGLE_OFFSET: f32 = 10.0;

// Move-done reporting
pub const REPORT_WINDOW: Duration = Duration::from_secs(5);
pub const REPORT_RETRIES: u32 = 3;

// Zenoh topics
pub const TOPIC_CMD: &str = "ruckus/cmd"; // commands from the game server / setup page
pub const TOPIC_DONE: &str = "ruckus/bot/done"; // move completion
pub const TOPIC_JOIN: &str = "ruckus/bot/join"; // join announcement

// Where tunable settings live between power cycles
pub const DEFAULT_SETTINGS_PATH: &str = "robot_config.json";

// Ingress drain rate
pub const INGRESS_HZ: u64 = 50;

/// Command-line options for the robot runtime
#[derive(Debug, Clone, Parser)]
#[command(name = "ruckus-runtime", about = "Command execution and motion control core")]
pub struct Args {
    /// JSON file holding the tunable settings
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,

    /// Robot number reported with every move-done signal until a player is assigned
    #[arg(long, default_value_t = 0)]
    pub robot_number: i32,

    /// Yaw drift of the simulated base while its wheels turn, in deg/s
    #[arg(long, default_value_t = 0.0)]
    pub sim_drift: f32,

    /// Use the legacy two-channel queue where payloads are matched by position
    #[arg(long)]
    pub positional_payloads: bool,
}
