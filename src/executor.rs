// The single consumer of the command queue
//
// Pulls one instruction at a time and runs it to completion. Settings, mode
// and player identity are owned here and only ever changed from this loop,
// so producers can only ask for changes by queueing instructions.

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{EXECUTOR_PERIOD, RECEIVE_TIMEOUT};
use crate::display::{Color, Image};
use crate::messages::{ConfigCommand, Instruction, Movement, SetupCommand};
use crate::motion::{AngleSensor, DriveMotors, MotionController};
use crate::queue::{CommandSource, QueueError};
use crate::report::{MoveReporter, signal_done};
use crate::robot::{Robot, RobotMode};
use crate::settings::{Settings, SettingsStore, keys};

pub struct Executor<S, M, A, R> {
    source: S,
    motion: MotionController<M, A>,
    robot: Robot,
    reporter: R,
    store: Box<dyn SettingsStore>,
    settings: Settings,
}

impl<S, M, A, R> Executor<S, M, A, R>
where
    S: CommandSource,
    M: DriveMotors,
    A: AngleSensor,
    R: MoveReporter,
{
    pub fn new(
        source: S,
        motion: MotionController<M, A>,
        robot: Robot,
        reporter: R,
        store: Box<dyn SettingsStore>,
        settings: Settings,
    ) -> Self {
        Self {
            source,
            motion,
            robot,
            reporter,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn motion(&self) -> &MotionController<M, A> {
        &self.motion
    }

    fn color(&self) -> Color {
        Color::from_setting(self.settings.value(keys::ROBOT_COLOR))
    }

    /// Process instructions until every producer has gone away
    pub async fn run(&mut self) {
        info!("Command executor started");
        loop {
            match self.source.receive(RECEIVE_TIMEOUT).await {
                Ok(instruction) => self.execute(instruction).await,
                Err(QueueError::Timeout) => {}
                Err(QueueError::Closed) => {
                    info!("Command queue closed, executor stopping");
                    break;
                }
                // payload never arrived: the instruction is dropped as-is
                Err(e) => warn!("Dropped instruction: {}", e),
            }

            sleep(EXECUTOR_PERIOD).await;
        }
    }

    pub async fn execute(&mut self, instruction: Instruction) {
        info!("Processing {} command", instruction.kind());
        match instruction {
            Instruction::Move {
                movement,
                magnitude,
            } => self.execute_move(movement, magnitude).await,
            Instruction::Damage { magnitude } => {
                let color = self.color();
                self.robot.take_damage(magnitude, color).await;
            }
            Instruction::Config { command, payload } => {
                info!("Payload: {}", payload);
                self.execute_config(command, &payload).await;
            }
            Instruction::Setup { command, payload } => {
                self.execute_setup(command, &payload).await;
            }
        }
    }

    async fn execute_move(&mut self, movement: Movement, magnitude: i32) {
        if magnitude > 0 {
            self.motion
                .execute(&self.settings, movement, magnitude)
                .await;
        } else {
            info!("Move {:?} blocked", movement);
            let color = self.color();
            self.robot.blocked_move(color).await;
        }
        // the server waits on this whether or not the robot moved
        signal_done(&self.reporter, self.robot.robot_number()).await;
    }

    async fn execute_config(&mut self, command: ConfigCommand, payload: &str) {
        let color = self.color();
        match command {
            ConfigCommand::AssignPlayer => match parse_pair(payload) {
                Some((player, robot_number)) if player != 0 => {
                    self.robot.assign_player(player, robot_number, color);
                }
                Some(_) => info!("Player 0 is not a real assignment, ignoring"),
                None => warn!("Bad player assignment: {:?}", payload),
            },
            ConfigCommand::Reset => self.robot.reset(color),
            ConfigCommand::Ready => self.robot.ready(color),
            ConfigCommand::NotReady => self.robot.not_ready(color),
            ConfigCommand::UpdateImage => match parse_pair(payload) {
                Some((code, cache)) => match Image::from_code(code) {
                    Some(image) => self.robot.show_image(image, color, cache == 1),
                    None => warn!("Unknown image {}", code),
                },
                None => warn!("Bad image payload: {:?}", payload),
            },
            ConfigCommand::CalibrateGyro => {
                self.robot.show_image(Image::Duck, color, false);
                self.motion.calibrate_gyro().await;
                self.robot.restore_image(color);
            }
        }
    }

    async fn execute_setup(&mut self, command: SetupCommand, payload: &str) {
        match command {
            SetupCommand::Enter => {
                let color = self.color();
                self.robot.set_mode(RobotMode::Setup, color);
            }
            SetupCommand::SpeedTest => {
                if self.accept_setup_settings(payload) {
                    let color = self.color();
                    self.robot.show_image(Image::Duck, color, true);
                    self.motion.speed_test(&self.settings).await;
                }
            }
            SetupCommand::NavigationTest => {
                if self.accept_setup_settings(payload) {
                    let color = self.color();
                    self.robot.show_image(Image::Duck, color, true);
                    self.motion.navigation_test(&self.settings).await;
                }
            }
            SetupCommand::Exit => {
                if self.accept_setup_settings(payload) {
                    if let Err(e) = self.store.save(&self.settings) {
                        error!("Failed to save settings: {}", e);
                    }
                }
                // leave setup even if nothing could be saved
                let color = self.color();
                self.robot.set_mode(RobotMode::Normal, color);
            }
        }
    }

    /// Setup commands only act in setup mode and only with settings that parse
    fn accept_setup_settings(&mut self, payload: &str) -> bool {
        if !self.robot.in_setup() {
            info!("Not in setup mode, ignoring setup command");
            return false;
        }
        self.settings.update(payload).is_ok()
    }
}

/// Parse an `"a:b"` payload of two small integers
fn parse_pair(payload: &str) -> Option<(i32, i32)> {
    let (a, b) = payload.trim().split_once(':')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}
