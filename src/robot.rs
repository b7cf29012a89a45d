// Robot face and identity: everything the executor does that is display-only

use tokio::time::sleep;
use tracing::info;

use crate::config::REACTION_HOLD;
use crate::display::{Color, Display, Image};

/// Normal play or calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotMode {
    #[default]
    Normal,
    Setup,
}

pub struct Robot {
    display: Box<dyn Display>,
    mode: RobotMode,
    current_image: Image,
    player: i32,
    robot_number: i32,
}

impl Robot {
    pub fn new(display: Box<dyn Display>, robot_number: i32) -> Self {
        Self {
            display,
            mode: RobotMode::Normal,
            current_image: Image::Clear,
            player: 0,
            robot_number,
        }
    }

    pub fn mode(&self) -> RobotMode {
        self.mode
    }

    pub fn in_setup(&self) -> bool {
        self.mode == RobotMode::Setup
    }

    pub fn current_image(&self) -> Image {
        self.current_image
    }

    pub fn player(&self) -> i32 {
        self.player
    }

    pub fn robot_number(&self) -> i32 {
        self.robot_number
    }

    /// Show an image, remembering it as the resting image when `cache` is set
    pub fn show_image(&mut self, image: Image, color: Color, cache: bool) {
        if cache {
            self.current_image = image;
        }
        self.display.show(image, color);
    }

    /// Put the resting image back after something temporary was shown
    pub fn restore_image(&mut self, color: Color) {
        self.show_image(self.current_image, color, true);
    }

    pub fn assign_player(&mut self, player: i32, robot_number: i32, color: Color) {
        info!("Assigned player {} as robot {}", player, robot_number);
        self.player = player;
        self.robot_number = robot_number;
        self.show_image(Image::digit(player), color, true);
    }

    pub fn reset(&mut self, color: Color) {
        self.player = 0;
        self.show_image(Image::Happy, color, true);
    }

    pub fn ready(&mut self, color: Color) {
        info!("Ready!");
        self.show_image(Image::Happy, color, true);
    }

    pub fn not_ready(&mut self, color: Color) {
        self.show_image(Image::Sad, color, true);
    }

    /// Tried to move but the board says no
    pub async fn blocked_move(&mut self, color: Color) {
        self.flinch(color).await;
    }

    pub async fn take_damage(&mut self, amount: i32, color: Color) {
        info!("Took damage, total {}", amount);
        self.flinch(color).await;
    }

    async fn flinch(&mut self, color: Color) {
        self.show_image(Image::Surprised, color, true);
        sleep(REACTION_HOLD).await;
        self.show_image(Image::digit(self.player), color, true);
    }

    pub fn set_mode(&mut self, mode: RobotMode, color: Color) {
        info!("Robot mode: {:?}", mode);
        self.mode = mode;
        match mode {
            RobotMode::Setup => self.show_image(Image::Duck, color, true),
            RobotMode::Normal => self.show_image(Image::Happy, color, true),
        }
    }
}
