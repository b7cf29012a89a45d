// Message types for the runtime: queued instructions and their wire forms

use serde::{Deserialize, Serialize};

/// A discrete move requested by the game server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Left,
    Right,
    Forward,
    Backward,
    LeftLateral,
    RightLateral,
}

/// Game configuration commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigCommand {
    AssignPlayer,
    Reset,
    Ready,
    NotReady,
    UpdateImage,
    /// Re-measure the gyro offset; the robot has to stand still
    CalibrateGyro,
}

/// Commands accepted while calibrating the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupCommand {
    Enter,
    SpeedTest,
    NavigationTest,
    Exit,
}

/// One unit of work for the executor.
///
/// Config and Setup carry their payload inline, so an instruction and its
/// data are always enqueued and dequeued together.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Move { movement: Movement, magnitude: i32 },
    Damage { magnitude: i32 },
    Config { command: ConfigCommand, payload: String },
    Setup { command: SetupCommand, payload: String },
}

impl Instruction {
    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::Move { .. } => "movement",
            Instruction::Damage { .. } => "damage",
            Instruction::Config { .. } => "config",
            Instruction::Setup { .. } => "setup",
        }
    }
}

/// A numeric code that does not name any known command
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} code {code}")]
pub struct BadCommand {
    pub what: &'static str,
    pub code: i32,
}

impl TryFrom<i32> for Movement {
    type Error = BadCommand;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Movement::Left),
            1 => Ok(Movement::Right),
            2 => Ok(Movement::Forward),
            3 => Ok(Movement::Backward),
            4 => Ok(Movement::LeftLateral),
            5 => Ok(Movement::RightLateral),
            _ => Err(BadCommand {
                what: "movement",
                code,
            }),
        }
    }
}

impl TryFrom<i32> for ConfigCommand {
    type Error = BadCommand;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ConfigCommand::AssignPlayer),
            1 => Ok(ConfigCommand::Reset),
            2 => Ok(ConfigCommand::Ready),
            3 => Ok(ConfigCommand::NotReady),
            4 => Ok(ConfigCommand::UpdateImage),
            5 => Ok(ConfigCommand::CalibrateGyro),
            _ => Err(BadCommand {
                what: "config",
                code,
            }),
        }
    }
}

impl TryFrom<i32> for SetupCommand {
    type Error = BadCommand;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SetupCommand::Enter),
            1 => Ok(SetupCommand::SpeedTest),
            2 => Ok(SetupCommand::NavigationTest),
            3 => Ok(SetupCommand::Exit),
            _ => Err(BadCommand { what: "setup", code }),
        }
    }
}

// Command from the game server / setup page -> runtime
// Codes stay numeric on the wire, matching the form fields the server already sends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngressMessage {
    Move {
        #[serde(rename = "move")]
        movement: i32,
        magnitude: i32,
    },
    Damage {
        magnitude: i32,
    },
    Config {
        command: i32,
        #[serde(default)]
        payload: String,
    },
    Setup {
        option: i32,
        parameters: String,
    },
}

impl TryFrom<IngressMessage> for Instruction {
    type Error = BadCommand;

    fn try_from(msg: IngressMessage) -> Result<Self, Self::Error> {
        Ok(match msg {
            IngressMessage::Move {
                movement,
                magnitude,
            } => Instruction::Move {
                movement: movement.try_into()?,
                magnitude,
            },
            IngressMessage::Damage { magnitude } => Instruction::Damage { magnitude },
            IngressMessage::Config { command, payload } => Instruction::Config {
                command: command.try_into()?,
                payload,
            },
            IngressMessage::Setup { option, parameters } => Instruction::Setup {
                command: option.try_into()?,
                payload: parameters,
            },
        })
    }
}

/// Move completion, runtime -> game server
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MoveDone {
    pub bot: i32,
}

/// Join announcement, runtime -> game server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinGame {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_message_decodes() {
        let msg: IngressMessage =
            serde_json::from_str(r#"{"type":"move","move":2,"magnitude":3}"#).unwrap();
        let instruction = Instruction::try_from(msg).unwrap();
        assert_eq!(
            instruction,
            Instruction::Move {
                movement: Movement::Forward,
                magnitude: 3
            }
        );
    }

    #[test]
    fn test_config_payload_defaults_to_empty() {
        let msg: IngressMessage = serde_json::from_str(r#"{"type":"config","command":1}"#).unwrap();
        let instruction = Instruction::try_from(msg).unwrap();
        assert_eq!(
            instruction,
            Instruction::Config {
                command: ConfigCommand::Reset,
                payload: String::new()
            }
        );
    }

    #[test]
    fn test_setup_parameters_become_payload() {
        let msg: IngressMessage =
            serde_json::from_str(r#"{"type":"setup","option":3,"parameters":"{}"}"#).unwrap();
        match Instruction::try_from(msg).unwrap() {
            Instruction::Setup { command, payload } => {
                assert_eq!(command, SetupCommand::Exit);
                assert_eq!(payload, "{}");
            }
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[test]
    fn test_unknown_codes_are_rejected() {
        let bad = IngressMessage::Move {
            movement: 6,
            magnitude: 1,
        };
        assert_eq!(
            Instruction::try_from(bad),
            Err(BadCommand {
                what: "movement",
                code: 6
            })
        );
        assert!(ConfigCommand::try_from(-1).is_err());
        assert!(ConfigCommand::try_from(6).is_err());
        assert_eq!(ConfigCommand::try_from(5), Ok(ConfigCommand::CalibrateGyro));
        assert!(SetupCommand::try_from(4).is_err());
    }

    #[test]
    fn test_unknown_message_type_fails_to_parse() {
        let parsed = serde_json::from_str::<IngressMessage>(r#"{"type":"dance","magnitude":1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_move_done_wire_shape() {
        let json = serde_json::to_string(&MoveDone { bot: 4 }).unwrap();
        assert_eq!(json, r#"{"bot":4}"#);
    }
}
