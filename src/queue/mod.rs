// Command queue between producers (ingress, buttons, startup) and the single executor
//
// Two implementations share the same producer and consumer seams:
// - tagged: one channel of `Instruction`, payload carried inline (default)
// - split: the legacy header channel + payload channel, matched by position

use std::future::Future;
use std::time::Duration;

use crate::messages::{ConfigCommand, Instruction, Movement, SetupCommand};

pub mod split;
pub mod tagged;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Queue full")]
    Full,

    #[error("Nothing to receive")]
    Timeout,

    #[error("Missing or bad {kind} data payload")]
    PayloadTimeout { kind: &'static str },

    #[error("Instruction queued but its payload was dropped")]
    PayloadDropped,

    #[error("Queue closed")]
    Closed,
}

/// Producer side. Every call gives up after a short bounded wait.
pub trait CommandSink: Send + Sync {
    fn submit_movement(
        &self,
        movement: Movement,
        magnitude: i32,
    ) -> impl Future<Output = Result<(), QueueError>> + Send;

    fn submit_damage(&self, magnitude: i32) -> impl Future<Output = Result<(), QueueError>> + Send;

    fn submit_config(
        &self,
        command: ConfigCommand,
        payload: String,
    ) -> impl Future<Output = Result<(), QueueError>> + Send;

    fn submit_setup(
        &self,
        command: SetupCommand,
        payload: String,
    ) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Route an already decoded instruction to the matching submit call
    fn submit(&self, instruction: Instruction) -> impl Future<Output = Result<(), QueueError>> + Send {
        async move {
            match instruction {
                Instruction::Move {
                    movement,
                    magnitude,
                } => self.submit_movement(movement, magnitude).await,
                Instruction::Damage { magnitude } => self.submit_damage(magnitude).await,
                Instruction::Config { command, payload } => {
                    self.submit_config(command, payload).await
                }
                Instruction::Setup { command, payload } => self.submit_setup(command, payload).await,
            }
        }
    }
}

/// Consumer side, owned by the executor
pub trait CommandSource: Send {
    /// Wait up to `timeout` for the next complete instruction
    fn receive(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Instruction, QueueError>> + Send;
}
