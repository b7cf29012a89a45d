// Single-channel command queue: each instruction carries its own payload

use std::time::Duration;

use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{CommandSink, CommandSource, QueueError};
use crate::config::ENQUEUE_TIMEOUT;
use crate::messages::{ConfigCommand, Instruction, Movement, SetupCommand};

/// Create a bounded queue with the given capacity
pub fn channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Cloneable handle for every producer
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Instruction>,
}

impl CommandSender {
    async fn enqueue(&self, instruction: Instruction) -> Result<(), QueueError> {
        debug!("Adding {} command to queue", instruction.kind());
        match self.tx.send_timeout(instruction, ENQUEUE_TIMEOUT).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(rejected)) => {
                warn!("Queue full, dropped {:?}", rejected);
                Err(QueueError::Full)
            }
            Err(SendTimeoutError::Closed(_)) => Err(QueueError::Closed),
        }
    }
}

impl CommandSink for CommandSender {
    async fn submit_movement(&self, movement: Movement, magnitude: i32) -> Result<(), QueueError> {
        self.enqueue(Instruction::Move {
            movement,
            magnitude,
        })
        .await
    }

    async fn submit_damage(&self, magnitude: i32) -> Result<(), QueueError> {
        self.enqueue(Instruction::Damage { magnitude }).await
    }

    async fn submit_config(&self, command: ConfigCommand, payload: String) -> Result<(), QueueError> {
        self.enqueue(Instruction::Config { command, payload }).await
    }

    async fn submit_setup(&self, command: SetupCommand, payload: String) -> Result<(), QueueError> {
        self.enqueue(Instruction::Setup { command, payload }).await
    }
}

#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::Receiver<Instruction>,
}

impl CommandSource for CommandReceiver {
    async fn receive(&mut self, wait: Duration) -> Result<Instruction, QueueError> {
        match timeout(wait, self.rx.recv()).await {
            Ok(Some(instruction)) => Ok(instruction),
            Ok(None) => Err(QueueError::Closed),
            Err(_) => Err(QueueError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{COMMAND_QUEUE_CAPACITY, RECEIVE_TIMEOUT};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fifo_across_kinds() {
        let (tx, mut rx) = channel(COMMAND_QUEUE_CAPACITY);
        tx.submit_movement(Movement::Forward, 1).await.unwrap();
        tx.submit_damage(2).await.unwrap();
        tx.submit_movement(Movement::Left, 3).await.unwrap();

        let received = [
            rx.receive(RECEIVE_TIMEOUT).await.unwrap(),
            rx.receive(RECEIVE_TIMEOUT).await.unwrap(),
            rx.receive(RECEIVE_TIMEOUT).await.unwrap(),
        ];
        assert_eq!(
            received,
            [
                Instruction::Move {
                    movement: Movement::Forward,
                    magnitude: 1
                },
                Instruction::Damage { magnitude: 2 },
                Instruction::Move {
                    movement: Movement::Left,
                    magnitude: 3
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_fails_fast() {
        let (tx, _rx) = channel(COMMAND_QUEUE_CAPACITY);
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            tx.submit_damage(1).await.unwrap();
        }

        let start = Instant::now();
        let result = tx.submit_movement(Movement::Forward, 1).await;
        let waited = start.elapsed();

        assert_eq!(result, Err(QueueError::Full));
        assert!(waited >= ENQUEUE_TIMEOUT);
        assert!(waited < ENQUEUE_TIMEOUT * 2, "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_stays_with_instruction() {
        let (tx, mut rx) = channel(COMMAND_QUEUE_CAPACITY);
        tx.submit_config(ConfigCommand::UpdateImage, "13:1".to_string())
            .await
            .unwrap();
        tx.submit_setup(SetupCommand::Exit, "{}".to_string())
            .await
            .unwrap();

        assert_eq!(
            rx.receive(RECEIVE_TIMEOUT).await.unwrap(),
            Instruction::Config {
                command: ConfigCommand::UpdateImage,
                payload: "13:1".to_string()
            }
        );
        assert_eq!(
            rx.receive(RECEIVE_TIMEOUT).await.unwrap(),
            Instruction::Setup {
                command: SetupCommand::Exit,
                payload: "{}".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_producers_all_arrive() {
        let (tx, mut rx) = channel(COMMAND_QUEUE_CAPACITY);
        let mut handles = Vec::new();
        for i in 0..4 {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move { tx.submit_damage(i).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut magnitudes = Vec::new();
        while let Ok(Instruction::Damage { magnitude }) = rx.receive(RECEIVE_TIMEOUT).await {
            magnitudes.push(magnitude);
        }
        magnitudes.sort();
        assert_eq!(magnitudes, vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_reports_timeout_then_closed() {
        let (tx, mut rx) = channel(COMMAND_QUEUE_CAPACITY);
        assert_eq!(rx.receive(RECEIVE_TIMEOUT).await, Err(QueueError::Timeout));
        drop(tx);
        assert_eq!(rx.receive(RECEIVE_TIMEOUT).await, Err(QueueError::Closed));
    }
}
