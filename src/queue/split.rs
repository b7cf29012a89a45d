// Legacy two-channel command queue
//
// Instruction headers and their string payloads travel on separate bounded
// channels. Nothing ties a payload to its header except arrival order, so a
// payload that is dropped or late shifts every later Config/Setup onto the
// wrong data. The executor never tries to resynchronize the two channels.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{CommandSink, CommandSource, QueueError};
use crate::config::{ENQUEUE_TIMEOUT, PAYLOAD_TIMEOUT};
use crate::messages::{ConfigCommand, Instruction, Movement, SetupCommand};

/// What goes on the header channel. Config and Setup expect a payload to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    Move { movement: Movement, magnitude: i32 },
    Damage { magnitude: i32 },
    Config(ConfigCommand),
    Setup(SetupCommand),
}

/// Create the header and payload channels with independent capacities
pub fn channel(command_capacity: usize, payload_capacity: usize) -> (SplitSender, SplitReceiver) {
    let (headers_tx, headers_rx) = mpsc::channel(command_capacity);
    let (payloads_tx, payloads_rx) = mpsc::channel(payload_capacity);
    (
        SplitSender {
            headers: headers_tx,
            payloads: payloads_tx,
        },
        SplitReceiver {
            headers: headers_rx,
            payloads: payloads_rx,
            payload_timeout: PAYLOAD_TIMEOUT,
        },
    )
}

fn map_send_error<T>(err: SendTimeoutError<T>) -> QueueError {
    match err {
        SendTimeoutError::Timeout(_) => QueueError::Full,
        SendTimeoutError::Closed(_) => QueueError::Closed,
    }
}

/// Collapse a two-step submit into the legacy status flag.
///
/// The flag is inverted relative to the usual convention and is kept that
/// way for callers that still rely on it: `true` means the header was
/// queued but its payload was not (the header is now orphaned); `false`
/// means either both steps succeeded or the header itself was rejected.
pub fn legacy_status(result: &Result<(), QueueError>) -> bool {
    matches!(result, Err(QueueError::PayloadDropped))
}

#[derive(Debug, Clone)]
pub struct SplitSender {
    headers: mpsc::Sender<Header>,
    payloads: mpsc::Sender<String>,
}

impl SplitSender {
    async fn enqueue_header(&self, header: Header) -> Result<(), QueueError> {
        debug!("Adding {:?} to queue", header);
        self.headers
            .send_timeout(header, ENQUEUE_TIMEOUT)
            .await
            .map_err(|e| {
                warn!("Queue full, dropped {:?}", header);
                map_send_error(e)
            })
    }

    async fn enqueue_with_payload(&self, header: Header, payload: String) -> Result<(), QueueError> {
        self.enqueue_header(header).await?;
        if let Err(e) = self.payloads.send_timeout(payload, ENQUEUE_TIMEOUT).await {
            warn!("{} on payload queue, {:?} left without data", map_send_error(e), header);
            return Err(QueueError::PayloadDropped);
        }
        Ok(())
    }

    /// Queue a config command and its payload, reporting the legacy status flag
    pub async fn add_config_command(&self, command: ConfigCommand, payload: String) -> bool {
        legacy_status(&self.enqueue_with_payload(Header::Config(command), payload).await)
    }

    /// Queue a setup command and its payload, reporting the legacy status flag
    pub async fn add_setup_command(&self, command: SetupCommand, payload: String) -> bool {
        legacy_status(&self.enqueue_with_payload(Header::Setup(command), payload).await)
    }
}

impl CommandSink for SplitSender {
    async fn submit_movement(&self, movement: Movement, magnitude: i32) -> Result<(), QueueError> {
        self.enqueue_header(Header::Move {
            movement,
            magnitude,
        })
        .await
    }

    async fn submit_damage(&self, magnitude: i32) -> Result<(), QueueError> {
        self.enqueue_header(Header::Damage { magnitude }).await
    }

    async fn submit_config(&self, command: ConfigCommand, payload: String) -> Result<(), QueueError> {
        self.enqueue_with_payload(Header::Config(command), payload).await
    }

    async fn submit_setup(&self, command: SetupCommand, payload: String) -> Result<(), QueueError> {
        self.enqueue_with_payload(Header::Setup(command), payload).await
    }
}

#[derive(Debug)]
pub struct SplitReceiver {
    headers: mpsc::Receiver<Header>,
    payloads: mpsc::Receiver<String>,
    payload_timeout: Duration,
}

impl SplitReceiver {
    /// Take whatever payload is next in line, whoever it was meant for
    async fn next_payload(&mut self, kind: &'static str) -> Result<String, QueueError> {
        match timeout(self.payload_timeout, self.payloads.recv()).await {
            Ok(Some(payload)) => {
                info!("Payload: {}", payload);
                Ok(payload)
            }
            _ => {
                warn!("Missing or bad {} data payload", kind);
                Err(QueueError::PayloadTimeout { kind })
            }
        }
    }
}

impl CommandSource for SplitReceiver {
    async fn receive(&mut self, wait: Duration) -> Result<Instruction, QueueError> {
        let header = match timeout(wait, self.headers.recv()).await {
            Ok(Some(header)) => header,
            Ok(None) => return Err(QueueError::Closed),
            Err(_) => return Err(QueueError::Timeout),
        };

        Ok(match header {
            Header::Move {
                movement,
                magnitude,
            } => Instruction::Move {
                movement,
                magnitude,
            },
            Header::Damage { magnitude } => Instruction::Damage { magnitude },
            Header::Config(command) => Instruction::Config {
                command,
                payload: self.next_payload("config").await?,
            },
            Header::Setup(command) => Instruction::Setup {
                command,
                payload: self.next_payload("setup").await?,
            },
        })
    }
}
