// Reporting back to the game server: move completion and the join announcement

use std::future::Future;
use std::sync::Arc;

use tokio::time::{Instant, timeout};
use tracing::{info, warn};

use crate::config::{REPORT_RETRIES, REPORT_WINDOW, TOPIC_DONE, TOPIC_JOIN};
use crate::messages::{JoinGame, MoveDone};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Report timed out")]
    TimedOut,
}

/// One attempt at telling the game server a move has finished
pub trait MoveReporter: Send + Sync {
    fn send_done(&self, robot: i32) -> impl Future<Output = Result<(), ReportError>> + Send;
}

impl<R: MoveReporter> MoveReporter for Arc<R> {
    fn send_done(&self, robot: i32) -> impl Future<Output = Result<(), ReportError>> + Send {
        (**self).send_done(robot)
    }
}

/// Telling the game server this robot exists
pub trait JoinReporter: Send + Sync {
    fn join_game(&self, name: &str) -> impl Future<Output = Result<(), ReportError>> + Send;
}

/// Signal move completion, retrying a few times without backoff.
///
/// Gives up after `REPORT_RETRIES` extra attempts or once `REPORT_WINDOW` has
/// passed. The outcome is only logged; the caller carries on either way.
pub async fn signal_done<R: MoveReporter>(reporter: &R, robot: i32) -> bool {
    let deadline = Instant::now() + REPORT_WINDOW;
    let mut retries = 0;

    while Instant::now() < deadline {
        info!("Sending done moving for robot {}", robot);
        let remaining = deadline.saturating_duration_since(Instant::now());
        let result = match timeout(remaining, reporter.send_done(robot)).await {
            Ok(result) => result,
            Err(_) => Err(ReportError::TimedOut),
        };

        match result {
            Ok(()) => return true,
            Err(e) => warn!("Done signal failed: {}", e),
        }

        if retries >= REPORT_RETRIES {
            break;
        }
        retries += 1;
    }

    warn!("Giving up on done signal for robot {}", robot);
    false
}

/// Publishes reports over zenoh
pub struct ZenohReporter {
    done: zenoh::pubsub::Publisher<'static>,
    join: zenoh::pubsub::Publisher<'static>,
}

impl ZenohReporter {
    pub async fn declare(
        session: &zenoh::Session,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let done = session.declare_publisher(TOPIC_DONE).await?;
        let join = session.declare_publisher(TOPIC_JOIN).await?;
        Ok(Self { done, join })
    }
}

impl JoinReporter for ZenohReporter {
    async fn join_game(&self, name: &str) -> Result<(), ReportError> {
        info!("Sending bot info for {}", name);
        let body = serde_json::to_string(&JoinGame {
            name: name.to_string(),
        })
        .map_err(|e| ReportError::Transport(e.to_string()))?;
        self.join
            .put(body)
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))
    }
}

impl MoveReporter for ZenohReporter {
    async fn send_done(&self, robot: i32) -> Result<(), ReportError> {
        let body = serde_json::to_string(&MoveDone { bot: robot })
            .map_err(|e| ReportError::Transport(e.to_string()))?;
        self.done
            .put(body)
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))
    }
}
