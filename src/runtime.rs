// Zenoh ingress loop feeding the command queue, with the executor on its own task
//
// Ingress only decodes and enqueues. Anything that moves the robot or touches
// settings happens on the executor task, one instruction at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{info, warn};

use crate::config::{
    Args, COMMAND_QUEUE_CAPACITY, INGRESS_HZ, JOIN_RETRY_PAUSE, PAYLOAD_QUEUE_CAPACITY, TOPIC_CMD,
    TOPIC_DONE, TOPIC_JOIN,
};
use crate::display::LogDisplay;
use crate::executor::Executor;
use crate::messages::{BadCommand, ConfigCommand, IngressMessage, Instruction};
use crate::motion::{IntegratingGyro, MotionController, WheelSpeeds};
use crate::queue::{CommandSink, CommandSource, QueueError, split, tagged};
use crate::report::{JoinReporter, ZenohReporter};
use crate::robot::Robot;
use crate::settings::{FileStore, Settings, keys};
use crate::sim::SimulatedBase;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum IngressError {
    #[error("Failed to parse command: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rejected command: {0}")]
    Command(#[from] BadCommand),
}

/// Turn one ingress sample into an instruction ready for the queue
pub fn decode_instruction(bytes: &[u8]) -> Result<Instruction, IngressError> {
    let msg: IngressMessage = serde_json::from_slice(bytes)?;
    Ok(Instruction::try_from(msg)?)
}

/// Everything the executor owns, built before the queue flavor is chosen
struct Parts {
    robot: Robot,
    base: SimulatedBase,
    store: FileStore,
    settings: Settings,
}

pub async fn run(args: Args) -> Result<(), BoxError> {
    info!("Loading settings from {}", args.settings.display());
    let store = FileStore::new(&args.settings);
    let settings = Settings::load_or_default(&store);

    let zero = WheelSpeeds::new(
        settings.value(keys::LEFT_ZERO) as i32,
        settings.value(keys::RIGHT_ZERO) as i32,
    );
    let parts = Parts {
        robot: Robot::new(Box::new(LogDisplay), args.robot_number),
        base: SimulatedBase::new(zero, args.sim_drift),
        store,
        settings,
    };

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD).await?;
    let reporter = ZenohReporter::declare(&session).await?;
    info!("Subscribed to: {}", TOPIC_CMD);
    info!("Publishing to: {}, {}", TOPIC_DONE, TOPIC_JOIN);

    if args.positional_payloads {
        info!("Using positional payload queue");
        let (sink, source) = split::channel(COMMAND_QUEUE_CAPACITY, PAYLOAD_QUEUE_CAPACITY);
        serve(sink, source, parts, reporter, subscriber).await
    } else {
        let (sink, source) = tagged::channel(COMMAND_QUEUE_CAPACITY);
        serve(sink, source, parts, reporter, subscriber).await
    }
}

async fn serve<K, S>(
    sink: K,
    source: S,
    parts: Parts,
    reporter: ZenohReporter,
    subscriber: zenoh::pubsub::Subscriber<zenoh::handlers::FifoChannelHandler<zenoh::sample::Sample>>,
) -> Result<(), BoxError>
where
    K: CommandSink,
    S: CommandSource + 'static,
{
    let name = parts.settings.name.clone();
    let reporter = Arc::new(reporter);
    let executor = spawn_executor(source, parts, Arc::clone(&reporter)).await;
    announce(&sink, reporter.as_ref(), &name).await;

    let mut tick = interval(Duration::from_millis(1000 / INGRESS_HZ));
    info!("Ingress started: {}Hz", INGRESS_HZ);

    loop {
        tick.tick().await;

        // Drain everything pending; each sample becomes at most one instruction
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match decode_instruction(&payload) {
                Ok(instruction) => {
                    let kind = instruction.kind();
                    if let Err(e) = sink.submit(instruction).await {
                        warn!("Dropped {} command: {}", kind, e);
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }

        if executor.is_finished() {
            executor.await?;
            return Err("Command executor stopped".into());
        }
    }
}

/// Calibrate the gyro while the robot is still, then start the executor task
async fn spawn_executor<S>(source: S, parts: Parts, reporter: Arc<ZenohReporter>) -> JoinHandle<()>
where
    S: CommandSource + 'static,
{
    let mut motion = MotionController::new(
        parts.base.motors(),
        IntegratingGyro::new(parts.base.gyro()),
    );
    motion.calibrate_gyro().await;

    let mut executor = Executor::new(
        source,
        motion,
        parts.robot,
        reporter,
        Box::new(parts.store),
        parts.settings,
    );
    tokio::spawn(async move { executor.run().await })
}

/// Keep announcing the robot until the game server takes it.
///
/// Every failed attempt queues NotReady; the first success queues Ready.
/// Gives up only if the queue has no consumer left.
async fn announce<K: CommandSink, J: JoinReporter>(sink: &K, reporter: &J, name: &str) {
    loop {
        let joined = match reporter.join_game(name).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Join announcement failed: {}", e);
                false
            }
        };
        let command = if joined {
            ConfigCommand::Ready
        } else {
            ConfigCommand::NotReady
        };
        match sink.submit_config(command, String::new()).await {
            Err(QueueError::Closed) => {
                warn!("Command queue closed, no longer announcing");
                return;
            }
            Err(e) => warn!("Could not queue {:?}: {}", command, e),
            Ok(()) => {}
        }
        if joined {
            return;
        }
        sleep(JOIN_RETRY_PAUSE).await;
    }
}
