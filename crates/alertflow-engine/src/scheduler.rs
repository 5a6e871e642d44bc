use crate::service::AlertService;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

/// Periodic evaluation loop driving the engine's background phases.
///
/// Owned by the service lifecycle rather than free-running: `run` exits
/// when the shutdown receiver fires, and [`spawn`] packages the loop with
/// a handle that signals shutdown and awaits the task.
pub struct EvaluationScheduler {
    service: Arc<AlertService>,
    tick: Duration,
}

impl EvaluationScheduler {
    pub fn new(service: Arc<AlertService>, tick_secs: u64) -> Self {
        Self {
            service,
            tick: Duration::from_secs(tick_secs),
        }
    }

    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(tick_secs = self.tick.as_secs(), "Evaluation scheduler started");

        let mut tick = interval(self.tick);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.service.run_tick();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Evaluation scheduler shutting down");
                    break;
                }
            }
        }
    }
}

/// Handle to a spawned scheduler task.
pub struct SchedulerHandle {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}

/// Spawn the evaluation loop on the current runtime.
pub fn spawn(service: Arc<AlertService>, tick_secs: u64) -> SchedulerHandle {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let scheduler = EvaluationScheduler::new(service, tick_secs);
    let task = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });
    SchedulerHandle {
        shutdown: shutdown_tx,
        task,
    }
}
