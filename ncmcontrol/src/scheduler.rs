//! Process-wide tick source.
//!
//! One interval task ticks every registered orchestrator, optionally probing
//! the output device first. Orchestrators stay independent: a slow or dead
//! one only loses its own ticks.

use crate::model::DeviceReport;
use crate::orchestrator::PlaybackOrchestrator;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reads the transport state of an output device at tick time.
#[async_trait]
pub trait DeviceProbe: Send + Sync {
    /// `None` when the device cannot be queried.
    async fn probe(&self) -> Option<DeviceReport>;
}

#[derive(Clone)]
struct Registration {
    orchestrator: PlaybackOrchestrator,
    probe: Option<Arc<dyn DeviceProbe>>,
}

type Registry = Arc<RwLock<HashMap<String, Registration>>>;

pub struct TickScheduler {
    period: Duration,
    registry: Registry,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickScheduler {
    /// Starts the tick task. The first tick happens one `period` from now.
    pub fn start(period: Duration) -> Self {
        let registry: Registry = Arc::new(RwLock::new(HashMap::new()));
        let token = CancellationToken::new();

        let handle = tokio::spawn(run(period, Arc::clone(&registry), token.clone()));
        info!(period_ms = period.as_millis() as u64, "Tick scheduler started");

        Self {
            period,
            registry,
            token,
            handle: Some(handle),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks `orchestrator` without device feedback. Replaces any previous
    /// registration of the same device.
    pub fn register(&self, orchestrator: PlaybackOrchestrator) {
        self.insert(orchestrator, None);
    }

    /// Ticks `orchestrator` with the report of `probe`.
    pub fn register_with_probe(
        &self,
        orchestrator: PlaybackOrchestrator,
        probe: Arc<dyn DeviceProbe>,
    ) {
        self.insert(orchestrator, Some(probe));
    }

    /// Returns `false` when the device was not registered.
    pub fn unregister(&self, device: &str) -> bool {
        let removed = write(&self.registry).remove(device).is_some();
        if removed {
            info!(device, "Device unregistered from tick scheduler");
        }
        removed
    }

    pub fn devices(&self) -> Vec<String> {
        let mut devices: Vec<String> = read(&self.registry).keys().cloned().collect();
        devices.sort();
        devices
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Stops ticking and waits for the tick task to end.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Tick scheduler task ended abnormally: {}", e);
            }
        }
        write(&self.registry).clear();
        info!("Tick scheduler stopped");
    }

    fn insert(&self, orchestrator: PlaybackOrchestrator, probe: Option<Arc<dyn DeviceProbe>>) {
        let device = orchestrator.device().to_string();
        let previous = write(&self.registry).insert(
            device.clone(),
            Registration {
                orchestrator,
                probe,
            },
        );
        if previous.is_some() {
            debug!(device = %device, "Replacing tick registration");
        } else {
            info!(device = %device, "Device registered on tick scheduler");
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(period: Duration, registry: Registry, token: CancellationToken) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => tick_all(&registry).await,
        }
    }
}

async fn tick_all(registry: &Registry) {
    let registrations: Vec<Registration> = read(registry).values().cloned().collect();

    let reports = join_all(registrations.iter().map(|registration| async move {
        match &registration.probe {
            Some(probe) => probe.probe().await,
            None => None,
        }
    }))
    .await;

    for (registration, report) in registrations.iter().zip(reports) {
        let orchestrator = &registration.orchestrator;
        if !orchestrator.try_tick(report) && !orchestrator.is_running() {
            warn!(device = orchestrator.device(), "Orchestrator stopped, unregistering");
            write(registry).remove(orchestrator.device());
        }
    }
}

fn read(registry: &Registry) -> RwLockReadGuard<'_, HashMap<String, Registration>> {
    registry.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(registry: &Registry) -> RwLockWriteGuard<'_, HashMap<String, Registration>> {
    registry.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
