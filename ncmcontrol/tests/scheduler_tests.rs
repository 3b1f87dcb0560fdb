mod common;

use async_trait::async_trait;
use common::{MockCatalogue, tracks};
use ncmcontrol::{
    DeviceProbe, DeviceReport, DeviceTransport, PlaybackOrchestrator, PlaybackSettings,
    TickScheduler,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SECOND: Duration = Duration::from_secs(1);

async fn playing(device: &str, duration_secs: u64) -> PlaybackOrchestrator {
    let catalogue = Arc::new(
        MockCatalogue::new().with_list("playlist:1", tracks(&["A", "B", "C"], duration_secs)),
    );
    let orchestrator =
        PlaybackOrchestrator::spawn(device, catalogue, PlaybackSettings::default().with_seed(1));
    orchestrator
        .play("cloudmusic://163/playlist?id=1")
        .await
        .unwrap();
    orchestrator
}

/// Reports "playing" for a number of probes, then "off".
struct SwitchedOffProbe {
    probes: AtomicUsize,
    playing_for: usize,
}

#[async_trait]
impl DeviceProbe for SwitchedOffProbe {
    async fn probe(&self) -> Option<DeviceReport> {
        let n = self.probes.fetch_add(1, Ordering::SeqCst);
        let transport = if n < self.playing_for {
            DeviceTransport::Playing
        } else {
            DeviceTransport::Off
        };
        Some(DeviceReport::new(transport))
    }
}

#[tokio::test(start_paused = true)]
async fn test_registered_orchestrators_are_ticked() {
    let salon = playing("salon", 200).await;
    let kitchen = playing("kitchen", 200).await;

    let scheduler = TickScheduler::start(SECOND);
    scheduler.register(salon.clone());
    scheduler.register(kitchen.clone());
    assert_eq!(scheduler.devices(), ["kitchen", "salon"]);

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(salon.now_playing().await.unwrap().position_secs, 3.0);
    assert_eq!(kitchen.now_playing().await.unwrap().position_secs, 3.0);

    assert!(scheduler.unregister("kitchen"));
    assert!(!scheduler.unregister("kitchen"));
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(salon.now_playing().await.unwrap().position_secs, 5.0);
    assert_eq!(kitchen.now_playing().await.unwrap().position_secs, 3.0);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_drives_track_changes() {
    let orchestrator = playing("salon", 3).await;
    let scheduler = TickScheduler::start(SECOND);
    scheduler.register(orchestrator.clone());

    tokio::time::sleep(Duration::from_millis(3500)).await;
    let now = orchestrator.now_playing().await.unwrap();
    assert_eq!(now.track.map(|t| t.id).as_deref(), Some("B"));

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_probe_reports_device_off() {
    let orchestrator = playing("salon", 200).await;
    let probe = Arc::new(SwitchedOffProbe {
        probes: AtomicUsize::new(0),
        playing_for: 2,
    });

    let scheduler = TickScheduler::start(SECOND);
    scheduler.register_with_probe(orchestrator.clone(), probe.clone());

    tokio::time::sleep(Duration::from_millis(3500)).await;
    let now = orchestrator.now_playing().await.unwrap();
    assert_eq!(now.track.map(|t| t.id).as_deref(), Some("B"));
    assert!(probe.probes.load(Ordering::SeqCst) >= 3);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stopped_orchestrators_are_dropped() {
    let orchestrator = playing("salon", 200).await;
    let scheduler = TickScheduler::start(SECOND);
    scheduler.register(orchestrator.clone());

    orchestrator.shutdown().await;
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert!(scheduler.devices().is_empty());
    assert!(scheduler.is_running());
    scheduler.shutdown().await;
}
