mod commands;
mod logs;

use anyhow::{Result, bail};
use commands::{HELP, HostCommand, parse_line};
use logs::LogControl;
use ncmcatalogue::{CatalogueClient, NeteaseClient};
use ncmconfig::Config;
use ncmcontrol::{
    NowPlaying, OrchestratorEvent, Outcome, PlaybackConfigExt, PlaybackOrchestrator, RadioMode,
    TickScheduler, TransportIntent,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Orchestrateurs pilotés depuis la console
struct Host {
    orchestrators: Vec<PlaybackOrchestrator>,
    current: usize,
    logs: LogControl,
}

impl Host {
    fn current(&self) -> &PlaybackOrchestrator {
        &self.orchestrators[self.current]
    }

    /// Exécute une commande ; renvoie `false` pour quitter
    async fn dispatch(&mut self, command: HostCommand) -> Result<bool> {
        let orchestrator = self.current().clone();
        let outcome = match command {
            HostCommand::Play(identifier) => orchestrator.play(&identifier).await?,
            HostCommand::Next => orchestrator.next().await?,
            HostCommand::Previous => orchestrator.previous().await?,
            HostCommand::Select(index) => orchestrator.select(index).await?,
            HostCommand::Seek(position) => orchestrator.seek_to(&position).await?,
            HostCommand::Shuffle(enabled) => orchestrator.set_shuffle(enabled).await?,
            HostCommand::Pause => orchestrator.pause().await?,
            HostCommand::Resume => orchestrator.resume().await?,
            HostCommand::Stop => orchestrator.stop().await?,
            HostCommand::Clear => orchestrator.clear_playlist().await?,
            HostCommand::Volume(level) => orchestrator.set_volume(level).await?,
            HostCommand::Mute(muted) => orchestrator.mute(muted).await?,
            HostCommand::Radio(mode) => orchestrator.play_radio(mode.as_deref()).await?,
            HostCommand::Trash => orchestrator.trash_current().await?,
            HostCommand::ExitRadio => orchestrator.exit_radio().await?,
            HostCommand::Status => {
                print_now_playing(&orchestrator.now_playing().await?);
                return Ok(true);
            }
            HostCommand::Queue => {
                let current = orchestrator.now_playing().await?.track.map(|t| t.id);
                for (index, track) in orchestrator.queue().await?.iter().enumerate() {
                    let marker = if current.as_deref() == Some(track.id.as_str()) {
                        ">"
                    } else {
                        " "
                    };
                    println!(
                        "{} {:>3}  {} - {}  (cloudmusic://local/playlist?index={})",
                        marker, index, track.artist_name, track.title, index
                    );
                }
                return Ok(true);
            }
            HostCommand::Modes => {
                for mode in RadioMode::ALL {
                    println!("  {}", mode.display_name());
                }
                return Ok(true);
            }
            HostCommand::Devices => {
                for (i, o) in self.orchestrators.iter().enumerate() {
                    let marker = if i == self.current { "*" } else { " " };
                    println!("{} {}", marker, o.device());
                }
                return Ok(true);
            }
            HostCommand::Use(device) => {
                match self.orchestrators.iter().position(|o| o.device() == device) {
                    Some(index) => {
                        self.current = index;
                        println!("Now controlling '{}'", device);
                    }
                    None => bail!("Unknown device '{}'", device),
                }
                return Ok(true);
            }
            HostCommand::Log(level) => {
                let filter = self.logs.set_level(&level)?;
                println!("Log level set to {}", filter);
                return Ok(true);
            }
            HostCommand::Help => {
                println!("{}", HELP);
                return Ok(true);
            }
            HostCommand::Quit => return Ok(false),
        };

        print_outcome(&outcome);
        Ok(true)
    }
}

fn print_outcome(outcome: &Outcome) {
    if outcome.is_noop() {
        println!("(nothing to do)");
    }
    print_now_playing(&outcome.now_playing);
}

fn print_now_playing(now: &NowPlaying) {
    let title = match &now.track {
        Some(track) => format!("{} - {}", track.artist_name, track.title),
        None => now.media_url.clone().unwrap_or_else(|| "-".to_string()),
    };
    let queue = match now.queue_position {
        Some(position) => format!("{}/{}", position + 1, now.queue_len),
        None => format!("-/{}", now.queue_len),
    };
    let radio = match &now.radio_mode {
        Some(mode) => format!(" radio={}", mode),
        None => String::new(),
    };
    println!(
        "[{}] {:?} {} {}/{} queue={} shuffle={} volume={:.2}{}{}",
        now.device,
        now.state,
        title,
        now.position_hhmmss(),
        now.duration_hhmmss(),
        queue,
        now.shuffle,
        now.volume,
        if now.muted { " (muted)" } else { "" },
        radio,
    );
}

/// Journalise les événements d'un orchestrateur, à la place d'un vrai renderer
fn spawn_event_logger(orchestrator: &PlaybackOrchestrator) {
    let mut rx = orchestrator.subscribe();
    let device = orchestrator.device().to_string();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(OrchestratorEvent::Transport { device, intent }) => match intent {
                    TransportIntent::Play { url, track } => {
                        let title = track.map(|t| t.title).unwrap_or_default();
                        info!(device = %device, url = %url, "▶️ Play {}", title);
                    }
                    other => info!(device = %device, "🎛️ {:?}", other),
                },
                Ok(OrchestratorEvent::NowPlaying(now)) => {
                    debug!(
                        device = %now.device,
                        position = %now.position_hhmmss(),
                        "Now playing {}",
                        now.title().unwrap_or("-")
                    );
                }
                Ok(OrchestratorEvent::Notice { device, message }) => {
                    warn!(device = %device, "⚠️ {}", message);
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(device = %device, "Event logger lagged, {} events missed", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(device = %device, "Event logger stopped");
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // ========== PHASE 1 : Configuration ==========
    let config_dir = std::env::args().nth(1).unwrap_or_default();
    let config = Config::load_config(&config_dir)?;
    let logs = logs::init_logging(&config);

    info!("🎵 Starting NCMusic (config in {})", config.dir());

    // ========== PHASE 2 : Catalogue et orchestrateurs ==========
    let catalogue: Arc<dyn CatalogueClient> = Arc::new(NeteaseClient::from_config(&config)?);
    let settings = config.get_playback_settings()?;
    let devices = config.get_playback_devices()?;

    let scheduler = TickScheduler::start(settings.tick_interval);
    let mut orchestrators = Vec::with_capacity(devices.len());
    for device in devices {
        let orchestrator =
            PlaybackOrchestrator::spawn(&device, catalogue.clone(), settings.clone());
        spawn_event_logger(&orchestrator);
        scheduler.register(orchestrator.clone());
        info!("📡 Device '{}' ready", device);
        orchestrators.push(orchestrator);
    }

    if orchestrators.is_empty() {
        bail!("No playback device configured");
    }

    let mut host = Host {
        orchestrators,
        current: 0,
        logs,
    };

    // ========== PHASE 3 : Boucle de commandes ==========
    info!(
        "✅ NCMusic is ready, controlling '{}' (type 'help')",
        host.current().device()
    );
    info!("Press Ctrl+C to stop...");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received");
                break;
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                };
                let command = match parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match host.dispatch(command).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("Error: {}", e),
                }
            }
        }
    }

    info!("🛑 Shutting down...");
    scheduler.shutdown().await;
    for orchestrator in &host.orchestrators {
        orchestrator.shutdown().await;
    }
    info!("👋 Bye");
    Ok(())
}
