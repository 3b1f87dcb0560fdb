#![allow(dead_code)]

use async_trait::async_trait;
use ncmcatalogue::{
    CatalogueClient, CatalogueError, FmMode, Page, Result, SearchHit, SearchKind, StreamUrl, Track,
};
use ncmcontrol::{OrchestratorEvent, TransportIntent};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, broadcast};

/// In-memory catalogue with call counters.
#[derive(Default)]
pub struct MockCatalogue {
    lists: Mutex<HashMap<String, Vec<Track>>>,
    hits: Mutex<HashMap<String, Vec<SearchHit>>>,
    external: Mutex<HashMap<String, Track>>,
    failing_sources: Mutex<HashSet<String>>,
    known: Mutex<HashMap<String, Track>>,
    radio_batches: Mutex<VecDeque<Vec<Track>>>,
    unplayable: Mutex<HashSet<String>>,
    last_page: Mutex<Option<Page>>,
    last_fm_mode: Mutex<Option<FmMode>>,
    trashed: Mutex<Vec<String>>,
    stream_gate: Option<Arc<Semaphore>>,
    pub radio_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
}

impl MockCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a list under `kind:id` (`playlist`, `album`, `artist`,
    /// `radio`, `daily`, `liked`, `cloud`, `search`).
    pub fn with_list(self, key: &str, tracks: Vec<Track>) -> Self {
        self.remember(&tracks);
        self.lists.lock().unwrap().insert(key.to_string(), tracks);
        self
    }

    pub fn with_hits(self, kind: SearchKind, keyword: &str, ids: &[&str]) -> Self {
        let hits = ids
            .iter()
            .map(|id| SearchHit {
                id: id.to_string(),
                name: format!("hit {}", id),
                kind,
                cover_url: None,
            })
            .collect();
        self.hits
            .lock()
            .unwrap()
            .insert(format!("{:?}:{}", kind, keyword), hits);
        self
    }

    pub fn with_external(self, source: &str, keyword: &str, track: Track) -> Self {
        self.external
            .lock()
            .unwrap()
            .insert(format!("{}:{}", source, keyword), track);
        self
    }

    pub fn with_failing_source(self, source: &str) -> Self {
        self.failing_sources.lock().unwrap().insert(source.to_string());
        self
    }

    pub fn with_radio_batch(self, tracks: Vec<Track>) -> Self {
        self.remember(&tracks);
        self.radio_batches.lock().unwrap().push_back(tracks);
        self
    }

    pub fn with_unplayable(self, ids: &[&str]) -> Self {
        let mut unplayable = self.unplayable.lock().unwrap();
        for id in ids {
            unplayable.insert(id.to_string());
        }
        drop(unplayable);
        self
    }

    /// Holds every `stream_url` call until `gate` hands out a permit.
    pub fn with_stream_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.stream_gate = Some(gate);
        self
    }

    pub fn last_page(&self) -> Option<Page> {
        *self.last_page.lock().unwrap()
    }

    pub fn last_fm_mode(&self) -> Option<FmMode> {
        self.last_fm_mode.lock().unwrap().clone()
    }

    pub fn trashed(&self) -> Vec<String> {
        self.trashed.lock().unwrap().clone()
    }

    pub fn radio_calls(&self) -> usize {
        self.radio_calls.load(Ordering::SeqCst)
    }

    fn remember(&self, tracks: &[Track]) {
        let mut known = self.known.lock().unwrap();
        for track in tracks {
            known.insert(track.id.clone(), track.clone());
        }
    }

    fn list(&self, key: String) -> Result<Vec<Track>> {
        self.lists
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(CatalogueError::NotFound(key))
    }
}

#[async_trait]
impl CatalogueClient for MockCatalogue {
    async fn track(&self, track_id: &str) -> Result<Track> {
        self.known
            .lock()
            .unwrap()
            .get(track_id)
            .cloned()
            .ok_or_else(|| CatalogueError::NotFound(track_id.to_string()))
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        self.list(format!("playlist:{}", playlist_id))
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>> {
        self.list(format!("album:{}", album_id))
    }

    async fn artist_tracks(&self, artist_id: &str) -> Result<Vec<Track>> {
        self.list(format!("artist:{}", artist_id))
    }

    async fn radio_programs(&self, radio_id: &str, page: Page) -> Result<Vec<Track>> {
        *self.last_page.lock().unwrap() = Some(page);
        self.list(format!("radio:{}", radio_id))
    }

    async fn daily_recommendation(&self) -> Result<Vec<Track>> {
        self.list("daily".to_string())
    }

    async fn liked_songs(&self) -> Result<Vec<Track>> {
        self.list("liked".to_string())
    }

    async fn cloud_drive(&self) -> Result<Vec<Track>> {
        self.list("cloud".to_string())
    }

    async fn search_songs(&self, keyword: &str) -> Result<Vec<Track>> {
        Ok(self
            .list(format!("search:{}", keyword))
            .unwrap_or_default())
    }

    async fn search(&self, keyword: &str, kind: SearchKind) -> Result<Vec<SearchHit>> {
        Ok(self
            .hits
            .lock()
            .unwrap()
            .get(&format!("{:?}:{}", kind, keyword))
            .cloned()
            .unwrap_or_default())
    }

    async fn search_external(&self, source: &str, keyword: &str) -> Result<Option<Track>> {
        if self.failing_sources.lock().unwrap().contains(source) {
            return Err(CatalogueError::Other(format!("{} is down", source)));
        }
        Ok(self
            .external
            .lock()
            .unwrap()
            .get(&format!("{}:{}", source, keyword))
            .cloned())
    }

    async fn radio_batch(&self, mode: &FmMode) -> Result<Vec<Track>> {
        self.radio_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_fm_mode.lock().unwrap() = Some(mode.clone());
        Ok(self
            .radio_batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn trash(&self, track_id: &str) -> Result<()> {
        self.trashed.lock().unwrap().push(track_id.to_string());
        Ok(())
    }

    async fn stream_url(&self, track_id: &str) -> Result<StreamUrl> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.stream_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.unplayable.lock().unwrap().contains(track_id) {
            return Ok(StreamUrl { url: None, fee: 1 });
        }
        Ok(StreamUrl {
            url: Some(stream_url_of(track_id)),
            fee: 0,
        })
    }
}

pub fn stream_url_of(track_id: &str) -> String {
    format!("http://stream.test/{}.mp3", track_id)
}

/// Tracks of `duration_secs` each, without eager stream URL.
pub fn tracks(ids: &[&str], duration_secs: u64) -> Vec<Track> {
    ids.iter()
        .map(|id| {
            Track::new(*id, format!("Song {}", id))
                .with_artist("Artist")
                .with_duration_ms(duration_secs * 1000)
        })
        .collect()
}

/// Tracks carrying their stream URL, as radio batches do.
pub fn eager_tracks(ids: &[&str], duration_secs: u64) -> Vec<Track> {
    tracks(ids, duration_secs)
        .into_iter()
        .map(|t| {
            let url = stream_url_of(&t.id);
            t.with_stream_url(url)
        })
        .collect()
}

pub fn played_id(intent: &Option<TransportIntent>) -> Option<String> {
    match intent {
        Some(TransportIntent::Play {
            track: Some(track), ..
        }) => Some(track.id.clone()),
        _ => None,
    }
}

/// Drains the events currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<OrchestratorEvent>) -> Vec<OrchestratorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Ids of the tracks started, in order, among `events`.
pub fn started_ids(events: &[OrchestratorEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            OrchestratorEvent::Transport {
                intent:
                    TransportIntent::Play {
                        track: Some(track), ..
                    },
                ..
            } => Some(track.id.clone()),
            _ => None,
        })
        .collect()
}
