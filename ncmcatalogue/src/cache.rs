//! Système de cache en mémoire pour les données du catalogue
//!
//! Ce module fournit un cache en mémoire avec TTL pour minimiser les requêtes à la passerelle.

use crate::models::{SearchHit, StreamUrl, Track};
use moka::future::Cache as MokaCache;
use std::sync::Arc;
use std::time::Duration;

/// Cache principal pour les données du catalogue
#[derive(Clone)]
pub struct CatalogueCache {
    /// Listes de pistes par clé de route (TTL: 30 minutes)
    track_lists: Arc<MokaCache<String, Vec<Track>>>,
    /// Pistes individuelles (TTL: 1 heure)
    tracks: Arc<MokaCache<String, Track>>,
    /// Résultats de recherche (TTL: 15 minutes)
    searches: Arc<MokaCache<String, Vec<SearchHit>>>,
    /// URLs de streaming (TTL: 5 minutes)
    stream_urls: Arc<MokaCache<String, StreamUrl>>,
}

impl Default for CatalogueCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogueCache {
    /// Crée un nouveau cache avec les paramètres par défaut
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Crée un nouveau cache avec une capacité spécifique
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            track_lists: Arc::new(
                MokaCache::builder()
                    .max_capacity((max_capacity / 4).max(1))
                    .time_to_live(Duration::from_secs(1800)) // 30 minutes
                    .build(),
            ),
            tracks: Arc::new(
                MokaCache::builder()
                    .max_capacity(max_capacity * 2)
                    .time_to_live(Duration::from_secs(3600)) // 1 heure
                    .build(),
            ),
            searches: Arc::new(
                MokaCache::builder()
                    .max_capacity((max_capacity / 2).max(1))
                    .time_to_live(Duration::from_secs(900)) // 15 minutes
                    .build(),
            ),
            stream_urls: Arc::new(
                MokaCache::builder()
                    .max_capacity((max_capacity / 4).max(1))
                    .time_to_live(Duration::from_secs(300)) // 5 minutes
                    .build(),
            ),
        }
    }

    // ============ Listes ============

    pub async fn get_track_list(&self, key: &str) -> Option<Vec<Track>> {
        self.track_lists.get(key).await
    }

    /// Ajoute une liste et indexe chacune de ses pistes
    pub async fn put_track_list(&self, key: String, tracks: Vec<Track>) {
        for track in &tracks {
            self.tracks.insert(track.id.clone(), track.clone()).await;
        }
        self.track_lists.insert(key, tracks).await;
    }

    pub async fn invalidate_track_list(&self, key: &str) {
        self.track_lists.invalidate(key).await;
    }

    // ============ Tracks ============

    pub async fn get_track(&self, id: &str) -> Option<Track> {
        self.tracks.get(id).await
    }

    pub async fn put_track(&self, id: String, track: Track) {
        self.tracks.insert(id, track).await;
    }

    // ============ Recherche ============

    pub async fn get_search(&self, key: &str) -> Option<Vec<SearchHit>> {
        self.searches.get(key).await
    }

    pub async fn put_search(&self, key: String, hits: Vec<SearchHit>) {
        self.searches.insert(key, hits).await;
    }

    // ============ Streaming ============

    pub async fn get_stream_url(&self, track_id: &str) -> Option<StreamUrl> {
        self.stream_urls.get(track_id).await
    }

    pub async fn put_stream_url(&self, track_id: String, url: StreamUrl) {
        self.stream_urls.insert(track_id, url).await;
    }

    /// Vide tous les caches
    pub fn clear_all(&self) {
        self.track_lists.invalidate_all();
        self.tracks.invalidate_all();
        self.searches.invalidate_all();
        self.stream_urls.invalidate_all();
    }
}
