//! Client principal pour interagir avec la passerelle
//!
//! Ce module fournit un client haut-niveau avec cache intégré qui implémente
//! [`CatalogueClient`].

use crate::api::NeteaseApi;
use crate::cache::CatalogueCache;
use crate::config_ext::CatalogueConfigExt;
use crate::error::{CatalogueError, Result};
use crate::models::*;
use crate::CatalogueClient;
use async_trait::async_trait;
use ncmconfig::Config;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_API_BASE: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_USER_AGENT: &str = "NCMusic/0.1";

/// Client haut-niveau avec cache
pub struct NeteaseClient {
    api: NeteaseApi,
    cache: Arc<CatalogueCache>,
    quality: AudioQuality,
}

impl NeteaseClient {
    /// Crée un builder
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use ncmcatalogue::NeteaseClient;
    ///
    /// # fn main() -> ncmcatalogue::Result<()> {
    /// let client = NeteaseClient::builder()
    ///     .api_base("http://127.0.0.1:3000")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Crée un client depuis un objet Config
    pub fn from_config(config: &Config) -> Result<Self> {
        let builder = Self::builder()
            .api_base(config.get_catalogue_api_url()?)
            .quality(config.get_catalogue_audio_quality()?)
            .timeout(Duration::from_secs(config.get_catalogue_timeout_secs()?))
            .cache_capacity(config.get_catalogue_cache_capacity()?);

        let builder = match config.get_catalogue_cookie()? {
            Some(cookie) => builder.cookie(cookie),
            None => builder,
        };
        builder.build()
    }

    pub fn quality(&self) -> AudioQuality {
        self.quality
    }

    /// Retourne une référence au cache
    pub fn cache(&self) -> Arc<CatalogueCache> {
        self.cache.clone()
    }

    /// Liste de pistes mise en cache sous `key`
    async fn cached_list<F, Fut>(&self, key: String, fetch: F) -> Result<Vec<Track>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Track>>>,
    {
        if let Some(tracks) = self.cache.get_track_list(&key).await {
            debug!("{} found in cache ({} tracks)", key, tracks.len());
            return Ok(tracks);
        }

        let tracks = fetch().await?;
        self.cache.put_track_list(key, tracks.clone()).await;
        Ok(tracks)
    }
}

#[async_trait]
impl CatalogueClient for NeteaseClient {
    async fn track(&self, track_id: &str) -> Result<Track> {
        if let Some(track) = self.cache.get_track(track_id).await {
            debug!("Track {} found in cache", track_id);
            return Ok(track);
        }

        let track = self
            .api
            .song_details(&[track_id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogueError::NotFound(format!("track {}", track_id)))?;
        self.cache.put_track(track_id.to_string(), track.clone()).await;
        Ok(track)
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        self.cached_list(format!("playlist:{}", playlist_id), || {
            self.api.playlist_tracks(playlist_id)
        })
        .await
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>> {
        self.cached_list(format!("album:{}", album_id), || {
            self.api.album_tracks(album_id)
        })
        .await
    }

    async fn artist_tracks(&self, artist_id: &str) -> Result<Vec<Track>> {
        self.cached_list(format!("artist:{}", artist_id), || {
            self.api.artist_tracks(artist_id)
        })
        .await
    }

    async fn radio_programs(&self, radio_id: &str, page: Page) -> Result<Vec<Track>> {
        self.cached_list(
            format!("radio:{}:{}:{}", radio_id, page.page, page.size),
            || self.api.radio_programs(radio_id, page),
        )
        .await
    }

    async fn daily_recommendation(&self) -> Result<Vec<Track>> {
        // Personnel et renouvelé chaque jour : pas de cache de liste
        self.api.daily_recommendation().await
    }

    async fn liked_songs(&self) -> Result<Vec<Track>> {
        let user_id = self.api.user_id().await?;
        let ids = self.api.liked_ids(&user_id).await?;
        info!("Loading {} liked songs for user {}", ids.len(), user_id);

        // /song/detail accepte un nombre limité d'IDs par appel
        let mut tracks = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(500) {
            tracks.extend(self.api.song_details(chunk).await?);
        }
        Ok(tracks)
    }

    async fn cloud_drive(&self) -> Result<Vec<Track>> {
        self.api.cloud_drive().await
    }

    async fn search_songs(&self, keyword: &str) -> Result<Vec<Track>> {
        self.cached_list(format!("search:{}", keyword), || {
            self.api.search_songs(keyword)
        })
        .await
    }

    async fn search(&self, keyword: &str, kind: SearchKind) -> Result<Vec<SearchHit>> {
        let key = format!("{}:{}", kind.code(), keyword);
        if let Some(hits) = self.cache.get_search(&key).await {
            return Ok(hits);
        }

        let hits = self.api.search(keyword, kind).await?;
        self.cache.put_search(key, hits.clone()).await;
        Ok(hits)
    }

    async fn search_external(&self, source: &str, keyword: &str) -> Result<Option<Track>> {
        let Some(track) = self.search_songs(keyword).await?.into_iter().next() else {
            return Ok(None);
        };

        match self.api.match_url(&track.id, source).await? {
            Some(url) => {
                info!(source, track_id = %track.id, "Matched external stream");
                Ok(Some(track.with_stream_url(url)))
            }
            None => Ok(None),
        }
    }

    async fn radio_batch(&self, mode: &FmMode) -> Result<Vec<Track>> {
        self.api.fm_tracks(mode).await
    }

    async fn trash(&self, track_id: &str) -> Result<()> {
        self.api.fm_trash(track_id).await
    }

    async fn stream_url(&self, track_id: &str) -> Result<StreamUrl> {
        if let Some(url) = self.cache.get_stream_url(track_id).await {
            debug!("Stream URL for track {} found in cache", track_id);
            return Ok(url);
        }

        let url = self.api.song_url(track_id, self.quality).await?;
        if url.is_playable() {
            self.cache
                .put_stream_url(track_id.to_string(), url.clone())
                .await;
        } else {
            warn!(track_id, fee = url.fee, "No stream URL available");
        }
        Ok(url)
    }
}

/// Builder for [`NeteaseClient`]
pub struct ClientBuilder {
    client: Option<Client>,
    api_base: String,
    request_timeout: Duration,
    user_agent: String,
    quality: AudioQuality,
    cookie: Option<String>,
    cache_capacity: u64,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            quality: AudioQuality::default(),
            cookie: None,
            cache_capacity: 1000,
        }
    }
}

impl ClientBuilder {
    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the gateway base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn quality(mut self, quality: AudioQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<NeteaseClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.request_timeout)
                .build()?,
        };

        info!(api_base = %self.api_base, quality = %self.quality, "Creating catalogue client");

        let mut api = NeteaseApi::new(client, self.api_base);
        api.set_cookie(self.cookie);

        Ok(NeteaseClient {
            api,
            cache: Arc::new(CatalogueCache::with_capacity(self.cache_capacity)),
            quality: self.quality,
        })
    }
}
