//! # ncmcatalogue - Accès au catalogue musical distant
//!
//! Cette crate définit la capacité [`CatalogueClient`] dont dépend
//! l'orchestrateur de lecture, ainsi qu'une implémentation HTTP
//! ([`NeteaseClient`]) pour une passerelle compatible NetEase Cloud Music API.
//!
//! ## Architecture
//!
//! - `CatalogueClient` : trait asynchrone (listes, recherche, radio, streaming)
//! - `NeteaseClient` : client haut-niveau avec cache
//! - `api` : couche d'accès REST, une méthode par route
//! - `cache` : cache en mémoire avec TTL (moka)
//! - `models` : structures de données (Track, StreamUrl, SearchHit…)
//! - `config_ext` : paramètres du catalogue dans `ncmconfig::Config`
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use ncmcatalogue::{CatalogueClient, NeteaseClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ncmconfig::Config::load_config("")?;
//!     let client = NeteaseClient::from_config(&config)?;
//!
//!     for track in client.search_songs("晴天").await? {
//!         println!("{} - {}", track.artist_name, track.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;

pub use cache::CatalogueCache;
pub use client::{ClientBuilder, NeteaseClient};
pub use config_ext::CatalogueConfigExt;
pub use error::{CatalogueError, Result};
pub use models::{AudioQuality, FmMode, Page, SearchHit, SearchKind, StreamUrl, Track};

use async_trait::async_trait;

/// Capacité d'accès au catalogue
///
/// Toutes les méthodes peuvent échouer ; l'appelant décide quoi faire de
/// l'erreur (l'orchestrateur la transforme en `CatalogueUnavailable`).
#[async_trait]
pub trait CatalogueClient: Send + Sync {
    /// Détail d'une piste
    async fn track(&self, track_id: &str) -> Result<Track>;

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>>;

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>>;

    /// Titres populaires d'un artiste
    async fn artist_tracks(&self, artist_id: &str) -> Result<Vec<Track>>;

    /// Émissions d'une radio (podcast), paginées
    async fn radio_programs(&self, radio_id: &str, page: Page) -> Result<Vec<Track>>;

    async fn daily_recommendation(&self) -> Result<Vec<Track>>;

    async fn liked_songs(&self) -> Result<Vec<Track>>;

    async fn cloud_drive(&self) -> Result<Vec<Track>>;

    /// Recherche de chansons (20 résultats au plus)
    async fn search_songs(&self, keyword: &str) -> Result<Vec<Track>>;

    /// Recherche typée
    async fn search(&self, keyword: &str, kind: SearchKind) -> Result<Vec<SearchHit>>;

    /// Recherche sur une source externe
    ///
    /// Renvoie au plus une piste, avec son URL de streaming déjà résolue.
    async fn search_external(&self, source: &str, keyword: &str) -> Result<Option<Track>>;

    /// Lot de pistes du mode radio personnelle
    async fn radio_batch(&self, mode: &FmMode) -> Result<Vec<Track>>;

    /// Feedback négatif (« corbeille ») sur une piste de la radio
    async fn trash(&self, track_id: &str) -> Result<()>;

    /// URL de streaming d'une piste
    async fn stream_url(&self, track_id: &str) -> Result<StreamUrl>;
}
