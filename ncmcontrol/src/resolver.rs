//! Identifier resolution.
//!
//! `ResourceResolver` turns an identifier into a [`Resolution`] by dispatching
//! on its route and calling the catalogue. It never touches playlist state:
//! the orchestrator decides what to do with the result.

use crate::errors::ControlError;
use crate::identifier::{Identifier, SCHEME};
use ncmcatalogue::{CatalogueClient, Page, SearchKind, Track};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_PAGE_SIZE: u32 = 100;

/// How the orchestrator must use a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Index,
    Playlist,
    DirectUrl,
    Radio,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Jump to a position of the loaded playlist.
    Index(usize),
    /// Replace the playlist, starting at `start_index` of the original order.
    /// May be empty.
    Playlist {
        tracks: Vec<Track>,
        start_index: usize,
    },
    /// One-off stream, the playlist is left alone.
    DirectUrl(String),
    /// Start the personal radio; an empty name selects the default mode.
    Radio(String),
}

impl Resolution {
    pub fn kind(&self) -> ResolutionKind {
        match self {
            Resolution::Index(_) => ResolutionKind::Index,
            Resolution::Playlist { .. } => ResolutionKind::Playlist,
            Resolution::DirectUrl(_) => ResolutionKind::DirectUrl,
            Resolution::Radio(_) => ResolutionKind::Radio,
        }
    }

    fn playlist(tracks: Vec<Track>, start_index: usize) -> Self {
        Resolution::Playlist {
            tracks,
            start_index,
        }
    }
}

/// Known routes of the `cloudmusic` scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    LocalPlaylist,
    Playlist,
    AlbumPlaylist,
    ArtistPlaylist,
    RadioPlaylist,
    Daily,
    Liked,
    Cloud,
    Fm,
    SearchName,
    SearchPlay,
    PlaySong,
    PlayList,
    PlayAlbum,
    PlaySinger,
    PlayRadio,
}

impl Route {
    fn from_path(route: &str) -> Option<Self> {
        let route = match route {
            "local/playlist" => Route::LocalPlaylist,
            "163/playlist" => Route::Playlist,
            "163/album/playlist" => Route::AlbumPlaylist,
            "163/artist/playlist" => Route::ArtistPlaylist,
            "163/radio/playlist" => Route::RadioPlaylist,
            "163/my/daily" => Route::Daily,
            "163/my/ilike" => Route::Liked,
            "163/my/cloud" => Route::Cloud,
            "163/my/fm" => Route::Fm,
            "search/name" => Route::SearchName,
            "search/play" => Route::SearchPlay,
            "play/song" => Route::PlaySong,
            "play/list" => Route::PlayList,
            "play/album" => Route::PlayAlbum,
            "play/singer" => Route::PlaySinger,
            "play/radio" => Route::PlayRadio,
            _ => return None,
        };
        Some(route)
    }
}

#[derive(Clone)]
pub struct ResourceResolver {
    catalogue: Arc<dyn CatalogueClient>,
    search_sources: Vec<String>,
}

impl ResourceResolver {
    pub fn new(catalogue: Arc<dyn CatalogueClient>) -> Self {
        Self {
            catalogue,
            search_sources: Vec::new(),
        }
    }

    /// Sources tried in order by the `search/play` route.
    pub fn with_search_sources(mut self, sources: Vec<String>) -> Self {
        self.search_sources = sources;
        self
    }

    pub async fn resolve(&self, raw: &str) -> Result<Resolution, ControlError> {
        let identifier = Identifier::parse(raw)?;
        self.resolve_identifier(&identifier).await
    }

    pub async fn resolve_identifier(
        &self,
        identifier: &Identifier,
    ) -> Result<Resolution, ControlError> {
        if identifier.is_direct_url() {
            return Ok(Resolution::DirectUrl(identifier.raw().to_string()));
        }
        if identifier.scheme() != SCHEME {
            return Err(ControlError::unsupported_identifier(identifier.raw()));
        }

        let route = Route::from_path(identifier.route())
            .ok_or_else(|| ControlError::unsupported_identifier(identifier.raw()))?;
        debug!(identifier = %identifier, ?route, "Resolving identifier");

        let start = identifier.param_or("index", 0usize);
        let catalogue = &self.catalogue;

        let resolution = match route {
            Route::LocalPlaylist => Resolution::Index(identifier.param_or("index", 0usize)),
            Route::Playlist => {
                let id = identifier.require("id")?;
                Resolution::playlist(catalogue.playlist_tracks(id).await?, start)
            }
            Route::AlbumPlaylist => {
                let id = identifier.require("id")?;
                Resolution::playlist(catalogue.album_tracks(id).await?, start)
            }
            Route::ArtistPlaylist => {
                let id = identifier.require("id")?;
                Resolution::playlist(catalogue.artist_tracks(id).await?, start)
            }
            Route::RadioPlaylist => {
                let id = identifier.require("id")?;
                let page = Page::new(
                    identifier.param_or("page", 1u32),
                    identifier.param_or("size", DEFAULT_PAGE_SIZE),
                );
                Resolution::playlist(catalogue.radio_programs(id, page).await?, start)
            }
            Route::Daily => Resolution::playlist(catalogue.daily_recommendation().await?, start),
            Route::Liked => Resolution::playlist(catalogue.liked_songs().await?, start),
            Route::Cloud => Resolution::playlist(catalogue.cloud_drive().await?, start),
            Route::Fm => Resolution::Radio(identifier.param("mode").unwrap_or_default().to_string()),
            Route::SearchName => {
                let keyword = identifier.require("kv")?;
                Resolution::playlist(catalogue.search_songs(keyword).await?, start)
            }
            Route::SearchPlay => {
                let keyword = identifier.require("kv")?;
                let tracks = self.search_fallback(keyword).await.into_iter().collect();
                Resolution::playlist(tracks, 0)
            }
            Route::PlaySong => match identifier.param("id") {
                Some(id) => Resolution::playlist(vec![catalogue.track(id).await?], 0),
                None => {
                    let keyword = identifier.require("kv")?;
                    Resolution::playlist(catalogue.search_songs(keyword).await?, 0)
                }
            },
            Route::PlayList | Route::PlayAlbum | Route::PlaySinger | Route::PlayRadio => {
                let kind = match route {
                    Route::PlayList => SearchKind::Playlist,
                    Route::PlayAlbum => SearchKind::Album,
                    Route::PlaySinger => SearchKind::Artist,
                    _ => SearchKind::Radio,
                };
                let tracks = match self.target_id(identifier, kind).await? {
                    Some(id) => self.tracks_of(kind, &id).await?,
                    None => Vec::new(),
                };
                Resolution::playlist(tracks, start)
            }
        };

        Ok(resolution)
    }

    /// `id` parameter, or the first search hit for `kv`.
    async fn target_id(
        &self,
        identifier: &Identifier,
        kind: SearchKind,
    ) -> Result<Option<String>, ControlError> {
        if let Some(id) = identifier.param("id") {
            return Ok(Some(id.to_string()));
        }
        let keyword = identifier.require("kv")?;
        let hit = self.catalogue.search(keyword, kind).await?.into_iter().next();
        match hit {
            Some(hit) => {
                info!(keyword, id = %hit.id, name = %hit.name, "Search matched");
                Ok(Some(hit.id))
            }
            None => Ok(None),
        }
    }

    async fn tracks_of(&self, kind: SearchKind, id: &str) -> Result<Vec<Track>, ControlError> {
        let tracks = match kind {
            SearchKind::Playlist => self.catalogue.playlist_tracks(id).await?,
            SearchKind::Album => self.catalogue.album_tracks(id).await?,
            SearchKind::Artist => self.catalogue.artist_tracks(id).await?,
            SearchKind::Radio => self.catalogue.radio_programs(id, Page::default()).await?,
            SearchKind::Song => vec![self.catalogue.track(id).await?],
        };
        Ok(tracks)
    }

    /// Best effort: failing sources are logged and skipped.
    async fn search_fallback(&self, keyword: &str) -> Option<Track> {
        for source in &self.search_sources {
            match self.catalogue.search_external(source, keyword).await {
                Ok(Some(track)) => {
                    info!(source = %source, keyword, track_id = %track.id, "External source matched");
                    return Some(track);
                }
                Ok(None) => debug!(source = %source, keyword, "No match"),
                Err(e) => warn!(source = %source, keyword, "External search failed: {}", e),
            }
        }
        None
    }
}
