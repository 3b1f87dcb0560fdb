//! Modèles de données du catalogue
//!
//! Les structures `Netease*` reflètent le JSON brut de la passerelle ; elles
//! sont converties en [`Track`] avant de sortir de la crate.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Désérialise un ID qui peut être soit un nombre soit une chaîne
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("ID must be a string or number")),
    }
}

/// Piste jouable, valeur immuable
///
/// L'égalité et le hachage ne portent que sur `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist_name: String,
    pub album_name: String,
    /// Durée en millisecondes (0 si inconnue)
    pub duration_ms: u64,
    /// URL de streaming déjà résolue, sinon résolue à la demande
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist_name: String::new(),
            album_name: String::new(),
            duration_ms: 0,
            stream_url: None,
            thumbnail_url: None,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist_name = artist.into();
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album_name = album.into();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Durée en secondes
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Résultat de la résolution d'une URL de streaming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamUrl {
    /// Absente quand la piste n'est pas jouable pour ce compte
    pub url: Option<String>,
    /// 0/8 gratuit, 1 VIP, 4 achat
    #[serde(default)]
    pub fee: i64,
}

impl StreamUrl {
    pub fn is_playable(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Type de recherche (valeurs du paramètre `type` de `/cloudsearch`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchKind {
    Song,
    Album,
    Artist,
    Playlist,
    Radio,
}

impl SearchKind {
    pub fn code(self) -> u32 {
        match self {
            SearchKind::Song => 1,
            SearchKind::Album => 10,
            SearchKind::Artist => 100,
            SearchKind::Playlist => 1000,
            SearchKind::Radio => 1009,
        }
    }

    /// Clé du tableau de résultats dans `result`
    pub(crate) fn result_key(self) -> &'static str {
        match self {
            SearchKind::Song => "songs",
            SearchKind::Album => "albums",
            SearchKind::Artist => "artists",
            SearchKind::Playlist => "playlists",
            SearchKind::Radio => "djRadios",
        }
    }
}

/// Un résultat de recherche typé
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub kind: SearchKind,
    pub cover_url: Option<String>,
}

/// Qualité audio demandée à `/song/url/v1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    Standard,
    Higher,
    #[default]
    Exhigh,
    Lossless,
    Hires,
    Jyeffect,
    Sky,
    Dolby,
    Jymaster,
}

impl AudioQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioQuality::Standard => "standard",
            AudioQuality::Higher => "higher",
            AudioQuality::Exhigh => "exhigh",
            AudioQuality::Lossless => "lossless",
            AudioQuality::Hires => "hires",
            AudioQuality::Jyeffect => "jyeffect",
            AudioQuality::Sky => "sky",
            AudioQuality::Dolby => "dolby",
            AudioQuality::Jymaster => "jymaster",
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(AudioQuality::Standard),
            "higher" => Ok(AudioQuality::Higher),
            "exhigh" => Ok(AudioQuality::Exhigh),
            "lossless" => Ok(AudioQuality::Lossless),
            "hires" => Ok(AudioQuality::Hires),
            "jyeffect" => Ok(AudioQuality::Jyeffect),
            "sky" => Ok(AudioQuality::Sky),
            "dolby" => Ok(AudioQuality::Dolby),
            "jymaster" => Ok(AudioQuality::Jymaster),
            other => Err(format!("unknown audio quality '{}'", other)),
        }
    }
}

/// Paramètres du mode radio personnelle (`/personal/fm/mode`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FmMode {
    pub mode: String,
    pub submode: Option<String>,
}

impl FmMode {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            submode: None,
        }
    }

    pub fn with_submode(mode: impl Into<String>, submode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            submode: Some(submode.into()),
        }
    }
}

/// Pagination 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page.max(1) - 1) * self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, 100)
    }
}

// ============ JSON brut de la passerelle ============

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NeteaseArtistRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NeteaseAlbumRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "picUrl")]
    pub pic_url: Option<String>,
}

/// Chanson telle que renvoyée par `/song/detail`, `/playlist/track/all`…
///
/// Les anciennes routes utilisent `artists`/`album`/`duration`, les
/// nouvelles `ar`/`al`/`dt`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NeteaseSong {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "artists")]
    pub ar: Vec<NeteaseArtistRef>,
    #[serde(default, alias = "album")]
    pub al: Option<NeteaseAlbumRef>,
    #[serde(default, alias = "duration")]
    pub dt: u64,
}

impl From<NeteaseSong> for Track {
    fn from(song: NeteaseSong) -> Self {
        let artist_name = song
            .ar
            .iter()
            .filter_map(|a| a.name.as_deref())
            .collect::<Vec<_>>()
            .join("/");
        let (album_name, thumbnail_url) = match song.al {
            Some(al) => (al.name.unwrap_or_default(), al.pic_url),
            None => (String::new(), None),
        };
        Track {
            id: song.id,
            title: song.name,
            artist_name,
            album_name,
            duration_ms: song.dt,
            stream_url: None,
            thumbnail_url,
        }
    }
}

/// Émission d'une radio (`/dj/program`)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NeteaseProgram {
    #[serde(rename = "mainSong")]
    pub main_song: NeteaseSong,
    #[serde(default, rename = "coverUrl")]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<NeteaseProgram> for Track {
    fn from(program: NeteaseProgram) -> Self {
        let cover = program.cover_url.clone();
        let mut track = Track::from(program.main_song);
        if let Some(name) = program.name {
            track.title = name;
        }
        if cover.is_some() {
            track.thumbnail_url = cover;
        }
        track
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NeteaseStreamUrl {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub fee: i64,
}

impl From<NeteaseStreamUrl> for StreamUrl {
    fn from(raw: NeteaseStreamUrl) -> Self {
        StreamUrl {
            url: raw.url.filter(|u| !u.is_empty()),
            fee: raw.fee,
        }
    }
}
