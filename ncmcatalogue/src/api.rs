//! Couche d'accès à la passerelle REST NetEase Cloud Music API
//!
//! Ce module fournit une interface bas-niveau : une méthode par route, sans
//! cache. Le cache et le trait [`crate::CatalogueClient`] sont gérés par
//! [`crate::NeteaseClient`].

use crate::error::{CatalogueError, Result};
use crate::models::{
    AudioQuality, FmMode, NeteaseProgram, NeteaseSong, NeteaseStreamUrl, Page, SearchHit,
    SearchKind, StreamUrl, Track, deserialize_id,
};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Nombre maximal de résultats conservés par recherche
pub const SEARCH_LIMIT: usize = 20;

/// Client API bas-niveau
pub struct NeteaseApi {
    client: Client,
    base_url: String,
    cookie: Option<String>,
}

impl NeteaseApi {
    /// Crée une instance à partir d'un client HTTP déjà configuré
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            cookie: None,
        }
    }

    /// Définit le cookie de session transmis à la passerelle
    pub fn set_cookie(&mut self, cookie: Option<String>) {
        self.cookie = cookie.filter(|c| !c.is_empty());
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Effectue une requête GET et vérifie le code applicatif
    pub(crate) async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);

        debug!("GET {} with {} params", url, params.len());

        let mut request = self.client.get(&url).query(params);
        if let Some(ref cookie) = self.cookie {
            request = request.query(&[("cookie", cookie.as_str())]);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Traite la réponse HTTP
    async fn handle_response(&self, response: Response) -> Result<Value> {
        let status = response.status();
        let status_code = status.as_u16();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("API error ({}): {}", status_code, error_text);
            return Err(CatalogueError::from_status_code(status_code, error_text));
        }

        let text = response.text().await?;
        let json: Value = serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            CatalogueError::JsonParse(e)
        })?;

        // La passerelle renvoie HTTP 200 avec un `code` applicatif
        if let Some(code) = json.get("code").and_then(Value::as_i64) {
            if code != 200 {
                let message = json
                    .get("message")
                    .or_else(|| json.get("msg"))
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                warn!("Catalogue API error {}: {}", code, message);
                return Err(CatalogueError::from_api_code(code, message));
            }
        }

        Ok(json)
    }

    // ============ Listes de pistes ============

    /// Toutes les pistes d'une playlist
    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let json = self
            .get("/playlist/track/all", &[("id", playlist_id.to_string())])
            .await?;
        songs_at(&json, "/songs")
    }

    /// Pistes d'un album
    pub async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>> {
        let json = self.get("/album", &[("id", album_id.to_string())]).await?;
        let mut tracks = songs_at(&json, "/songs")?;

        // Les pistes d'album n'ont pas toujours la pochette
        if let Some(cover) = json.pointer("/album/picUrl").and_then(Value::as_str) {
            for track in tracks.iter_mut().filter(|t| t.thumbnail_url.is_none()) {
                track.thumbnail_url = Some(cover.to_string());
            }
        }
        Ok(tracks)
    }

    /// Titres populaires d'un artiste
    pub async fn artist_tracks(&self, artist_id: &str) -> Result<Vec<Track>> {
        let json = self.get("/artists", &[("id", artist_id.to_string())]).await?;
        songs_at(&json, "/hotSongs")
    }

    /// Émissions d'une radio, paginées
    pub async fn radio_programs(&self, radio_id: &str, page: Page) -> Result<Vec<Track>> {
        let json = self
            .get(
                "/dj/program",
                &[
                    ("rid", radio_id.to_string()),
                    ("limit", page.size.to_string()),
                    ("offset", page.offset().to_string()),
                ],
            )
            .await?;

        let programs = match json.get("programs") {
            Some(value) => Vec::<NeteaseProgram>::deserialize(value)?,
            None => Vec::new(),
        };
        Ok(programs.into_iter().map(Track::from).collect())
    }

    /// Recommandation quotidienne
    pub async fn daily_recommendation(&self) -> Result<Vec<Track>> {
        let json = self.get("/recommend/songs", &[]).await?;
        songs_at(&json, "/data/dailySongs")
    }

    /// Identifiant du compte connecté
    pub async fn user_id(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct Account {
            #[serde(deserialize_with = "deserialize_id")]
            id: String,
        }

        let json = self.get("/user/account", &[]).await?;
        match json.get("account") {
            Some(Value::Null) | None => Err(CatalogueError::Unauthorized(
                "no account attached to the session".to_string(),
            )),
            Some(value) => Ok(Account::deserialize(value)?.id),
        }
    }

    /// IDs des titres aimés par un utilisateur
    pub async fn liked_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let json = self.get("/likelist", &[("uid", user_id.to_string())]).await?;
        let ids = json
            .get("ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(value_to_id).collect())
            .unwrap_or_default();
        Ok(ids)
    }

    /// Détail de plusieurs chansons
    pub async fn song_details(&self, ids: &[String]) -> Result<Vec<Track>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let json = self
            .get("/song/detail", &[("ids", ids.join(","))])
            .await?;
        songs_at(&json, "/songs")
    }

    /// Titres du cloud personnel
    pub async fn cloud_drive(&self) -> Result<Vec<Track>> {
        #[derive(Deserialize)]
        struct CloudItem {
            #[serde(rename = "simpleSong")]
            simple_song: NeteaseSong,
        }

        let json = self.get("/user/cloud", &[]).await?;
        let items = match json.get("data") {
            Some(value) => Vec::<CloudItem>::deserialize(value)?,
            None => Vec::new(),
        };
        Ok(items
            .into_iter()
            .map(|item| Track::from(item.simple_song))
            .collect())
    }

    // ============ Recherche ============

    /// Recherche de chansons, limitée à [`SEARCH_LIMIT`] résultats
    pub async fn search_songs(&self, keyword: &str) -> Result<Vec<Track>> {
        let json = self.cloudsearch(keyword, SearchKind::Song).await?;
        let mut tracks = songs_at(&json, "/result/songs")?;
        tracks.truncate(SEARCH_LIMIT);
        Ok(tracks)
    }

    /// Recherche typée (album, artiste, playlist, radio…)
    pub async fn search(&self, keyword: &str, kind: SearchKind) -> Result<Vec<SearchHit>> {
        let json = self.cloudsearch(keyword, kind).await?;
        let pointer = format!("/result/{}", kind.result_key());
        let hits = json
            .pointer(&pointer)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| search_hit(item, kind))
                    .take(SEARCH_LIMIT)
                    .collect()
            })
            .unwrap_or_default();
        Ok(hits)
    }

    async fn cloudsearch(&self, keyword: &str, kind: SearchKind) -> Result<Value> {
        self.get(
            "/cloudsearch",
            &[
                ("keywords", keyword.to_string()),
                ("type", kind.code().to_string()),
                ("limit", SEARCH_LIMIT.to_string()),
            ],
        )
        .await
    }

    // ============ Radio personnelle ============

    /// Lot de pistes du mode radio personnelle
    pub async fn fm_tracks(&self, mode: &FmMode) -> Result<Vec<Track>> {
        let mut params = vec![("mode", mode.mode.clone())];
        if let Some(ref submode) = mode.submode {
            params.push(("submode", submode.clone()));
        }
        let json = self.get("/personal/fm/mode", &params).await?;
        songs_at(&json, "/data")
    }

    /// Feedback négatif sur une piste de la radio
    pub async fn fm_trash(&self, track_id: &str) -> Result<()> {
        self.get("/fm_trash", &[("id", track_id.to_string())])
            .await?;
        Ok(())
    }

    // ============ Streaming ============

    /// URL de streaming d'une piste dans la qualité demandée
    pub async fn song_url(&self, track_id: &str, quality: AudioQuality) -> Result<StreamUrl> {
        let json = self
            .get(
                "/song/url/v1",
                &[
                    ("id", track_id.to_string()),
                    ("level", quality.as_str().to_string()),
                ],
            )
            .await?;

        let entries = match json.get("data") {
            Some(value) => Vec::<NeteaseStreamUrl>::deserialize(value)?,
            None => Vec::new(),
        };
        Ok(entries
            .into_iter()
            .next()
            .map(StreamUrl::from)
            .unwrap_or(StreamUrl { url: None, fee: 0 }))
    }

    /// URL de remplacement depuis une source externe
    pub async fn match_url(&self, track_id: &str, source: &str) -> Result<Option<String>> {
        let json = self
            .get(
                "/song/url/match",
                &[("id", track_id.to_string()), ("source", source.to_string())],
            )
            .await?;

        let url = match json.get("data") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(map)) => map.get("url").and_then(Value::as_str).map(String::from),
            _ => None,
        };
        Ok(url.filter(|u| !u.is_empty()))
    }
}

/// Extrait et convertit le tableau de chansons pointé par `pointer`
fn songs_at(json: &Value, pointer: &str) -> Result<Vec<Track>> {
    match json.pointer(pointer) {
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(value) => {
            let songs = Vec::<NeteaseSong>::deserialize(value)?;
            Ok(songs.into_iter().map(Track::from).collect())
        }
    }
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn search_hit(item: &Value, kind: SearchKind) -> Option<SearchHit> {
    let id = item.get("id").and_then(value_to_id)?;
    let name = item.get("name").and_then(Value::as_str)?.to_string();
    let cover_url = ["/picUrl", "/coverImgUrl", "/al/picUrl", "/img1v1Url"]
        .iter()
        .find_map(|p| item.pointer(p).and_then(Value::as_str))
        .map(String::from);
    Some(SearchHit {
        id,
        name,
        kind,
        cover_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_is_trimmed() {
        let api = NeteaseApi::new(Client::new(), "http://localhost:3000/");
        assert_eq!(api.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_songs_at_missing_pointer_is_empty() {
        let json = json!({"code": 200});
        assert!(songs_at(&json, "/songs").unwrap().is_empty());
    }

    #[test]
    fn test_search_hit_cover_lookup() {
        let item = json!({"id": 7, "name": "Jazz", "coverImgUrl": "http://img/c.jpg"});
        let hit = search_hit(&item, SearchKind::Playlist).unwrap();
        assert_eq!(hit.id, "7");
        assert_eq!(hit.cover_url.as_deref(), Some("http://img/c.jpg"));

        let nameless = json!({"id": 8});
        assert!(search_hit(&nameless, SearchKind::Album).is_none());
    }
}
