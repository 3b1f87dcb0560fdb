//! Integration tests for the catalogue HTTP client

use ncmcatalogue::{
    AudioQuality, CatalogueClient, CatalogueError, FmMode, NeteaseClient, Page, SearchKind,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn song_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "ar": [{"id": 1, "name": "Artist"}],
        "al": {"id": 2, "name": "Album", "picUrl": "http://img.example/cover.jpg"},
        "dt": 200000
    })
}

fn client_for(server: &MockServer) -> NeteaseClient {
    NeteaseClient::builder()
        .api_base(server.uri())
        .quality(AudioQuality::Lossless)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_playlist_tracks_are_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/playlist/track/all"))
        .and(query_param("id", "24381616"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "songs": [song_json(1, "One"), song_json(2, "Two")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let tracks = client.playlist_tracks("24381616").await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, "1");
    assert_eq!(tracks[1].title, "Two");
    assert_eq!(tracks[0].duration_ms, 200000);

    // Second appel servi par le cache (expect(1) vérifié au drop)
    let again = client.playlist_tracks("24381616").await.unwrap();
    assert_eq!(again, tracks);

    // Les pistes de la liste sont aussi indexées individuellement
    assert_eq!(client.track("2").await.unwrap().title, "Two");
}

#[tokio::test]
async fn test_api_code_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recommend/songs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 301,
            "msg": "需要登录"
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.daily_recommendation().await.unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_http_status_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/album"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.album_tracks("9").await.unwrap_err();
    assert!(matches!(err, CatalogueError::NotFound(_)));
}

#[tokio::test]
async fn test_album_tracks_inherit_cover() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/album"))
        .and(query_param("id", "18905"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "album": {"id": 18905, "name": "叶惠美", "picUrl": "http://img.example/album.jpg"},
            "songs": [{"id": 3, "name": "Bare", "ar": [], "dt": 1000}]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let tracks = client.album_tracks("18905").await.unwrap();
    assert_eq!(
        tracks[0].thumbnail_url.as_deref(),
        Some("http://img.example/album.jpg")
    );
}

#[tokio::test]
async fn test_radio_programs_pagination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dj/program"))
        .and(query_param("rid", "336355127"))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "programs": [{
                "name": "Episode 51",
                "coverUrl": "http://img.example/ep.jpg",
                "mainSong": song_json(51, "raw")
            }]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let tracks = client
        .radio_programs("336355127", Page::new(2, 50))
        .await
        .unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "Episode 51");
    assert_eq!(
        tracks[0].thumbnail_url.as_deref(),
        Some("http://img.example/ep.jpg")
    );
}

#[tokio::test]
async fn test_liked_songs_chain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "account": {"id": 777}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/likelist"))
        .and(query_param("uid", "777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "ids": [10, 11]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/song/detail"))
        .and(query_param("ids", "10,11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "songs": [song_json(10, "Ten"), song_json(11, "Eleven")]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let tracks = client.liked_songs().await.unwrap();
    let ids: Vec<_> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["10", "11"]);
}

#[tokio::test]
async fn test_typed_search() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cloudsearch"))
        .and(query_param("keywords", "jazz"))
        .and(query_param("type", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "result": {
                "playlists": [
                    {"id": 5, "name": "Jazz Night", "coverImgUrl": "http://img.example/p.jpg"}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let hits = client.search("jazz", SearchKind::Playlist).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "5");
    assert_eq!(hits[0].kind, SearchKind::Playlist);
}

#[tokio::test]
async fn test_stream_url_uses_quality_and_detects_unplayable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/song/url/v1"))
        .and(query_param("id", "1"))
        .and(query_param("level", "lossless"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": [{"id": 1, "url": "http://m.example/1.flac", "fee": 8}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/song/url/v1"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": [{"id": 2, "url": null, "fee": 1}]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let playable = client.stream_url("1").await.unwrap();
    assert_eq!(playable.url.as_deref(), Some("http://m.example/1.flac"));

    let vip_only = client.stream_url("2").await.unwrap();
    assert!(!vip_only.is_playable());
    assert_eq!(vip_only.fee, 1);
}

#[tokio::test]
async fn test_radio_batch_and_trash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/personal/fm/mode"))
        .and(query_param("mode", "SCENE_RCMD"))
        .and(query_param("submode", "EXERCISE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": [song_json(21, "Run"), song_json(22, "Faster")]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fm_trash"))
        .and(query_param("id", "21"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let batch = client
        .radio_batch(&FmMode::with_submode("SCENE_RCMD", "EXERCISE"))
        .await
        .unwrap();
    assert_eq!(batch.len(), 2);

    client.trash("21").await.unwrap();
}

#[tokio::test]
async fn test_search_external_attaches_matched_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cloudsearch"))
        .and(query_param("type", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "result": {"songs": [song_json(31, "Found")]}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/song/url/match"))
        .and(query_param("id", "31"))
        .and(query_param("source", "kuwo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": "http://other.example/31.mp3"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/song/url/match"))
        .and(query_param("source", "migu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": ""
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let hit = client.search_external("kuwo", "found").await.unwrap().unwrap();
    assert_eq!(hit.id, "31");
    assert_eq!(hit.stream_url.as_deref(), Some("http://other.example/31.mp3"));

    assert!(client.search_external("migu", "found").await.unwrap().is_none());
}
