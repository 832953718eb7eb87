use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tube_digest::chatwork::{ChatworkClient, MessageSink};
use tube_digest::youtube::{SearchOptions, VideoSearchProvider, YouTubeClient};
use tube_digest::DigestError;

fn youtube(server: &MockServer) -> YouTubeClient {
    YouTubeClient::new("test-key".to_string(), &server.uri(), SearchOptions::default(), 5)
        .unwrap_or_else(|e| panic!("client should build: {e}"))
}

#[tokio::test]
async fn test_search_parses_hits() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "CCNA ネットワーク"))
        .and(query_param("type", "video"))
        .and(query_param("regionCode", "JP"))
        .and(query_param("relevanceLanguage", "ja"))
        .and(query_param("maxResults", "20"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": { "kind": "youtube#video", "videoId": "vid1" },
                    "snippet": {
                        "publishedAt": "2025-05-20T10:00:00Z",
                        "channelId": "UC1",
                        "title": "CCNA 入門",
                        "description": "ネットワークの基礎",
                        "channelTitle": "Net Academy",
                        "thumbnails": {}
                    }
                },
                {
                    "id": { "kind": "youtube#channel", "channelId": "UC2" },
                    "snippet": { "title": "not a video" }
                }
            ]
        })))
        .mount(&server)
        .await;

    let hits = youtube(&server)
        .search("CCNA ネットワーク", 20)
        .await
        .unwrap_or_else(|e| panic!("search failed: {e}"));

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].video_id, "vid1");
    assert_eq!(hits[0].channel_id, "UC1");
    assert_eq!(hits[0].channel_title, "Net Academy");
    assert_eq!(hits[0].published_at, "2025-05-20T10:00:00Z");
}

#[tokio::test]
async fn test_search_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
        .mount(&server)
        .await;

    let result = youtube(&server).search("anything", 20).await;
    match result {
        Err(DigestError::Api { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("quotaExceeded"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_video_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "v1,v2"))
        .and(query_param("part", "statistics,contentDetails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "v1",
                    "statistics": { "viewCount": "12345" },
                    "contentDetails": { "duration": "PT12M3S" }
                },
                { "id": "v2" }
            ]
        })))
        .mount(&server)
        .await;

    let ids = vec!["v1".to_string(), "v2".to_string()];
    let details = youtube(&server)
        .video_details(&ids)
        .await
        .unwrap_or_else(|e| panic!("video details failed: {e}"));

    assert_eq!(details["v1"].view_count.as_deref(), Some("12345"));
    assert_eq!(details["v1"].duration.as_deref(), Some("PT12M3S"));
    assert_eq!(details["v2"].view_count, None);
    assert_eq!(details["v2"].duration, None);
}

#[tokio::test]
async fn test_channel_details_hidden_subscribers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", "UC1,UC2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "UC1", "statistics": { "subscriberCount": "54000", "hiddenSubscriberCount": false } },
                { "id": "UC2", "statistics": { "hiddenSubscriberCount": true } }
            ]
        })))
        .mount(&server)
        .await;

    let ids = vec!["UC1".to_string(), "UC2".to_string()];
    let details = youtube(&server)
        .channel_details(&ids)
        .await
        .unwrap_or_else(|e| panic!("channel details failed: {e}"));

    assert_eq!(details["UC1"].subscriber_count.as_deref(), Some("54000"));
    assert_eq!(details["UC2"].subscriber_count, None);
}

#[tokio::test]
async fn test_empty_id_list_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = youtube(&server);
    assert!(client.video_details(&[]).await.map(|d| d.is_empty()).unwrap_or(false));
    assert!(client.channel_details(&[]).await.map(|d| d.is_empty()).unwrap_or(false));
}

#[tokio::test]
async fn test_chatwork_post() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rooms/12345/messages"))
        .and(header("X-ChatWorkToken", "cw-token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("body="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message_id": "1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatworkClient::new("cw-token".to_string(), &server.uri(), 5)
        .unwrap_or_else(|e| panic!("client should build: {e}"));
    let result = client.post("12345", "今日の動画 & more").await;
    assert!(result.is_ok(), "post failed: {result:?}");
}

#[tokio::test]
async fn test_chatwork_rejected_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rooms/12345/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API token"))
        .mount(&server)
        .await;

    let client = ChatworkClient::new("bad".to_string(), &server.uri(), 5)
        .unwrap_or_else(|e| panic!("client should build: {e}"));

    match client.post("12345", "hello").await {
        Err(DigestError::Api { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "Invalid API token");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
