//! YouTube playlist catalog fetcher.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::sync::provider_error;

/// A playlist entry normalized for the sync pipeline
#[derive(Debug, Clone)]
pub struct VideoCandidate {
    pub title: String,
    pub video_id: String,
    /// Canonical watch URL constructed from the video id; this is the
    /// external identifier used for deduplication
    pub youtube_url: String,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    published_at: String,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    #[serde(rename = "default")]
    fallback: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Build the canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Extract the 11-character video id from a watch/share/embed URL.
/// Used when an administrator registers a sermon by pasting a link.
pub fn video_id_from_url(url: &str) -> Option<String> {
    for marker in ["watch?v=", "youtu.be/", "embed/", "&v="] {
        if let Some(pos) = url.find(marker) {
            let rest = &url[pos + marker.len()..];
            let id: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect();
            if id.len() == 11 {
                return Some(id);
            }
        }
    }
    None
}

/// Fetch every item of a playlist, following continuation tokens until the
/// provider reports no more pages. Returns candidates sorted newest-first
/// by publish timestamp.
pub async fn fetch_playlist(
    http: &reqwest::Client,
    api_base: &str,
    api_key: &str,
    playlist_id: &str,
) -> Result<Vec<VideoCandidate>> {
    if api_key.is_empty() {
        return Err(Error::Config("google_api_key is not set".to_string()));
    }
    if playlist_id.is_empty() {
        return Err(Error::Config("playlist id is not set".to_string()));
    }

    let mut candidates = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut url = format!(
            "{}/youtube/v3/playlistItems?part=snippet&maxResults=50&playlistId={}&key={}",
            api_base, playlist_id, api_key
        );
        if let Some(token) = &page_token {
            url.push_str("&pageToken=");
            url.push_str(token);
        }

        let response = http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let page: PlaylistPage = response.json().await?;
        tracing::debug!(
            "Playlist {} page returned {} item(s)",
            playlist_id,
            page.items.len()
        );

        for item in page.items {
            candidates.push(normalize(item));
        }

        page_token = page.next_page_token;
        if page_token.is_none() {
            break;
        }
    }

    candidates.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(candidates)
}

fn normalize(item: PlaylistItem) -> VideoCandidate {
    let snippet = item.snippet;
    let video_id = snippet.resource_id.video_id;
    let published_at = DateTime::parse_from_rfc3339(&snippet.published_at)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let thumbnail_url = snippet
        .thumbnails
        .high
        .or(snippet.thumbnails.medium)
        .or(snippet.thumbnails.fallback)
        .map(|t| t.url);

    VideoCandidate {
        title: snippet.title,
        youtube_url: watch_url(&video_id),
        video_id,
        thumbnail_url,
        published_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url_construction() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_video_id_from_watch_url() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_video_id_from_short_url() {
        assert_eq!(
            video_id_from_url("https://youtu.be/dQw4w9WgXcQ?t=10").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_video_id_from_embed_url() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_video_id_rejects_non_video_urls() {
        assert_eq!(video_id_from_url("https://example.com/page"), None);
        assert_eq!(video_id_from_url("https://youtu.be/short"), None);
    }

    #[test]
    fn test_page_deserialization() {
        let body = r#"{
            "items": [{
                "snippet": {
                    "title": "2025.11.23 주일설교",
                    "publishedAt": "2025-11-23T03:00:00Z",
                    "resourceId": { "videoId": "abcdefghijk" },
                    "thumbnails": { "high": { "url": "https://i.ytimg.com/vi/abcdefghijk/hqdefault.jpg" } }
                }
            }],
            "nextPageToken": "CAUQAA"
        }"#;

        let page: PlaylistPage = serde_json::from_str(body).expect("page parses");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));

        let candidate = normalize(page.items.into_iter().next().expect("one item"));
        assert_eq!(candidate.video_id, "abcdefghijk");
        assert_eq!(
            candidate.youtube_url,
            "https://www.youtube.com/watch?v=abcdefghijk"
        );
        assert_eq!(
            candidate.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/abcdefghijk/hqdefault.jpg")
        );
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_epoch() {
        let item = PlaylistItem {
            snippet: Snippet {
                title: "no date".into(),
                published_at: "not a timestamp".into(),
                resource_id: ResourceId {
                    video_id: "abcdefghijk".into(),
                },
                thumbnails: Thumbnails::default(),
            },
        };
        assert_eq!(normalize(item).published_at, DateTime::<Utc>::UNIX_EPOCH);
    }
}
