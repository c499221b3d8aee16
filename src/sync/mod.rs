//! Content synchronization pipeline.
//!
//! Each run is one sequential pass: load the existing-identifier set, fetch
//! every page of the external collection(s), drop candidates that are
//! already stored, persist the rest. Runs are triggered by an administrator
//! button or by the externally-invoked sync endpoints; overlapping runs are
//! not coordinated against each other.

pub mod dedup;
pub mod drive;
pub mod youtube;

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{NewNewsPost, NewSermonPost, Storage};

/// Category label for Sunday worship sermons
pub const CATEGORY_SUNDAY: &str = "주일설교";
/// Category label for dawn worship sermons
pub const CATEGORY_DAWN: &str = "새벽설교";

/// Result payload of a sync run, serialized for the trigger surfaces
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub success: bool,
    pub synced: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub message: String,
}

impl SyncOutcome {
    /// Outcome for a run that never got past its fatal error
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            synced: 0,
            errors: Vec::new(),
            message: message.into(),
        }
    }
}

/// Turn a non-success provider response into an error carrying the
/// provider's own message when the body has one
pub(crate) async fn provider_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    };
    let message = match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(fallback),
        Err(_) => fallback(),
    };

    Error::Provider {
        status: status.as_u16(),
        message,
    }
}

/// Pull both sermon playlists into the content store.
///
/// The Sunday and dawn playlists are fetched sequentially; a fetch failure
/// in one collection is recorded and the other still runs. Per-item
/// persistence errors accumulate without aborting the batch. Fails outright
/// only on missing configuration or when the existing-identifier set cannot
/// be read.
pub async fn sync_sermons(
    config: &Config,
    http: &reqwest::Client,
    storage: &Storage,
) -> Result<SyncOutcome> {
    if config.google_api_key.is_empty() {
        return Err(Error::Config("google_api_key is not set".to_string()));
    }
    if config.youtube_playlist_sunday.is_empty() || config.youtube_playlist_dawn.is_empty() {
        return Err(Error::Config(
            "youtube_playlist_sunday and youtube_playlist_dawn must both be set".to_string(),
        ));
    }

    // Loaded once per run; a failure here is fatal, proceeding with an
    // empty set would re-insert the whole catalog
    let existing = storage.existing_sermon_urls().await?;

    let playlists = [
        (config.youtube_playlist_sunday.as_str(), CATEGORY_SUNDAY),
        (config.youtube_playlist_dawn.as_str(), CATEGORY_DAWN),
    ];

    let mut synced = 0usize;
    let mut errors = Vec::new();

    for (playlist_id, category) in playlists {
        let candidates = match youtube::fetch_playlist(
            http,
            &config.google_api_base,
            &config.google_api_key,
            playlist_id,
        )
        .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!("Fetching playlist for {} failed: {}", category, e);
                errors.push(format!("{}: {}", category, e));
                continue;
            }
        };

        let fresh = dedup::filter_new(candidates, &existing, |c| c.youtube_url.as_str());

        for video in fresh {
            let title = video.title.clone();
            let post = NewSermonPost {
                title: video.title,
                youtube_url: video.youtube_url,
                video_id: video.video_id,
                thumbnail_url: video.thumbnail_url,
                preacher: category.to_string(),
                published_at: Some(video.published_at.to_rfc3339()),
            };
            match storage.upsert_sermon(post).await {
                Ok(()) => synced += 1,
                Err(e) => {
                    tracing::error!("Persisting sermon '{}' failed: {}", title, e);
                    errors.push(format!("{}: {}", title, e));
                }
            }
        }
    }

    let message = if synced == 0 && errors.is_empty() {
        "Nothing to sync, every playlist video is already registered".to_string()
    } else {
        format!("Synced {} sermon video(s)", synced)
    };

    tracing::info!("Sermon sync finished: {} new, {} error(s)", synced, errors.len());

    Ok(SyncOutcome {
        success: true,
        synced,
        errors,
        message,
    })
}

/// Pull the bulletin image folder into the content store.
///
/// Candidates are keyed on the provider file id at every entry point and
/// persisted with upsert semantics, so re-running over an unchanged folder
/// converges to zero inserts.
pub async fn sync_bulletins(
    config: &Config,
    http: &reqwest::Client,
    storage: &Storage,
) -> Result<SyncOutcome> {
    if config.google_api_key.is_empty() {
        return Err(Error::Config("google_api_key is not set".to_string()));
    }
    if config.drive_folder_id.is_empty() {
        return Err(Error::Config("drive_folder_id is not set".to_string()));
    }

    let existing = storage.existing_drive_file_ids().await?;

    let candidates = drive::fetch_folder(
        http,
        &config.google_api_base,
        &config.google_api_key,
        &config.drive_folder_id,
    )
    .await?;

    if candidates.is_empty() {
        return Ok(SyncOutcome {
            success: true,
            synced: 0,
            errors: Vec::new(),
            message: "The bulletin folder has no images".to_string(),
        });
    }

    let fresh = dedup::filter_new(candidates, &existing, |c| c.file_id.as_str());

    let mut synced = 0usize;
    let mut errors = Vec::new();

    for file in fresh {
        let title = file.title.clone();
        let post = NewNewsPost {
            title: file.title,
            content: String::new(),
            image_url: file.image_url,
            link_url: file.link_url,
            drive_file_id: Some(file.file_id),
            published_at: Some(file.created_at.to_rfc3339()),
        };
        match storage.upsert_news(post).await {
            Ok(()) => synced += 1,
            Err(e) => {
                tracing::error!("Persisting bulletin '{}' failed: {}", title, e);
                errors.push(format!("{}: {}", title, e));
            }
        }
    }

    let message = if synced == 0 && errors.is_empty() {
        "Nothing to sync, every bulletin is already registered".to_string()
    } else {
        format!("Synced {} bulletin(s)", synced)
    };

    tracing::info!("Bulletin sync finished: {} new, {} error(s)", synced, errors.len());

    Ok(SyncOutcome {
        success: true,
        synced,
        errors,
        message,
    })
}
