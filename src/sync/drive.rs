//! Google Drive folder catalog fetcher for bulletin images.

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::sync::provider_error;

/// A Drive file normalized for the sync pipeline
#[derive(Debug, Clone)]
pub struct BulletinCandidate {
    /// File name with the extension stripped
    pub title: String,
    /// Provider-assigned file id; the external identifier used for dedup
    pub file_id: String,
    /// Large image URL derived from the provider thumbnail link
    pub image_url: String,
    pub link_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
    thumbnail_link: Option<String>,
    web_view_link: Option<String>,
    created_time: Option<String>,
}

/// Fetch every image file in a Drive folder, following continuation tokens
/// until the provider reports no more pages. Returns candidates sorted
/// newest-first by creation time.
pub async fn fetch_folder(
    http: &reqwest::Client,
    api_base: &str,
    api_key: &str,
    folder_id: &str,
) -> Result<Vec<BulletinCandidate>> {
    if api_key.is_empty() {
        return Err(Error::Config("google_api_key is not set".to_string()));
    }
    if folder_id.is_empty() {
        return Err(Error::Config("drive_folder_id is not set".to_string()));
    }

    // Folder membership, no sub-folders, trash excluded
    let query = format!(
        "'{}' in parents and mimeType != 'application/vnd.google-apps.folder' and trashed = false",
        folder_id
    );
    let encoded_query = utf8_percent_encode(&query, NON_ALPHANUMERIC).to_string();

    let mut candidates = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut url = format!(
            "{}/drive/v3/files?q={}&fields=files(id,name,mimeType,thumbnailLink,createdTime,webViewLink),nextPageToken&pageSize=100&key={}",
            api_base, encoded_query, api_key
        );
        if let Some(token) = &page_token {
            url.push_str("&pageToken=");
            url.push_str(token);
        }

        let response = http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let page: FileListPage = response.json().await?;
        tracing::debug!(
            "Drive folder {} page returned {} file(s)",
            folder_id,
            page.files.len()
        );

        for file in page.files {
            if file.mime_type.starts_with("image/") {
                candidates.push(normalize(file));
            }
        }

        page_token = page.next_page_token;
        if page_token.is_none() {
            break;
        }
    }

    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(candidates)
}

fn normalize(file: DriveFile) -> BulletinCandidate {
    let image_url = match &file.thumbnail_link {
        Some(link) => upsize_thumbnail(link),
        None => format!("https://drive.google.com/thumbnail?id={}&sz=w1600", file.id),
    };
    let created_at = file
        .created_time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    BulletinCandidate {
        title: strip_extension(&file.name),
        file_id: file.id,
        image_url,
        link_url: file.web_view_link,
        created_at,
    }
}

/// Drive thumbnail links end in a size suffix like `=s220`; request the
/// large rendition instead
fn upsize_thumbnail(link: &str) -> String {
    if let Some(pos) = link.rfind("=s") {
        let suffix = &link[pos + 2..];
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            return format!("{}=s1600", &link[..pos]);
        }
    }
    link.to_string()
}

/// File name without its final extension
fn strip_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[..pos].to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_upsizing() {
        assert_eq!(
            upsize_thumbnail("https://lh3.googleusercontent.com/drive-viewer/abc=s220"),
            "https://lh3.googleusercontent.com/drive-viewer/abc=s1600"
        );
    }

    #[test]
    fn test_thumbnail_without_size_suffix_unchanged() {
        assert_eq!(
            upsize_thumbnail("https://example.com/thumb.png"),
            "https://example.com/thumb.png"
        );
        assert_eq!(
            upsize_thumbnail("https://example.com/a=sale"),
            "https://example.com/a=sale"
        );
    }

    #[test]
    fn test_extension_stripping() {
        assert_eq!(strip_extension("260105_주일주보.png"), "260105_주일주보");
        assert_eq!(strip_extension("no-extension"), "no-extension");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_page_deserialization_and_fallback_image() {
        let body = r#"{
            "files": [
                {
                    "id": "file-1",
                    "name": "1123_주일주보.jpg",
                    "mimeType": "image/jpeg",
                    "thumbnailLink": "https://lh3.googleusercontent.com/x=s220",
                    "webViewLink": "https://drive.google.com/file/d/file-1/view",
                    "createdTime": "2025-11-23T01:00:00Z"
                },
                {
                    "id": "file-2",
                    "name": "plain.png",
                    "mimeType": "image/png"
                }
            ]
        }"#;

        let page: FileListPage = serde_json::from_str(body).expect("page parses");
        assert_eq!(page.files.len(), 2);
        assert!(page.next_page_token.is_none());

        let mut files = page.files.into_iter();
        let first = normalize(files.next().expect("first file"));
        assert_eq!(first.title, "1123_주일주보");
        assert_eq!(first.image_url, "https://lh3.googleusercontent.com/x=s1600");
        assert_eq!(
            first.link_url.as_deref(),
            Some("https://drive.google.com/file/d/file-1/view")
        );

        let second = normalize(files.next().expect("second file"));
        assert_eq!(
            second.image_url,
            "https://drive.google.com/thumbnail?id=file-2&sz=w1600"
        );
        assert_eq!(second.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }
}
