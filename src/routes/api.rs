use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::{content, error::Result, storage::SermonPost, AppState};

/// A sermon as exposed over the public API, with the normalized title date
#[derive(Serialize)]
pub struct SermonInfo {
    pub id: String,
    pub title: String,
    pub youtube_url: String,
    pub video_id: String,
    pub preacher: String,
    /// `YYYY-MM-DD` derived from the title, when the title carries one
    pub date: Option<String>,
}

impl From<&SermonPost> for SermonInfo {
    fn from(sermon: &SermonPost) -> Self {
        Self {
            id: sermon.id.clone(),
            title: sermon.title.clone(),
            youtube_url: sermon.youtube_url.clone(),
            video_id: sermon.video_id.clone(),
            preacher: sermon.preacher.clone(),
            date: content::display_date(&sermon.title),
        }
    }
}

#[derive(Serialize)]
pub struct SermonsResponse {
    pub sunday: Vec<SermonInfo>,
    pub dawn: Vec<SermonInfo>,
}

/// API route: GET /api/news
/// Returns all bulletin posts, newest first by the title date prefix
pub async fn get_news(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let news = content::sort_news(state.storage.list_news().await?);
    Ok(Json(news))
}

/// API route: GET /api/sermons
/// Returns sermons grouped by worship category, newest first by title date
pub async fn get_sermons(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let sermons = state.storage.list_sermons().await?;

    let response = SermonsResponse {
        sunday: content::sunday_sermons(&sermons).iter().map(SermonInfo::from).collect(),
        dawn: content::dawn_sermons(&sermons).iter().map(SermonInfo::from).collect(),
    };

    Ok(Json(response))
}
