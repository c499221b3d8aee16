use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AdminOnly,
    error::{Error, Result},
    storage::{Member, MemberStats, NewNewsPost, NewSermonPost},
    sync,
    util::render_error,
    AppState,
};

/// Admin dashboard template
#[derive(Template)]
#[template(path = "admin.html")]
struct AdminTemplate {
    username: String,
    news_count: usize,
    sermon_count: usize,
    stats: MemberStats,
}

/// Member management template
#[derive(Template)]
#[template(path = "members.html")]
struct MembersTemplate {
    username: String,
}

/// GET /admin - Admin dashboard
/// Shows content counts, member statistics, and the sync triggers
pub async fn admin_dashboard(
    State(state): State<AppState>,
    AdminOnly(username): AdminOnly,
) -> Result<Html<String>> {
    let news_count = state.storage.news_count().await?;
    let sermon_count = state.storage.sermon_count().await?;
    let stats = state.storage.member_stats().await?;

    let template = AdminTemplate {
        username,
        news_count,
        sermon_count,
        stats,
    };

    Ok(Html(template.render().map_err(render_error)?))
}

/// GET /admin/members - Member management page
pub async fn members_page(AdminOnly(username): AdminOnly) -> Result<Html<String>> {
    let template = MembersTemplate { username };
    Ok(Html(template.render().map_err(render_error)?))
}

/// Response body for the member listing
#[derive(Serialize)]
pub struct MembersResponse {
    pub stats: MemberStats,
    pub members: Vec<Member>,
}

/// GET /api/admin/members - List all members with role statistics
pub async fn get_members(
    State(state): State<AppState>,
    AdminOnly(_username): AdminOnly,
) -> Result<Json<MembersResponse>> {
    let members = state.storage.list_members().await?;
    let stats = state.storage.member_stats().await?;
    Ok(Json(MembersResponse { stats, members }))
}

/// Request body for changing a member's role
#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// PATCH /api/admin/members/:id - Change a member's role
/// Admins cannot demote themselves
pub async fn update_member_role(
    State(state): State<AppState>,
    AdminOnly(current_username): AdminOnly,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<StatusCode> {
    let member = state
        .storage
        .get_member(&id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Member not found: {}", id)))?;

    if member.username == current_username && request.role != "admin" {
        return Err(Error::BadRequest(
            "Cannot demote yourself from admin".to_string(),
        ));
    }

    state.storage.update_member_role(&id, &request.role).await?;

    tracing::info!("Member '{}' role changed to {}", member.username, request.role);
    Ok(StatusCode::NO_CONTENT)
}

/// Request body for creating a member account
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "guest".to_string()
}

/// POST /api/admin/members - Create a member account
pub async fn create_user(
    State(state): State<AppState>,
    AdminOnly(_username): AdminOnly,
    Json(request): Json<CreateUserRequest>,
) -> Result<StatusCode> {
    if state.storage.username_exists(&request.username).await? {
        return Err(Error::Conflict(format!(
            "Username '{}' already exists",
            request.username
        )));
    }

    state
        .storage
        .create_user(&request.username, &request.password, &request.role)
        .await?;

    Ok(StatusCode::CREATED)
}

/// POST /api/admin/news - Register a bulletin post from the admin form.
/// Multipart fields: title, content, and an optional image file that is
/// stored locally and served under /uploads.
pub async fn create_news(
    State(state): State<AppState>,
    AdminOnly(_username): AdminOnly,
    mut multipart: Multipart,
) -> Result<StatusCode> {
    let mut title = String::new();
    let mut content = String::new();
    let mut image_url = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Invalid form data: {}", e)))?
    {
        match field.name() {
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Invalid title field: {}", e)))?;
            }
            Some("content") => {
                content = field
                    .text()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Invalid content field: {}", e)))?;
            }
            Some("image") => {
                let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Invalid image field: {}", e)))?;
                if !bytes.is_empty() {
                    image_url = state.uploads.save_image(&file_name, &bytes).await?;
                }
            }
            _ => {}
        }
    }

    if title.is_empty() {
        return Err(Error::BadRequest("Title is required".to_string()));
    }

    state
        .storage
        .insert_news(NewNewsPost {
            title,
            content,
            image_url,
            link_url: None,
            drive_file_id: None,
            published_at: None,
        })
        .await?;

    Ok(StatusCode::CREATED)
}

/// Request body for registering a sermon by hand
#[derive(Deserialize)]
pub struct CreateSermonRequest {
    pub title: String,
    pub youtube_url: String,
    pub preacher: String,
    pub preached_at: Option<String>,
}

/// POST /api/admin/sermons - Register a sermon video from the admin form
pub async fn create_sermon(
    State(state): State<AppState>,
    AdminOnly(_username): AdminOnly,
    Json(request): Json<CreateSermonRequest>,
) -> Result<StatusCode> {
    if request.title.is_empty() || request.youtube_url.is_empty() {
        return Err(Error::BadRequest(
            "Title and YouTube URL are required".to_string(),
        ));
    }

    let video_id = sync::youtube::video_id_from_url(&request.youtube_url).unwrap_or_default();

    state
        .storage
        .insert_sermon(NewSermonPost {
            title: request.title,
            youtube_url: request.youtube_url,
            video_id,
            thumbnail_url: None,
            preacher: request.preacher,
            published_at: request.preached_at,
        })
        .await?;

    Ok(StatusCode::CREATED)
}

/// POST /api/admin/sync/youtube - Admin-triggered sermon sync
pub async fn admin_sync_youtube(
    State(state): State<AppState>,
    AdminOnly(username): AdminOnly,
) -> Result<Json<sync::SyncOutcome>> {
    tracing::info!("Sermon sync triggered by {}", username);
    let outcome = sync::sync_sermons(&state.config, &state.http, &state.storage).await?;
    Ok(Json(outcome))
}

/// POST /api/admin/sync/drive - Admin-triggered bulletin sync
pub async fn admin_sync_drive(
    State(state): State<AppState>,
    AdminOnly(username): AdminOnly,
) -> Result<Json<sync::SyncOutcome>> {
    tracing::info!("Bulletin sync triggered by {}", username);
    let outcome = sync::sync_bulletins(&state.config, &state.http, &state.storage).await?;
    Ok(Json(outcome))
}
