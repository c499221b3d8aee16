use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    auth::{Username, SESSION_TOKEN_KEY, SESSION_USERNAME_KEY},
    error::{Error, Result},
    AppState,
};

/// Login page template
const LOGIN_PAGE: &str = include_str!("../../templates/login.html");

/// Login form data
#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

fn render_login(error: &str) -> Html<String> {
    let error_html = if error.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="form-error">{}</p>"#, crate::util::html_escape(error))
    };
    Html(LOGIN_PAGE.replace("{{ error }}", &error_html))
}

/// GET /login - Show login page
pub async fn get_login() -> Html<String> {
    render_login("")
}

/// POST /login - Process login
pub async fn post_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse> {
    // Verify credentials
    match state
        .storage
        .verify_user(&form.username, &form.password)
        .await?
    {
        Some(token) => {
            // Store token and username in session
            session
                .insert(SESSION_TOKEN_KEY, token)
                .await
                .map_err(|e| Error::Internal(format!("Failed to save session: {}", e)))?;
            session
                .insert(SESSION_USERNAME_KEY, form.username.clone())
                .await
                .map_err(|e| Error::Internal(format!("Failed to save session: {}", e)))?;

            tracing::info!("User {} logged in successfully", form.username);
            Ok(Redirect::to("/admin").into_response())
        }
        None => {
            // Invalid credentials, show error
            tracing::warn!("Failed login attempt for username: {}", form.username);
            Ok(render_login("Invalid username or password").into_response())
        }
    }
}

/// Request body for password changes
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/user/change-password - Change the logged-in user's password
pub async fn change_password(
    State(state): State<AppState>,
    Username(username): Username,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    if request.new_password.len() < 8 {
        return Err(Error::BadRequest(
            "New password must be at least 8 characters".to_string(),
        ));
    }

    state
        .storage
        .change_password(&username, &request.current_password, &request.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /logout - Clear session and redirect to login
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Ok(Some(token)) = session.get::<String>(SESSION_TOKEN_KEY).await {
        let _ = state.storage.logout(&token).await;
    }
    let _ = session.delete().await;
    tracing::info!("User logged out");
    Redirect::to("/login")
}
