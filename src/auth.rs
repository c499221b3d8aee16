use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::AppState;

/// Session key for storing username
pub const SESSION_USERNAME_KEY: &str = "username";

/// Session key for storing user token
pub const SESSION_TOKEN_KEY: &str = "token";

/// Authentication middleware guarding the admin surfaces.
///
/// The public site stays open; only /admin pages and /api/admin endpoints
/// require a valid session. The externally-invoked /api/sync endpoints
/// carry their own bearer-token check instead of a session.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if !is_protected_path(path) {
        return next.run(request).await;
    }

    // Check if user has valid session
    if let Ok(Some(token)) = session.get::<String>(SESSION_TOKEN_KEY).await {
        match state.storage.verify_token(&token).await {
            Ok(Some(username)) => {
                // Add username to request extensions for handlers to use
                request.extensions_mut().insert(username.clone());
                return next.run(request).await;
            }
            Ok(None) => {
                // Token invalid, clear session
                let _ = session.delete().await;
            }
            Err(e) => {
                tracing::error!("Error verifying token: {}", e);
            }
        }
    }

    // Not authenticated; API callers get a status, pages get the login form
    if request.uri().path().starts_with("/api/") {
        (StatusCode::UNAUTHORIZED, "Not authenticated").into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

/// Check if a path requires an authenticated session
fn is_protected_path(path: &str) -> bool {
    path == "/admin"
        || path.starts_with("/admin/")
        || path.starts_with("/api/admin/")
        || path.starts_with("/api/user/")
}

/// Helper to get username from request extensions
/// Injected by require_auth middleware
pub fn get_username(request: &Request) -> Option<String> {
    request.extensions().get::<String>().cloned()
}

/// Username extractor that can be used as a handler parameter
/// Extracts username from request extensions (set by require_auth middleware)
pub struct Username(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Username
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<String>()
            .cloned()
            .map(Username)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// AdminOnly extractor that requires the authenticated user to hold the
/// admin role
pub struct AdminOnly(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // First check if user is authenticated
        let username = parts
            .extensions
            .get::<String>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated"))?;

        // Check the role
        let is_admin = state.storage.is_admin(&username).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to verify admin status",
            )
        })?;

        if is_admin {
            Ok(AdminOnly(username))
        } else {
            Err((StatusCode::FORBIDDEN, "Admin access required"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_paths() {
        assert!(is_protected_path("/admin"));
        assert!(is_protected_path("/admin/members"));
        assert!(is_protected_path("/api/admin/members"));
        assert!(is_protected_path("/api/admin/sync/youtube"));
        assert!(is_protected_path("/api/user/change-password"));
    }

    #[test]
    fn test_public_paths() {
        assert!(!is_protected_path("/"));
        assert!(!is_protected_path("/news"));
        assert!(!is_protected_path("/sermons"));
        assert!(!is_protected_path("/api/news"));
        assert!(!is_protected_path("/api/sync/youtube"));
        assert!(!is_protected_path("/administrator-notes"));
    }
}
