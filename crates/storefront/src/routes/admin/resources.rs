//! Content resource management (logo, videos, gallery, events, text).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use ironhouse_core::{ResourceId, ResourceKind};
use tracing::instrument;
use url::Url;

use crate::backend::{Resource, ResourceInput};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Check that a resource carries what its kind needs.
///
/// Media kinds need an http(s) URL, events need a date and text needs content.
///
/// # Errors
///
/// Returns a message describing the first problem found.
pub fn validate_resource(mut input: ResourceInput) -> std::result::Result<ResourceInput, String> {
    input.title = input.title.trim().to_string();
    if input.title.is_empty() {
        return Err("title is required".to_string());
    }

    match input.kind {
        ResourceKind::Logo | ResourceKind::Video | ResourceKind::Image => {
            let url = input
                .url
                .as_deref()
                .ok_or_else(|| "a URL is required for media".to_string())?;
            let parsed = Url::parse(url).map_err(|e| format!("invalid URL: {e}"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err("URL must be http or https".to_string());
            }
        }
        ResourceKind::Event => {
            if input.event_date.is_none() {
                return Err("events need a date".to_string());
            }
        }
        ResourceKind::Text => {
            if input.content.as_deref().is_none_or(|c| c.trim().is_empty()) {
                return Err("text resources need content".to_string());
            }
        }
    }
    Ok(input)
}

/// `GET /api/admin/resources`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Resource>>> {
    Ok(Json(state.backend().get_resources().await?.as_ref().clone()))
}

/// `POST /api/admin/resources`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ResourceInput>,
) -> Result<(StatusCode, Json<Resource>)> {
    let input = validate_resource(input).map_err(AppError::BadRequest)?;
    let resource = state.backend().create_resource(&admin.token, &input).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

/// `PUT /api/admin/resources/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ResourceId>,
    Json(input): Json<ResourceInput>,
) -> Result<Json<Resource>> {
    let input = validate_resource(input).map_err(AppError::BadRequest)?;
    Ok(Json(
        state
            .backend()
            .update_resource(&admin.token, &id, &input)
            .await?,
    ))
}

/// `DELETE /api/admin/resources/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ResourceId>,
) -> Result<StatusCode> {
    state.backend().delete_resource(&admin.token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn input(kind: ResourceKind) -> ResourceInput {
        ResourceInput {
            title: "hero".to_string(),
            kind,
            url: None,
            content: None,
            event_date: None,
            position: None,
        }
    }

    #[test]
    fn test_media_needs_web_url() {
        assert!(validate_resource(input(ResourceKind::Video)).is_err());

        let mut ftp = input(ResourceKind::Image);
        ftp.url = Some("ftp://files.example.com/a.png".to_string());
        assert!(validate_resource(ftp).is_err());

        let mut ok = input(ResourceKind::Logo);
        ok.url = Some("https://cdn.example.com/logo.svg".to_string());
        assert!(validate_resource(ok).is_ok());
    }

    #[test]
    fn test_events_and_text() {
        assert!(validate_resource(input(ResourceKind::Event)).is_err());
        let mut event = input(ResourceKind::Event);
        event.event_date = Some(Utc::now());
        assert!(validate_resource(event).is_ok());

        let mut text = input(ResourceKind::Text);
        text.content = Some("  ".to_string());
        assert!(validate_resource(text).is_err());
    }
}
