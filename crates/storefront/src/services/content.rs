//! Homepage and footer content assembled from admin-managed resources.

use chrono::{DateTime, Utc};
use ironhouse_core::ResourceKind;
use serde::Serialize;

use crate::backend::{BackendError, GymApiClient, Resource};

/// Title of the text resource rendered in the footer.
pub const FOOTER_TITLE: &str = "footer";

/// Content for the landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HomepageContent {
    pub logo: Option<Resource>,
    pub hero_video: Option<Resource>,
    /// Ordered by `position`, then title.
    pub gallery: Vec<Resource>,
    /// Events that have not happened yet, soonest first.
    pub upcoming_events: Vec<Resource>,
    pub footer: Option<String>,
}

impl HomepageContent {
    /// Sort resources into homepage slots by kind.
    ///
    /// When several logos or videos exist the one with the lowest `position`
    /// wins.
    #[must_use]
    pub fn from_resources(resources: &[Resource], now: DateTime<Utc>) -> Self {
        let mut sorted: Vec<&Resource> = resources.iter().collect();
        sorted.sort_by(|a, b| {
            position_key(a)
                .cmp(&position_key(b))
                .then_with(|| a.title.cmp(&b.title))
        });

        let first_of = |kind: ResourceKind| sorted.iter().find(|r| r.kind == kind).map(|r| (*r).clone());

        let gallery = sorted
            .iter()
            .filter(|r| r.kind == ResourceKind::Image)
            .map(|r| (*r).clone())
            .collect();

        let mut upcoming_events: Vec<Resource> = sorted
            .iter()
            .filter(|r| r.kind == ResourceKind::Event && r.event_date.is_some_and(|d| d >= now))
            .map(|r| (*r).clone())
            .collect();
        upcoming_events.sort_by_key(|r| r.event_date);

        let footer = sorted
            .iter()
            .find(|r| r.kind == ResourceKind::Text && r.title.eq_ignore_ascii_case(FOOTER_TITLE))
            .and_then(|r| r.content.clone());

        Self {
            logo: first_of(ResourceKind::Logo),
            hero_video: first_of(ResourceKind::Video),
            gallery,
            upcoming_events,
            footer,
        }
    }
}

fn position_key(resource: &Resource) -> i32 {
    resource.position.unwrap_or(i32::MAX)
}

pub struct ContentService<'a> {
    backend: &'a GymApiClient,
}

impl<'a> ContentService<'a> {
    #[must_use]
    pub const fn new(backend: &'a GymApiClient) -> Self {
        Self { backend }
    }

    /// # Errors
    ///
    /// Returns an error if resources cannot be loaded.
    pub async fn homepage(&self, now: DateTime<Utc>) -> Result<HomepageContent, BackendError> {
        let resources = self.backend.get_resources().await?;
        Ok(HomepageContent::from_resources(&resources, now))
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` when no resource has that title.
    pub async fn by_title(&self, title: &str) -> Result<Resource, BackendError> {
        self.backend.get_resource_by_title(title.trim()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use ironhouse_core::ResourceId;

    use super::*;

    fn resource(title: &str, kind: ResourceKind, position: Option<i32>) -> Resource {
        Resource {
            id: ResourceId::new(title),
            title: title.to_string(),
            kind,
            url: Some(format!("https://cdn.example.com/{title}")),
            content: None,
            event_date: None,
            position,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_slots_filled_by_kind() {
        let mut footer = resource("Footer", ResourceKind::Text, None);
        footer.content = Some("Open 6am to 10pm".to_string());
        let resources = vec![
            resource("logo-dark", ResourceKind::Logo, Some(2)),
            resource("logo", ResourceKind::Logo, Some(1)),
            resource("hero", ResourceKind::Video, None),
            resource("gallery-b", ResourceKind::Image, None),
            resource("gallery-a", ResourceKind::Image, Some(3)),
            resource("about", ResourceKind::Text, None),
            footer,
        ];

        let home = HomepageContent::from_resources(&resources, now());
        assert_eq!(home.logo.unwrap().title, "logo");
        assert_eq!(home.hero_video.unwrap().title, "hero");
        let gallery: Vec<&str> = home.gallery.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(gallery, vec!["gallery-a", "gallery-b"]);
        assert_eq!(home.footer.as_deref(), Some("Open 6am to 10pm"));
    }

    #[test]
    fn test_past_events_dropped_and_sorted() {
        let mut past = resource("bootcamp", ResourceKind::Event, None);
        past.event_date = Some(now() - Duration::days(1));
        let mut later = resource("powerlifting meet", ResourceKind::Event, Some(1));
        later.event_date = Some(now() + Duration::days(30));
        let mut sooner = resource("yoga morning", ResourceKind::Event, Some(2));
        sooner.event_date = Some(now() + Duration::days(2));
        let undated = resource("tbd", ResourceKind::Event, None);

        let home = HomepageContent::from_resources(&[past, later, sooner, undated], now());
        let events: Vec<&str> = home.upcoming_events.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(events, vec!["yoga morning", "powerlifting meet"]);
    }

    #[test]
    fn test_empty_resources() {
        assert_eq!(HomepageContent::from_resources(&[], now()), HomepageContent::default());
    }
}
