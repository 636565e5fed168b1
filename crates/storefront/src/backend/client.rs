//! HTTP plumbing shared by every endpoint group.

use std::sync::Arc;

use ironhouse_core::ChangeKind;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::BackendError;
use super::cache::{CacheKey, CacheValue};
use super::types::AccessToken;
use crate::config::GymApiConfig;

const CACHE_CAPACITY: u64 = 1000;
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// GymApiClient
// =============================================================================

/// Client for the gym REST backend.
///
/// Cheap to clone. Catalog reads (products, plans, trainers, resources) are
/// cached for the configured TTL.
#[derive(Clone)]
pub struct GymApiClient {
    inner: Arc<GymApiClientInner>,
}

struct GymApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl GymApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &GymApiConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .support_invalidation_closures()
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ironhouse-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(GymApiClientInner {
                client,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                cache,
            }),
        })
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Build an endpoint URL. Segments are percent-encoded, so IDs taken
    /// from user input cannot escape their path position.
    pub(super) fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Url)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: Option<&AccessToken>) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header("x-api-key", self.inner.api_key.expose_secret());
        match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        token: Option<&AccessToken>,
    ) -> Result<T, BackendError> {
        let url = self.url(segments)?;
        self.send(self.request(Method::GET, url, token)).await
    }

    pub(super) async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&AccessToken>,
        body: &B,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        self.send(self.request(method, url, token).json(body)).await
    }

    /// Send a request whose response body is ignored.
    pub(super) async fn send_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&AccessToken>,
        body: Option<&B>,
    ) -> Result<(), BackendError> {
        let url = self.url(segments)?;
        let mut builder = self.request(method, url, token);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send_raw(builder).await.map(|_| ())
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let body = self.send_raw(builder).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, LOG_BODY_LIMIT),
                "Failed to parse gym backend response"
            );
            BackendError::Parse(e)
        })
    }

    async fn send_raw(&self, builder: RequestBuilder) -> Result<String, BackendError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        warn!(
            status = %status,
            body = %truncate(&body, LOG_BODY_LIMIT),
            "Gym backend returned non-success status"
        );
        Err(status_error(status, &body))
    }

    // =========================================================================
    // Cache
    // =========================================================================

    pub(super) async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        self.inner.cache.get(key).await
    }

    pub(super) async fn remember(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Drop every cached entry matching `predicate`.
    pub(super) fn invalidate_where<F>(&self, predicate: F)
    where
        F: Fn(&CacheKey) -> bool + Send + Sync + 'static,
    {
        if let Err(e) = self
            .inner
            .cache
            .invalidate_entries_if(move |key, _| predicate(key))
        {
            warn!(error = %e, "Predicate invalidation failed, clearing cache");
            self.inner.cache.invalidate_all();
        }
    }

    /// React to a realtime change event from the backend.
    ///
    /// This is the hook a realtime transport calls; admin writes through this
    /// client call it too.
    pub fn apply_change(&self, kind: ChangeKind) {
        if kind == ChangeKind::CartUpdates {
            debug!(%kind, "Nothing cached for change");
            return;
        }
        self.invalidate_where(move |key| key.affected_by(kind));
        info!(%kind, "Invalidated cached catalog entries");
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a non-success response to a [`BackendError`].
fn status_error(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized(message),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::CONFLICT => BackendError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::Rejected(message)
        }
        _ => BackendError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
