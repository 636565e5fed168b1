//! Rate limiting for auth endpoints using governor and `tower_governor`.
//!
//! Login, signup and the OTP endpoints each reach the backend's mailer or
//! password check, so they get a strict per-IP limit (~10/min).

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client IP headers, most trusted first.
const SINGLE_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

// =============================================================================
// Client IP extraction
// =============================================================================

/// Key extractor that reads the client IP from proxy headers.
///
/// `X-Forwarded-For` is consulted after `CF-Connecting-IP` and before the
/// other single-value headers; its first entry is the original client.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers()).ok_or(GovernorError::UnableToExtractKey)
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Resolve the client IP from proxy headers.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let [cloudflare, rest @ ..] = SINGLE_IP_HEADERS;
    if let Some(ip) = header_ip(headers, cloudflare) {
        return Some(ip);
    }

    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    rest.iter().find_map(|name| header_ip(headers, name))
}

// =============================================================================
// Limiter
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// One token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Never in practice: both settings are non-zero constants, which
/// `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let map = headers(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "203.0.113.9"),
        ]);
        assert_eq!(client_ip(&map), Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let map = headers(&[
            ("x-forwarded-for", "198.51.100.4, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_ip(&map), Some("198.51.100.4".parse().unwrap()));
    }

    #[test]
    fn test_falls_back_to_fly_header() {
        let map = headers(&[("fly-client-ip", "2001:db8::1")]);
        assert_eq!(client_ip(&map), Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_no_headers() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
        assert_eq!(client_ip(&headers(&[("x-real-ip", "garbage")])), None);
    }
}
