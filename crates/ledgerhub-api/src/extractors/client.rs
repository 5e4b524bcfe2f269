//! `ClientMeta` extractor: IP, user agent and device label for sessions
//! and lockout bookkeeping.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header;
use axum::http::request::Parts;

use ledgerhub_auth::ClientInfo;

use crate::state::AppState;

const MAX_HEADER_LEN: usize = 512;

/// Client metadata for the current request.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub ClientInfo);

impl std::ops::Deref for ClientMeta {
    type Target = ClientInfo;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn truncate(value: &str) -> String {
    value.chars().take(MAX_HEADER_LEN).collect()
}

/// Resolve the client IP.
///
/// Forwarding headers (first `X-Forwarded-For` hop, then `X-Real-IP`) are
/// read only when the socket peer is a trusted proxy; otherwise the peer
/// address is the client.
pub(crate) fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: &[IpAddr],
) -> Option<String> {
    let peer_ip = peer.map(|addr| addr.ip());
    let forwarded = peer_ip
        .filter(|ip| trusted_proxies.contains(ip))
        .and_then(|_| {
            header_str(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .or_else(|| header_str(headers, "x-real-ip"))
        })
        .map(truncate);
    forwarded.or_else(|| peer_ip.map(|ip| ip.to_string()))
}

impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let trusted = &state.config.server.trusted_proxies;

        Ok(ClientMeta(ClientInfo {
            ip_address: client_ip(&parts.headers, peer, trusted),
            user_agent: header_str(&parts.headers, header::USER_AGENT.as_str()).map(truncate),
            device_name: header_str(&parts.headers, "x-device-name").map(truncate),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn proxy() -> SocketAddr {
        "10.0.0.2:44100".parse().unwrap()
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers
    }

    #[test]
    fn test_forwarded_for_takes_first_hop_from_trusted_proxy() {
        let trusted = [proxy().ip()];
        let headers = forwarded("203.0.113.7, 10.0.0.1");
        assert_eq!(
            client_ip(&headers, Some(proxy()), &trusted).as_deref(),
            Some("203.0.113.7")
        );
    }

    #[test]
    fn test_real_ip_used_when_forwarded_for_missing() {
        let trusted = [proxy().ip()];
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(
            client_ip(&headers, Some(proxy()), &trusted).as_deref(),
            Some("198.51.100.4")
        );
    }

    #[test]
    fn test_forwarding_headers_ignored_from_untrusted_peer() {
        let peer: SocketAddr = "192.0.2.10:5123".parse().unwrap();
        let headers = forwarded("203.0.113.7");
        assert_eq!(
            client_ip(&headers, Some(peer), &[proxy().ip()]).as_deref(),
            Some("192.0.2.10")
        );
        assert_eq!(client_ip(&headers, Some(peer), &[]).as_deref(), Some("192.0.2.10"));
    }

    #[test]
    fn test_no_peer_means_no_address() {
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_ip(&headers, None, &[proxy().ip()]), None);
        assert_eq!(client_ip(&HeaderMap::new(), None, &[]), None);
    }
}
