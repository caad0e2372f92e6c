//! Same-origin check for gated requests.
//!
//! Requests without both `Origin` and `Referer` are allowed. Browsers send at
//! least one of them on cross-site requests, so their absence means a same-site
//! navigation or a non-browser client. That relaxation is deliberate; tightening
//! it would lock out scripts and header-stripping proxies.

use axum::http::{
    HeaderMap, HeaderName, Uri,
    header::{HOST, ORIGIN, REFERER},
    uri::Authority,
};
use url::Url;

/// Decide whether a request comes from the site serving it.
///
/// An unparseable `Origin` or `Referer` never matches; the check falls through
/// to the next header.
#[must_use]
pub fn is_same_origin(origin: Option<&str>, referer: Option<&str>, host: Option<&str>) -> bool {
    if origin.is_none() && referer.is_none() {
        return true;
    }

    let Some(host) = host.and_then(HostHeader::parse) else {
        return false;
    };

    if origin.is_some_and(|origin| host.matches(origin)) {
        return true;
    }

    referer.is_some_and(|referer| host.matches(referer))
}

/// Same check reading the values from a request.
///
/// HTTP/2 clients may carry the authority in the URI instead of `Host`.
#[must_use]
pub fn is_same_origin_request(headers: &HeaderMap, uri: &Uri) -> bool {
    let host = header_str(headers, &HOST).or_else(|| uri.authority().map(Authority::as_str));
    is_same_origin(
        header_str(headers, &ORIGIN),
        header_str(headers, &REFERER),
        host,
    )
}

/// A header that is present but not valid UTF-8 reads as an empty value, which
/// never matches, instead of counting as absent.
fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .map(|value| value.to_str().unwrap_or_default())
}

#[derive(Debug, PartialEq, Eq)]
struct HostHeader {
    hostname: String,
    port: Option<u16>,
}

impl HostHeader {
    fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        // Reuse the URL parser so IPv6 literals and ports are handled consistently.
        let url = Url::parse(&format!("http://{value}")).ok()?;
        if url.path() != "/" || url.query().is_some() || !url.username().is_empty() {
            return None;
        }
        let hostname = url.host_str()?.to_ascii_lowercase();
        let port = explicit_port(value, &url);
        Some(Self { hostname, port })
    }

    fn matches(&self, candidate: &str) -> bool {
        let Ok(url) = Url::parse(candidate.trim()) else {
            return false;
        };
        let Some(hostname) = url.host_str() else {
            return false;
        };
        if !hostname.eq_ignore_ascii_case(&self.hostname) {
            return false;
        }
        // A Host without a port implies the scheme's default port.
        let host_port = self.port.or_else(|| url.port_or_known_default());
        host_port == url.port_or_known_default()
    }
}

/// `Url` drops default ports (`:80`), so read the port back from the raw value.
fn explicit_port(raw: &str, url: &Url) -> Option<u16> {
    if let Some(port) = url.port() {
        return Some(port);
    }
    let after_host = raw.rsplit_once(']').map_or(raw, |(_, rest)| rest);
    after_host
        .rsplit_once(':')
        .and_then(|(_, port)| port.parse::<u16>().ok())
}
