use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Names the routing prefix that served a proxied response
pub const ROUTE_HEADER: &str = "x-portal-route";

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("upstream {url} unreachable: {source}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream {0} timed out")]
    Timeout(String),

    #[error("failed to read upstream response: {0}")]
    Response(String),
}

/// Single-hop forwarder. A failed hop is reported, never retried.
pub struct ReverseProxy {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReverseProxy {
    pub fn new(timeout: Duration, max_body_bytes: usize) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            // Bodies pass through byte-for-byte with their original encoding
            .no_gzip()
            .build()?;

        Ok(Self {
            client,
            max_body_bytes,
        })
    }

    pub async fn forward(&self, request: Request, url: Url, prefix: &str) -> Result<Response, ProxyError> {
        let (parts, body) = request.into_parts();
        let body = to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|_| ProxyError::BodyTooLarge(self.max_body_bytes))?;

        let mut headers = strip_hop_by_hop(&parts.headers);
        if let Some(host) = parts.headers.get(header::HOST) {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host.clone());
        }
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        let target = url.to_string();
        tracing::debug!(method = %parts.method, %target, "proxying request");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProxyError::Timeout(target.clone())
                } else {
                    ProxyError::Upstream {
                        url: target.clone(),
                        source: e,
                    }
                }
            })?;

        let status = upstream.status();
        let mut response_headers = strip_hop_by_hop(upstream.headers());
        let bytes = upstream
            .bytes()
            .await
            .map_err(|e| ProxyError::Response(e.to_string()))?;

        response_headers.remove(header::CONTENT_LENGTH);
        if let Ok(value) = HeaderValue::from_str(prefix) {
            response_headers.insert(HeaderName::from_static(ROUTE_HEADER), value);
        }

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

/// Copy headers minus hop-by-hop ones. Repeated headers such as
/// `Set-Cookie` keep every value.
fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if is_hop_by_hop(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_every_set_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert(HeaderName::from_static("keep-alive"), HeaderValue::from_static("timeout=5"));

        let out = strip_hop_by_hop(&headers);
        assert_eq!(out.get_all(header::SET_COOKIE).iter().count(), 2);
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get("keep-alive").is_none());
    }
}
