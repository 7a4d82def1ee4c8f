use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use sha2::Digest as _;

pub(crate) const ADMIN_HEADER: &str = "X-Marine-Admin";

const PAGE_CSP: &str = "default-src 'self'; img-src 'self' data:; style-src 'self'; script-src 'self'; connect-src 'self'; frame-ancestors 'none'";

fn configured_token() -> Option<String> {
    std::env::var("MARINE_ADMIN_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
}

pub(crate) fn admin_token_set() -> bool {
    configured_token().is_some()
}

fn presented_token(headers: &HeaderMap) -> Option<String> {
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|hv| hv.strip_prefix("Bearer "))
    {
        return Some(bearer.trim().to_string());
    }
    headers
        .get(ADMIN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|v| v.trim().to_string())
}

fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Mutating routes are open while no token is configured (loopback binds
/// only; startup refuses public binds without one).
pub(crate) fn admin_ok(headers: &HeaderMap) -> bool {
    let Some(want) = configured_token() else {
        return true;
    };
    let Some(got) = presented_token(headers) else {
        return false;
    };
    // Compare digests so lengths never leak through the early return.
    let want = sha2::Sha256::digest(want.as_bytes());
    let got = sha2::Sha256::digest(got.as_bytes());
    ct_eq(&want, &got)
}

pub async fn headers_mw(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut res = next.run(req).await;
    let h = res.headers_mut();
    let add_hdr = |h: &mut HeaderMap, name: &'static str, val: &str| {
        let name = HeaderName::from_static(name);
        if !h.contains_key(&name) {
            if let Ok(v) = HeaderValue::from_str(val) {
                h.insert(name, v);
            }
        }
    };
    add_hdr(h, "x-content-type-options", "nosniff");
    add_hdr(h, "x-frame-options", "DENY");
    add_hdr(h, "referrer-policy", "no-referrer");
    if std::env::var("MARINE_HSTS").ok().as_deref() == Some("1") {
        add_hdr(
            h,
            "strict-transport-security",
            "max-age=31536000; includeSubDomains",
        );
    }
    let is_html = h
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false);
    if is_html {
        add_hdr(h, "content-security-policy", PAGE_CSP);
    }
    res
}
