//! URL scheme alignment between a requested image URL and the upload root.
//!
//! A site configured with `http://example.com/uploads` may be served over
//! HTTPS, or reference uploads with protocol-relative `//example.com/...`
//! URLs. The base URL is rewritten to the requester's scheme before it is
//! used, both for the "is this a local upload?" prefix check and for the
//! URLs we hand back, so browsers never see mixed-content links.

const HTTP: &str = "http://";
const HTTPS: &str = "https://";
const PROTOCOL_RELATIVE: &str = "//";

/// Rewrite the scheme of `base_url` to match `request_url`.
///
/// | `request_url` starts with | `base_url` rewrite |
/// |---|---|
/// | `https://` | `http://` → `https://` |
/// | `http://` | `https://` → `http://` |
/// | `//` | `http://` or `https://` → `//` |
/// | anything else | unchanged |
///
/// Only the leading scheme is touched.
pub fn reconcile(request_url: &str, base_url: &str) -> String {
    if request_url.starts_with(HTTPS) {
        swap_prefix(base_url, HTTP, HTTPS)
    } else if request_url.starts_with(HTTP) {
        swap_prefix(base_url, HTTPS, HTTP)
    } else if request_url.starts_with(PROTOCOL_RELATIVE) {
        let rest = base_url
            .strip_prefix(HTTP)
            .or_else(|| base_url.strip_prefix(HTTPS));
        match rest {
            Some(rest) => format!("{PROTOCOL_RELATIVE}{rest}"),
            None => base_url.to_string(),
        }
    } else {
        base_url.to_string()
    }
}

fn swap_prefix(url: &str, from: &str, to: &str) -> String {
    match url.strip_prefix(from) {
        Some(rest) => format!("{to}{rest}"),
        None => url.to_string(),
    }
}
