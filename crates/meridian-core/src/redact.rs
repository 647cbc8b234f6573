//! Credential redaction for diagnostic output.
//!
//! Auth-bearing headers and cookies must never reach logs in the clear.
//! Every diagnostic path in the engine renders headers through this module
//! with `reveal = false`; the override exists only for explicit
//! troubleshooting helpers and has to be passed by the caller each time.

use reqwest::header::HeaderMap;

const MASK: &str = "<SENSITIVE - NOT SHOWN BY DEFAULT>";

/// Cookie name that carries the controller auth token.
pub const AUTH_COOKIE: &str = "auth_token";

/// Header that carries a static auth token.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Render a `Cookie` header value with auth-token cookies masked.
///
/// Cookies whose name matches [`AUTH_COOKIE`] (case-insensitive) keep their
/// name and lose their value unless `reveal` is set; all other cookies pass
/// through unchanged.
#[must_use]
pub fn cookie_header(value: &str, reveal: bool) -> String {
    if reveal {
        return value.to_string();
    }

    let masked: Vec<String> = value
        .split("; ")
        .map(|cookie| {
            let trimmed = cookie.trim();
            match trimmed.split_once('=') {
                Some((name, _)) if name.eq_ignore_ascii_case(AUTH_COOKIE) => {
                    format!("{name}={MASK}")
                }
                _ => trimmed.to_string(),
            }
        })
        .collect();

    masked.join("; ")
}

/// Render a header map as `name: value` lines with credentials masked.
///
/// `cookie` values are run through [`cookie_header`]; [`AUTH_HEADER`] is
/// masked entirely. Values that are not valid UTF-8 render as a
/// placeholder.
#[must_use]
pub fn headers(map: &HeaderMap, reveal: bool) -> String {
    let mut lines = Vec::with_capacity(map.len());
    for (name, value) in map {
        let text = value.to_str().unwrap_or("<binary>");
        let rendered = if !reveal && name.as_str().eq_ignore_ascii_case(AUTH_HEADER) {
            MASK.to_string()
        } else if name.as_str().eq_ignore_ascii_case("cookie") {
            cookie_header(text, reveal)
        } else {
            text.to_string()
        };
        lines.push(format!("{name}: {rendered}"));
    }
    lines.join("\n")
}
