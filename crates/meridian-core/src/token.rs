//! Auth token parsing.
//!
//! Controller auth tokens arrive as a random prefix segment followed by a
//! URL-encoded `key=value` pair list:
//! `<prefix>-<key1>%3D<val1>&<key2>=<val2>...`. The prefix carries no
//! information and is discarded.

use std::collections::HashMap;

/// Break an auth token into its constituent key/value pairs.
///
/// The segment before the first `-` is dropped, the remainder is URL-decoded
/// and split on `&`. Pairs that do not contain exactly one `=` are silently
/// skipped; a token with no `-` delimiter yields an empty map.
#[must_use]
pub fn parse_auth_token(auth_token: &str) -> HashMap<String, String> {
    let Some((_, trailer)) = auth_token.split_once('-') else {
        return HashMap::new();
    };

    let decoded = urlencoding::decode(trailer)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| trailer.to_string());

    let mut fields = HashMap::new();
    for pair in decoded.split('&') {
        let parts: Vec<&str> = pair.split('=').collect();
        if let [key, value] = parts[..] {
            fields.insert(key.to_string(), value.to_string());
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_with_region() {
        let fields = parse_auth_token("abc123-key1%3Dval1&region=usa");
        assert_eq!(fields.get("region").map(String::as_str), Some("usa"));
        assert_eq!(fields.get("key1").map(String::as_str), Some("val1"));
    }

    #[test]
    fn test_prefix_discarded_up_to_first_dash() {
        // later dashes stay part of the value
        let fields = parse_auth_token("r4nd0m-tenant=acme-west&region=europe");
        assert_eq!(fields.get("tenant").map(String::as_str), Some("acme-west"));
        assert_eq!(fields.get("region").map(String::as_str), Some("europe"));
    }

    #[test]
    fn test_malformed_pairs_dropped() {
        let fields = parse_auth_token("prefix-noequals&region=usa&a=b=c");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("region").map(String::as_str), Some("usa"));
        assert!(!fields.contains_key("noequals"));
        assert!(!fields.contains_key("a"));
    }

    #[test]
    fn test_token_without_delimiter() {
        assert!(parse_auth_token("nodelimiterhere").is_empty());
    }

    #[test]
    fn test_empty_token() {
        assert!(parse_auth_token("").is_empty());
    }

    #[test]
    fn test_url_decoding_applied() {
        let fields = parse_auth_token("p-path%3D%2Fapi%2Fv2&region=usa");
        assert_eq!(fields.get("path").map(String::as_str), Some("/api/v2"));
    }
}
