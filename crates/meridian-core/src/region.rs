//! Controller region rewriting helpers.
//!
//! Controller URLs follow the `<name[-env]>.<region>.<domain>.<tld>` shape.
//! Rewriting operates on the dot-split of the full controller string
//! (scheme included) and replaces the segment at position 1; bases with a
//! single segment get the region appended instead. This matches the known
//! deployment domain shape and is deliberately not generalized to other
//! segment counts.

/// Whether `region` already appears as a dot-separated segment of `base`.
pub(crate) fn region_label_present(base: &str, region: &str) -> bool {
    base.split('.').any(|part| part == region)
}

/// Rewrite `base` so its second dot-segment is `region`.
///
/// Single-segment bases (no dots) get `.region` appended.
pub(crate) fn rewrite_with_region(base: &str, region: &str) -> String {
    let mut parts: Vec<&str> = base.split('.').collect();
    if parts.len() > 1 {
        parts[1] = region;
        parts.join(".")
    } else {
        format!("{base}.{region}")
    }
}
