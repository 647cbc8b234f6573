//! Release update check.
//!
//! Best-effort notification when a newer SDK release has been published.
//! Runs once at session construction when enabled; every failure is
//! swallowed so a broken or unreachable registry never affects the session.

use crate::config::UPDATE_CHECK_TIMEOUT_SECS;
use crate::Error;
use semver::Version;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Check the registry and print a notice to stderr if a newer release
/// exists. Failures are logged at debug level and otherwise ignored.
pub(crate) fn notify_for_new_version(update_info_url: &str) {
    let latest = match fetch_latest_version(update_info_url) {
        Ok(version) => version,
        Err(err) => {
            debug!(error = %err, "update check failed");
            return;
        }
    };

    let Ok(current) = Version::parse(env!("CARGO_PKG_VERSION")) else {
        return;
    };

    debug!(%latest, %current, "update check versions");

    if newer_release(&current, &latest) {
        eprintln!(
            "WARNING: Meridian SDK upgrade available. Releases are typically \
             deprecated 6 months after a new version ships.\n\
             \tLatest version: {latest}\n\
             \tCurrent version: {current}\n\
             \tThis notice can be suppressed by disabling the update check \
             on the session builder.\n"
        );
    }
}

fn fetch_latest_version(update_info_url: &str) -> Result<Version, Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(UPDATE_CHECK_TIMEOUT_SECS))
        .build()?;
    let info: Value = client.get(update_info_url).send()?.json()?;

    let latest = latest_from_info(&info)
        .ok_or_else(|| Error::ParseError("update info missing max_version".to_string()))?;

    Version::parse(latest).map_err(|err| Error::ParseError(err.to_string()))
}

fn latest_from_info(info: &Value) -> Option<&str> {
    info.get("crate")?.get("max_version")?.as_str()
}

/// Compare releases on major/minor/patch only; build metadata and
/// pre-release tags do not trigger a notice.
fn newer_release(current: &Version, latest: &Version) -> bool {
    (latest.major, latest.minor, latest.patch) > (current.major, current.minor, current.patch)
}
