//! TLS trust material for the controller connection.
//!
//! The SDK pins the controller API endpoint to a CA bundle shipped with the
//! crate. At session construction the bundle is written once to a temporary
//! file so callers and diagnostics have a concrete verification input on
//! disk; the file is removed exactly once when the owning session drops.

use crate::config::TrustSetting;
use crate::Error;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// CA bundle for the Meridian controller API endpoint, PEM-encoded.
pub const CONTROLLER_CA_BUNDLE: &[u8] = include_bytes!("../certs/controller-ca.pem");

/// Materialized trust material for a session.
///
/// Owns the temporary bundle file in the pinned case; dropping the session
/// (and with it this value) deletes the file. The handle stays open for the
/// session's lifetime - `tempfile` opens it with share permissions, so the
/// path remains readable by the TLS layer on every platform.
#[derive(Debug)]
pub struct TrustMaterial {
    setting: TrustSetting,
    pinned_bundle: Option<NamedTempFile>,
}

impl TrustMaterial {
    /// Resolve a [`TrustSetting`] into usable trust material.
    ///
    /// # Errors
    ///
    /// Returns an error if the pinned bundle cannot be written to a
    /// temporary file.
    pub fn materialize(setting: &TrustSetting) -> Result<Self, Error> {
        let pinned_bundle = match setting {
            TrustSetting::Pinned => {
                let mut file = NamedTempFile::new().map_err(|err| {
                    Error::ConfigError(format!("Failed to create CA bundle file: {err}"))
                })?;
                file.write_all(CONTROLLER_CA_BUNDLE).map_err(|err| {
                    Error::ConfigError(format!("Failed to write CA bundle: {err}"))
                })?;
                file.flush().map_err(|err| {
                    Error::ConfigError(format!("Failed to flush CA bundle: {err}"))
                })?;
                debug!(path = %file.path().display(), "materialized pinned CA bundle");
                Some(file)
            }
            TrustSetting::Disabled | TrustSetting::CaBundle(_) => None,
        };

        Ok(Self {
            setting: setting.clone(),
            pinned_bundle,
        })
    }

    /// Whether TLS verification is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.setting == TrustSetting::Disabled
    }

    /// Path of the CA bundle used for verification, if any.
    ///
    /// `None` when verification is disabled.
    #[must_use]
    pub fn verify_path(&self) -> Option<&Path> {
        match &self.setting {
            TrustSetting::Pinned => self.pinned_bundle.as_ref().map(NamedTempFile::path),
            TrustSetting::Disabled => None,
            TrustSetting::CaBundle(path) => Some(path.as_path()),
        }
    }

    /// PEM bytes of the CA bundle to install as root certificates.
    ///
    /// `None` when verification is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if a caller-supplied bundle path cannot be read.
    pub fn ca_pem(&self) -> Result<Option<Vec<u8>>, Error> {
        match &self.setting {
            TrustSetting::Pinned => Ok(Some(CONTROLLER_CA_BUNDLE.to_vec())),
            TrustSetting::Disabled => Ok(None),
            TrustSetting::CaBundle(path) => {
                let bytes = std::fs::read(path).map_err(|err| {
                    Error::ConfigError(format!(
                        "Failed to read CA bundle {}: {err}",
                        path.display()
                    ))
                })?;
                Ok(Some(bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_bundle_is_pem() {
        let text = std::str::from_utf8(CONTROLLER_CA_BUNDLE).unwrap();
        assert!(text.contains("-----BEGIN CERTIFICATE-----"));
        assert!(text.contains("-----END CERTIFICATE-----"));
    }

    #[test]
    fn test_pinned_writes_temp_bundle() {
        let material = TrustMaterial::materialize(&TrustSetting::Pinned).unwrap();
        assert!(!material.is_disabled());

        let path = material.verify_path().expect("pinned bundle path").to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), CONTROLLER_CA_BUNDLE);

        // dropping the material removes the file exactly once
        drop(material);
        assert!(!path.exists());
    }

    #[test]
    fn test_disabled_has_no_path() {
        let material = TrustMaterial::materialize(&TrustSetting::Disabled).unwrap();
        assert!(material.is_disabled());
        assert!(material.verify_path().is_none());
        assert!(material.ca_pem().unwrap().is_none());
    }

    #[test]
    fn test_caller_supplied_path_used_verbatim() {
        let setting = TrustSetting::CaBundle(PathBuf::from("/etc/ssl/custom.pem"));
        let material = TrustMaterial::materialize(&setting).unwrap();
        assert_eq!(
            material.verify_path(),
            Some(Path::new("/etc/ssl/custom.pem"))
        );
        // unreadable caller path surfaces as a config error
        assert!(material.ca_pem().is_err());
    }

    #[test]
    fn test_caller_supplied_path_read() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"-----BEGIN CERTIFICATE-----\n").unwrap();
        file.flush().unwrap();

        let setting = TrustSetting::CaBundle(file.path().to_path_buf());
        let material = TrustMaterial::materialize(&setting).unwrap();
        let pem = material.ca_pem().unwrap().unwrap();
        assert_eq!(pem, b"-----BEGIN CERTIFICATE-----\n");
    }

    #[test]
    fn test_pinned_pem_matches_bundle() {
        let material = TrustMaterial::materialize(&TrustSetting::Pinned).unwrap();
        assert_eq!(material.ca_pem().unwrap().unwrap(), CONTROLLER_CA_BUNDLE);
    }
}
