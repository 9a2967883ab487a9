use tracing::debug;

use crate::effects::Platform;

const MACOS: &str = "macos";
const MIN_MACOS: [u32; 2] = [10, 15];

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    #[error("only macOS is supported")]
    UnsupportedOs,
    #[error("could not check macOS version")]
    UnknownVersion,
    #[error("this script requires at least macOS 10.15 to run")]
    TooOld,
}

/// Refuses to run anywhere but macOS 10.15 or newer.
///
/// # Errors
/// Returns the [`PlatformError`] describing why the host is unsupported.
pub fn ensure_supported(platform: &dyn Platform) -> Result<(), PlatformError> {
    if platform.os_family() != MACOS {
        return Err(PlatformError::UnsupportedOs);
    }
    let raw = platform.product_version().map_err(|err| {
        debug!(%err, "product version query failed");
        PlatformError::UnknownVersion
    })?;
    let version = parse_version(&raw).ok_or_else(|| {
        debug!(version = %raw, "unparsable product version");
        PlatformError::UnknownVersion
    })?;
    if version.as_slice() < MIN_MACOS.as_slice() {
        return Err(PlatformError::TooOld);
    }
    Ok(())
}

fn parse_version(raw: &str) -> Option<Vec<u32>> {
    raw.trim()
        .split('.')
        .map(|part| part.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};

    struct FakePlatform {
        os: &'static str,
        version: Option<&'static str>,
    }

    impl Platform for FakePlatform {
        fn os_family(&self) -> &str {
            self.os
        }

        fn product_version(&self) -> Result<String> {
            self.version
                .map(str::to_string)
                .ok_or_else(|| anyhow!("sw_vers not found"))
        }
    }

    fn check(os: &'static str, version: Option<&'static str>) -> Result<(), PlatformError> {
        ensure_supported(&FakePlatform { os, version })
    }

    #[test]
    fn accepts_supported_versions() {
        assert_eq!(check("macos", Some("10.15")), Ok(()));
        assert_eq!(check("macos", Some("10.15.7\n")), Ok(()));
        assert_eq!(check("macos", Some("13.2.1")), Ok(()));
    }

    #[test]
    fn rejects_other_systems() {
        assert_eq!(check("linux", Some("13.0")), Err(PlatformError::UnsupportedOs));
        assert_eq!(
            PlatformError::UnsupportedOs.to_string(),
            "only macOS is supported"
        );
    }

    #[test]
    fn rejects_old_or_unknown_versions() {
        assert_eq!(check("macos", Some("10.14.6")), Err(PlatformError::TooOld));
        assert_eq!(check("macos", Some("10")), Err(PlatformError::TooOld));
        assert_eq!(check("macos", Some("ten")), Err(PlatformError::UnknownVersion));
        assert_eq!(check("macos", None), Err(PlatformError::UnknownVersion));
    }
}
