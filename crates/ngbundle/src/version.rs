//! Version record derived once per build invocation.

use std::fmt;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("version pattern is valid"));

/// The values stamped into placeholder tokens.
///
/// `cdn` carries the same value as `full`; the two only diverge in deployment
/// setups this tool does not handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub full: String,
    pub cdn: String,
    pub code_name: String,
}

impl VersionRecord {
    /// Parse the first `major.minor.patch` triple found in `input`.
    ///
    /// Never fails: input without a usable triple yields `0.0.0` with an empty
    /// code name.
    pub fn parse(input: &str, code_name: &str) -> Self {
        let Some(caps) = VERSION_PATTERN.captures(input) else {
            warn!("Version string {input:?} has no major.minor.patch, using 0.0.0");
            return Self::fallback();
        };

        let parts = (caps[1].parse(), caps[2].parse(), caps[3].parse());
        match parts {
            (Ok(major), Ok(minor), Ok(patch)) => Self::new(major, minor, patch, code_name),
            _ => {
                warn!("Version string {input:?} has out-of-range components, using 0.0.0");
                Self::fallback()
            }
        }
    }

    pub fn new(major: u64, minor: u64, patch: u64, code_name: &str) -> Self {
        let full = format!("{major}.{minor}.{patch}");
        Self {
            major,
            minor,
            patch,
            cdn: full.clone(),
            full,
            code_name: code_name.to_owned(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(0, 0, 0, "")
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code_name.is_empty() {
            write!(f, "{}", self.full)
        } else {
            write!(f, "{} ({})", self.full, self.code_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prerelease_suffix() {
        let version = VersionRecord::parse("1.2.3-beta", "snapshot");
        assert_eq!(version.major, 1);
        assert_eq!(version.minor, 2);
        assert_eq!(version.patch, 3);
        assert_eq!(version.full, "1.2.3");
        assert_eq!(version.cdn, "1.2.3");
        assert_eq!(version.code_name, "snapshot");
    }

    #[test]
    fn test_parse_empty_falls_back() {
        let version = VersionRecord::parse("", "snapshot");
        assert_eq!(version, VersionRecord::new(0, 0, 0, ""));
        assert_eq!(version.full, "0.0.0");
        assert!(version.code_name.is_empty());
    }

    #[test]
    fn test_parse_finds_triple_anywhere() {
        let version = VersionRecord::parse("v1.8.3-local+sha.abc", "bubble-burst");
        assert_eq!(version.full, "1.8.3");
    }

    #[test]
    fn test_parse_two_components_falls_back() {
        assert_eq!(VersionRecord::parse("1.8", "x"), VersionRecord::fallback());
    }

    #[test]
    fn test_parse_overflow_falls_back() {
        let version = VersionRecord::parse("99999999999999999999999.0.0", "x");
        assert_eq!(version, VersionRecord::fallback());
    }

    #[test]
    fn test_display() {
        assert_eq!(VersionRecord::new(1, 2, 3, "").to_string(), "1.2.3");
        assert_eq!(
            VersionRecord::new(1, 2, 3, "snapshot").to_string(),
            "1.2.3 (snapshot)"
        );
    }
}
