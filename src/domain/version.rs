//! API version negotiation.
//!
//! A version token is `[prefix]<integer>`. The integer part must be plain
//! ASCII digits and fall inside the supported inclusive range. Comparison is
//! numeric, so `"10"` is above `"9"`.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Deserialize;
use thiserror::Error;

/// Textual prefix policy, e.g. `v` for tokens like `v2`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionPrefix {
    pub text: String,
    #[serde(default)]
    pub required: bool,
}

impl VersionPrefix {
    pub fn optional(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            required: false,
        }
    }

    pub fn required(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            required: true,
        }
    }
}

/// Supported version range and prefix policy for a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    pub minimum: u32,
    pub maximum: u32,
    pub prefix: Option<VersionPrefix>,
}

impl Default for VersionSpec {
    fn default() -> Self {
        Self {
            minimum: 1,
            maximum: 1,
            prefix: None,
        }
    }
}

impl VersionSpec {
    pub fn new(range: RangeInclusive<u32>) -> Self {
        Self {
            minimum: *range.start(),
            maximum: *range.end(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: VersionPrefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn accepts(&self, version: u32) -> bool {
        (self.minimum..=self.maximum).contains(&version)
    }

    /// Match a raw token against this spec.
    pub fn matches(&self, token: Option<&str>) -> Result<ApiVersion, VersionError> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(VersionError::Missing),
        };

        let digits = match &self.prefix {
            Some(prefix) if !prefix.text.is_empty() => match token.strip_prefix(&prefix.text) {
                Some(rest) => rest,
                None if prefix.required => {
                    return Err(VersionError::invalid(token, "required prefix missing"));
                }
                None => token,
            },
            _ => token,
        };

        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(VersionError::invalid(token, "not a whole number"));
        }

        let version: u32 = digits
            .parse()
            .map_err(|_| VersionError::invalid(token, "number out of range"))?;

        if !self.accepts(version) {
            return Err(VersionError::Unsupported {
                version,
                minimum: self.minimum,
                maximum: self.maximum,
            });
        }

        Ok(ApiVersion(version))
    }
}

/// A version accepted by [`VersionSpec::matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion(pub u32);

impl ApiVersion {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("no version was specified")]
    Missing,
    #[error("version `{token}` is malformed: {reason}")]
    Malformed { token: String, reason: &'static str },
    #[error("version {version} is not between {minimum} and {maximum}")]
    Unsupported {
        version: u32,
        minimum: u32,
        maximum: u32,
    },
}

impl VersionError {
    fn invalid(token: &str, reason: &'static str) -> Self {
        Self::Malformed {
            token: token.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> VersionSpec {
        VersionSpec::new(1..=2)
    }

    #[test]
    fn accepts_versions_in_range() {
        assert_eq!(spec().matches(Some("1")), Ok(ApiVersion(1)));
        assert_eq!(spec().matches(Some("2")), Ok(ApiVersion(2)));
    }

    #[test]
    fn rejects_invalid_numbers() {
        for token in ["0", "3", "10", "2.5", "2.2", "1.1", "abc", "+1", "-1", " 1", "1 "] {
            assert!(spec().matches(Some(token)).is_err(), "accepted `{token}`");
        }
    }

    #[test]
    fn rejects_missing_version() {
        assert_eq!(spec().matches(None), Err(VersionError::Missing));
        assert_eq!(spec().matches(Some("")), Err(VersionError::Missing));
    }

    #[test]
    fn rejects_prefix_when_none_is_configured() {
        assert!(spec().matches(Some("v1")).is_err());
    }

    #[test]
    fn optional_prefix_accepts_with_and_without() {
        let spec = spec().with_prefix(VersionPrefix::optional("v"));
        assert_eq!(spec.matches(Some("v1")), Ok(ApiVersion(1)));
        assert_eq!(spec.matches(Some("1")), Ok(ApiVersion(1)));
    }

    #[test]
    fn optional_prefix_rejects_foreign_prefix() {
        let spec = spec().with_prefix(VersionPrefix::optional("v"));
        assert!(spec.matches(Some("x1")).is_err());
    }

    #[test]
    fn required_prefix_must_be_present() {
        let spec = spec().with_prefix(VersionPrefix::required("v"));
        assert_eq!(spec.matches(Some("v1")), Ok(ApiVersion(1)));
        assert!(spec.matches(Some("1")).is_err());
        assert!(spec.matches(Some("x1")).is_err());
    }

    #[test]
    fn required_foreign_prefix_rejects_other_prefixes() {
        let spec = spec().with_prefix(VersionPrefix::required("x"));
        assert!(spec.matches(Some("v1")).is_err());
    }

    #[test]
    fn bare_prefix_is_rejected() {
        let spec = spec().with_prefix(VersionPrefix::optional("v"));
        assert!(matches!(
            spec.matches(Some("v")),
            Err(VersionError::Malformed { .. })
        ));
    }

    #[test]
    fn comparison_is_numeric() {
        let spec = VersionSpec::new(2..=10);
        assert_eq!(spec.matches(Some("10")), Ok(ApiVersion(10)));
        assert_eq!(spec.matches(Some("9")), Ok(ApiVersion(9)));
        assert!(spec.matches(Some("11")).is_err());
    }

    #[test]
    fn overflowing_numbers_are_rejected() {
        assert!(spec().matches(Some("99999999999999999999")).is_err());
    }
}
