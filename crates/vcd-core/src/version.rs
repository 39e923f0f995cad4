//! API version parsing and negotiation
//!
//! VCD advertises a set of API versions (`36.0`, `37.2`, `38.1`, ...). Each
//! OpenAPI endpoint has a minimum version it exists in. Negotiation picks the
//! highest version the server advertises that is at least the endpoint's
//! minimum and, when the client is capped, no higher than the cap.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Operation, Result, VcdError};

/// A `major.minor` API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Error returned when a version string is not `major[.minor]`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid API version '{0}'")]
pub struct ParseVersionError(pub String);

impl FromStr for ApiVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.splitn(2, '.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| ParseVersionError(s.to_string()))?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| ParseVersionError(s.to_string()))?,
            None => 0,
        };
        Ok(Self { major, minor })
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The versions a connected server advertises, sorted ascending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerVersions {
    versions: Vec<ApiVersion>,
}

impl ServerVersions {
    pub fn new(versions: impl IntoIterator<Item = ApiVersion>) -> Self {
        let mut versions: Vec<_> = versions.into_iter().collect();
        versions.sort();
        versions.dedup();
        Self { versions }
    }

    /// Parse a list of version strings, skipping anything unparseable
    pub fn parse<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(raw.into_iter().filter_map(|v| v.as_ref().parse().ok()))
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn highest(&self) -> Option<ApiVersion> {
        self.versions.last().copied()
    }

    pub fn as_slice(&self) -> &[ApiVersion] {
        &self.versions
    }

    /// Highest advertised version within `[required, cap]`
    ///
    /// `operation`, `entity` and `endpoint` are only used for the error message.
    pub fn negotiate(
        &self,
        operation: Operation,
        entity: &str,
        endpoint: &str,
        required: ApiVersion,
        cap: Option<ApiVersion>,
    ) -> Result<ApiVersion> {
        self.versions
            .iter()
            .rev()
            .copied()
            .find(|v| *v >= required && cap.is_none_or(|c| *v <= c))
            .ok_or_else(|| VcdError::UnsupportedEndpoint {
                operation,
                entity: entity.to_string(),
                endpoint: endpoint.to_string(),
                required: required.to_string(),
                available: self.describe(cap),
            })
    }

    fn describe(&self, cap: Option<ApiVersion>) -> String {
        let listed = if self.versions.is_empty() {
            "no versions".to_string()
        } else {
            self.versions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match cap {
            Some(cap) => format!("[{listed}] (client capped at {cap})"),
            None => format!("[{listed}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ApiVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_versions() {
        assert_eq!(v("38.1"), ApiVersion::new(38, 1));
        assert_eq!(v("37"), ApiVersion::new(37, 0));
        assert!("abc".parse::<ApiVersion>().is_err());
        assert!("37.x".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn test_ordering_is_numeric() {
        assert!(v("37.10") > v("37.2"));
        assert!(v("38.0") > v("37.10"));
    }

    #[test]
    fn test_negotiate_rejects_old_server() {
        let server = ServerVersions::new([v("33.0"), v("36.0")]);
        let err = server.negotiate(Operation::Get, "IP Space", "1.0.0/ipSpaces/", v("37.0"), None).unwrap_err();
        assert!(err.is_unsupported_endpoint());
        assert!(err.to_string().contains("37.0"));
    }

    #[test]
    fn test_negotiate_picks_highest() {
        let server = ServerVersions::new([v("33.0"), v("38.1")]);
        let picked = server.negotiate(Operation::Get, "IP Space", "1.0.0/ipSpaces/", v("37.0"), None).unwrap();
        assert_eq!(picked, v("38.1"));
    }

    #[test]
    fn test_negotiate_respects_client_cap() {
        let server = ServerVersions::new([v("36.0"), v("37.2"), v("38.1")]);
        let picked = server
            .negotiate(Operation::List, "Role", "1.0.0/roles/", v("31.0"), Some(v("37.2")))
            .unwrap();
        assert_eq!(picked, v("37.2"));

        let err = server
            .negotiate(Operation::Create, "IP Space", "1.0.0/ipSpaces/", v("38.0"), Some(v("37.2")))
            .unwrap_err();
        assert!(err.is_unsupported_endpoint());
        assert!(err.to_string().contains("capped"));
        assert!(err.to_string().starts_with("create IP Space: "));
    }

    #[test]
    fn test_empty_server_versions() {
        let server = ServerVersions::default();
        assert!(server.negotiate(Operation::Get, "IP Space", "x", v("1.0"), None).is_err());
        assert_eq!(server.highest(), None);
    }

    #[test]
    fn test_parse_skips_garbage_and_dedups() {
        let server = ServerVersions::parse(["38.1", "nope", "36.0", "38.1"]);
        assert_eq!(server.as_slice(), &[v("36.0"), v("38.1")]);
    }
}
