//! Module versions and their total order.
//!
//! A version is split on `.` into segments. Numeric segments compare
//! numerically, text segments lexically, and a numeric segment always sorts
//! before a text one. The shorter sequence is padded with numeric zeros, so
//! `1.0` and `1.0.0` sort together; the raw strings break that tie so that
//! `Ord` stays consistent with `Eq`.
//!
//! The empty version sorts above every other version. It is what a
//! dependency on an overridden module usually declares.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Num(u64),
    Text(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Num(a), Segment::Num(b)) => a.cmp(b),
            (Segment::Num(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Num(_)) => Ordering::Greater,
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const ZERO: Segment = Segment::Num(0);

/// A parsed module version
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    segments: Vec<Segment>,
}

/// Error returned when a version string is malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError {
    pub input: String,
    pub reason: &'static str,
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for VersionParseError {}

impl Version {
    /// Parse a version string
    ///
    /// # Errors
    /// Returns [`VersionParseError`] for empty segments (`1..0`, `.1`) and
    /// characters other than ASCII alphanumerics, `-`, `_` and `+`.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        if input.is_empty() {
            return Ok(Self::empty());
        }
        let mut segments = Vec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(VersionParseError {
                    input: input.to_string(),
                    reason: "empty segment",
                });
            }
            if !part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
            {
                return Err(VersionParseError {
                    input: input.to_string(),
                    reason: "unexpected character",
                });
            }
            let segment = if part.chars().all(|c| c.is_ascii_digit()) {
                part.parse::<u64>()
                    .map(Segment::Num)
                    .map_err(|_| VersionParseError {
                        input: input.to_string(),
                        reason: "numeric segment out of range",
                    })?
            } else {
                Segment::Text(part.to_string())
            };
            segments.push(segment);
        }
        Ok(Self {
            raw: input.to_string(),
            segments,
        })
    }

    /// The empty version
    pub fn empty() -> Self {
        Self {
            raw: String::new(),
            segments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Smallest member of `allowed` that is greater than or equal to
    /// `candidate`.
    pub fn ceiling<'a>(candidate: &Version, allowed: &'a BTreeSet<Version>) -> Option<&'a Version> {
        allowed.range(candidate.clone()..).next()
    }

    fn cmp_segments(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).unwrap_or(&ZERO);
            let b = other.segments.get(i).unwrap_or(&ZERO);
            match a.cmp(b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        self.cmp_segments(other)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality and hashing go through the raw string, which `cmp` also ends on.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_segments_compare_numerically() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("2.0") > v("1.99.99"));
    }

    #[test]
    fn test_shorter_version_is_padded_with_zero() {
        assert_eq!(v("1.0").cmp_segments(&v("1.0.0")), Ordering::Equal);
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn test_padding_tie_is_broken_by_raw_string() {
        assert!(v("1.0.0") > v("1.0"));
        assert_ne!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn test_text_segments_sort_after_numbers() {
        assert!(v("1.rc1") > v("1.9"));
        assert!(v("1.beta") > v("1.alpha"));
    }

    #[test]
    fn test_empty_version_is_highest() {
        assert!(Version::empty() > v("999.0"));
        assert_eq!(Version::parse("").unwrap(), Version::empty());
    }

    #[test]
    fn test_malformed_versions_are_rejected() {
        assert!(Version::parse("1..0").is_err());
        assert!(Version::parse(".1").is_err());
        assert!(Version::parse("1.0 ").is_err());
        assert!(Version::parse("1/2").is_err());
    }

    #[test]
    fn test_ceiling_rounds_up_to_allowed_member() {
        let allowed: BTreeSet<Version> = ["1.0", "2.0", "3.0"].iter().map(|s| v(s)).collect();
        assert_eq!(Version::ceiling(&v("0.5"), &allowed), Some(&v("1.0")));
        assert_eq!(Version::ceiling(&v("2.0"), &allowed), Some(&v("2.0")));
        assert_eq!(Version::ceiling(&v("2.1"), &allowed), Some(&v("3.0")));
        assert_eq!(Version::ceiling(&v("3.1"), &allowed), None);
    }
}
