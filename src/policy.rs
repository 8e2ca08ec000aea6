//! Privacy Policy Module
//!
//! Maps a record's privacy classification to its cache lifetime. More
//! sensitive data is cached for less time; the ordering is validated when
//! the configuration is loaded.

use std::fmt;
use std::time::Duration;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

// == Privacy Level ==
/// Ordinal privacy classification of a record.
///
/// Classification is supplied by the platform's data layer. Any raw value
/// outside the four defined levels resolves to the most conservative level
/// rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrivacyLevel {
    /// Openly shareable data (course catalogs, public aggregates)
    Public = 1,
    /// Data shared within a cohort or class
    Limited = 2,
    /// Individual learner data
    Private = 3,
    /// Regulated or consent-gated data
    Restricted = 4,
}

impl PrivacyLevel {
    /// Converts a raw classification value into a level.
    ///
    /// Total over all inputs: 1-4 map to their levels, anything else maps
    /// to `Restricted`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => PrivacyLevel::Public,
            2 => PrivacyLevel::Limited,
            3 => PrivacyLevel::Private,
            4 => PrivacyLevel::Restricted,
            _ => PrivacyLevel::Restricted,
        }
    }

    /// Returns the ordinal value of the level.
    pub fn as_raw(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrivacyLevel::Public => "public",
            PrivacyLevel::Limited => "limited",
            PrivacyLevel::Private => "private",
            PrivacyLevel::Restricted => "restricted",
        };
        write!(f, "{}", name)
    }
}

// Levels cross the wire as their ordinal value. Deserialization goes
// through `from_raw`, so an unknown ordinal lands on `Restricted` instead
// of rejecting the request.
impl Serialize for PrivacyLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for PrivacyLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Ok(PrivacyLevel::from_raw(raw))
    }
}

// == Lifetime Table ==
/// Cache lifetime in seconds for each privacy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeTable {
    pub public_secs: u64,
    pub limited_secs: u64,
    pub private_secs: u64,
    pub restricted_secs: u64,
}

impl Default for LifetimeTable {
    fn default() -> Self {
        Self {
            public_secs: 3600,
            limited_secs: 1800,
            private_secs: 900,
            restricted_secs: 300,
        }
    }
}

impl LifetimeTable {
    /// Lifetime for a level, in seconds.
    pub fn seconds_for(&self, level: PrivacyLevel) -> u64 {
        match level {
            PrivacyLevel::Public => self.public_secs,
            PrivacyLevel::Limited => self.limited_secs,
            PrivacyLevel::Private => self.private_secs,
            PrivacyLevel::Restricted => self.restricted_secs,
        }
    }

    /// Checks that every lifetime is positive and non-increasing as the
    /// level becomes more sensitive.
    pub fn is_ordered(&self) -> bool {
        self.restricted_secs > 0
            && self.public_secs >= self.limited_secs
            && self.limited_secs >= self.private_secs
            && self.private_secs >= self.restricted_secs
    }
}

// == Privacy Policy Resolver ==
/// Resolves a privacy level to a cache lifetime.
///
/// Deterministic and side-effect free. Callers holding a raw classification
/// value go through [`PrivacyLevel::from_raw`] first, so unknown values
/// receive the level-4 lifetime.
#[derive(Debug, Clone)]
pub struct PrivacyPolicyResolver {
    table: LifetimeTable,
}

impl PrivacyPolicyResolver {
    /// Creates a resolver over a validated lifetime table.
    pub fn new(table: LifetimeTable) -> Self {
        Self { table }
    }

    /// Returns the cache lifetime for a level.
    pub fn resolve(&self, level: PrivacyLevel) -> Duration {
        Duration::from_secs(self.table.seconds_for(level))
    }

    /// Returns the cache lifetime for a raw classification value.
    pub fn resolve_raw(&self, raw: u8) -> Duration {
        self.resolve(PrivacyLevel::from_raw(raw))
    }
}

impl Default for PrivacyPolicyResolver {
    fn default() -> Self {
        Self::new(LifetimeTable::default())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_defined_levels() {
        assert_eq!(PrivacyLevel::from_raw(1), PrivacyLevel::Public);
        assert_eq!(PrivacyLevel::from_raw(2), PrivacyLevel::Limited);
        assert_eq!(PrivacyLevel::from_raw(3), PrivacyLevel::Private);
        assert_eq!(PrivacyLevel::from_raw(4), PrivacyLevel::Restricted);
    }

    #[test]
    fn test_from_raw_unknown_is_restricted() {
        assert_eq!(PrivacyLevel::from_raw(0), PrivacyLevel::Restricted);
        assert_eq!(PrivacyLevel::from_raw(5), PrivacyLevel::Restricted);
        assert_eq!(PrivacyLevel::from_raw(255), PrivacyLevel::Restricted);
    }

    #[test]
    fn test_resolve_documented_table() {
        let resolver = PrivacyPolicyResolver::default();

        assert_eq!(
            resolver.resolve(PrivacyLevel::Public),
            Duration::from_secs(3600)
        );
        assert_eq!(
            resolver.resolve(PrivacyLevel::Limited),
            Duration::from_secs(1800)
        );
        assert_eq!(
            resolver.resolve(PrivacyLevel::Private),
            Duration::from_secs(900)
        );
        assert_eq!(
            resolver.resolve(PrivacyLevel::Restricted),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_resolve_raw_unknown_gets_restricted_lifetime() {
        let resolver = PrivacyPolicyResolver::default();

        assert_eq!(resolver.resolve_raw(0), Duration::from_secs(300));
        assert_eq!(resolver.resolve_raw(99), Duration::from_secs(300));
    }

    #[test]
    fn test_default_table_is_ordered() {
        assert!(LifetimeTable::default().is_ordered());
    }

    #[test]
    fn test_table_ordering_violations() {
        let inverted = LifetimeTable {
            public_secs: 300,
            limited_secs: 900,
            private_secs: 1800,
            restricted_secs: 3600,
        };
        assert!(!inverted.is_ordered());

        let zero = LifetimeTable {
            restricted_secs: 0,
            ..LifetimeTable::default()
        };
        assert!(!zero.is_ordered());
    }

    #[test]
    fn test_level_serde_roundtrip() {
        let json = serde_json::to_string(&PrivacyLevel::Private).unwrap();
        assert_eq!(json, "3");

        let level: PrivacyLevel = serde_json::from_str("2").unwrap();
        assert_eq!(level, PrivacyLevel::Limited);
    }

    #[test]
    fn test_level_deserialize_unknown() {
        let level: PrivacyLevel = serde_json::from_str("42").unwrap();
        assert_eq!(level, PrivacyLevel::Restricted);
    }
}
