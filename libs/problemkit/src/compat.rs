//! Compatibility versions and switches.
//!
//! A compatibility version selects which release's defaults apply. Options
//! whose default changes between versions are stored in a
//! [`CompatibilitySwitch`], which remembers whether the value was set
//! explicitly so that version defaults never overwrite user configuration.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum CompatibilityVersion {
    #[serde(rename = "2.0")]
    Version2_0,
    #[serde(rename = "2.1")]
    Version2_1,
    #[serde(rename = "2.2")]
    Version2_2,
    #[default]
    #[serde(rename = "latest")]
    Latest,
}

impl CompatibilityVersion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Version2_0 => "2.0",
            Self::Version2_1 => "2.1",
            Self::Version2_2 => "2.2",
            Self::Latest => "latest",
        }
    }
}

impl fmt::Display for CompatibilityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompatibilityVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2.0" => Ok(Self::Version2_0),
            "2.1" => Ok(Self::Version2_1),
            "2.2" => Ok(Self::Version2_2),
            "latest" => Ok(Self::Latest),
            other => Err(ConfigError::UnknownCompatibilityVersion {
                value: other.to_owned(),
            }),
        }
    }
}

// YAML and environment sources hand over an unquoted `2.1` as a number.
impl<'de> Deserialize<'de> for CompatibilityVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VersionVisitor;

        impl Visitor<'_> for VersionVisitor {
            type Value = CompatibilityVersion;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a compatibility version (2.0, 2.1, 2.2 or latest)")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                self.visit_str(&format!("{v:.1}"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                self.visit_str(&format!("{v}.0"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                self.visit_str(&format!("{v}.0"))
            }
        }

        deserializer.deserialize_any(VersionVisitor)
    }
}

/// Option value that tracks whether it was set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompatibilitySwitch<T> {
    value: T,
    is_value_set: bool,
}

impl<T: Copy> CompatibilitySwitch<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            is_value_set: false,
        }
    }

    #[must_use]
    pub fn value(&self) -> T {
        self.value
    }

    #[must_use]
    pub fn is_value_set(&self) -> bool {
        self.is_value_set
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.is_value_set = true;
    }

    /// Write a version default; returns false when the value was set explicitly.
    pub fn apply_default(&mut self, value: T) -> bool {
        if self.is_value_set {
            return false;
        }
        self.value = value;
        true
    }
}
