//! Non-negative `HH:MM:SS` time spans.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A non-negative elapsed time span, formatted as `HH:MM:SS`.
///
/// Shift records carry two spans: total elapsed time and run (productive)
/// time. Hours are unbounded; minutes and seconds must be below 60.
/// Serialized as the `HH:MM:SS` string on every wire and cache format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RunSpan {
    secs: u64,
}

impl RunSpan {
    /// A zero-length span.
    pub const ZERO: RunSpan = RunSpan { secs: 0 };

    /// Creates a span from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    /// Creates a span from hour/minute/second components.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSpan`] when minutes or seconds are 60
    /// or more.
    pub fn from_hms(hours: u64, minutes: u64, seconds: u64) -> CoreResult<Self> {
        if minutes >= 60 || seconds >= 60 {
            return Err(CoreError::InvalidSpan {
                value: format!("{hours}:{minutes}:{seconds}"),
            });
        }
        Ok(Self {
            secs: hours * 3600 + minutes * 60 + seconds,
        })
    }

    /// Returns the span in whole seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.secs
    }

    /// Parses a span from an `HH:MM:SS` string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSpan`] on a malformed string.
    pub fn parse(value: &str) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidSpan {
            value: value.into(),
        };

        let mut parts = value.split(':');
        let hours = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        let minutes = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        let seconds = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)?;

        if parts.next().is_some() {
            return Err(invalid());
        }

        Self::from_hms(hours, minutes, seconds)
    }
}

impl fmt::Display for RunSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.secs / 3600;
        let minutes = (self.secs % 3600) / 60;
        let seconds = self.secs % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl FromStr for RunSpan {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RunSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RunSpan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let span = RunSpan::parse("08:00:00").unwrap();
        assert_eq!(span.as_secs(), 8 * 3600);
        assert_eq!(span.to_string(), "08:00:00");

        let span = RunSpan::parse("07:30:15").unwrap();
        assert_eq!(span.as_secs(), 7 * 3600 + 30 * 60 + 15);
    }

    #[test]
    fn hours_unbounded() {
        let span = RunSpan::parse("120:00:01").unwrap();
        assert_eq!(span.as_secs(), 120 * 3600 + 1);
        assert_eq!(span.to_string(), "120:00:01");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "8h", "08:00", "08:00:00:00", "08:61:00", "08:00:75", "-1:00:00"] {
            assert!(
                matches!(RunSpan::parse(bad), Err(CoreError::InvalidSpan { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn ordering_by_length() {
        assert!(RunSpan::parse("07:30:00").unwrap() < RunSpan::parse("08:00:00").unwrap());
        assert_eq!(RunSpan::ZERO, RunSpan::from_secs(0));
    }

    #[test]
    fn serde_as_string() {
        let span = RunSpan::parse("02:15:30").unwrap();
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(json, "\"02:15:30\"");

        let back: RunSpan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);
    }

    #[test]
    fn serde_rejects_malformed() {
        assert!(serde_json::from_str::<RunSpan>("\"junk\"").is_err());
    }
}
