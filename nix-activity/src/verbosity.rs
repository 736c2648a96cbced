//! Verbosity levels and the process-wide emission threshold.

use std::sync::atomic::{AtomicU8, Ordering};

use num_enum::TryFromPrimitive;
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::Error;

/// Event level, ordered from most to least important.
///
/// Encoded on the wire as its integer value.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize_repr,
    Deserialize_repr,
    TryFromPrimitive,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Verbosity {
    Error = 0,
    Warn = 1,
    Notice = 2,
    #[default]
    Info = 3,
    Talkative = 4,
    Chatty = 5,
    Debug = 6,
    Vomit = 7,
}

impl Verbosity {
    /// Level reached by raising the default `count` times, e.g. for `-v -v`.
    /// Saturates at [`Verbosity::Vomit`].
    pub fn from_count(count: u8) -> Self {
        let raised = (Verbosity::Info as u8).saturating_add(count);
        Verbosity::try_from(raised.min(Verbosity::Vomit as u8)).unwrap_or(Verbosity::Vomit)
    }
}

impl TryFrom<i64> for Verbosity {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Error> {
        u8::try_from(value)
            .ok()
            .and_then(|b| Verbosity::try_from(b).ok())
            .ok_or(Error::InvalidVerbosity(value))
    }
}

static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Info as u8);

/// Current emission threshold. Events above it are dropped.
pub fn verbosity() -> Verbosity {
    Verbosity::try_from(VERBOSITY.load(Ordering::Relaxed)).unwrap_or_default()
}

/// Replace the emission threshold for the whole process.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Whether an event at `level` passes the current threshold.
pub fn enabled(level: Verbosity) -> bool {
    level <= verbosity()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_levels_are_totally_ordered() {
        let levels: Vec<_> = Verbosity::iter().collect();
        for pair in levels.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_parse_and_display() {
        for level in Verbosity::iter() {
            let parsed: Verbosity = level.to_string().parse().unwrap();
            assert_eq!(parsed, level);
        }
        assert_eq!("TALKATIVE".parse::<Verbosity>().unwrap(), Verbosity::Talkative);
        assert!("loud".parse::<Verbosity>().is_err());
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(Verbosity::try_from(0i64).unwrap(), Verbosity::Error);
        assert_eq!(Verbosity::try_from(7i64).unwrap(), Verbosity::Vomit);
        assert!(matches!(
            Verbosity::try_from(8i64),
            Err(Error::InvalidVerbosity(8))
        ));
        assert!(Verbosity::try_from(-1i64).is_err());
    }

    #[test]
    fn test_wire_encoding_is_numeric() {
        assert_eq!(serde_json::to_string(&Verbosity::Chatty).unwrap(), "5");
        let level: Verbosity = serde_json::from_str("1").unwrap();
        assert_eq!(level, Verbosity::Warn);
        assert!(serde_json::from_str::<Verbosity>("9").is_err());
    }

    #[test]
    fn test_from_count() {
        assert_eq!(Verbosity::from_count(0), Verbosity::Info);
        assert_eq!(Verbosity::from_count(1), Verbosity::Talkative);
        assert_eq!(Verbosity::from_count(3), Verbosity::Debug);
        assert_eq!(Verbosity::from_count(200), Verbosity::Vomit);
    }
}
