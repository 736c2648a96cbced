//! Identifiers, activity/result kinds and typed fields carried by events.

use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Identifier of an activity, unique within a session.
///
/// The high 32 bits hold the id of the process that created the activity,
/// the low bits a per-process counter. Process ids can be reused over a long
/// session, so uniqueness across processes is best effort.
pub type ActivityId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a fresh activity id for this process.
pub fn next_activity_id() -> ActivityId {
    let pid = u64::from(std::process::id());
    NEXT_ID.fetch_add(1, Ordering::Relaxed) | (pid << 32)
}

/// Defines an integer-coded enumeration that keeps unknown values.
///
/// Peers may be newer than us, so a value missing from the catalog decodes
/// to `Other(n)` and encodes back to `n`.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "u64", into = "u64")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
            /// A value this build does not know about.
            Other(u64),
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                match value {
                    $($value => $name::$variant,)*
                    other => $name::Other(other),
                }
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> u64 {
                match value {
                    $($name::$variant => $value,)*
                    $name::Other(other) => other,
                }
            }
        }
    };
}

open_enum! {
    /// Kind of work an activity represents.
    pub enum ActivityType {
        Unknown = 0,
        CopyPath = 100,
        /// Transfers are the only kind an untrusted peer may start.
        FileTransfer = 101,
        Realise = 102,
        CopyPaths = 103,
        Builds = 104,
        Build = 105,
        OptimiseStore = 106,
        VerifyPaths = 107,
        Substitute = 108,
        QueryPathInfo = 109,
        PostBuildHook = 110,
        BuildWaiting = 111,
        FetchTree = 112,
    }
}

open_enum! {
    /// Kind of incremental update reported against a running activity.
    pub enum ResultType {
        FileLinked = 100,
        /// Field 0 is the line of build output.
        BuildLogLine = 101,
        UntrustedPath = 102,
        CorruptedPath = 103,
        /// Field 0 is the name of the new phase.
        SetPhase = 104,
        /// Fields are done, expected, running, failed.
        Progress = 105,
        /// Fields are the activity type and the expected amount.
        SetExpected = 106,
        /// Field 0 is the line of post-build-hook output.
        PostBuildLogLine = 107,
        FetchStatus = 108,
    }
}

/// A typed value attached to an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Int(u64),
    String(String),
}

/// Ordered event payload. Positions are meaningful per [`ResultType`].
pub type Fields = Vec<Field>;

impl Field {
    pub fn as_int(&self) -> Option<u64> {
        match self {
            Field::Int(i) => Some(*i),
            Field::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::String(s) => Some(s),
            Field::Int(_) => None,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Field::Int(i) => write!(f, "{i}"),
            Field::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field::Int(value)
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::String(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::String(value.to_string())
    }
}

impl From<ActivityType> for Field {
    fn from(value: ActivityType) -> Self {
        Field::Int(value.into())
    }
}

impl TryFrom<serde_json::Value> for Field {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Error> {
        use serde_json::Value;

        match value {
            Value::Number(n) => n
                .as_u64()
                .map(Field::Int)
                .ok_or(Error::UnsupportedField("signed or fractional number")),
            Value::String(s) => Ok(Field::String(s)),
            Value::Null => Err(Error::UnsupportedField("null")),
            Value::Bool(_) => Err(Error::UnsupportedField("boolean")),
            Value::Array(_) => Err(Error::UnsupportedField("array")),
            Value::Object(_) => Err(Error::UnsupportedField("object")),
        }
    }
}
