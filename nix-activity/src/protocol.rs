//! Decoding of the `@nix` structured log protocol.
//!
//! Each protocol message is one line: the [`MARKER`] followed by a JSON object
//! tagged by its `action`. Lines without the marker are plain text.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::types::{ActivityId, ActivityType, Field, Fields, ResultType};
use crate::verbosity::Verbosity;

/// Prefix that distinguishes protocol lines from ordinary output.
pub const MARKER: &str = "@nix ";

/// A decoded protocol message.
///
/// Field lists are kept as raw JSON until [`decode_fields`] runs, so that a
/// record rejected before its fields are looked at never fails on them.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum InternalLog {
    Msg {
        level: Verbosity,
        msg: String,
        // Unrendered message when logging an ErrorInfo
        #[serde(default)]
        raw_msg: Option<String>,
    },
    Start {
        id: ActivityId,
        level: Verbosity,
        #[serde(rename = "type")]
        typ: ActivityType,
        text: String,
        #[serde(default)]
        parent: ActivityId,
        #[serde(default)]
        fields: Option<Vec<Value>>,
    },
    Stop {
        id: ActivityId,
    },
    Result {
        id: ActivityId,
        #[serde(rename = "type")]
        typ: ResultType,
        #[serde(default)]
        fields: Option<Vec<Value>>,
    },
    // Possibly deprecated.
    SetPhase {
        phase: String,
    },
    /// An action this build does not understand.
    #[serde(other)]
    Unknown,
}

impl InternalLog {
    /// Parse a protocol line. Returns `None` for lines without the marker.
    pub fn parse<T>(line: T) -> Option<serde_json::Result<Self>>
    where
        T: AsRef<str>,
    {
        strip_marker(line.as_ref()).map(serde_json::from_str)
    }
}

/// The JSON payload of a protocol line, if `line` is one.
pub fn strip_marker(line: &str) -> Option<&str> {
    line.strip_prefix(MARKER)
}

/// Convert a raw field list. A missing list is empty.
///
/// Fails with [`Error::UnsupportedField`](crate::Error::UnsupportedField) on
/// values that are neither unsigned integers nor strings.
pub fn decode_fields(fields: Option<Vec<Value>>) -> Result<Fields> {
    fields
        .into_iter()
        .flatten()
        .map(Field::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_log_msg() {
        let line = r#"@nix {"action":"msg","level":1,"msg":"hello"}"#;
        let log = InternalLog::parse(line).unwrap().unwrap();
        assert_eq!(
            log,
            InternalLog::Msg {
                level: Verbosity::Warn,
                msg: "hello".to_string(),
                raw_msg: None,
            }
        );
    }

    #[test]
    fn test_parse_log_start() {
        let line = r#"@nix {"action":"start","id":1,"level":3,"type":100,"text":"hello","parent":0,"fields":[]}"#;
        let log = InternalLog::parse(line).unwrap().unwrap();
        assert_eq!(
            log,
            InternalLog::Start {
                id: 1,
                level: Verbosity::Info,
                typ: ActivityType::CopyPath,
                text: "hello".to_string(),
                parent: 0,
                fields: Some(vec![]),
            }
        );
    }

    #[test]
    fn test_parse_log_start_without_fields() {
        let line = r#"@nix {"action":"start","id":9,"level":0,"type":101,"text":"","parent":3}"#;
        match InternalLog::parse(line).unwrap().unwrap() {
            InternalLog::Start { fields, parent, .. } => {
                assert_eq!(fields, None);
                assert_eq!(parent, 3);
            }
            other => panic!("Expected Start, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_log_stop() {
        let line = r#"@nix {"action":"stop","id":1}"#;
        let log = InternalLog::parse(line).unwrap().unwrap();
        assert_eq!(log, InternalLog::Stop { id: 1 });
    }

    #[test]
    fn test_parse_log_result() {
        let line = r#"@nix {"action":"result","id":1,"type":101,"fields":["hello"]}"#;
        let log = InternalLog::parse(line).unwrap().unwrap();
        assert_eq!(
            log,
            InternalLog::Result {
                id: 1,
                typ: ResultType::BuildLogLine,
                fields: Some(vec![json!("hello")]),
            }
        );
    }

    #[test]
    fn test_parse_set_phase() {
        let line = r#"@nix {"action":"setPhase","phase":"unpackPhase"}"#;
        let log = InternalLog::parse(line).unwrap().unwrap();
        assert_eq!(
            log,
            InternalLog::SetPhase {
                phase: "unpackPhase".to_string()
            }
        );
    }

    #[test]
    fn test_parse_unknown_action() {
        let line = r#"@nix {"action":"rewind","id":1}"#;
        let log = InternalLog::parse(line).unwrap().unwrap();
        assert_eq!(log, InternalLog::Unknown);
    }

    #[test]
    fn test_parse_missing_required_field() {
        let line = r#"@nix {"action":"stop"}"#;
        assert!(InternalLog::parse(line).unwrap().is_err());
    }

    #[test]
    fn test_parse_non_nix_log() {
        let line = "This is not a Nix log line";
        assert!(InternalLog::parse(line).is_none());
        assert!(InternalLog::parse("@nix{}").is_none());
    }

    #[test]
    fn test_decode_fields() {
        assert_eq!(
            decode_fields(Some(vec![json!(42), json!("ok")])).unwrap(),
            vec![Field::Int(42), Field::String("ok".into())]
        );
        assert!(decode_fields(None).unwrap().is_empty());
        assert!(matches!(
            decode_fields(Some(vec![json!(1), json!(false)])),
            Err(Error::UnsupportedField("boolean"))
        ));
    }
}
