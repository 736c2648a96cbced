//! Logger options and resolved settings.
//!
//! Follows the usual options/settings split:
//! - `LoggerOptions`: all `Option<T>` fields, deserializable from a host config
//! - `LoggerSettings`: concrete values
//! - `resolve()`: fills whatever the options leave open from the environment

use std::io::{self, IsTerminal};

use serde::Deserialize;

/// Combine two values, preferring `self` (higher precedence).
trait Combine: Sized {
    fn combine(self, other: Self) -> Self;
}

impl<T> Combine for Option<T> {
    fn combine(self, other: Self) -> Self {
        self.or(other)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoggerOptions {
    /// Include trace frames when rendering structured errors.
    pub show_trace: Option<bool>,
    /// Print build output lines as they arrive.
    pub print_build_logs: Option<bool>,
    /// Prefix lines with a syslog priority for a supervising process.
    pub systemd: Option<bool>,
    /// Keep ANSI escapes in the output.
    pub tty: Option<bool>,
}

/// Resolved logger settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoggerSettings {
    pub show_trace: bool,
    pub print_build_logs: bool,
    pub systemd: bool,
    pub tty: bool,
}

impl LoggerOptions {
    /// Merge with lower-precedence options, e.g. CLI flags over a config file.
    pub fn merge(self, fallback: LoggerOptions) -> LoggerOptions {
        LoggerOptions {
            show_trace: self.show_trace.combine(fallback.show_trace),
            print_build_logs: self.print_build_logs.combine(fallback.print_build_logs),
            systemd: self.systemd.combine(fallback.systemd),
            tty: self.tty.combine(fallback.tty),
        }
    }

    pub fn resolve(self) -> LoggerSettings {
        LoggerSettings {
            show_trace: self.show_trace.unwrap_or(false),
            print_build_logs: self.print_build_logs.unwrap_or(true),
            systemd: self.systemd.unwrap_or_else(in_systemd),
            tty: self.tty.unwrap_or_else(|| io::stderr().is_terminal()),
        }
    }
}

/// Whether a supervisor that understands `<N>` priority prefixes reads our stderr.
pub fn in_systemd() -> bool {
    std::env::var("IN_SYSTEMD").is_ok_and(|value| value == "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_options_win() {
        let settings = LoggerOptions {
            show_trace: Some(true),
            print_build_logs: Some(false),
            systemd: Some(true),
            tty: Some(false),
        }
        .resolve();

        assert_eq!(
            settings,
            LoggerSettings {
                show_trace: true,
                print_build_logs: false,
                systemd: true,
                tty: false,
            }
        );
    }

    #[test]
    fn test_defaults() {
        let settings = LoggerOptions {
            systemd: Some(false),
            tty: Some(true),
            ..Default::default()
        }
        .resolve();
        assert!(!settings.show_trace);
        assert!(settings.print_build_logs);
    }

    #[test]
    fn test_merge_prefers_self() {
        let cli = LoggerOptions {
            show_trace: Some(true),
            ..Default::default()
        };
        let file = LoggerOptions {
            show_trace: Some(false),
            print_build_logs: Some(false),
            ..Default::default()
        };
        let merged = cli.merge(file);
        assert_eq!(merged.show_trace, Some(true));
        assert_eq!(merged.print_build_logs, Some(false));
        assert_eq!(merged.tty, None);
    }

    #[test]
    fn test_deserialize_from_config() {
        let options: LoggerOptions =
            serde_json::from_str(r#"{"show-trace": true, "print-build-logs": false}"#).unwrap();
        assert_eq!(options.show_trace, Some(true));
        assert_eq!(options.print_build_logs, Some(false));

        assert!(serde_json::from_str::<LoggerOptions>(r#"{"colour": true}"#).is_err());
    }
}
