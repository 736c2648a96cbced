//! A child process logging through `JsonLogger` and a parent replaying its
//! output with `JsonLogReceiver`.

use std::sync::Arc;

use nix_activity::testing::{Call, RecordingLogger};
use nix_activity::{
    Activity, ActivityType, ErrorInfo, Field, JsonLogReceiver, JsonLogger, Logger, ResultType,
    Verbosity,
};
use pretty_assertions::assert_eq;

/// Lines a child wrote to its stderr.
fn child_output(f: impl FnOnce(&JsonLogger)) -> Vec<String> {
    let stream = RecordingLogger::new();
    f(&JsonLogger::new(stream.clone(), false));
    stream.messages(Verbosity::Error)
}

fn replay(lines: &[String], trusted: bool) -> (Arc<RecordingLogger>, Vec<bool>) {
    let parent = RecordingLogger::new();
    let enclosing = Activity::builder(ActivityType::Builds)
        .text("building 1 derivation")
        .logger(parent.clone())
        .start()
        .unwrap();

    // Tests in this binary run in parallel, so nothing goes through the
    // process-wide logger.
    let mut rx = JsonLogReceiver::with_logger(enclosing.id(), parent.clone());
    let handled = lines
        .iter()
        .map(|line| rx.handle_line(line, "child", trusted).unwrap())
        .collect();
    (parent, handled)
}

fn starts(calls: &[Call]) -> Vec<&Call> {
    calls
        .iter()
        .filter(|call| matches!(call, Call::Start { .. }))
        .collect()
}

#[test]
fn test_start_round_trip() {
    let lines = child_output(|child| {
        child
            .start_activity(
                7,
                Verbosity::Info,
                ActivityType::from(3u64),
                "build",
                &[Field::Int(42), Field::from("ok")],
                1,
            )
            .unwrap();
    });

    let (parent, handled) = replay(&lines, true);
    assert_eq!(handled, vec![true]);

    let calls = parent.calls();
    let Call::Start { id: enclosing, .. } = &calls[0] else {
        panic!("expected enclosing start, got {:?}", calls[0]);
    };
    let Call::Start {
        level,
        typ,
        text,
        fields,
        parent: remote_parent,
        ..
    } = &calls[1]
    else {
        panic!("expected replayed start, got {:?}", calls[1]);
    };

    assert_eq!(*level, Verbosity::Info);
    assert_eq!(*typ, ActivityType::Other(3));
    assert_eq!(text, "build");
    assert_eq!(fields, &vec![Field::Int(42), Field::String("ok".into())]);
    assert_eq!(remote_parent, enclosing);
}

#[test]
fn test_activity_lifecycle_round_trip() {
    let lines = child_output(|child| {
        child
            .start_activity(3, Verbosity::Info, ActivityType::FileTransfer, "downloading", &[], 0)
            .unwrap();
        child
            .result(
                3,
                ResultType::Progress,
                &[Field::Int(10), Field::Int(100), Field::Int(1), Field::Int(0)],
            )
            .unwrap();
        child.stop_activity(3).unwrap();
    });
    assert_eq!(lines.len(), 3);

    let (parent, handled) = replay(&lines, false);
    assert_eq!(handled, vec![true, true, true]);

    let calls = parent.calls();
    let &Call::Start { id: enclosing, .. } = &calls[0] else {
        panic!("expected enclosing start, got {:?}", calls[0]);
    };
    let &Call::Start { id: local, .. } = &calls[1] else {
        panic!("expected replayed start, got {:?}", calls[1]);
    };
    assert_eq!(
        calls[2..].to_vec(),
        vec![
            Call::Result {
                id: local,
                typ: ResultType::Progress,
                fields: vec![Field::Int(10), Field::Int(100), Field::Int(1), Field::Int(0)],
            },
            Call::Stop { id: local },
            Call::Stop { id: enclosing },
        ]
    );
}

#[test]
fn test_untrusted_spoof_has_no_effect() {
    let lines = child_output(|child| {
        child
            .start_activity(9, Verbosity::Info, ActivityType::Build, "spoofed", &[], 0)
            .unwrap();
        child
            .result(9, ResultType::BuildLogLine, &[Field::from("injected")])
            .unwrap();
        child.stop_activity(9).unwrap();
    });

    let (parent, handled) = replay(&lines, false);
    assert_eq!(handled, vec![true, true, true]);

    // Only the enclosing activity is visible.
    let calls = parent.calls();
    assert_eq!(starts(&calls).len(), 1);
    assert!(!calls.iter().any(|call| matches!(call, Call::Result { .. })));
    assert_eq!(calls.len(), 2);
}

#[test]
fn test_malformed_line_warns_once() {
    let (parent, handled) = replay(&["@nix {not valid json".to_string()], true);
    assert_eq!(handled, vec![false]);

    let warnings = parent.messages(Verbosity::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("bad JSON log message from child"));
}

#[test]
fn test_result_for_unknown_id_is_ignored() {
    let lines = child_output(|child| {
        child
            .result(1234, ResultType::BuildLogLine, &[Field::from("orphan")])
            .unwrap();
    });

    let (parent, handled) = replay(&lines, true);
    assert_eq!(handled, vec![true]);
    let calls = parent.calls();
    assert!(!calls.iter().any(|call| matches!(call, Call::Result { .. })));
    assert_eq!(starts(&calls).len(), 1);
}

#[test]
fn test_messages_and_errors_reach_parent() {
    let lines = child_output(|child| {
        child.log(Verbosity::Talkative, "evaluating").unwrap();
        child
            .log_error_info(&ErrorInfo::new(Verbosity::Error, "builder failed"))
            .unwrap();
    });

    let (parent, handled) = replay(&lines, true);
    assert_eq!(handled, vec![true, true]);
    assert_eq!(parent.messages(Verbosity::Talkative), vec!["evaluating"]);

    let errors = parent.messages(Verbosity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("builder failed"));
}
