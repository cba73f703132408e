#![cfg(unix)]

use std::time::Duration;

use match_wrapper::prelude::*;
use match_wrapper::runner::{RunStatus, ScenarioConfig, SubjectConfig, SubjectKind};
use serde_json::json;

mod common;
use common::{engine, sh, silent_bot};

fn scenario(kind: SubjectKind, command: ProcessCommand, lines: &[&str]) -> ScenarioConfig {
    ScenarioConfig {
        scenario: lines.iter().map(|s| s.to_string()).collect(),
        subject: SubjectConfig {
            kind,
            command,
            configuration: json!({}),
        },
    }
}

const LINES: [&str; 5] = [
    "settings your_bot player0",
    "settings timebank 300",
    "",
    "update game round 1",
    "action move 300",
];

#[test]
fn responsive_bot_passes() {
    let bot = sh(r#"while IFS= read -r line; do case "$line" in action*) echo pass ;; esac; done"#);
    let mut runner =
        ScenarioRunner::prepare(&scenario(SubjectKind::Bot, bot, &LINES), Configuration::new())
            .unwrap();

    runner.run();
    assert_eq!(runner.postrun(Duration::ZERO), 0);

    let results = runner.results().unwrap();
    assert_eq!(results.status, RunStatus::Ok);
    assert!(results.error.is_none());
    let log = results.subject.log.as_deref().unwrap();
    assert!(log.contains("update game round 1\n"));
    assert!(log.contains("action move 300\n"));
    assert!(log.contains("Output from your bot: \"pass\""));
}

#[test]
fn silent_bot_fails_with_timeout() {
    let mut runner = ScenarioRunner::prepare(
        &scenario(SubjectKind::Bot, silent_bot(), &LINES),
        Configuration::new(),
    )
    .unwrap();

    runner.run();
    assert_eq!(runner.postrun(Duration::ZERO), 0);

    let results = runner.results().unwrap();
    assert_eq!(results.status, RunStatus::Error);
    assert_eq!(
        results.error.as_ref().unwrap().message,
        "Response timed out (300ms)"
    );
}

#[test]
fn engine_subject_has_no_log() {
    let engine = engine(r#"    action*) echo ok ;;"#);
    let mut runner = ScenarioRunner::prepare(
        &scenario(SubjectKind::Engine, engine, &["settings timebank 1000", "action initialize"]),
        Configuration::new(),
    )
    .unwrap();

    runner.run();
    runner.postrun(Duration::ZERO);

    let results = runner.results().unwrap();
    assert_eq!(results.status, RunStatus::Ok);
    assert!(results.subject.log.is_none());
    assert_eq!(
        results.subject.errors,
        "settings timebank 1000\naction initialize\n"
    );
}
