#![cfg(unix)]

use std::time::Duration;

use match_wrapper::prelude::*;
use match_wrapper::runner::{BotConfig, EngineConfig, MatchConfig, RunStatus};
use serde_json::json;

mod common;
use common::{answering_bot, engine, init_test_logger};

fn match_config(engine: ProcessCommand, bots: Vec<ProcessCommand>) -> MatchConfig {
    MatchConfig {
        engine: EngineConfig {
            command: engine,
            configuration: json!({ "seed": 1 }),
        },
        bots: bots
            .into_iter()
            .map(|command| BotConfig { command })
            .collect(),
    }
}

fn stderr_lines(runner: &MatchRunner) -> Vec<String> {
    runner
        .api()
        .engine()
        .stderr()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn single_bot_match_end_to_end() {
    init_test_logger();
    let engine = engine(
        r#"    initialize) echo ok ;;
    start) echo "bot 0 send update round 1"; echo "bot 0 ask move" ;;
    "bot 0 "*) echo end ;;
    details) echo "winner player0" ;;
    game) echo '{"rounds":1}' ;;"#,
    );
    let config = Configuration::new();
    let mut runner =
        MatchRunner::prepare(&match_config(engine, vec![answering_bot("pass")]), config).unwrap();

    runner.run();
    assert_eq!(runner.outcome(), Some(&RouterOutcome::Completed));
    assert_eq!(runner.api().state(), RouterState::Ended);

    assert_eq!(runner.postrun(Duration::from_millis(42)), 0);
    assert_eq!(
        stderr_lines(&runner),
        vec![
            "initialize",
            "bot_ids 0",
            r#"configuration {"seed":1}"#,
            "settings player_names player0",
            "start",
            "bot 0 pass",
            "details",
            "game",
        ]
    );

    let results = runner.results().unwrap();
    assert_eq!(results.status, RunStatus::Ok);
    assert_eq!(results.time_elapsed, 42);
    assert_eq!(results.details, "winner player0");
    assert_eq!(results.game, r#"{"rounds":1}"#);
    assert_eq!(results.players.len(), 1);

    let player = &results.players[0];
    assert!(player.log.contains("settings your_bot player0\n"));
    assert!(player.log.contains("settings timebank 10000\n"));
    assert!(player.log.contains("settings time_per_move 500\n"));
    assert!(player.log.contains("update round 1\n"));
    assert!(player.log.contains("move 10000\n"));
    assert!(player.log.contains("Output from your bot: \"pass\""));
    assert_eq!(player.response_times.len(), 1);
    assert_eq!(
        player.total_response_time,
        player.response_times.iter().sum::<u64>()
    );
}

#[test]
fn ask_is_routed_to_addressed_bot() {
    let engine = engine(
        r#"    initialize) echo ok ;;
    start) echo "bot 2 ask roll" ;;
    "bot 2 "*) echo end ;;
    details|game) echo none ;;"#,
    );
    let bots = vec![
        answering_bot("one"),
        answering_bot("two"),
        answering_bot("six"),
    ];
    let mut runner = MatchRunner::prepare(&match_config(engine, bots), Configuration::new()).unwrap();

    runner.run();
    assert_eq!(runner.outcome(), Some(&RouterOutcome::Completed));
    runner.postrun(Duration::ZERO);

    let lines = stderr_lines(&runner);
    assert!(lines.contains(&"bot 2 six".to_string()), "{lines:?}");
    assert!(lines.contains(&"settings player_names player0,player1,player2".to_string()));

    let results = runner.results().unwrap();
    assert!(results.players[2].log.contains("roll 10000\n"));
    assert!(!results.players[0].log.contains("roll"));
    assert!(!results.players[1].log.contains("roll"));
}

#[test]
fn broadcast_and_warning_are_delivered() {
    let engine = engine(
        r#"    initialize) echo ok ;;
    start) echo "bot all send update round 1"; echo "bot 1 warning slow down"; echo ok; echo end ;;
    details|game) echo none ;;"#,
    );
    let bots = vec![answering_bot("a"), answering_bot("b")];
    let mut runner = MatchRunner::prepare(&match_config(engine, bots), Configuration::new()).unwrap();

    runner.run();
    assert_eq!(runner.outcome(), Some(&RouterOutcome::Completed));
    assert_eq!(runner.postrun(Duration::ZERO), 0);

    let results = runner.results().unwrap();
    assert!(results.players[0].log.contains("update round 1\n"));
    assert!(results.players[1].log.contains("update round 1\n"));
    assert!(results.players[1].log.contains("slow down\n"));
    assert!(!results.players[0].log.contains("slow down"));
    assert!(results.players.iter().all(|p| p.response_times.is_empty()));
}

#[test]
fn unknown_line_ends_match_as_error() {
    let engine = engine(
        r#"    initialize) echo ok ;;
    start) echo "launch missiles" ;;
    details|game) echo none ;;"#,
    );
    let mut runner =
        MatchRunner::prepare(&match_config(engine, vec![answering_bot("x")]), Configuration::new())
            .unwrap();

    runner.run();
    assert_eq!(
        runner.outcome(),
        Some(&RouterOutcome::ProtocolViolation {
            line: "launch missiles".to_string()
        })
    );
    assert_eq!(runner.api().state(), RouterState::Ended);
    assert_eq!(runner.postrun(Duration::ZERO), 1);

    let results = runner.results().unwrap();
    assert_eq!(results.status, RunStatus::Error);
    assert_eq!(
        results.error.as_ref().unwrap().message,
        "'launch missiles' did not match any action"
    );
}

#[test]
fn bot_outside_roster_is_a_protocol_violation() {
    let engine = engine(
        r#"    initialize) echo ok ;;
    start) echo "bot 5 ask move" ;;
    details|game) echo none ;;"#,
    );
    let mut runner =
        MatchRunner::prepare(&match_config(engine, vec![answering_bot("x")]), Configuration::new())
            .unwrap();

    runner.run();
    assert!(matches!(
        runner.outcome(),
        Some(RouterOutcome::ProtocolViolation { .. })
    ));
}

#[test]
fn failed_handshake_never_starts_the_game() {
    let engine = engine(r#"    initialize) echo nope ;;"#);
    let mut runner =
        MatchRunner::prepare(&match_config(engine, vec![answering_bot("x")]), Configuration::new())
            .unwrap();

    runner.run();
    assert_eq!(
        runner.outcome(),
        Some(&RouterOutcome::HandshakeFailed {
            response: "nope".to_string()
        })
    );
    assert_eq!(runner.postrun(Duration::ZERO), 1);
    assert_eq!(stderr_lines(&runner), vec!["initialize"]);

    let results = runner.results().unwrap();
    assert_eq!(results.status, RunStatus::Error);
    assert!(results.players[0].log.is_empty());
}

#[test]
fn silent_engine_ends_match_with_failure() {
    let engine = engine(r#"    initialize) echo ok ;;"#);
    let config = Configuration::new().with_engine_timeout(Duration::from_millis(100));
    let mut runner =
        MatchRunner::prepare(&match_config(engine, vec![answering_bot("x")]), config).unwrap();

    runner.run();
    assert_eq!(runner.api().state(), RouterState::Ended);
    assert_eq!(runner.outcome(), Some(&RouterOutcome::Completed));
    assert!(runner.api().engine().is_errored());
    assert_eq!(runner.postrun(Duration::ZERO), 1);

    let results = runner.results().unwrap();
    assert_eq!(results.status, RunStatus::Error);
    assert_eq!(
        results.error.as_ref().unwrap().message,
        "Engine did not respond in time"
    );
}

#[test]
fn launch_failure_aborts_before_protocol() {
    let engine = engine(r#"    initialize) echo ok ;;"#);
    let bots = vec![ProcessCommand::from("/nonexistent/bot")];
    let error = MatchRunner::prepare(&match_config(engine, bots), Configuration::new()).unwrap_err();
    assert!(format!("{error:#}").contains("Failed to start bot 0."));
}
