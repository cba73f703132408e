use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use match_wrapper::configuration::Configuration;
use match_wrapper::logger::init_logger;
use match_wrapper::runner::{save_results, MatchRunner, RunConfig, RunMode, Runner, ScenarioRunner};
use tracing::info;

const DEBUG_GAME_FILE: &str = "./game-resultfile.json";

/// Usage: `match-wrapper '<json configuration>'`
fn main() -> ExitCode {
    match run() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<i32> {
    let start = Instant::now();

    let json = std::env::args()
        .nth(1)
        .context("usage: match-wrapper '<json configuration>'")?;
    let run_config = RunConfig::parse(&json).context("Failed to parse settings.")?;
    let config = run_config.wrapper.apply(Configuration::from_env());
    init_logger(config)?;

    let result_file = run_config.wrapper.result_file.as_path();
    info!("Starting...");
    match run_config.mode()? {
        RunMode::Match(match_config) => {
            let mut runner = MatchRunner::prepare(&match_config, config)?;
            let status = run_to_completion(&mut runner, start, result_file)?;
            if config.debug() {
                if let Some(results) = runner.results() {
                    std::fs::write(DEBUG_GAME_FILE, &results.game)
                        .with_context(|| format!("could not write {DEBUG_GAME_FILE}"))?;
                }
            }
            Ok(status)
        }
        RunMode::Scenario(scenario_config) => {
            let mut runner = ScenarioRunner::prepare(&scenario_config, config)?;
            run_to_completion(&mut runner, start, result_file)
        }
    }
}

fn run_to_completion<R: Runner>(
    runner: &mut R,
    start: Instant,
    result_file: &Path,
) -> anyhow::Result<i32> {
    runner.run();

    info!("Stopping...");
    let status = runner.postrun(start.elapsed());

    if let Some(results) = runner.results() {
        info!("Saving results to {}", result_file.display());
        save_results(results, result_file)?;
    }

    info!("Done.");
    Ok(status)
}
