//! # Match Wrapper
//!
//! Referees a match between a game engine process and one or more bot processes, relaying
//! line-based text messages between them over OS pipes under per-move time budgets.
//!
//! It provides:
//! - A process channel draining stdout and stderr of a child in background threads
//!   ([`ProcessChannel`](crate::process::ProcessChannel))
//! - Request/response with soft timeouts on top of it ([`Responder`](crate::responder::Responder))
//! - The two roles: the [`Engine`](crate::engine::Engine) and the bots
//!   ([`Player`](crate::player::Player)), the latter with a timebank and a timeout budget
//! - The router interpreting the engine's commands ([`EngineApi`](crate::engine_api::EngineApi))
//! - Runners for a whole match or for a scripted scenario ([`runner`])
//!
//! # Documentation Overview
//!
//! - For the protocol spoken by the engine, see the [`engine_api`] module.
//! - For timebanks and forfeits, see [`budget`] and [`Player`](crate::player::Player).
//! - For wrapper settings, see [`Configuration`](crate::configuration::Configuration).
//!
//! # Usage Example
//!
//! ```no_run
//! use std::time::Duration;
//! use match_wrapper::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::new()
//!         .with_timebank_max(Duration::from_secs(5))
//!         .with_time_per_move(Duration::from_millis(200));
//!
//!     let engine = Engine::launch(&"./engine".into(), "{}".to_string(), config)?;
//!     let players = vec![
//!         Player::launch(&"./bot_a".into(), 0, config)?,
//!         Player::launch(&"./bot_b".into(), 1, config)?,
//!     ];
//!
//!     let mut runner = MatchRunner::new(EngineApi::new(engine, players, config));
//!     runner.run();
//!     let exit_status = runner.postrun(Duration::ZERO);
//!
//!     if let Some(results) = runner.results() {
//!         println!("{}: {}", results.details, exit_status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Bot Protocol
//!
//! Bots read lines on stdin and answer on stdout, one line per request:
//!  * Wrapper -> Bot : `settings your_bot player<N>`, `settings timebank <ms>`,
//!    `settings time_per_move <ms>`, then whatever the engine sends
//!  * Wrapper -> Bot : `<request> <remaining timebank in ms>` when an answer is expected
//!  * Bot -> Wrapper : the answer, or `pass` / `no_moves` to skip the move

pub use anyhow;
pub mod budget;
pub mod configuration;
pub mod engine;
pub mod engine_api;
pub mod logger;
pub mod player;
pub mod process;
pub mod responder;
pub mod runner;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use match_wrapper::prelude::*;
/// ```
pub mod prelude {
    pub use crate::configuration::Configuration;
    pub use crate::engine::Engine;
    pub use crate::engine_api::{EngineApi, RouterOutcome, RouterState};
    pub use crate::player::Player;
    pub use crate::process::{ProcessChannel, ProcessCommand};
    pub use crate::responder::Responder;
    pub use crate::runner::{MatchRunner, Runner, ScenarioRunner};
}
