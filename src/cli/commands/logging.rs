//! `-v` / `HABITS_LOG_LEVEL`: how much the frontend logs.
//!
//! Each `-v` raises the level by one step from the error-only default. The
//! env var accepts either a level name or the same step count as a number.

use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in step order; the index is the `-v` count.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const MAX_STEPS: u8 = 5;

fn parse_level(level: &str) -> Result<u8, String> {
    let level = level.trim();
    if let Ok(steps) = level.parse::<u8>() {
        return if steps <= MAX_STEPS {
            Ok(steps)
        } else {
            Err(format!("log level step must be 0-{MAX_STEPS}, got {steps}"))
        };
    }

    LEVELS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(level))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("invalid log level '{level}', expected one of: {}", LEVELS.join(", ")))
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Raise log verbosity from errors only: -v warn, -vv info, -vvv debug, -vvvv trace")
            .env("HABITS_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
