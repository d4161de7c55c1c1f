// tests/logging_level.rs

use pipedag::cli::LogLevel;
use pipedag::logging::resolve_level;
use tracing::Level;

#[test]
fn cli_flag_wins_over_environment() {
    assert_eq!(resolve_level(Some(LogLevel::Debug), Some("error")), Level::DEBUG);
}

#[test]
fn environment_is_used_when_flag_missing() {
    assert_eq!(resolve_level(None, Some(" Warning ")), Level::WARN);
    assert_eq!(resolve_level(None, Some("TRACE")), Level::TRACE);
}

#[test]
fn defaults_to_info() {
    assert_eq!(resolve_level(None, None), Level::INFO);
    assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
}
