//! Terminal logger for the `glint` binary
//!
//! Records from the glint crates go to stderr with the elapsed time, a level
//! tag and the last segment of the emitting module. Records from other
//! crates are dropped.

use log::{Level, LevelFilter, Metadata, Record};
use std::io::IsTerminal;
use std::sync::OnceLock;
use std::time::Instant;

struct Logger {
    start: Instant,
    max_level: LevelFilter,
    color: bool,
}

/// `glint` (the binary) and every `glint_*` library crate
fn is_glint_target(target: &str) -> bool {
    let krate = target.split("::").next().unwrap_or_default();
    krate == "glint" || krate.starts_with("glint_")
}

fn level_tag(level: Level, color: bool) -> &'static str {
    match (level, color) {
        (Level::Error, true) => "\x1B[1;31mERRO\x1B[0m",
        (Level::Warn, true) => "\x1B[1;33mWARN\x1B[0m",
        (Level::Info, true) => "\x1B[1;32mINFO\x1B[0m",
        (Level::Debug, true) => "\x1B[1;36mDEBG\x1B[0m",
        (Level::Trace, true) => "\x1B[1;34mTRCE\x1B[0m",
        (Level::Error, false) => "ERRO",
        (Level::Warn, false) => "WARN",
        (Level::Info, false) => "INFO",
        (Level::Debug, false) => "DEBG",
        (Level::Trace, false) => "TRCE",
    }
}

fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level && is_glint_target(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        // stdout carries the generated code
        eprintln!(
            "[{elapsed:>10.4}] {} {}: {}",
            level_tag(record.level(), self.color),
            short_target(record.target()),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Install the logger; `verbose` lowers the threshold from warnings to debug
pub fn initialize_logger(verbose: bool) {
    let max_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let logger = LOGGER.get_or_init(|| Logger {
        start: Instant::now(),
        max_level,
        color: std::io::stderr().is_terminal(),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(max_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_filter() {
        assert!(is_glint_target("glint"));
        assert!(is_glint_target("glint::commands::compile"));
        assert!(is_glint_target("glint_compiler::compiler"));
        assert!(!is_glint_target("glintish::x"));
        assert!(!is_glint_target("pest::parser_state"));
    }

    #[test]
    fn test_level_tags_and_targets() {
        assert_eq!(level_tag(Level::Warn, false), "WARN");
        assert!(level_tag(Level::Error, true).contains("ERRO"));
        assert_eq!(short_target("glint_compiler::config"), "config");
        assert_eq!(short_target("glint"), "glint");
    }

    #[test]
    fn test_enabled_respects_level() {
        let logger = Logger {
            start: Instant::now(),
            max_level: LevelFilter::Warn,
            color: false,
        };
        let warn = Metadata::builder()
            .level(Level::Warn)
            .target("glint_compiler::config")
            .build();
        let debug = Metadata::builder()
            .level(Level::Debug)
            .target("glint_compiler::compiler")
            .build();
        assert!(log::Log::enabled(&logger, &warn));
        assert!(!log::Log::enabled(&logger, &debug));
    }
}
