//! Terminal output for CLI handlers.
//!
//! Every helper goes through one emitter that picks the rendering:
//! colored text, quiet text (only warnings and failures survive), or one
//! `{"type": ..., "payload": ...}` JSON line per call for scripting.

use std::collections::BTreeSet;
use std::fmt::Display;

use owo_colors::OwoColorize;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::domain::PairSymbol;
use crate::infrastructure::orchestration::{HealthCheck, HealthStatus};

/// Output settings taken from the global CLI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
    /// Number of `-v` flags.
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static CONFIG: RwLock<OutputConfig> = parking_lot::const_rwlock(OutputConfig::new(false, false, 0));

/// How a line behaves under `--quiet` and where it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Priority {
    /// Suppressed by `--quiet`.
    Info,
    /// Always shown on stdout.
    Alert,
    /// Always shown, on stderr.
    Failure,
}

fn emit(kind: &str, priority: Priority, payload: impl FnOnce() -> Value, human: impl FnOnce()) {
    let config = *CONFIG.read();
    if config.json {
        let line = json!({ "type": kind, "payload": payload() });
        if priority == Priority::Failure {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
        return;
    }
    if config.quiet && priority == Priority::Info {
        return;
    }
    human();
}

pub fn configure(config: OutputConfig) {
    *CONFIG.write() = config;
}

#[must_use]
pub fn is_json() -> bool {
    CONFIG.read().json
}

#[must_use]
pub fn verbosity() -> u8 {
    CONFIG.read().verbose
}

/// Startup banner with the binary version.
pub fn header(version: &str) {
    emit(
        "header",
        Priority::Info,
        || json!({ "app": env!("CARGO_PKG_NAME"), "version": version }),
        || println!("{} {}\n", env!("CARGO_PKG_NAME").bold(), version.dimmed()),
    );
}

pub fn section(title: &str) {
    emit(
        "section",
        Priority::Info,
        || json!({ "title": title }),
        || println!("\n{}", title.bold()),
    );
}

/// A labeled value, aligned under the current section.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        "field",
        Priority::Info,
        || json!({ "label": label, "value": value }),
        || println!("  {:<16} {}", label.dimmed(), value),
    );
}

pub fn note(message: &str) {
    emit(
        "note",
        Priority::Info,
        || json!({ "message": message }),
        || println!("  {}", message.dimmed()),
    );
}

pub fn success(message: &str) {
    emit(
        "success",
        Priority::Info,
        || json!({ "message": message }),
        || println!("  {} {}", "✓".green(), message),
    );
}

pub fn warning(message: &str) {
    emit(
        "warning",
        Priority::Alert,
        || json!({ "message": message }),
        || println!("  {} {}", "!".yellow(), message),
    );
}

pub fn error(message: &str) {
    emit(
        "error",
        Priority::Failure,
        || json!({ "message": message }),
        || eprintln!("  {} {}", "×".red(), message),
    );
}

/// One health check. Failed critical checks are errors, the rest warnings.
pub fn health(check: &HealthCheck) {
    match check.status() {
        HealthStatus::Healthy => success(check.name()),
        HealthStatus::Unhealthy(reason) if check.critical() => {
            error(&format!("{}: {reason}", check.name()));
        }
        HealthStatus::Unhealthy(reason) => warning(&format!("{}: {reason}", check.name())),
    }
}

/// A titled set of pairs, each with an optional annotation.
pub fn pairs(
    title: &str,
    pairs: &BTreeSet<PairSymbol>,
    annotate: impl Fn(&PairSymbol) -> Option<&'static str>,
) {
    section(title);
    if pairs.is_empty() {
        note("empty");
        return;
    }
    for pair in pairs {
        field(pair.as_str(), annotate(pair).map(muted).unwrap_or_default());
    }
}

/// A pre-rendered table, indented under the current section.
pub fn table(rendered: &str) {
    emit(
        "table",
        Priority::Info,
        || json!({ "content": rendered }),
        || {
            for line in rendered.lines() {
                println!("  {line}");
            }
        },
    );
}

/// A complete JSON document, printed as is.
pub fn document(value: &Value) {
    println!("{value}");
}

/// Signed percentage with four decimals, colored by sign outside JSON mode.
#[must_use]
pub fn spread(value: Decimal) -> String {
    format_spread(value, !is_json())
}

fn format_spread(value: Decimal, colored: bool) -> String {
    let text = format!("{value:+.4}%");
    if !colored || value.is_zero() {
        return text;
    }
    if value.is_sign_positive() {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

#[must_use]
pub fn muted(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        value
    } else {
        value.dimmed().to_string()
    }
}
