//! Logging bootstrap and console output for score director events.
//!
//! Provides a custom `tracing` layer that formats score director lifecycle
//! events as single lines. Call [`init`] once at startup.
//!
//! ## Log Levels
//!
//! - **INFO**: Config loading and test-gen capture
//! - **DEBUG**: Director lifecycle (built, solution set, disposed)
//! - **WARN**: Corruption of a director
//! - **TRACE**: Individual notifications

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Initializes console output, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times - only the first call has effect, and an
/// already installed global subscriber is left alone.
pub fn init() {
    INIT.get_or_init(|| {
        EPOCH.get_or_init(Instant::now);
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(ScoreDirectorConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats ScoreForge events.
pub struct ScoreDirectorConsoleLayer;

impl<S: Subscriber> Layer<S> for ScoreDirectorConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("scoreforge") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(*metadata.level(), &visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stderr(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    backend: Option<String>,
    solution: Option<String>,
    reason: Option<String>,
    error: Option<String>,
    environment_mode: Option<String>,
    score_director_type: Option<String>,
    path: Option<String>,
    entity_count: Option<u64>,
    calculation_count: Option<u64>,
    listeners: Option<u64>,
    rules: Option<u64>,
    look_up_enabled: Option<bool>,
    constraint_match_enabled: Option<bool>,
}

impl EventVisitor {
    fn set_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "backend" => self.backend = Some(value),
            "solution" => self.solution = Some(value),
            "reason" => self.reason = Some(value),
            "error" => self.error = Some(value),
            "environment_mode" => self.environment_mode = Some(value),
            "score_director_type" => self.score_director_type = Some(value),
            "path" => self.path = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_text(field, s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_text(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "calculation_count" => self.calculation_count = Some(value),
            "entity_count" => self.entity_count = Some(value),
            "listeners" => self.listeners = Some(value),
            "rules" => self.rules = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            "look_up_enabled" => self.look_up_enabled = Some(value),
            "constraint_match_enabled" => self.constraint_match_enabled = Some(value),
            _ => {}
        }
    }
}

fn format_event(level: Level, v: &EventVisitor) -> String {
    let msg = v.message.as_deref().unwrap_or("");
    let body = match msg {
        "Built score director" => format!(
            "Built {} score director: look-up ({}), constraint match ({}), environment mode ({}), listeners ({})",
            v.backend.as_deref().unwrap_or("?"),
            on_off(v.look_up_enabled),
            on_off(v.constraint_match_enabled),
            v.environment_mode.as_deref().unwrap_or("?"),
            v.listeners.unwrap_or(0)
        ),
        "Working solution set" => format!(
            "Working solution {} set: entity count ({})",
            v.solution.as_deref().unwrap_or("?"),
            v.entity_count.unwrap_or(0)
        ),
        "Score director disposed" => format!(
            "Disposed {} score director after {} score calculations",
            v.backend.as_deref().unwrap_or("?"),
            v.calculation_count.unwrap_or(0)
        ),
        "Score director corrupted" => format!(
            "Score director corrupted: {}",
            v.reason.as_deref().unwrap_or("?")
        ),
        "Score corruption captured" => format!(
            "Score corruption captured: {}",
            v.error.as_deref().unwrap_or("?")
        ),
        "Loaded score director config" => format!(
            "Loaded {}: score director type ({}), environment mode ({})",
            v.path.as_deref().unwrap_or("?"),
            v.score_director_type.as_deref().unwrap_or("?"),
            v.environment_mode.as_deref().unwrap_or("?")
        ),
        "" => return String::new(),
        other => match v.rules {
            Some(rules) => format!("{}: rules ({})", other, rules),
            None => other.to_string(),
        },
    };

    format!("{} {:>5} [ScoreDirector] {}", format_elapsed(), level.to_string(), body)
}

fn on_off(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "on",
        Some(false) => "off",
        None => "?",
    }
}

// Seconds since logging was initialized.
fn format_elapsed() -> String {
    let elapsed = EPOCH.get_or_init(Instant::now).elapsed();
    format!("{:>7.3}s", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visitor(message: &str) -> EventVisitor {
        EventVisitor {
            message: Some(message.to_string()),
            ..EventVisitor::default()
        }
    }

    #[test]
    fn test_format_built_director() {
        let v = EventVisitor {
            backend: Some("rule_engine".to_string()),
            look_up_enabled: Some(true),
            constraint_match_enabled: Some(false),
            environment_mode: Some("FastAssert".to_string()),
            listeners: Some(2),
            ..visitor("Built score director")
        };
        let line = format_event(Level::DEBUG, &v);
        assert!(line.ends_with(
            "DEBUG [ScoreDirector] Built rule_engine score director: look-up (on), constraint match (off), environment mode (FastAssert), listeners (2)"
        ));
    }

    #[test]
    fn test_format_solution_set() {
        let v = EventVisitor {
            solution: Some("ConflictSolution".to_string()),
            entity_count: Some(3),
            ..visitor("Working solution set")
        };
        let line = format_event(Level::DEBUG, &v);
        assert!(line.ends_with("Working solution ConflictSolution set: entity count (3)"));
    }

    #[test]
    fn test_format_unknown_message_passes_through() {
        let v = EventVisitor {
            rules: Some(4),
            ..visitor("Captured rule sources for test generation")
        };
        let line = format_event(Level::INFO, &v);
        assert!(line.ends_with(" INFO [ScoreDirector] Captured rule sources for test generation: rules (4)"));
    }

    #[test]
    fn test_format_without_message_is_skipped() {
        assert!(format_event(Level::WARN, &EventVisitor::default()).is_empty());
    }

    #[test]
    fn test_lines_start_with_elapsed_seconds() {
        let line = format_event(Level::INFO, &visitor("Loaded"));
        let (elapsed, rest) = line.split_once("s ").unwrap();
        assert!(elapsed.trim().parse::<f64>().unwrap() >= 0.0);
        assert_eq!(rest, " INFO [ScoreDirector] Loaded");
    }

    #[test]
    fn test_init_is_repeatable() {
        init();
        init();
    }
}
