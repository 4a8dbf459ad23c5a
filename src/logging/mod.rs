//! Structured logging: a non-blocking JSONL file sink for machine parsing
//! plus a pretty stderr sink for interactive runs, a per-tick correlation
//! id, and counters the agent loop reports periodically.
//!
//! No log-capture toggle and no in-memory ring buffer for a UI to poll:
//! this core has no UI to serve one to.

use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::OnceLock;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub mod metrics;

pub use metrics::Metrics;

// =============================================================================
// CORRELATION ID
// =============================================================================

static DEFAULT_CORRELATION_ID: OnceLock<String> = OnceLock::new();

thread_local! {
    static CORRELATION_ID: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Set the correlation_id for the current thread, returning a guard that
/// restores the previous value on drop. The agent loop calls this once per
/// tick with a fresh UUID v4.
pub fn set_correlation_id(id: impl Into<String>) -> CorrelationGuard {
    let previous = CORRELATION_ID.with(|cell| cell.borrow_mut().replace(id.into()));
    CorrelationGuard { previous }
}

/// Convenience: start a tick's correlation scope with a freshly generated id.
pub fn new_tick_correlation() -> CorrelationGuard {
    set_correlation_id(Uuid::new_v4().to_string())
}

pub struct CorrelationGuard {
    previous: Option<String>,
}

impl Drop for CorrelationGuard {
    fn drop(&mut self) {
        let prev = self.previous.take();
        CORRELATION_ID.with(|cell| *cell.borrow_mut() = prev);
    }
}

fn current_correlation_id() -> String {
    CORRELATION_ID.with(|cell| {
        cell.borrow().clone().unwrap_or_else(|| {
            DEFAULT_CORRELATION_ID
                .get_or_init(|| Uuid::new_v4().to_string())
                .clone()
        })
    })
}

// =============================================================================
// JSON FORMATTER WITH CORRELATION ID INJECTION
// =============================================================================

#[derive(Default)]
struct JsonFieldCollector {
    fields: Map<String, Value>,
}

impl Visit for JsonFieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match serde_json::Number::from_f64(value) {
            Some(num) => {
                self.fields.insert(field.name().to_string(), Value::Number(num));
            }
            None => {
                self.fields
                    .insert(field.name().to_string(), Value::String(format!("{value:.2}")));
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), Value::String(format!("{value:?}")));
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Every JSONL line carries `timestamp`, `level`, `target`, `correlation_id`
/// and `message`, with any remaining event fields nested under `fields`.
#[derive(Default)]
struct JsonWithCorrelation;

impl<S, N> FormatEvent<S, N> for JsonWithCorrelation
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let mut collector = JsonFieldCollector::default();
        event.record(&mut collector);
        let mut fields = collector.fields;

        let message = fields
            .remove("message")
            .map(value_to_string)
            .unwrap_or_default();

        let correlation_id = fields
            .remove("correlation_id")
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(current_correlation_id);

        let mut root = Map::new();
        root.insert(
            "timestamp".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        );
        root.insert("level".to_string(), Value::String(event.metadata().level().to_string()));
        root.insert("target".to_string(), Value::String(event.metadata().target().to_string()));
        root.insert("correlation_id".to_string(), Value::String(correlation_id));
        root.insert("message".to_string(), Value::String(message));
        if !fields.is_empty() {
            root.insert("fields".to_string(), Value::Object(fields));
        }

        match serde_json::to_string(&Value::Object(root)) {
            Ok(json) => writeln!(writer, "{json}"),
            Err(e) => writeln!(writer, r#"{{"level":"ERROR","message":"failed to serialize log","error":"{e}"}}"#),
        }
    }
}

// =============================================================================
// INIT
// =============================================================================

fn log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".uma-agent").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("uma-agent-logs"))
}

pub fn log_path() -> PathBuf {
    log_dir().join("agent.jsonl")
}

/// Guard that must be kept alive for the process lifetime; dropping it
/// flushes and closes the JSONL sink.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

static LOGGING_GUARD: OnceLock<LoggingGuard> = OnceLock::new();

/// Initialize the global tracing subscriber. Safe to call more than once;
/// only the first call takes effect.
pub fn init() {
    LOGGING_GUARD.get_or_init(init_internal);
}

fn init_internal() -> LoggingGuard {
    let _ = DEFAULT_CORRELATION_ID.get_or_init(|| Uuid::new_v4().to_string());

    let dir = log_dir();
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("[logging] failed to create log directory {}: {e}", dir.display());
    }

    let path = log_dir().join("agent.jsonl");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .unwrap_or_else(|e| {
            eprintln!("[logging] failed to open {}: {e}", path.display());
            OpenOptions::new().write(true).open("/dev/null").expect("/dev/null must open")
        });

    let (non_blocking, file_guard) = tracing_appender::non_blocking(file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer()
        .event_format(JsonWithCorrelation)
        .with_writer(non_blocking)
        .with_ansi(false);

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    tracing::info!(
        event_type = "session_start",
        pid = std::process::id(),
        log_path = %path.display(),
        "agent session started"
    );

    LoggingGuard { _file_guard: file_guard }
}

/// Confidence floor under which a resolved OCR-disambiguation click is
/// logged at debug with the matched text, for curating future training
/// data.
pub const LOW_CONFIDENCE_CLICK_THRESHOLD: f32 = 0.75;

/// Log a low-confidence click resolution. Called by the Waiter's OCR
/// disambiguation cascade when the winning match's confidence is below
/// `LOW_CONFIDENCE_CLICK_THRESHOLD`.
pub fn log_low_confidence_click(kind: &'static str, roi_x: i32, roi_y: i32, matched_text: &str, confidence: f32) {
    tracing::debug!(
        kind,
        roi_x,
        roi_y,
        matched_text,
        confidence,
        correlation_id = %current_correlation_id(),
        "low-confidence click resolution"
    );
}
