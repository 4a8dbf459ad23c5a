use thiserror::Error;
use tracing::{error, warn};

/// Error severity, used to decide how loudly a fatal error is surfaced at exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Setup-time and persistence errors for the agent core.
///
/// Hot control-flow results (`ActionResult`, the skills tri-state, the race
/// flow states) are plain enums, not `Result<_, AgentError>` — transient and
/// soft failures are modeled as data the caller inspects, not as an error
/// channel. `AgentError` covers only what's treated as fatal: configuration
/// invalidity at load time, catalog/persistence I/O, and the controller or
/// perception backends being unreachable past their deadline.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("failed to persist state to '{path}': {source}")]
    Persistence {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("controller backend error: {0}")]
    Controller(String),

    #[error("perception backend unreachable: {0}")]
    Perception(String),
}

impl AgentError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config(_) => ErrorSeverity::Critical,
            Self::Catalog(_) => ErrorSeverity::Critical,
            Self::Persistence { .. } => ErrorSeverity::Error,
            Self::Controller(_) => ErrorSeverity::Error,
            Self::Perception(_) => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::Catalog(msg) => format!("Catalog load issue: {msg}"),
            Self::Persistence { path, source } => {
                format!("Could not persist state to {}: {source}", path.display())
            }
            Self::Controller(msg) => format!("Controller backend failed: {msg}"),
            Self::Perception(msg) => format!("Perception backend failed: {msg}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

/// Extension trait for downgrading a `Result` to a logged `Option`, with
/// caller location, for call sites where the failure is recoverable and the
/// loop should simply carry on.
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "operation had warning"
                );
                None
            }
        }
    }
}

/// Panic in debug builds, log-and-degrade in release builds. Reserved for
/// invariants this crate's own flows are supposed to guarantee internally
/// (e.g. a tri-state flow returning Success without having checked the
/// post-condition) — never for data coming from perception, which is
/// expected to be noisy.
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("impossible state: {}", format_args!($($fmt_arg)*));
        }
    };
}
