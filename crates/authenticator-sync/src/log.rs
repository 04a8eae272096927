//! # Host Log Bridge
//!
//! Forwards `tracing` events to a logger supplied by the host app, so
//! Android/iOS/Web hosts see sync logs in their own log pipeline.
//!
//! ```text
//! debug!(upserts = 2, "Calculated operations")
//!        │
//!        ▼
//!  EnvFilter ──► HostLogLayer ──► Logger::log(Debug, "Calculated operations upserts=2")
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{SyncError, SyncResult};

/// Severity passed to the host logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        if *level == Level::ERROR {
            LogLevel::Error
        } else if *level == Level::WARN {
            LogLevel::Warn
        } else if *level == Level::INFO {
            LogLevel::Info
        } else if *level == Level::DEBUG {
            LogLevel::Debug
        } else {
            LogLevel::Trace
        }
    }
}

/// Logger implemented by the host app.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: String);
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: BTreeMap<&'static str, String>,
}

impl MessageVisitor {
    fn record(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name(), value);
        }
    }

    /// `message key=value key=value`, fields in name order.
    fn into_line(self) -> String {
        let mut line = self.message.unwrap_or_default();
        for (name, value) in self.fields {
            if !line.is_empty() {
                line.push(' ');
            }
            let _ = write!(line, "{name}={value}");
        }
        line
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record(field, value.to_string());
    }
}

/// `tracing_subscriber` layer that hands every event to a [`Logger`].
#[derive(Clone)]
pub struct HostLogLayer {
    logger: Arc<dyn Logger>,
}

impl HostLogLayer {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        HostLogLayer { logger }
    }
}

impl<S> Layer<S> for HostLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.logger
            .log(LogLevel::from(event.metadata().level()), visitor.into_line());
    }
}

/// Installs the global subscriber: `EnvFilter` plus the host bridge.
///
/// Fails if `filter` does not parse or a global subscriber already exists.
pub fn init_logging(logger: Arc<dyn Logger>, filter: &str) -> SyncResult<()> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| SyncError::InvalidConfig(format!("invalid log filter '{filter}': {e}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(HostLogLayer::new(logger))
        .try_init()
        .map_err(|e| SyncError::LoggingInitFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing_subscriber::registry;

    #[derive(Default)]
    struct CapturingLogger {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for CapturingLogger {
        fn log(&self, level: LogLevel, message: String) {
            self.lines.lock().unwrap().push((level, message));
        }
    }

    #[test]
    fn test_events_reach_host_logger() {
        let logger = Arc::new(CapturingLogger::default());
        let subscriber = registry().with(HostLogLayer::new(logger.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(upserts = 2, pushes = 1, "Calculated operations");
            tracing::warn!("Reconcile tick failed");
        });

        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            (LogLevel::Debug, "Calculated operations pushes=1 upserts=2".to_string())
        );
        assert_eq!(lines[1], (LogLevel::Warn, "Reconcile tick failed".to_string()));
    }

    #[test]
    fn test_filter_applies_before_bridge() {
        let logger = Arc::new(CapturingLogger::default());
        let subscriber = registry()
            .with(EnvFilter::new("warn"))
            .with(HostLogLayer::new(logger.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("hidden");
            tracing::error!(retryable = false, "shown");
        });

        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], (LogLevel::Error, "shown retryable=false".to_string()));
    }

    #[test]
    fn test_init_logging_twice_fails() {
        let logger: Arc<dyn Logger> = Arc::new(CapturingLogger::default());
        let _ = init_logging(logger.clone(), "info");

        let err = init_logging(logger, "info").unwrap_err();
        assert!(matches!(err, SyncError::LoggingInitFailed(_)));
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::from(&Level::TRACE), LogLevel::Trace);
        assert_eq!(LogLevel::from(&Level::ERROR), LogLevel::Error);
    }
}
