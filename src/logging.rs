//! The injected logging port (SPEC_FULL.md §10.1). No component in this
//! crate calls a logging macro on a global subscriber directly; everything
//! goes through a `&dyn LogSink` handed in by the caller.

/// Severity of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
  Info,
  Warn,
  Error,
}

/// The logging port. Implement this to wire the core's diagnostics into
/// whatever transport a host application already uses.
pub trait LogSink: Send + Sync {
  fn log(&self, level: LogLevel, message: &str);

  fn info(&self, message: &str) {
    self.log(LogLevel::Info, message);
  }

  fn warn(&self, message: &str) {
    self.log(LogLevel::Warn, message);
  }

  fn error(&self, message: &str) {
    self.log(LogLevel::Error, message);
  }
}

/// Forwards to `tracing`'s span-scoped macros. The default sink for hosts
/// that already run a `tracing-subscriber`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
  fn log(&self, level: LogLevel, message: &str) {
    match level {
      LogLevel::Info => tracing::info!("{message}"),
      LogLevel::Warn => tracing::warn!("{message}"),
      LogLevel::Error => tracing::error!("{message}"),
    }
  }
}

/// Discards everything. Used by tests and embeddings that want silence.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
  fn log(&self, _level: LogLevel, _message: &str) {}
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  #[derive(Default)]
  struct RecordingSink(Mutex<Vec<(LogLevel, String)>>);

  impl LogSink for RecordingSink {
    fn log(&self, level: LogLevel, message: &str) {
      self.0.lock().unwrap().push((level, message.to_string()));
    }
  }

  #[test]
  fn default_level_helpers_forward_to_log() {
    let sink = RecordingSink::default();
    sink.info("a");
    sink.warn("b");
    sink.error("c");
    let recorded = sink.0.lock().unwrap();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[0], (LogLevel::Info, "a".to_string()));
    assert_eq!(recorded[2], (LogLevel::Error, "c".to_string()));
  }

  #[test]
  fn null_sink_never_panics() {
    let sink = NullLogSink;
    sink.info("whatever");
  }

  #[test]
  fn tracing_sink_forwards_into_a_live_subscriber() {
    use tracing_subscriber::fmt::TestWriter;

    let subscriber = tracing_subscriber::fmt().with_writer(TestWriter::default()).finish();
    tracing::subscriber::with_default(subscriber, || {
      let sink = TracingLogSink;
      sink.info("hello from the core");
    });
  }
}
