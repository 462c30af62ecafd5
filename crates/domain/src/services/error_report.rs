//! Error display channel.
//!
//! The registry never returns persistence failures to its caller; it hands a
//! human readable message to an `ErrorReporter` and carries on.

use std::sync::Mutex;

use shared::sync::lock;

/// Receives user-visible error messages.
pub trait ErrorReporter: Send + Sync {
    fn show_error_message(&self, message: &str);
}

/// Reporter that writes messages to the log at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingErrorReporter;

impl ErrorReporter for LoggingErrorReporter {
    fn show_error_message(&self, message: &str) {
        tracing::error!(message = %message, "Group storage error");
    }
}

/// Reporter that keeps every message in memory.
///
/// Useful for development and testing.
#[derive(Debug, Default)]
pub struct RecordingErrorReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.messages).len()
    }
}

impl ErrorReporter for RecordingErrorReporter {
    fn show_error_message(&self, message: &str) {
        tracing::warn!(message = %message, "Recording group storage error");
        lock(&self.messages).push(message.to_string());
    }
}
