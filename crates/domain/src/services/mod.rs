//! Collaborator contracts for the group registry.

pub mod error_report;
pub mod labels;

pub use error_report::{ErrorReporter, LoggingErrorReporter, RecordingErrorReporter};
pub use labels::{GroupLabels, StaticLabels};
