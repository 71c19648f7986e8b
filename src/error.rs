//! Console error types
//!
//! Every failure the console can surface to an operator is one of four kinds.
//! All of them are caught at the state machine boundary and turned into a
//! one-line notice; none of them is retried.

use thiserror::Error;

/// Console error with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConsoleError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ConsoleError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedInput, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// One-line notice shown to the operator
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::Connection => format!("Connection failed: {}", self.message),
            ErrorKind::MalformedInput => {
                format!("Invalid JSON format. Please try again. ({})", self.message)
            }
            ErrorKind::Database => format!("An error occurred: {}", self.message),
            ErrorKind::Protocol => format!("Unsupported action: {}", self.message),
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad URL or unreachable cluster, only at the connection step
    Connection,
    /// Free text that should have been a JSON object
    MalformedInput,
    /// Any gateway call failure, driver message passed through
    Database,
    /// Unknown navigation token or missing session context
    Protocol,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::MalformedInput => "malformed_input",
            Self::Database => "database",
            Self::Protocol => "protocol",
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed_input(e.to_string())
    }
}
