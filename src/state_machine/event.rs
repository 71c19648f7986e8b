//! Events that can occur in a conversation

use crate::error::ConsoleError;
use crate::gateway::Document;
use crate::menu::NavToken;
use serde_json::Value;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Operator events
    /// New-session trigger
    Start,
    /// Abandon whatever prompt is pending
    Cancel,
    Text {
        text: String,
    },
    Navigate {
        token: NavToken,
    },

    // Gateway events
    Connected,
    OperationCompleted {
        outcome: Outcome,
    },
    OperationFailed {
        error: ConsoleError,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Cancel => "cancel",
            Self::Text { .. } => "text",
            Self::Navigate { .. } => "navigate",
            Self::Connected => "connected",
            Self::OperationCompleted { .. } => "operation_completed",
            Self::OperationFailed { .. } => "operation_failed",
        }
    }
}

/// Result of one executed operation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    DatabaseCreated {
        db: String,
    },
    CollectionCreated {
        db: String,
        coll: String,
    },
    SearchResults {
        db: String,
        coll: String,
        documents: Vec<Document>,
        total: u64,
    },
    Inserted {
        db: String,
        coll: String,
        id: Value,
    },
    Updated {
        db: String,
        coll: String,
        modified: u64,
    },
    Deleted {
        db: String,
        coll: String,
        deleted: u64,
    },
    AllDeleted {
        db: String,
        coll: String,
        deleted: u64,
    },
    DatabaseDropped {
        db: String,
    },
    CollectionDropped {
        db: String,
        coll: String,
    },
    Page {
        db: String,
        coll: String,
        offset: u64,
        total: u64,
        documents: Vec<Document>,
    },
}
