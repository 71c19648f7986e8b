//! Effects produced by state transitions

use crate::gateway::Document;
use crate::menu::{Menu, Screen};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open a cluster handle for the session
    Connect { url: String },

    /// Run one gateway operation
    Execute(Operation),

    /// Build and show a screen (may enumerate names first)
    ShowScreen { screen: Screen, notice: Option<String> },

    /// Send text to the operator
    Reply(Reply),
}

impl Effect {
    pub fn reply(text: impl Into<String>, menu: Option<Menu>) -> Self {
        Effect::Reply(Reply {
            text: text.into(),
            menu,
        })
    }

    pub fn show(screen: Screen) -> Self {
        Effect::ShowScreen {
            screen,
            notice: None,
        }
    }

    /// Show `screen` with a line of text above its title
    pub fn show_with_notice(screen: Screen, notice: impl Into<String>) -> Self {
        Effect::ShowScreen {
            screen,
            notice: Some(notice.into()),
        }
    }

    pub fn execute(operation: Operation) -> Self {
        Effect::Execute(operation)
    }
}

/// Outbound text with an optional menu
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub menu: Option<Menu>,
}

/// Gateway work requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a placeholder collection so the database exists
    CreateDatabase { db: String },
    CreateCollection { db: String, coll: String },
    Search {
        db: String,
        coll: String,
        filter: Document,
        limit: u64,
    },
    Insert {
        db: String,
        coll: String,
        document: Document,
    },
    Update {
        db: String,
        coll: String,
        filter: Document,
        update: Document,
    },
    DeleteOne {
        db: String,
        coll: String,
        filter: Document,
    },
    DeleteAll { db: String, coll: String },
    DropDatabase { db: String },
    DropCollection { db: String, coll: String },
    ViewPage {
        db: String,
        coll: String,
        offset: u64,
        limit: u64,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateDatabase { .. } => "create_database",
            Self::CreateCollection { .. } => "create_collection",
            Self::Search { .. } => "search",
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::DeleteOne { .. } => "delete_one",
            Self::DeleteAll { .. } => "delete_all",
            Self::DropDatabase { .. } => "drop_database",
            Self::DropCollection { .. } => "drop_collection",
            Self::ViewPage { .. } => "view_page",
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::DeleteAll { .. } | Self::DropDatabase { .. } | Self::DropCollection { .. }
        )
    }
}
