//! Conversation state types

use crate::gateway::Document;
use serde::{Deserialize, Serialize};

/// Conversational mode of one operator session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvState {
    /// No cluster handle yet; free text is a connection URL
    #[default]
    AwaitingConnection,
    /// Connected, browsing by buttons
    MainMenu,
    AwaitingNewDatabaseName,
    AwaitingNewCollectionName,
    AwaitingSearchFilter,
    AwaitingInsertDocument,
    /// First step of update: the filter
    AwaitingUpdateFilter,
    /// Second step of update: the update document, `pending_filter` is set
    AwaitingUpdateDocument,
    AwaitingDeleteFilter,
}

impl ConvState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingConnection => "awaiting_connection",
            Self::MainMenu => "main_menu",
            Self::AwaitingNewDatabaseName => "awaiting_new_database_name",
            Self::AwaitingNewCollectionName => "awaiting_new_collection_name",
            Self::AwaitingSearchFilter => "awaiting_search_filter",
            Self::AwaitingInsertDocument => "awaiting_insert_document",
            Self::AwaitingUpdateFilter => "awaiting_update_filter",
            Self::AwaitingUpdateDocument => "awaiting_update_document",
            Self::AwaitingDeleteFilter => "awaiting_delete_filter",
        }
    }
}

impl std::fmt::Display for ConvState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The database/collection the operator last navigated into
///
/// Cleared independently of the conversational mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub database: Option<String>,
    pub collection: Option<String>,
}

impl Selection {
    pub fn database(db: &str) -> Self {
        Self {
            database: Some(db.to_string()),
            collection: None,
        }
    }

    pub fn collection(db: &str, coll: &str) -> Self {
        Self {
            database: Some(db.to_string()),
            collection: Some(coll.to_string()),
        }
    }

    /// Both names, when a collection is selected
    pub fn target(&self) -> Option<(&str, &str)> {
        Some((self.database.as_deref()?, self.collection.as_deref()?))
    }
}

/// Everything the state machine reads and writes for one session
///
/// The live cluster handle is deliberately absent: it is owned by the
/// session record and only touched by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub state: ConvState,
    pub selection: Selection,
    /// Held between the two update steps
    pub pending_filter: Option<Document>,
}

impl Conversation {
    /// Connected and idle at the main menu, keeping the current selection
    #[must_use]
    pub fn settled(&self) -> Self {
        Self {
            state: ConvState::MainMenu,
            selection: self.selection.clone(),
            pending_filter: None,
        }
    }

    /// Enter a prompt state with a fresh selection
    #[must_use]
    pub fn prompting(state: ConvState, selection: Selection) -> Self {
        Self {
            state,
            selection,
            pending_filter: None,
        }
    }
}

/// Immutable per-console configuration the transition function needs
#[derive(Debug, Clone)]
pub struct ConvContext {
    /// Documents per view page and search result
    pub page_size: u64,
}

impl ConvContext {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }
}

impl Default for ConvContext {
    fn default() -> Self {
        Self::new(crate::paginate::DEFAULT_PAGE_SIZE)
    }
}
