//! Pure state transition function
//!
//! Given a conversation snapshot and an event, decide the next snapshot and
//! the effects to run. No I/O happens here; the runtime executes effects
//! and feeds their results back in as `Connected`, `OperationCompleted` or
//! `OperationFailed` events.

use super::effect::{Operation, Reply};
use super::event::Outcome;
use super::state::Selection;
use super::{ConvContext, ConvState, Conversation, Effect, Event};
use crate::error::ConsoleError;
use crate::gateway::Document;
use crate::menu::{self, NavToken, Screen};
use crate::paginate::paginate;
use serde_json::Value;
use thiserror::Error;

/// Name of the placeholder collection that makes a new database exist
pub const PLACEHOLDER_COLLECTION: &str = "dummy_collection";

pub const WELCOME: &str =
    "Welcome to the MongoDB Management Bot!\nPlease enter your MongoDB URL to begin.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub next: Conversation,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(next: Conversation) -> Self {
        Self {
            next,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events rejected outright; the session is left untouched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Not connected yet. Please enter your MongoDB URL first.")]
    NotConnected,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    conv: &Conversation,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (conv.state, event) {
        // ============================================================
        // Session lifecycle
        // ============================================================
        (_, Event::Start) => Ok(TransitionResult::new(Conversation::default())
            .with_effect(Effect::reply(WELCOME, None))),

        (ConvState::AwaitingConnection, Event::Cancel) => Ok(TransitionResult::new(conv.clone())
            .with_effect(Effect::reply("Please enter your MongoDB URL to begin.", None))),

        (_, Event::Cancel) => Ok(TransitionResult::new(conv.settled())
            .with_effect(Effect::show_with_notice(Screen::MainMenu, "Cancelled."))),

        // ============================================================
        // Connection
        // ============================================================
        (ConvState::AwaitingConnection, Event::Text { text }) => {
            Ok(TransitionResult::new(conv.clone()).with_effect(Effect::Connect {
                url: text.trim().to_string(),
            }))
        }

        (ConvState::AwaitingConnection, Event::Connected) => {
            Ok(TransitionResult::new(conv.settled()).with_effect(Effect::show_with_notice(
                Screen::MainMenu,
                "Connected successfully!",
            )))
        }

        // Connection failures keep the session where it is so the operator can retry
        (ConvState::AwaitingConnection, Event::OperationFailed { error }) => {
            Ok(TransitionResult::new(conv.clone()).with_effect(Effect::reply(
                format!(
                    "{}\nPlease enter your MongoDB URL again.",
                    error.user_message()
                ),
                None,
            )))
        }

        (ConvState::AwaitingConnection, _) => Err(TransitionError::NotConnected),

        // ============================================================
        // Button navigation (any connected state)
        // ============================================================
        (_, Event::Navigate { token }) => Ok(navigate(conv, context, token)),

        // ============================================================
        // Free text
        // ============================================================
        (ConvState::MainMenu, Event::Text { .. }) => {
            Ok(TransitionResult::new(conv.clone()).with_effect(Effect::show_with_notice(
                Screen::MainMenu,
                "Nothing is waiting for text right now.",
            )))
        }

        (state, Event::Text { text }) => Ok(handle_text(conv, context, state, &text)),

        // ============================================================
        // Operation results
        // ============================================================
        (_, Event::OperationCompleted { outcome }) => {
            Ok(TransitionResult::new(conv.settled())
                .with_effect(Effect::Reply(render_outcome(outcome, context))))
        }

        (_, Event::OperationFailed { error }) => Ok(TransitionResult::new(conv.settled())
            .with_effect(Effect::show_with_notice(Screen::MainMenu, error.user_message()))),

        (state, event @ Event::Connected) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state} with event {}",
            event.kind()
        ))),
    }
}

// ============================================================================
// Navigation
// ============================================================================

fn browse(conv: &Conversation, selection: Selection, screen: Screen) -> TransitionResult {
    let next = Conversation {
        selection,
        ..conv.settled()
    };
    TransitionResult::new(next).with_effect(Effect::show(screen))
}

fn prompt(state: ConvState, selection: Selection, text: String) -> TransitionResult {
    TransitionResult::new(Conversation::prompting(state, selection))
        .with_effect(Effect::reply(text, Some(menu::cancel_menu())))
}

fn run(conv: &Conversation, selection: Selection, operation: Operation) -> TransitionResult {
    let next = Conversation {
        selection,
        ..conv.settled()
    };
    TransitionResult::new(next).with_effect(Effect::execute(operation))
}

/// Button presses never depend on `state`; a pending prompt is abandoned
#[allow(clippy::too_many_lines)]
fn navigate(conv: &Conversation, context: &ConvContext, token: NavToken) -> TransitionResult {
    let none = Selection::default();
    match token {
        NavToken::MainMenu => browse(conv, none, Screen::MainMenu),
        NavToken::ManageDatabases => browse(conv, none, Screen::DatabaseMenu),
        NavToken::ManageCollections => browse(conv, none, Screen::CollectionMenu),
        NavToken::ManageDocuments => browse(conv, none, Screen::DocumentDatabases),
        NavToken::ListDatabases => browse(conv, none, Screen::DatabaseList),
        NavToken::ListCollections => browse(conv, none, Screen::CollectionDatabases),
        NavToken::CreateCollection => browse(conv, none, Screen::PickDatabaseForNewCollection),
        NavToken::DeleteDatabase => browse(conv, none, Screen::PickDatabaseToDrop),
        NavToken::DeleteCollection => browse(conv, none, Screen::PickDatabaseForCollectionDrop),
        NavToken::Database { db } => {
            browse(conv, Selection::database(&db), Screen::CollectionList { db })
        }
        NavToken::DropCollectionFrom { db } => {
            browse(conv, Selection::database(&db), Screen::PickCollectionToDrop { db })
        }
        NavToken::Collection { db, coll } => browse(
            conv,
            Selection::collection(&db, &coll),
            Screen::CollectionOptions { db, coll },
        ),

        // Destructive requests only ever show a confirmation dialog
        NavToken::ConfirmDropDatabase { db } => {
            browse(conv, none, Screen::ConfirmDropDatabase { db })
        }
        NavToken::ConfirmDropCollection { db, coll } => browse(
            conv,
            Selection::database(&db),
            Screen::ConfirmDropCollection { db, coll },
        ),
        NavToken::ConfirmDeleteAll { db, coll } => browse(
            conv,
            Selection::collection(&db, &coll),
            Screen::ConfirmDeleteAll { db, coll },
        ),

        // Confirmed tokens carry their own targets
        NavToken::DropDatabase { db } => run(conv, none, Operation::DropDatabase { db }),
        NavToken::DropCollection { db, coll } => run(
            conv,
            Selection::database(&db),
            Operation::DropCollection { db, coll },
        ),
        NavToken::DeleteAll { db, coll } => run(
            conv,
            Selection::collection(&db, &coll),
            Operation::DeleteAll { db, coll },
        ),
        NavToken::View { db, coll, offset } => run(
            conv,
            Selection::collection(&db, &coll),
            Operation::ViewPage {
                db,
                coll,
                offset,
                limit: context.page_size,
            },
        ),

        // Prompts
        NavToken::CreateDatabase => prompt(
            ConvState::AwaitingNewDatabaseName,
            none,
            "Please enter the name for the new database:".to_string(),
        ),
        NavToken::NewCollectionIn { db } => prompt(
            ConvState::AwaitingNewCollectionName,
            Selection::database(&db),
            format!("Please enter the name for the new collection in database '{db}':"),
        ),
        NavToken::Search { db, coll } => prompt(
            ConvState::AwaitingSearchFilter,
            Selection::collection(&db, &coll),
            format!(
                "Please enter your search query for {db}.{coll} in JSON format.\n\
                 Example: {{\"name\": \"John\"}}"
            ),
        ),
        NavToken::Insert { db, coll } => prompt(
            ConvState::AwaitingInsertDocument,
            Selection::collection(&db, &coll),
            format!(
                "Please enter the document to insert into {db}.{coll} in JSON format.\n\
                 Example: {{\"name\": \"John\", \"age\": 30}}"
            ),
        ),
        NavToken::Update { db, coll } => prompt(
            ConvState::AwaitingUpdateFilter,
            Selection::collection(&db, &coll),
            format!(
                "Please enter the filter to select the document to update in {db}.{coll} \
                 in JSON format.\nExample: {{\"name\": \"John\"}}"
            ),
        ),
        NavToken::Delete { db, coll } => prompt(
            ConvState::AwaitingDeleteFilter,
            Selection::collection(&db, &coll),
            format!(
                "Please enter the filter to select the document to delete from {db}.{coll} \
                 in JSON format.\nExample: {{\"name\": \"John\"}}"
            ),
        ),
    }
}

// ============================================================================
// Free text
// ============================================================================

/// Strictly parse operator text as a JSON object
pub fn parse_document(text: &str) -> Result<Document, ConsoleError> {
    match serde_json::from_str::<Value>(text.trim())? {
        Value::Object(map) => Ok(map),
        other => Err(ConsoleError::malformed_input(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Wrap plain field maps in `$set`; operator documents pass through
pub fn normalize_update(update: Document) -> Document {
    if update.keys().any(|k| k.starts_with('$')) {
        return update;
    }
    let mut wrapped = Document::new();
    wrapped.insert("$set".to_string(), Value::Object(update));
    wrapped
}

fn fail(conv: &Conversation, error: &ConsoleError) -> TransitionResult {
    TransitionResult::new(conv.settled())
        .with_effect(Effect::show_with_notice(Screen::MainMenu, error.user_message()))
}

fn missing_context(conv: &Conversation, what: &str) -> TransitionResult {
    fail(
        conv,
        &ConsoleError::protocol(format!("no {what} selected for {}", conv.state)),
    )
}

/// Every branch except the update filter capture settles at `MainMenu`
#[allow(clippy::too_many_lines)]
fn handle_text(
    conv: &Conversation,
    context: &ConvContext,
    state: ConvState,
    text: &str,
) -> TransitionResult {
    if state == ConvState::AwaitingNewDatabaseName || state == ConvState::AwaitingNewCollectionName
    {
        let name = text.trim();
        if name.is_empty() {
            return fail(conv, &ConsoleError::malformed_input("name must not be empty"));
        }
        if state == ConvState::AwaitingNewDatabaseName {
            return run(
                conv,
                Selection::default(),
                Operation::CreateDatabase {
                    db: name.to_string(),
                },
            );
        }
        let Some(db) = conv.selection.database.clone() else {
            return missing_context(conv, "database");
        };
        return run(
            conv,
            Selection::database(&db),
            Operation::CreateCollection {
                db,
                coll: name.to_string(),
            },
        );
    }

    let Some((db, coll)) = conv
        .selection
        .target()
        .map(|(db, coll)| (db.to_string(), coll.to_string()))
    else {
        return missing_context(conv, "collection");
    };

    let document = match parse_document(text) {
        Ok(document) => document,
        Err(error) => return fail(conv, &error),
    };
    let selection = conv.selection.clone();

    match state {
        ConvState::AwaitingSearchFilter => run(
            conv,
            selection,
            Operation::Search {
                db,
                coll,
                filter: document,
                limit: context.page_size,
            },
        ),
        ConvState::AwaitingInsertDocument => run(
            conv,
            selection,
            Operation::Insert {
                db,
                coll,
                document,
            },
        ),
        ConvState::AwaitingUpdateFilter => TransitionResult::new(Conversation {
            state: ConvState::AwaitingUpdateDocument,
            selection,
            pending_filter: Some(document),
        })
        .with_effect(Effect::reply(
            "Now enter the update data in JSON format.\n\
             Example: {\"age\": 31} or {\"$inc\": {\"age\": 1}}",
            Some(menu::cancel_menu()),
        )),
        ConvState::AwaitingUpdateDocument => {
            let Some(filter) = conv.pending_filter.clone() else {
                return missing_context(conv, "update filter");
            };
            run(
                conv,
                selection,
                Operation::Update {
                    db,
                    coll,
                    filter,
                    update: normalize_update(document),
                },
            )
        }
        ConvState::AwaitingDeleteFilter => run(
            conv,
            selection,
            Operation::DeleteOne {
                db,
                coll,
                filter: document,
            },
        ),
        // Not JSON-expecting; handled above or by the caller
        ConvState::AwaitingConnection
        | ConvState::MainMenu
        | ConvState::AwaitingNewDatabaseName
        | ConvState::AwaitingNewCollectionName => fail(
            conv,
            &ConsoleError::protocol(format!("unexpected text in {state}")),
        ),
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Indented JSON blocks separated by blank lines
pub fn render_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| {
            serde_json::to_string_pretty(doc).unwrap_or_else(|_| "<unrenderable>".to_string())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn collection_back(db: &str, coll: &str) -> Option<(&'static str, NavToken)> {
    Some((
        "Back to Collection Options",
        NavToken::Collection {
            db: db.to_string(),
            coll: coll.to_string(),
        },
    ))
}

fn render_outcome(outcome: Outcome, context: &ConvContext) -> Reply {
    let (text, menu) = match outcome {
        Outcome::DatabaseCreated { db } => (
            format!("Database '{db}' has been created."),
            menu::result_menu(Some(("Back to Database Management", NavToken::ManageDatabases))),
        ),
        Outcome::CollectionCreated { db, coll } => (
            format!("Collection '{coll}' has been created in database '{db}'."),
            menu::result_menu(Some(("Back to Collections", NavToken::Database { db }))),
        ),
        Outcome::SearchResults {
            db,
            coll,
            documents,
            total,
        } => {
            let text = if documents.is_empty() {
                format!("No documents in {db}.{coll} match your query.")
            } else {
                format!(
                    "Search results in {db}.{coll} (first {} of {total} matches):\n\n{}",
                    documents.len(),
                    render_documents(&documents)
                )
            };
            (text, menu::result_menu(collection_back(&db, &coll)))
        }
        Outcome::Inserted { db, coll, id } => (
            format!("Document inserted successfully. Inserted ID: {}", render_id(&id)),
            menu::result_menu(collection_back(&db, &coll)),
        ),
        Outcome::Updated { db, coll, modified } => (
            format!("Update complete. Modified {modified} document(s)."),
            menu::result_menu(collection_back(&db, &coll)),
        ),
        Outcome::Deleted { db, coll, deleted } => (
            format!("Delete operation complete. Deleted {deleted} document(s)."),
            menu::result_menu(collection_back(&db, &coll)),
        ),
        Outcome::AllDeleted { db, coll, deleted } => (
            format!("Deleted {deleted} documents from {db}.{coll}."),
            menu::result_menu(collection_back(&db, &coll)),
        ),
        Outcome::DatabaseDropped { db } => (
            format!("Database '{db}' has been deleted."),
            menu::result_menu(Some(("Back to Database Management", NavToken::ManageDatabases))),
        ),
        Outcome::CollectionDropped { db, coll } => (
            format!("Collection '{coll}' has been deleted from database '{db}'."),
            menu::result_menu(Some(("Back to Collections", NavToken::Database { db }))),
        ),
        Outcome::Page {
            db,
            coll,
            offset,
            total,
            documents,
        } => return render_page(&db, &coll, offset, total, &documents, context),
    };
    Reply {
        text,
        menu: Some(menu),
    }
}

/// `ObjectId`s render as their hex string; other ids as JSON
fn render_id(id: &Value) -> String {
    match id.get("$oid").and_then(Value::as_str) {
        Some(hex) => hex.to_string(),
        None => id.to_string(),
    }
}

fn render_page(
    db: &str,
    coll: &str,
    offset: u64,
    total: u64,
    documents: &[Document],
    context: &ConvContext,
) -> Reply {
    let window = paginate(total, context.page_size, offset);
    let mut text = format!("Documents in {db}.{coll} ({}):", window.label(total));
    if !documents.is_empty() {
        text.push_str("\n\n");
        text.push_str(&render_documents(documents));
    }

    let mut page_menu = menu::Menu::default();
    if window.has_previous {
        page_menu.push(menu::MenuEntry::new(
            "Previous",
            NavToken::View {
                db: db.to_string(),
                coll: coll.to_string(),
                offset: window.previous_offset(),
            },
        ));
    }
    if window.has_next {
        page_menu.push(menu::MenuEntry::new(
            "Next",
            NavToken::View {
                db: db.to_string(),
                coll: coll.to_string(),
                offset: window.next_offset(),
            },
        ));
    }
    page_menu.push(menu::MenuEntry::new(
        "Back to Collection Options",
        NavToken::Collection {
            db: db.to_string(),
            coll: coll.to_string(),
        },
    ));
    Reply {
        text,
        menu: Some(page_menu),
    }
}
