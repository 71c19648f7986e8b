//! Menu/keyboard builder
//!
//! Pure mapping from a named screen to an ordered list of selectable
//! actions. Screens that enumerate databases or collections declare a
//! `Listing`; the runtime fetches the names and hands them back to `build`.

mod token;

pub use token::{NavToken, MAX_TOKEN_LEN};

/// One selectable action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub token: NavToken,
}

impl MenuEntry {
    pub fn new(label: impl Into<String>, token: NavToken) -> Self {
        Self {
            label: label.into(),
            token,
        }
    }
}

/// Ordered groups of entries; each group renders as one keyboard row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    pub rows: Vec<Vec<MenuEntry>>,
}

impl Menu {
    pub fn single(entry: MenuEntry) -> Self {
        Self {
            rows: vec![vec![entry]],
        }
    }

    /// Append an entry on its own row, skipping tokens the transport cannot carry
    pub fn push(&mut self, entry: MenuEntry) {
        if entry.token.fits_transport() {
            self.rows.push(vec![entry]);
        } else {
            tracing::warn!(
                label = %entry.label,
                max_len = MAX_TOKEN_LEN,
                "Omitting menu entry whose token exceeds the callback limit"
            );
        }
    }

    #[must_use]
    pub fn with(mut self, label: impl Into<String>, token: NavToken) -> Self {
        self.push(MenuEntry::new(label, token));
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = &MenuEntry> {
        self.rows.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Names a screen needs enumerated before it can be built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Databases,
    Collections { db: String },
}

/// Every screen the console can show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    MainMenu,
    DatabaseMenu,
    CollectionMenu,
    /// Databases to browse into
    DatabaseList,
    /// Databases whose collections to list
    CollectionDatabases,
    /// Databases whose documents to manage
    DocumentDatabases,
    CollectionList { db: String },
    CollectionOptions { db: String, coll: String },
    PickDatabaseForNewCollection,
    PickDatabaseToDrop,
    PickDatabaseForCollectionDrop,
    PickCollectionToDrop { db: String },
    ConfirmDropDatabase { db: String },
    ConfirmDropCollection { db: String, coll: String },
    ConfirmDeleteAll { db: String, coll: String },
}

impl Screen {
    /// Names to fetch before building, if any
    pub fn listing(&self) -> Option<Listing> {
        match self {
            Self::DatabaseList
            | Self::CollectionDatabases
            | Self::DocumentDatabases
            | Self::PickDatabaseForNewCollection
            | Self::PickDatabaseToDrop
            | Self::PickDatabaseForCollectionDrop => Some(Listing::Databases),
            Self::CollectionList { db } | Self::PickCollectionToDrop { db } => {
                Some(Listing::Collections { db: db.clone() })
            }
            _ => None,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::MainMenu => "Please select an option:".to_string(),
            Self::DatabaseMenu => "Database Management Options:".to_string(),
            Self::CollectionMenu => "Collection Management Options:".to_string(),
            Self::DatabaseList => "Select a database:".to_string(),
            Self::CollectionDatabases => "Select a database to list its collections:".to_string(),
            Self::DocumentDatabases => "Select a database to manage its documents:".to_string(),
            Self::CollectionList { db } => format!("Collections in {db}:"),
            Self::CollectionOptions { db, coll } => format!("Options for {db}.{coll}:"),
            Self::PickDatabaseForNewCollection => {
                "Select a database for the new collection:".to_string()
            }
            Self::PickDatabaseToDrop => "Select a database to delete:".to_string(),
            Self::PickDatabaseForCollectionDrop => {
                "Select a database to delete a collection from:".to_string()
            }
            Self::PickCollectionToDrop { db } => {
                format!("Select a collection to delete from database '{db}':")
            }
            Self::ConfirmDropDatabase { db } => format!(
                "Are you sure you want to delete the database '{db}'? This action cannot be undone."
            ),
            Self::ConfirmDropCollection { db, coll } => format!(
                "Are you sure you want to delete the collection '{coll}' from database '{db}'? \
                 This action cannot be undone."
            ),
            Self::ConfirmDeleteAll { db, coll } => format!(
                "Are you sure you want to delete all documents from {db}.{coll}? \
                 This action cannot be undone."
            ),
        }
    }
}

/// Build the menu for `screen`; `names` is the result of its `Listing`
#[allow(clippy::too_many_lines)]
pub fn build(screen: &Screen, names: &[String]) -> Menu {
    let mut menu = Menu::default();
    match screen {
        Screen::MainMenu => {
            menu = root_menu();
        }
        Screen::DatabaseMenu => {
            menu = menu
                .with("List Databases", NavToken::ListDatabases)
                .with("Create Database", NavToken::CreateDatabase)
                .with("Delete Database", NavToken::DeleteDatabase)
                .with("Back to Main Menu", NavToken::MainMenu);
        }
        Screen::CollectionMenu => {
            menu = menu
                .with("List Collections", NavToken::ListCollections)
                .with("Create Collection", NavToken::CreateCollection)
                .with("Delete Collection", NavToken::DeleteCollection)
                .with("Back to Main Menu", NavToken::MainMenu);
        }
        Screen::DatabaseList => {
            for db in names {
                menu.push(MenuEntry::new(db, NavToken::Database { db: db.clone() }));
            }
            menu.push(MenuEntry::new("Back to Database Management", NavToken::ManageDatabases));
        }
        Screen::CollectionDatabases => {
            for db in names {
                menu.push(MenuEntry::new(db, NavToken::Database { db: db.clone() }));
            }
            menu.push(MenuEntry::new(
                "Back to Collection Management",
                NavToken::ManageCollections,
            ));
        }
        Screen::DocumentDatabases => {
            for db in names {
                menu.push(MenuEntry::new(db, NavToken::Database { db: db.clone() }));
            }
            menu.push(MenuEntry::new("Back to Main Menu", NavToken::MainMenu));
        }
        Screen::CollectionList { db } => {
            for coll in names {
                menu.push(MenuEntry::new(
                    coll,
                    NavToken::Collection {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                ));
            }
            menu.push(MenuEntry::new("Back to Databases", NavToken::ListDatabases));
        }
        Screen::CollectionOptions { db, coll } => {
            let (db, coll) = (db.clone(), coll.clone());
            menu = menu
                .with(
                    "View Documents",
                    NavToken::View {
                        db: db.clone(),
                        coll: coll.clone(),
                        offset: 0,
                    },
                )
                .with(
                    "Search Documents",
                    NavToken::Search {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                )
                .with(
                    "Insert Document",
                    NavToken::Insert {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                )
                .with(
                    "Update Document",
                    NavToken::Update {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                )
                .with(
                    "Delete Document",
                    NavToken::Delete {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                )
                .with(
                    "Delete All Documents",
                    NavToken::ConfirmDeleteAll {
                        db: db.clone(),
                        coll,
                    },
                )
                .with("Back to Collections", NavToken::Database { db });
        }
        Screen::PickDatabaseForNewCollection => {
            for db in names {
                menu.push(MenuEntry::new(db, NavToken::NewCollectionIn { db: db.clone() }));
            }
            menu.push(MenuEntry::new("Cancel", NavToken::ManageCollections));
        }
        Screen::PickDatabaseToDrop => {
            for db in names {
                menu.push(MenuEntry::new(
                    db,
                    NavToken::ConfirmDropDatabase { db: db.clone() },
                ));
            }
            menu.push(MenuEntry::new("Cancel", NavToken::ManageDatabases));
        }
        Screen::PickDatabaseForCollectionDrop => {
            for db in names {
                menu.push(MenuEntry::new(
                    db,
                    NavToken::DropCollectionFrom { db: db.clone() },
                ));
            }
            menu.push(MenuEntry::new("Cancel", NavToken::ManageCollections));
        }
        Screen::PickCollectionToDrop { db } => {
            for coll in names {
                menu.push(MenuEntry::new(
                    coll,
                    NavToken::ConfirmDropCollection {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                ));
            }
            menu.push(MenuEntry::new("Cancel", NavToken::ManageCollections));
        }
        // Cancel targets are static screens so backing out costs no gateway call
        Screen::ConfirmDropDatabase { db } => {
            menu = menu
                .with(
                    "Yes, delete database",
                    NavToken::DropDatabase { db: db.clone() },
                )
                .with("No, cancel", NavToken::ManageDatabases);
        }
        Screen::ConfirmDropCollection { db, coll } => {
            menu = menu
                .with(
                    "Yes, delete collection",
                    NavToken::DropCollection {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                )
                .with("No, cancel", NavToken::ManageCollections);
        }
        Screen::ConfirmDeleteAll { db, coll } => {
            menu = menu
                .with(
                    "Yes, delete all",
                    NavToken::DeleteAll {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                )
                .with(
                    "No, cancel",
                    NavToken::Collection {
                        db: db.clone(),
                        coll: coll.clone(),
                    },
                );
        }
    }
    menu
}

/// The root screen: the only one without a back entry
pub fn root_menu() -> Menu {
    Menu::default()
        .with("Manage Databases", NavToken::ManageDatabases)
        .with("Manage Collections", NavToken::ManageCollections)
        .with("Manage Documents", NavToken::ManageDocuments)
}

/// Single-entry menu offering a way out of a text prompt
pub fn cancel_menu() -> Menu {
    Menu::single(MenuEntry::new("Cancel", NavToken::MainMenu))
}

/// Navigation attached to an operation result
pub fn result_menu(back: Option<(&str, NavToken)>) -> Menu {
    let mut menu = Menu::default();
    if let Some((label, token)) = back {
        menu.push(MenuEntry::new(label, token));
    }
    menu.with("Back to Main Menu", NavToken::MainMenu)
}
