//! Navigation tokens
//!
//! Grammar: `action[:param]*`. Parameters escape `%` and `:` so names that
//! contain the delimiter still round-trip.

use thiserror::Error;

/// Telegram rejects callback data longer than this many bytes
pub const MAX_TOKEN_LEN: usize = 64;

/// A routable menu action with typed parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NavToken {
    MainMenu,
    ManageDatabases,
    ManageCollections,
    ManageDocuments,
    ListDatabases,
    ListCollections,
    CreateDatabase,
    DeleteDatabase,
    ConfirmDropDatabase { db: String },
    DropDatabase { db: String },
    /// Collections of one database
    Database { db: String },
    CreateCollection,
    NewCollectionIn { db: String },
    DeleteCollection,
    DropCollectionFrom { db: String },
    ConfirmDropCollection { db: String, coll: String },
    DropCollection { db: String, coll: String },
    /// Options for one collection
    Collection { db: String, coll: String },
    View { db: String, coll: String, offset: u64 },
    Search { db: String, coll: String },
    Insert { db: String, coll: String },
    Update { db: String, coll: String },
    Delete { db: String, coll: String },
    ConfirmDeleteAll { db: String, coll: String },
    DeleteAll { db: String, coll: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("action '{action}' expects {expected} parameter(s), got {got}")]
    Arity {
        action: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid parameter '{0}'")]
    InvalidParameter(String),
}

fn escape(param: &str) -> String {
    param.replace('%', "%25").replace(':', "%3A")
}

fn unescape(param: &str) -> Result<String, TokenError> {
    let mut out = String::with_capacity(param.len());
    let mut rest = param;
    while let Some(pos) = rest.find('%') {
        let (plain, escaped) = rest.split_at(pos);
        out.push_str(plain);
        match escaped.get(1..3) {
            Some("25") => out.push('%'),
            Some("3A" | "3a") => out.push(':'),
            _ => return Err(TokenError::InvalidParameter(param.to_string())),
        }
        rest = escaped.get(3..).unwrap_or_default();
    }
    out.push_str(rest);
    Ok(out)
}

impl NavToken {
    /// Action name and parameters, in wire order
    fn parts(&self) -> (&'static str, Vec<String>) {
        match self {
            Self::MainMenu => ("main_menu", vec![]),
            Self::ManageDatabases => ("manage_databases", vec![]),
            Self::ManageCollections => ("manage_collections", vec![]),
            Self::ManageDocuments => ("manage_documents", vec![]),
            Self::ListDatabases => ("list_databases", vec![]),
            Self::ListCollections => ("list_collections", vec![]),
            Self::CreateDatabase => ("create_database", vec![]),
            Self::DeleteDatabase => ("delete_database", vec![]),
            Self::ConfirmDropDatabase { db } => ("confirm_delete_db", vec![db.clone()]),
            Self::DropDatabase { db } => ("execute_delete_db", vec![db.clone()]),
            Self::Database { db } => ("db", vec![db.clone()]),
            Self::CreateCollection => ("create_collection", vec![]),
            Self::NewCollectionIn { db } => ("new_coll_db", vec![db.clone()]),
            Self::DeleteCollection => ("delete_collection", vec![]),
            Self::DropCollectionFrom { db } => ("del_coll_db", vec![db.clone()]),
            Self::ConfirmDropCollection { db, coll } => {
                ("confirm_delete_coll", vec![db.clone(), coll.clone()])
            }
            Self::DropCollection { db, coll } => {
                ("execute_delete_coll", vec![db.clone(), coll.clone()])
            }
            Self::Collection { db, coll } => ("coll", vec![db.clone(), coll.clone()]),
            Self::View { db, coll, offset } => {
                ("view", vec![db.clone(), coll.clone(), offset.to_string()])
            }
            Self::Search { db, coll } => ("search", vec![db.clone(), coll.clone()]),
            Self::Insert { db, coll } => ("insert", vec![db.clone(), coll.clone()]),
            Self::Update { db, coll } => ("update", vec![db.clone(), coll.clone()]),
            Self::Delete { db, coll } => ("delete", vec![db.clone(), coll.clone()]),
            Self::ConfirmDeleteAll { db, coll } => ("delete_all", vec![db.clone(), coll.clone()]),
            Self::DeleteAll { db, coll } => {
                ("execute_delete_all", vec![db.clone(), coll.clone()])
            }
        }
    }

    pub fn encode(&self) -> String {
        let (action, params) = self.parts();
        let mut out = action.to_string();
        for param in params {
            out.push(':');
            out.push_str(&escape(&param));
        }
        out
    }

    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let mut pieces = raw.split(':');
        let action = pieces.next().unwrap_or_default();
        let params = pieces.map(unescape).collect::<Result<Vec<_>, _>>()?;

        let arity = |expected: usize| -> Result<(), TokenError> {
            if params.len() == expected {
                Ok(())
            } else {
                Err(TokenError::Arity {
                    action: action.to_string(),
                    expected,
                    got: params.len(),
                })
            }
        };

        let token = match action {
            "main_menu" => arity(0).map(|()| Self::MainMenu)?,
            "manage_databases" => arity(0).map(|()| Self::ManageDatabases)?,
            "manage_collections" => arity(0).map(|()| Self::ManageCollections)?,
            "manage_documents" => arity(0).map(|()| Self::ManageDocuments)?,
            "list_databases" => arity(0).map(|()| Self::ListDatabases)?,
            "list_collections" => arity(0).map(|()| Self::ListCollections)?,
            "create_database" => arity(0).map(|()| Self::CreateDatabase)?,
            "delete_database" => arity(0).map(|()| Self::DeleteDatabase)?,
            "create_collection" => arity(0).map(|()| Self::CreateCollection)?,
            "delete_collection" => arity(0).map(|()| Self::DeleteCollection)?,
            "confirm_delete_db" | "execute_delete_db" | "db" | "new_coll_db" | "del_coll_db" => {
                arity(1)?;
                let db = params[0].clone();
                match action {
                    "confirm_delete_db" => Self::ConfirmDropDatabase { db },
                    "execute_delete_db" => Self::DropDatabase { db },
                    "db" => Self::Database { db },
                    "new_coll_db" => Self::NewCollectionIn { db },
                    _ => Self::DropCollectionFrom { db },
                }
            }
            "confirm_delete_coll" | "execute_delete_coll" | "coll" | "search" | "insert"
            | "update" | "delete" | "delete_all" | "execute_delete_all" => {
                arity(2)?;
                let (db, coll) = (params[0].clone(), params[1].clone());
                match action {
                    "confirm_delete_coll" => Self::ConfirmDropCollection { db, coll },
                    "execute_delete_coll" => Self::DropCollection { db, coll },
                    "coll" => Self::Collection { db, coll },
                    "search" => Self::Search { db, coll },
                    "insert" => Self::Insert { db, coll },
                    "update" => Self::Update { db, coll },
                    "delete" => Self::Delete { db, coll },
                    "delete_all" => Self::ConfirmDeleteAll { db, coll },
                    _ => Self::DeleteAll { db, coll },
                }
            }
            "view" => {
                arity(3)?;
                let offset = params[2]
                    .parse()
                    .map_err(|_| TokenError::InvalidParameter(params[2].clone()))?;
                Self::View {
                    db: params[0].clone(),
                    coll: params[1].clone(),
                    offset,
                }
            }
            other => return Err(TokenError::UnknownAction(other.to_string())),
        };
        Ok(token)
    }

    /// Whether the encoded form fits in a Telegram callback payload
    pub fn fits_transport(&self) -> bool {
        self.encode().len() <= MAX_TOKEN_LEN
    }
}
