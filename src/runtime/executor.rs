//! Effect executor
//!
//! Runs the effects a transition produced. Gateway results come back as
//! events so the state machine decides what the operator sees next.

use super::Console;
use crate::error::ConsoleError;
use crate::gateway::Gateway;
use crate::menu::{self, Listing, Menu, Screen};
use crate::session::Session;
use crate::state_machine::{Effect, Event, Operation, Outcome, Reply, PLACEHOLDER_COLLECTION};

/// What one effect yields back to the drive loop
pub(super) enum Step {
    Reply(Reply),
    Feedback(Event),
}

impl Console {
    pub(super) async fn execute_effect(&self, session: &mut Session, effect: Effect) -> Step {
        match effect {
            Effect::Reply(reply) => Step::Reply(reply),

            Effect::Connect { url } => match self.connector.connect(&url).await {
                Ok(gateway) => {
                    session.attach(gateway).await;
                    tracing::info!("Session connected");
                    Step::Feedback(Event::Connected)
                }
                Err(error) => Step::Feedback(Event::OperationFailed { error }),
            },

            Effect::Execute(operation) => {
                let Some(gateway) = session.connection.clone() else {
                    return Step::Feedback(Event::OperationFailed {
                        error: ConsoleError::protocol("no open connection for this session"),
                    });
                };
                match execute(gateway.as_ref(), operation).await {
                    Ok(outcome) => Step::Feedback(Event::OperationCompleted { outcome }),
                    Err(error) => Step::Feedback(Event::OperationFailed { error }),
                }
            }

            Effect::ShowScreen { screen, notice } => {
                match render_screen(session.connection.as_deref(), &screen).await {
                    Ok(menu) => {
                        let title = screen.title();
                        let text = match notice {
                            Some(notice) => format!("{notice}\n{title}"),
                            None => title,
                        };
                        Step::Reply(Reply {
                            text,
                            menu: Some(menu),
                        })
                    }
                    Err(error) => Step::Feedback(Event::OperationFailed { error }),
                }
            }
        }
    }
}

/// Enumerate whatever the screen lists, then build its menu
pub(super) async fn render_screen(
    gateway: Option<&dyn Gateway>,
    screen: &Screen,
) -> Result<Menu, ConsoleError> {
    let names = match screen.listing() {
        None => Vec::new(),
        Some(listing) => {
            let gateway =
                gateway.ok_or_else(|| ConsoleError::protocol("no open connection for this session"))?;
            match listing {
                Listing::Databases => gateway.list_databases().await?,
                Listing::Collections { db } => gateway.list_collections(&db).await?,
            }
        }
    };
    Ok(menu::build(screen, &names))
}

/// Run one operation against the session's gateway
pub(super) async fn execute(
    gateway: &dyn Gateway,
    operation: Operation,
) -> Result<Outcome, ConsoleError> {
    if operation.is_destructive() {
        tracing::info!(operation = operation.name(), "Executing confirmed destructive operation");
    }

    let outcome = match operation {
        Operation::CreateDatabase { db } => {
            gateway.create_collection(&db, PLACEHOLDER_COLLECTION).await?;
            Outcome::DatabaseCreated { db }
        }
        Operation::CreateCollection { db, coll } => {
            gateway.create_collection(&db, &coll).await?;
            Outcome::CollectionCreated { db, coll }
        }
        Operation::Search {
            db,
            coll,
            filter,
            limit,
        } => {
            let total = gateway.count_documents(&db, &coll, Some(&filter)).await?;
            let documents = gateway
                .find_documents(&db, &coll, Some(&filter), 0, limit)
                .await?;
            Outcome::SearchResults {
                db,
                coll,
                documents,
                total,
            }
        }
        Operation::Insert { db, coll, document } => {
            let id = gateway.insert_one(&db, &coll, document).await?;
            Outcome::Inserted { db, coll, id }
        }
        Operation::Update {
            db,
            coll,
            filter,
            update,
        } => {
            let modified = gateway.update_one(&db, &coll, filter, update).await?;
            Outcome::Updated { db, coll, modified }
        }
        Operation::DeleteOne { db, coll, filter } => {
            let deleted = gateway.delete_one(&db, &coll, filter).await?;
            Outcome::Deleted { db, coll, deleted }
        }
        Operation::DeleteAll { db, coll } => {
            let deleted = gateway.delete_many(&db, &coll).await?;
            Outcome::AllDeleted { db, coll, deleted }
        }
        Operation::DropDatabase { db } => {
            gateway.drop_database(&db).await?;
            Outcome::DatabaseDropped { db }
        }
        Operation::DropCollection { db, coll } => {
            gateway.drop_collection(&db, &coll).await?;
            Outcome::CollectionDropped { db, coll }
        }
        Operation::ViewPage {
            db,
            coll,
            offset,
            limit,
        } => {
            let total = gateway.count_documents(&db, &coll, None).await?;
            let documents = gateway
                .find_documents(&db, &coll, None, offset, limit)
                .await?;
            Outcome::Page {
                db,
                coll,
                offset,
                total,
                documents,
            }
        }
    };

    Ok(outcome)
}
