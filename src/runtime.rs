//! Console runtime
//!
//! Resolves the operator's session, feeds each inbound event through the
//! pure `transition` function, executes the resulting effects against the
//! session's own cluster handle, and shapes the replies for the transport.

mod executor;
mod sweeper;

#[cfg(test)]
pub mod testing;

pub use sweeper::{spawn_sweeper, sweep};

use crate::error::ConsoleError;
use crate::gateway::Connector;
use crate::menu::{Menu, NavToken};
use crate::paginate::shape;
use crate::session::{Session, SessionRepository, UserId};
use crate::state_machine::{transition, ConvContext, Event, Reply, TransitionError};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;

pub const NO_SESSION: &str = "Please use the /start command to begin.";
pub const BUSY: &str = "Still working on your previous request. Please wait for it to finish.";
pub const STOPPED: &str = "Session ended and connection closed. Use /start to begin again.";

/// Events the transport delivers, already keyed by user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// New-session trigger
    Start,
    /// End the session and release its connection
    Stop,
    Cancel,
    Text(String),
    /// Raw navigation token echoed back from a menu selection
    Button(String),
}

/// One transport-sized message
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub text: String,
    pub menu: Option<Menu>,
}

fn notice(text: impl Into<String>) -> Reply {
    Reply {
        text: text.into(),
        menu: None,
    }
}

/// Transport-agnostic console shared by every operator
pub struct Console {
    sessions: Arc<dyn SessionRepository>,
    connector: Arc<dyn Connector>,
    context: ConvContext,
    max_message_len: usize,
}

impl Console {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        connector: Arc<dyn Connector>,
        context: ConvContext,
        max_message_len: usize,
    ) -> Self {
        Self {
            sessions,
            connector,
            context,
            max_message_len,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionRepository> {
        &self.sessions
    }

    /// Handle one inbound event and return the messages to send, in order
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn handle(&self, user_id: UserId, inbound: Inbound) -> Vec<Outbound> {
        let replies = match inbound {
            Inbound::Start => self.start(user_id).await,
            Inbound::Stop => self.stop(user_id).await,
            Inbound::Cancel => self.dispatch(user_id, Ok(Event::Cancel)).await,
            Inbound::Text(text) => self.dispatch(user_id, Ok(Event::Text { text })).await,
            Inbound::Button(raw) => {
                let event = NavToken::decode(&raw)
                    .map(|token| Event::Navigate { token })
                    .map_err(|e| ConsoleError::protocol(e.to_string()));
                self.dispatch(user_id, event).await
            }
        };

        replies
            .into_iter()
            .flat_map(|reply| shape(&reply.text, reply.menu, self.max_message_len))
            .collect()
    }

    /// Create the session, or replace an existing one and release its handle
    async fn start(&self, user_id: UserId) -> Vec<Reply> {
        let handle = self.sessions.get_or_create(user_id).await;
        let Ok(mut session) = handle.try_lock() else {
            return vec![notice(BUSY)];
        };
        session.release().await;
        session.touch(Utc::now());
        self.drive(&mut session, Event::Start).await
    }

    async fn stop(&self, user_id: UserId) -> Vec<Reply> {
        let Some(handle) = self.sessions.remove(user_id).await else {
            return vec![notice(NO_SESSION)];
        };
        // Waits for any in-flight operation before closing the handle
        handle.lock().await.release().await;
        tracing::info!("Session ended by operator");
        vec![notice(STOPPED)]
    }

    async fn dispatch(&self, user_id: UserId, event: Result<Event, ConsoleError>) -> Vec<Reply> {
        let Some(handle) = self.sessions.get(user_id).await else {
            return vec![notice(NO_SESSION)];
        };
        // Single flight per user: a second event while one is running is refused
        let Ok(mut session) = handle.try_lock() else {
            tracing::debug!("Rejecting event while another is in flight");
            return vec![notice(BUSY)];
        };
        session.touch(Utc::now());

        match event {
            Ok(event) => self.drive(&mut session, event).await,
            Err(error) => {
                tracing::warn!(error = %error, "Rejected navigation token");
                vec![notice(error.user_message())]
            }
        }
    }

    /// Run an event and every event its effects feed back
    async fn drive(&self, session: &mut Session, event: Event) -> Vec<Reply> {
        let mut replies = Vec::new();
        let mut events = VecDeque::from([event]);

        while let Some(event) = events.pop_front() {
            let kind = event.kind();
            let from = session.conversation.state;
            let result = match transition(&session.conversation, &self.context, event) {
                Ok(result) => result,
                Err(e @ TransitionError::NotConnected) => {
                    tracing::info!(state = %from, event = kind, "Event before connecting");
                    replies.push(notice(e.to_string()));
                    continue;
                }
                Err(e) => {
                    tracing::warn!(state = %from, event = kind, error = %e, "Event rejected");
                    replies.push(notice(e.to_string()));
                    continue;
                }
            };

            if result.next.state != from {
                tracing::debug!(from = %from, to = %result.next.state, event = kind, "State transition");
            }
            session.conversation = result.next;

            for effect in result.effects {
                match self.execute_effect(session, effect).await {
                    executor::Step::Reply(reply) => replies.push(reply),
                    executor::Step::Feedback(event) => events.push_back(event),
                }
            }
        }

        replies
    }
}
