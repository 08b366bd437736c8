use tokio::task::JoinHandle;

use crate::state::engine::TurnEngine;

/// Who is playing the current session.
///
/// Resolved by the caller (sign-in lives outside this service) and carried by
/// the session until the completion writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    /// Signed-in player.
    Authenticated {
        /// Stable user identifier, also the key of the user score document.
        uid: String,
        /// Contact address shown as the username when present.
        email: Option<String>,
    },
    /// Anonymous player; every completion creates a fresh guest document.
    #[default]
    Guest,
}

impl Identity {
    /// Identifier of the signed-in player, `None` for guests.
    pub fn uid(&self) -> Option<&str> {
        match self {
            Identity::Authenticated { uid, .. } => Some(uid),
            Identity::Guest => None,
        }
    }

    /// Username written next to the score.
    pub fn username(&self, guest_name: &str) -> String {
        match self {
            Identity::Authenticated {
                email: Some(email), ..
            } => email.clone(),
            Identity::Authenticated { uid, .. } => uid.clone(),
            Identity::Guest => guest_name.to_string(),
        }
    }
}

/// Game state guarded by the session mutex: the engine, the player and the
/// running timer task.
#[derive(Default)]
pub struct SessionSlot {
    /// Turn engine of the current (or last) session.
    pub engine: TurnEngine,
    /// Player the next completion is credited to.
    pub identity: Identity,
    timer: Option<JoinHandle<()>>,
}

impl SessionSlot {
    /// Install the timer of a new session, aborting the previous one.
    pub fn replace_timer(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.timer.replace(handle) {
            previous.abort();
        }
    }

    /// Abort the running timer, if any.
    pub fn stop_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_prefers_email() {
        let player = Identity::Authenticated {
            uid: "u-1".into(),
            email: Some("ana@example.com".into()),
        };
        assert_eq!(player.username("Guest"), "ana@example.com");
        assert_eq!(player.uid(), Some("u-1"));
    }

    #[test]
    fn username_falls_back_to_uid_then_guest_name() {
        let player = Identity::Authenticated {
            uid: "u-2".into(),
            email: None,
        };
        assert_eq!(player.username("Guest"), "u-2");
        assert_eq!(Identity::Guest.username("Convidado"), "Convidado");
        assert_eq!(Identity::Guest.uid(), None);
    }
}
