use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

pub type SessionId = i64;

/// What the next free-text message of a session answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Search,
    Filter,
}

/// Pending prompts, at most one per session.
#[derive(Default)]
pub struct Sessions {
    pending: Mutex<HashMap<SessionId, Prompt>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `prompt` for `session`, replacing any prompt still pending.
    pub async fn arm(&self, session: SessionId, prompt: Prompt) {
        let previous = self.pending.lock().await.insert(session, prompt);
        if let Some(previous) = previous {
            debug!(session, ?previous, ?prompt, "Replacing pending prompt");
        }
    }

    /// Removes and returns the pending prompt. A second call returns `None`.
    pub async fn take(&self, session: SessionId) -> Option<Prompt> {
        self.pending.lock().await.remove(&session)
    }

    pub async fn pending(&self, session: SessionId) -> Option<Prompt> {
        self.pending.lock().await.get(&session).copied()
    }
}
