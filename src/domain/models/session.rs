//! Agent session handles.

use std::time::Duration;

use tokio::time::Instant;

/// Agent API session that may be reused for a while after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Identifier returned by the agent API
    pub session_id: String,
    /// When the session was created
    pub created_at: Instant,
}

impl SessionHandle {
    /// Handle created now
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at: Instant::now(),
        }
    }

    /// True while `now - created_at < reuse_window`
    pub fn is_reusable(&self, reuse_window: Duration) -> bool {
        self.created_at.elapsed() < reuse_window
    }
}
