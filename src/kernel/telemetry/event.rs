use serde::{Deserialize, Serialize};

use crate::kernel::event::{CloseReason, SessionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SessionOpened {
        session: SessionId,
        participants: usize,
    },

    SessionClosed {
        session: SessionId,
        reason: CloseReason,
        duration_ms: u64,
        participants: usize,
    },

    SessionKilled {
        session: SessionId,
        duration_ms: u64,
    },

    /// Timer firings dropped because their session was already reset.
    StaleTimersDiscarded {
        count: usize,
    },
}
