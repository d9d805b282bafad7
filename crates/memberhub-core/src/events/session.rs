//! Session-related domain events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to the current authentication session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A session was established after sign-in.
    Established {
        /// The authenticated identity.
        identity_id: Uuid,
    },
    /// The session credential was refreshed for the same identity.
    Refreshed {
        /// The authenticated identity.
        identity_id: Uuid,
    },
    /// The session was torn down.
    Destroyed {
        /// The identity the session belonged to, if one was held.
        identity_id: Option<Uuid>,
        /// Why the session ended.
        reason: String,
    },
}
