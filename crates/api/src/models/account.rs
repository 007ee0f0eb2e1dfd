//! Account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use buyit_core::{AccountId, Email};

/// An account in the directory.
///
/// The credential secret is deliberately not part of this struct: it lives
/// only inside the storage layer and never crosses into handlers or
/// responses.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Account id.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
