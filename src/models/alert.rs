use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RecipientKind;

/// A result notification that could not be delivered, queued for admin follow-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAlert {
    pub id: Uuid,
    pub drug_test_id: Uuid,
    pub recipient_kind: RecipientKind,
    pub recipient: String,
    pub error: String,
    pub created_at: NaiveDateTime,
    pub resolved: bool,
}
