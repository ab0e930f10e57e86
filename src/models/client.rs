use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Party that ordered or monitors the client's testing (court, employer, program).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralContact {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub referral: Option<ReferralContact>,
}
