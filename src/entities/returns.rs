//! Return record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Record, ReturnStatus};
use crate::core::identity::RecordId;
use crate::core::store::TableId;

/// Items a department hands back from its PLL holding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub id: RecordId,
    pub department: String,
    pub item: String,
    pub quantity: u32,
    pub status: ReturnStatus,
    pub created: DateTime<Utc>,
}

impl Record for ReturnRecord {
    const TABLE: TableId = TableId::Returns;
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id
    }
}
