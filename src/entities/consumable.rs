//! Consumable issue record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::RecordId;
use crate::core::store::TableId;

/// Usage of a consumable item by a department; append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumableIssue {
    pub id: RecordId,
    pub item: String,
    pub department: String,
    pub quantity: u32,
    pub issued: DateTime<Utc>,
}

impl Record for ConsumableIssue {
    const TABLE: TableId = TableId::Summary;
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id
    }
}
