//! S-156 request record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Record, RequestStatus};
use crate::core::identity::{IdPrefix, RecordId};
use crate::core::store::TableId;

/// A department's request for permanent stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RecordId,
    pub item: String,
    pub department: String,
    pub quantity: u32,
    pub status: RequestStatus,

    /// Username that raised the request
    pub requested_by: String,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,

    /// Reason given when the store rejected the request
    #[serde(default)]
    pub remarks: Option<String>,
}

impl Request {
    pub fn new(item: &str, department: &str, quantity: u32, requested_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(IdPrefix::S156),
            item: item.to_string(),
            department: department.to_string(),
            quantity,
            status: RequestStatus::Requested,
            requested_by: requested_by.to_string(),
            created: now,
            updated: now,
            remarks: None,
        }
    }

    /// Whether the request still needs action from someone
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}

impl Record for Request {
    const TABLE: TableId = TableId::Requests;
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id
    }
}
