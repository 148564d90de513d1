//! Ledger and permanent loan ledger (PLL) records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::entity::Record;
use crate::core::identity::RecordId;
use crate::core::store::TableId;

/// Issue of a fulfilled request, posted once at receipt confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: RecordId,

    /// The S-156 request this entry fulfils
    pub request: RecordId,

    pub item: String,
    pub ledger_name: String,
    pub folio_number: String,
    pub department: String,
    pub quantity: u32,
    pub posted: DateTime<Utc>,
}

impl Record for LedgerEntry {
    const TABLE: TableId = TableId::Ledger;
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id
    }
}

/// Composite key of a PLL row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HoldingKey {
    pub department: String,
    pub item: String,
}

impl HoldingKey {
    pub fn new(department: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            item: item.into(),
        }
    }
}

impl fmt::Display for HoldingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.department, self.item)
    }
}

/// Running balance of one item on loan to one department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PllEntry {
    pub department: String,
    pub item: String,
    pub quantity_held: u32,
}

impl Record for PllEntry {
    const TABLE: TableId = TableId::Pll;
    type Key = HoldingKey;

    fn key(&self) -> HoldingKey {
        HoldingKey::new(&self.department, &self.item)
    }
}
