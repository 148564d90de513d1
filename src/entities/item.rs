//! Item master record

use serde::{Deserialize, Serialize};

use crate::core::entity::{ItemType, Record};
use crate::core::store::TableId;

/// A stock line kept by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item name
    pub name: String,

    /// Ledger the item is posted to (copied onto every ledger entry)
    pub ledger_name: String,

    /// Folio number within the ledger
    pub folio_number: String,

    pub item_type: ItemType,

    /// Quantity currently in the store
    pub stock: u32,
}

impl Item {
    /// Permanent items with stock left, i.e. what a department may request
    pub fn is_requestable(&self) -> bool {
        self.item_type == ItemType::Permanent && self.stock > 0
    }
}

impl Record for Item {
    const TABLE: TableId = TableId::Items;
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}
