//! Department record

use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::store::TableId;

/// A department that can hold items on permanent loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub name: String,
}

impl Record for Department {
    const TABLE: TableId = TableId::Departments;
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}
