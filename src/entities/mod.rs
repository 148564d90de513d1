//! Record type definitions

pub mod consumable;
pub mod department;
pub mod item;
pub mod ledger;
pub mod request;
pub mod returns;
pub mod survey;

pub use consumable::ConsumableIssue;
pub use department::Department;
pub use item::Item;
pub use ledger::{HoldingKey, LedgerEntry, PllEntry};
pub use request::Request;
pub use returns::ReturnRecord;
pub use survey::{Survey, WriteOff};
