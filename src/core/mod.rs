//! Core module - record store, access rules, and the lifecycle engine

pub mod access;
pub mod config;
pub mod entity;
pub mod identity;
pub mod store;
pub mod views;
pub mod workflow;

pub use access::{resolve_user, Operation, Role, User};
pub use config::{Config, ConfigError};
pub use entity::{ItemType, Record, RequestStatus, ReturnStatus, SurveyStatus};
pub use identity::{IdParseError, IdPrefix, RecordId};
pub use store::{CsvStore, MemoryStore, RecordStore, Snapshot, StoreError, Table, TableId};
pub use workflow::{
    ErrorKind, LedgerEngine, LedgerError, NewItem, NewSurvey, Posting, ReturnOutcome,
    WorkflowConfig, WriteOffPosting,
};
