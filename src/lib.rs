//! DLMS: Digital Ledger Management System
//!
//! Tracks store stock, S-156 requests, the permanent loan ledger, returns,
//! surveys and write-offs as plain-text CSV tables.

pub mod cli;
pub mod core;
pub mod entities;
