//! CLI command implementations

pub mod consumable;
pub mod dept;
pub mod init;
pub mod item;
pub mod request;
pub mod ret;
pub mod survey;
pub mod user;
pub mod view;
