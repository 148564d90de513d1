//! Record trait - common interface for all table rows, plus shared status types

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::store::TableId;

/// Common trait for every row persisted in the record store
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Table the record lives in
    const TABLE: TableId;

    /// Primary key type
    type Key: PartialEq + fmt::Display;

    /// Primary key of this row
    fn key(&self) -> Self::Key;
}

/// Whether an item is loaned out permanently or consumed on issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Permanent,
    Consumable,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Permanent => write!(f, "Permanent"),
            ItemType::Consumable => write!(f, "Consumable"),
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permanent" => Ok(ItemType::Permanent),
            "consumable" => Ok(ItemType::Consumable),
            _ => Err(format!("unknown item type: {}", s)),
        }
    }
}

/// S-156 request status
///
/// Older tables may carry the names of the four-state chain or the
/// space-separated spelling; these are read as the canonical states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(alias = "Pending", alias = "DeptApproved")]
    Requested,
    #[serde(alias = "Store Approved")]
    StoreApproved,
    #[serde(alias = "Approved")]
    Received,
    Rejected,
}

impl RequestStatus {
    /// No further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Received | RequestStatus::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Requested => write!(f, "Requested"),
            RequestStatus::StoreApproved => write!(f, "StoreApproved"),
            RequestStatus::Received => write!(f, "Received"),
            RequestStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Return status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnStatus::Pending => write!(f, "Pending"),
            ReturnStatus::Accepted => write!(f, "Accepted"),
            ReturnStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Survey status; write-offs are always recorded as Approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyStatus {
    Pending,
    Approved,
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyStatus::Pending => write!(f, "Pending"),
            SurveyStatus::Approved => write!(f, "Approved"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        status: RequestStatus,
    }

    #[test]
    fn test_legacy_request_status_names() {
        let data = "status\nPending\nStore Approved\nApproved\nDeptApproved\nRejected\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let statuses: Vec<RequestStatus> = rdr
            .deserialize::<Row>()
            .map(|r| r.unwrap().status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                RequestStatus::Requested,
                RequestStatus::StoreApproved,
                RequestStatus::Received,
                RequestStatus::Requested,
                RequestStatus::Rejected,
            ]
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RequestStatus::Requested.is_terminal());
        assert!(!RequestStatus::StoreApproved.is_terminal());
        assert!(RequestStatus::Received.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_item_type_parse() {
        assert_eq!("permanent".parse::<ItemType>().unwrap(), ItemType::Permanent);
        assert_eq!("Consumable".parse::<ItemType>().unwrap(), ItemType::Consumable);
        assert!("gadget".parse::<ItemType>().is_err());
    }
}
