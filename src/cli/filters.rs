//! Filter enums for list commands

use clap::ValueEnum;

use crate::core::{RequestStatus, ReturnStatus};

/// Status filter for `request list`
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum RequestStatusFilter {
    /// Waiting for store approval
    Requested,
    /// Approved, waiting for the department to confirm receipt
    StoreApproved,
    /// Received and posted to the ledger
    Received,
    /// Rejected by the store
    Rejected,
    /// Requested or StoreApproved
    Open,
    /// Every status - default
    #[default]
    All,
}

impl RequestStatusFilter {
    pub fn matches(&self, status: RequestStatus) -> bool {
        match self {
            RequestStatusFilter::Requested => status == RequestStatus::Requested,
            RequestStatusFilter::StoreApproved => status == RequestStatus::StoreApproved,
            RequestStatusFilter::Received => status == RequestStatus::Received,
            RequestStatusFilter::Rejected => status == RequestStatus::Rejected,
            RequestStatusFilter::Open => !status.is_terminal(),
            RequestStatusFilter::All => true,
        }
    }
}

/// Status filter for `return list`
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ReturnStatusFilter {
    Pending,
    Accepted,
    Rejected,
    #[default]
    All,
}

impl ReturnStatusFilter {
    pub fn matches(&self, status: ReturnStatus) -> bool {
        match self {
            ReturnStatusFilter::Pending => status == ReturnStatus::Pending,
            ReturnStatusFilter::Accepted => status == ReturnStatus::Accepted,
            ReturnStatusFilter::Rejected => status == ReturnStatus::Rejected,
            ReturnStatusFilter::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_filter_matches() {
        assert!(RequestStatusFilter::All.matches(RequestStatus::Rejected));
        assert!(RequestStatusFilter::Open.matches(RequestStatus::StoreApproved));
        assert!(!RequestStatusFilter::Open.matches(RequestStatus::Received));
        assert!(RequestStatusFilter::Requested.matches(RequestStatus::Requested));
        assert!(!RequestStatusFilter::Requested.matches(RequestStatus::StoreApproved));
    }

    #[test]
    fn test_request_filter_value_names() {
        let filter = RequestStatusFilter::from_str("store-approved", true).unwrap();
        assert_eq!(filter, RequestStatusFilter::StoreApproved);
    }

    #[test]
    fn test_return_filter_matches() {
        assert!(ReturnStatusFilter::Pending.matches(ReturnStatus::Pending));
        assert!(!ReturnStatusFilter::Pending.matches(ReturnStatus::Accepted));
        assert!(ReturnStatusFilter::All.matches(ReturnStatus::Rejected));
    }
}
