//! Role-scoped read views
//!
//! Department users see only rows of their own department; Store and Admin
//! see everything. Views never fail beyond returning nothing.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::access::{Role, User};
use crate::core::entity::{RequestStatus, ReturnStatus, SurveyStatus};
use crate::core::store::Snapshot;
use crate::entities::{
    ConsumableIssue, Item, LedgerEntry, PllEntry, Request, ReturnRecord, Survey, WriteOff,
};

/// Department a user is restricted to, `None` for unrestricted roles
fn scope(user: &User) -> Option<&str> {
    match user.role {
        Role::Department => Some(user.department.as_deref().unwrap_or_default()),
        Role::Store | Role::Admin => None,
    }
}

fn in_scope(user: &User, department: &str) -> bool {
    scope(user).map_or(true, |own| own == department)
}

/// Permanent items with stock left, i.e. what a department may request
pub fn available_stock(snap: &Snapshot) -> Vec<Item> {
    snap.items.iter().filter(|i| i.is_requestable()).cloned().collect()
}

/// All items in the item master
pub fn items(snap: &Snapshot) -> Vec<Item> {
    snap.items.rows().to_vec()
}

/// Requests visible to the user, optionally filtered by status
pub fn requests(snap: &Snapshot, user: &User, status: Option<RequestStatus>) -> Vec<Request> {
    snap.requests
        .iter()
        .filter(|r| in_scope(user, &r.department))
        .filter(|r| status.map_or(true, |s| r.status == s))
        .cloned()
        .collect()
}

/// Requests waiting on someone
///
/// A department sees its own requests that are not finished yet; Store and
/// Admin see requests waiting for approval.
pub fn pending_requests(snap: &Snapshot, user: &User) -> Vec<Request> {
    match user.role {
        Role::Department => snap
            .requests
            .iter()
            .filter(|r| in_scope(user, &r.department) && r.is_open())
            .cloned()
            .collect(),
        Role::Store | Role::Admin => requests(snap, user, Some(RequestStatus::Requested)),
    }
}

/// What the user's role is expected to act on next
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum PendingActions {
    Requests(Vec<Request>),
    Surveys(Vec<Survey>),
}

pub fn pending_actions(snap: &Snapshot, user: &User) -> PendingActions {
    match user.role {
        Role::Department | Role::Store => PendingActions::Requests(pending_requests(snap, user)),
        Role::Admin => PendingActions::Surveys(
            snap.surveys
                .iter()
                .filter(|s| s.status == SurveyStatus::Pending)
                .cloned()
                .collect(),
        ),
    }
}

/// PLL holdings visible to the user
pub fn holdings(snap: &Snapshot, user: &User) -> Vec<PllEntry> {
    snap.pll
        .iter()
        .filter(|h| in_scope(user, &h.department))
        .cloned()
        .collect()
}

pub fn ledger_entries(snap: &Snapshot, user: &User) -> Vec<LedgerEntry> {
    snap.ledger
        .iter()
        .filter(|e| in_scope(user, &e.department))
        .cloned()
        .collect()
}

pub fn consumable_summary(snap: &Snapshot, user: &User) -> Vec<ConsumableIssue> {
    snap.consumables
        .iter()
        .filter(|c| in_scope(user, &c.department))
        .cloned()
        .collect()
}

pub fn returns(snap: &Snapshot, user: &User) -> Vec<ReturnRecord> {
    snap.returns
        .iter()
        .filter(|r| in_scope(user, &r.department))
        .cloned()
        .collect()
}

pub fn surveys(snap: &Snapshot, user: &User) -> Vec<Survey> {
    snap.surveys
        .iter()
        .filter(|s| in_scope(user, &s.department))
        .cloned()
        .collect()
}

pub fn write_offs(snap: &Snapshot, user: &User) -> Vec<WriteOff> {
    snap.write_offs
        .iter()
        .filter(|w| in_scope(user, &w.department))
        .cloned()
        .collect()
}

/// Per-role dashboard figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Store {
        total_items: usize,
        available_stock: u64,
        ledger_entries: usize,
        pending_requests: usize,
        pending_returns: usize,
        pending_surveys: usize,
    },
    Department {
        department: String,
        items_on_pll: u64,
        open_requests: usize,
        pending_returns: usize,
        holdings: Vec<PllEntry>,
    },
    Admin {
        departments: usize,
        pending_surveys: usize,
        write_offs: usize,
        /// Total quantity held per department
        pll_by_department: BTreeMap<String, u64>,
    },
}

pub fn dashboard(snap: &Snapshot, user: &User) -> Dashboard {
    let pending_returns = snap
        .returns
        .iter()
        .filter(|r| r.status == ReturnStatus::Pending && in_scope(user, &r.department))
        .count();
    let pending_surveys = snap
        .surveys
        .iter()
        .filter(|s| s.status == SurveyStatus::Pending)
        .count();

    match user.role {
        Role::Store => Dashboard::Store {
            total_items: snap.items.len(),
            available_stock: snap.items.iter().map(|i| u64::from(i.stock)).sum(),
            ledger_entries: snap.ledger.len(),
            pending_requests: snap
                .requests
                .iter()
                .filter(|r| r.status == RequestStatus::Requested)
                .count(),
            pending_returns,
            pending_surveys,
        },
        Role::Department => {
            let holdings = holdings(snap, user);
            Dashboard::Department {
                department: scope(user).unwrap_or_default().to_string(),
                items_on_pll: holdings.iter().map(|h| u64::from(h.quantity_held)).sum(),
                open_requests: pending_requests(snap, user).len(),
                pending_returns,
                holdings,
            }
        }
        Role::Admin => {
            let mut pll_by_department = BTreeMap::new();
            for h in snap.pll.iter() {
                *pll_by_department.entry(h.department.clone()).or_insert(0) +=
                    u64::from(h.quantity_held);
            }
            Dashboard::Admin {
                departments: snap.departments.len(),
                pending_surveys,
                write_offs: snap.write_offs.len(),
                pll_by_department,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::ItemType;
    use crate::core::store::Table;
    use crate::entities::Department;

    fn user(role: Role, dept: Option<&str>) -> User {
        User {
            username: "u".to_string(),
            role,
            department: dept.map(String::from),
        }
    }

    fn snapshot() -> Snapshot {
        let requested = Request::new("Chair", "Physics", 2, "p1");
        let mut received = Request::new("Chair", "Physics", 3, "p1");
        received.status = RequestStatus::Received;
        let chem = Request::new("Table", "Chemistry", 1, "c1");

        Snapshot {
            items: Table::new(vec![
                Item {
                    name: "Chair".to_string(),
                    ledger_name: "Furniture".to_string(),
                    folio_number: "12".to_string(),
                    item_type: ItemType::Permanent,
                    stock: 5,
                },
                Item {
                    name: "Chalk".to_string(),
                    ledger_name: "Stationery".to_string(),
                    folio_number: "3".to_string(),
                    item_type: ItemType::Consumable,
                    stock: 100,
                },
                Item {
                    name: "Table".to_string(),
                    ledger_name: "Furniture".to_string(),
                    folio_number: "13".to_string(),
                    item_type: ItemType::Permanent,
                    stock: 0,
                },
            ]),
            departments: Table::new(vec![
                Department {
                    name: "Physics".to_string(),
                },
                Department {
                    name: "Chemistry".to_string(),
                },
            ]),
            requests: Table::new(vec![requested, received, chem]),
            pll: Table::new(vec![
                PllEntry {
                    department: "Physics".to_string(),
                    item: "Chair".to_string(),
                    quantity_held: 3,
                },
                PllEntry {
                    department: "Chemistry".to_string(),
                    item: "Table".to_string(),
                    quantity_held: 4,
                },
            ]),
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_available_stock_is_permanent_with_stock() {
        let names: Vec<String> = available_stock(&snapshot()).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Chair".to_string()]);
    }

    #[test]
    fn test_department_sees_only_own_rows() {
        let snap = snapshot();
        let physics = user(Role::Department, Some("Physics"));

        assert_eq!(requests(&snap, &physics, None).len(), 2);
        assert_eq!(pending_requests(&snap, &physics).len(), 1);
        let held = holdings(&snap, &physics);
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].item, "Chair");
    }

    #[test]
    fn test_store_sees_requests_awaiting_approval() {
        let snap = snapshot();
        let store = user(Role::Store, None);
        assert_eq!(pending_requests(&snap, &store).len(), 2);
        assert_eq!(holdings(&snap, &store).len(), 2);
    }

    #[test]
    fn test_admin_pending_actions_are_surveys() {
        let snap = snapshot();
        match pending_actions(&snap, &user(Role::Admin, None)) {
            PendingActions::Surveys(rows) => assert!(rows.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dashboards() {
        let snap = snapshot();

        assert_eq!(
            dashboard(&snap, &user(Role::Store, None)),
            Dashboard::Store {
                total_items: 3,
                available_stock: 105,
                ledger_entries: 0,
                pending_requests: 2,
                pending_returns: 0,
                pending_surveys: 0,
            }
        );

        match dashboard(&snap, &user(Role::Department, Some("Physics"))) {
            Dashboard::Department {
                items_on_pll,
                open_requests,
                ..
            } => {
                assert_eq!(items_on_pll, 3);
                assert_eq!(open_requests, 1);
            }
            other => panic!("unexpected {:?}", other),
        }

        match dashboard(&snap, &user(Role::Admin, None)) {
            Dashboard::Admin {
                departments,
                pll_by_department,
                ..
            } => {
                assert_eq!(departments, 2);
                assert_eq!(pll_by_department.get("Chemistry"), Some(&4));
                assert_eq!(pll_by_department.get("Physics"), Some(&3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
