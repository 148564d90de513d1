//! Workflow engine for the item lifecycle
//!
//! Owns the S-156 request state machine (Requested → StoreApproved →
//! Received, or Requested → Rejected), the posting of fulfilled requests to the
//! ledger and permanent loan ledger, and the return, survey and write-off
//! workflows. Every operation runs as one transaction against the record
//! store: all validation happens before the snapshot is touched, and nothing is
//! persisted when an operation fails.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::access::{resolve_user, Operation, Role, User};
use crate::core::entity::{ItemType, Record, RequestStatus, ReturnStatus, SurveyStatus};
use crate::core::identity::{IdPrefix, RecordId};
use crate::core::store::{self, RecordStore, Snapshot, StoreError, Table};
use crate::entities::{
    ConsumableIssue, Department, HoldingKey, Item, LedgerEntry, PllEntry, Request, ReturnRecord,
    Survey, WriteOff,
};

/// Workflow switches from the `workflow` config section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Allow the store to accept or reject pending returns
    pub complete_returns: bool,

    /// Let an Admin approve or reject requests in place of the Store
    pub allow_admin_approval: bool,
}

/// Stable classification of [`LedgerError`] for callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownUser,
    Unauthorized,
    InvalidQuantity,
    InsufficientStock,
    NoSuchHolding,
    StaleState,
    NotFound,
    AmbiguousId,
    AlreadyExists,
    WrongItemType,
    InvalidInput,
    NotEnabled,
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownUser => "unknown_user",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidQuantity => "invalid_quantity",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::NoSuchHolding => "no_such_holding",
            ErrorKind::StaleState => "stale_state",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AmbiguousId => "ambiguous_id",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::WrongItemType => "wrong_item_type",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotEnabled => "not_enabled",
            ErrorKind::Store => "store",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during workflow operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    #[error("Not authorized to {operation}: {reason}")]
    Unauthorized { operation: String, reason: String },

    #[error("Invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: u32, reason: String },

    #[error("Insufficient stock of {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: u32,
        available: u32,
    },

    #[error("{department} holds no {item} on the permanent loan ledger")]
    NoSuchHolding { department: String, item: String },

    #[error("{record} {id} is {current}; cannot {action}")]
    StaleState {
        record: &'static str,
        id: String,
        current: String,
        action: String,
    },

    #[error("{what} '{key}' not found")]
    NotFound { what: &'static str, key: String },

    #[error("'{partial}' matches {count} {what} records; use more of the id")]
    AmbiguousId {
        what: &'static str,
        partial: String,
        count: usize,
    },

    #[error("{what} '{key}' already exists")]
    AlreadyExists { what: &'static str, key: String },

    #[error("{item} is a {actual} item; cannot {operation}")]
    WrongItemType {
        item: String,
        actual: ItemType,
        operation: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{feature} is not enabled. Add 'workflow.{key}: true' to dlms.yaml")]
    NotEnabled {
        feature: &'static str,
        key: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::UnknownUser(_) => ErrorKind::UnknownUser,
            LedgerError::Unauthorized { .. } => ErrorKind::Unauthorized,
            LedgerError::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
            LedgerError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            LedgerError::NoSuchHolding { .. } => ErrorKind::NoSuchHolding,
            LedgerError::StaleState { .. } => ErrorKind::StaleState,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::AmbiguousId { .. } => ErrorKind::AmbiguousId,
            LedgerError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            LedgerError::WrongItemType { .. } => ErrorKind::WrongItemType,
            LedgerError::InvalidInput(_) => ErrorKind::InvalidInput,
            LedgerError::NotEnabled { .. } => ErrorKind::NotEnabled,
            LedgerError::Store(_) => ErrorKind::Store,
        }
    }
}

/// Check if a request status transition is valid
pub fn is_valid_transition(from: RequestStatus, to: RequestStatus) -> bool {
    matches!(
        (from, to),
        (RequestStatus::Requested, RequestStatus::StoreApproved)
            | (RequestStatus::Requested, RequestStatus::Rejected)
            | (RequestStatus::StoreApproved, RequestStatus::Received)
    )
}

/// Get allowed transitions from the current status
pub fn allowed_transitions(current: RequestStatus) -> Vec<RequestStatus> {
    match current {
        RequestStatus::Requested => vec![RequestStatus::StoreApproved, RequestStatus::Rejected],
        RequestStatus::StoreApproved => vec![RequestStatus::Received],
        RequestStatus::Received | RequestStatus::Rejected => vec![],
    }
}

/// Input for [`LedgerEngine::add_item`]
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub ledger_name: String,
    pub folio_number: String,
    pub item_type: ItemType,
    pub stock: u32,
}

/// Input for [`LedgerEngine::initiate_survey`]
#[derive(Debug, Clone)]
pub struct NewSurvey {
    pub item: String,
    pub department: String,
    pub quantity: u32,
    pub survey_ref: String,
}

/// Everything written when a request is fulfilled
#[derive(Debug, Clone, Serialize)]
pub struct Posting {
    pub request: Request,
    pub ledger_entry: LedgerEntry,
    pub holding: PllEntry,
}

/// Everything written when a survey is approved
#[derive(Debug, Clone, Serialize)]
pub struct WriteOffPosting {
    pub survey: Survey,
    pub write_off: WriteOff,
    pub holding: PllEntry,
}

/// Outcome of completing a return
#[derive(Debug, Clone, Serialize)]
pub struct ReturnOutcome {
    pub ret: ReturnRecord,
    /// Holding after an accepted return; `None` when rejected
    pub holding: Option<PllEntry>,
    /// Item after restocking; `None` when rejected
    pub item: Option<Item>,
}

/// Workflow engine over a record store
pub struct LedgerEngine<S: RecordStore> {
    store: S,
    config: WorkflowConfig,
}

impl<S: RecordStore> LedgerEngine<S> {
    /// Create a new workflow engine
    pub fn new(store: S, config: WorkflowConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the workflow configuration
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run `op` for `actor` as one transaction, after the role check
    fn execute<R, F>(&self, operation: Operation, actor: &str, op: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut Snapshot, &User) -> Result<R, LedgerError>,
    {
        let result = store::transact(&self.store, |snap| {
            let user = authorize(&snap.users, actor, operation, self.config.allow_admin_approval)?;
            op(snap, &user)
        });
        if let Err(e) = &result {
            warn!(%operation, actor, kind = %e.kind(), "operation rejected: {}", e);
        }
        result
    }

    /// Run a read-only view for `actor`
    pub fn view<R, F>(&self, actor: &str, view: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&Snapshot, &User) -> R,
    {
        store::read(&self.store, |snap| {
            resolve_user(&snap.users, actor)
                .map(|user| view(snap, user))
                .ok_or_else(|| LedgerError::UnknownUser(actor.to_string()))
        })?
    }

    /// Resolve a username to its user record
    pub fn whoami(&self, username: &str) -> Result<User, LedgerError> {
        self.view(username, |_, user| user.clone())
    }

    // ------------------------------------------------------------------
    // Master data
    // ------------------------------------------------------------------

    /// Register a user
    ///
    /// While the users table is empty anyone may add the first user, so a
    /// fresh store can be bootstrapped; afterwards only Admins may.
    pub fn add_user(&self, actor: Option<&str>, new_user: User) -> Result<User, LedgerError> {
        let result = store::transact(&self.store, |snap| {
            if !snap.users.is_empty() {
                let actor = actor.ok_or_else(|| LedgerError::Unauthorized {
                    operation: Operation::AddUser.to_string(),
                    reason: "no operator given".to_string(),
                })?;
                authorize(&snap.users, actor, Operation::AddUser, false)?;
            }

            let username = new_user.username.trim().to_string();
            if username.is_empty() {
                return Err(LedgerError::InvalidInput("username is empty".to_string()));
            }
            if snap.users.contains(&username) {
                return Err(LedgerError::AlreadyExists {
                    what: "user",
                    key: username,
                });
            }

            let department = match (new_user.role, new_user.department) {
                (Role::Department, Some(dept)) => {
                    require_department(&snap.departments, &dept)?;
                    Some(dept)
                }
                (Role::Department, None) => {
                    return Err(LedgerError::InvalidInput(
                        "department users need a department".to_string(),
                    ))
                }
                (_, Some(_)) => {
                    return Err(LedgerError::InvalidInput(
                        "only department users belong to a department".to_string(),
                    ))
                }
                (_, None) => None,
            };

            let user = User {
                username,
                role: new_user.role,
                department,
            };
            snap.users.append(user.clone());
            Ok(user)
        });

        match &result {
            Ok(user) => info!(username = %user.username, role = %user.role, "user added"),
            Err(e) => warn!(kind = %e.kind(), "add user rejected: {}", e),
        }
        result
    }

    pub fn add_department(&self, actor: &str, name: &str) -> Result<Department, LedgerError> {
        self.execute(Operation::AddDepartment, actor, |snap, _| {
            let name = require_name(name, "department name")?;
            if snap.departments.contains(&name) {
                return Err(LedgerError::AlreadyExists {
                    what: "department",
                    key: name,
                });
            }
            let dept = Department { name };
            snap.departments.append(dept.clone());
            info!(department = %dept.name, actor, "department added");
            Ok(dept)
        })
    }

    pub fn add_item(&self, actor: &str, new_item: NewItem) -> Result<Item, LedgerError> {
        self.execute(Operation::AddItem, actor, |snap, _| {
            let name = require_name(&new_item.name, "item name")?;
            if snap.items.contains(&name) {
                return Err(LedgerError::AlreadyExists {
                    what: "item",
                    key: name,
                });
            }
            let item = Item {
                name,
                ledger_name: new_item.ledger_name.trim().to_string(),
                folio_number: new_item.folio_number.trim().to_string(),
                item_type: new_item.item_type,
                stock: new_item.stock,
            };
            snap.items.append(item.clone());
            info!(item = %item.name, stock = item.stock, actor, "item added");
            Ok(item)
        })
    }

    /// Take delivered goods into store stock
    pub fn receive_stock(&self, actor: &str, item: &str, quantity: u32) -> Result<Item, LedgerError> {
        self.execute(Operation::ReceiveStock, actor, |snap, _| {
            require_positive(quantity)?;
            let current = require_item(&snap.items, item)?.clone();
            let stock = current
                .stock
                .checked_add(quantity)
                .ok_or_else(|| overflow(quantity))?;
            let key = current.key();
            snap.items.update(&key, |i| i.stock = stock);
            info!(item, quantity, stock, actor, "stock received");
            Ok(Item { stock, ..current })
        })
    }

    // ------------------------------------------------------------------
    // S-156 request lifecycle
    // ------------------------------------------------------------------

    /// Department raises an S-156 request against available stock
    pub fn raise_request(
        &self,
        actor: &str,
        item: &str,
        quantity: u32,
    ) -> Result<Request, LedgerError> {
        self.execute(Operation::RaiseRequest, actor, |snap, user| {
            let department = user_department(user, Operation::RaiseRequest)?;
            require_department(&snap.departments, department)?;
            require_positive(quantity)?;

            let stock_item = require_item(&snap.items, item)?;
            if stock_item.item_type != ItemType::Permanent {
                return Err(LedgerError::WrongItemType {
                    item: stock_item.name.clone(),
                    actual: stock_item.item_type,
                    operation: Operation::RaiseRequest.to_string(),
                });
            }
            if quantity > stock_item.stock {
                return Err(LedgerError::InvalidQuantity {
                    quantity,
                    reason: format!("only {} {} in stock", stock_item.stock, stock_item.name),
                });
            }

            let request = Request::new(&stock_item.name, department, quantity, &user.username);
            snap.requests.append(request.clone());
            info!(id = %request.id, item, quantity, department, "S-156 request raised");
            Ok(request)
        })
    }

    /// Store approves a request and issues the stock
    ///
    /// Stock is re-checked here because other approvals may have consumed it
    /// since the request was raised.
    pub fn approve_request(&self, actor: &str, id: &str) -> Result<Request, LedgerError> {
        self.execute(Operation::ApproveRequest, actor, |snap, user| {
            let id = resolve_id(&snap.requests, id, "request")?;
            let request = require_row(&snap.requests, &id, "request")?.clone();
            check_transition(&request, RequestStatus::StoreApproved, "approve")?;

            let stock_item = require_item(&snap.items, &request.item)?;
            if stock_item.stock < request.quantity {
                return Err(LedgerError::InsufficientStock {
                    item: request.item.clone(),
                    requested: request.quantity,
                    available: stock_item.stock,
                });
            }
            let remaining = stock_item.stock - request.quantity;

            snap.items.update(&request.item, |i| i.stock = remaining);
            let approved = transition(
                &mut snap.requests,
                &request,
                RequestStatus::StoreApproved,
                None,
            );
            info!(
                %id,
                item = %request.item,
                quantity = request.quantity,
                stock = remaining,
                approver = %user.username,
                "request approved"
            );
            Ok(approved)
        })
    }

    /// Store turns down a request; stock is untouched
    pub fn reject_request(
        &self,
        actor: &str,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Request, LedgerError> {
        self.execute(Operation::RejectRequest, actor, |snap, user| {
            let id = resolve_id(&snap.requests, id, "request")?;
            let request = require_row(&snap.requests, &id, "request")?.clone();
            check_transition(&request, RequestStatus::Rejected, "reject")?;

            let rejected = transition(
                &mut snap.requests,
                &request,
                RequestStatus::Rejected,
                reason.map(str::to_string),
            );
            info!(%id, rejector = %user.username, "request rejected");
            Ok(rejected)
        })
    }

    /// Requesting department confirms it received the issued stock
    pub fn confirm_receipt(&self, actor: &str, id: &str) -> Result<Posting, LedgerError> {
        self.execute(Operation::ConfirmReceipt, actor, |snap, user| {
            let id = resolve_id(&snap.requests, id, "request")?;
            let request = require_row(&snap.requests, &id, "request")?.clone();
            if !user.belongs_to(&request.department) {
                return Err(LedgerError::Unauthorized {
                    operation: Operation::ConfirmReceipt.to_string(),
                    reason: format!("request {} belongs to {}", id, request.department),
                });
            }
            check_transition(&request, RequestStatus::Received, "confirm receipt")?;

            let posting = post_fulfillment(snap, &request)?;
            info!(
                %id,
                ledger = %posting.ledger_entry.id,
                department = %posting.holding.department,
                held = posting.holding.quantity_held,
                "receipt confirmed and posted"
            );
            Ok(posting)
        })
    }

    // ------------------------------------------------------------------
    // Returns
    // ------------------------------------------------------------------

    /// Department hands back part of its PLL holding
    pub fn submit_return(
        &self,
        actor: &str,
        item: &str,
        quantity: u32,
    ) -> Result<ReturnRecord, LedgerError> {
        self.execute(Operation::SubmitReturn, actor, |snap, user| {
            let department = user_department(user, Operation::SubmitReturn)?;
            require_positive(quantity)?;
            let holding = require_holding(&snap.pll, department, item)?;
            if quantity > holding.quantity_held {
                return Err(LedgerError::InvalidQuantity {
                    quantity,
                    reason: format!("{} holds only {} {}", department, holding.quantity_held, item),
                });
            }

            let ret = ReturnRecord {
                id: RecordId::new(IdPrefix::Ret),
                department: department.to_string(),
                item: item.to_string(),
                quantity,
                status: ReturnStatus::Pending,
                created: Utc::now(),
            };
            snap.returns.append(ret.clone());
            info!(id = %ret.id, item, quantity, department, "return submitted");
            Ok(ret)
        })
    }

    /// Store accepts a pending return: PLL is reduced and the stock restored
    pub fn accept_return(&self, actor: &str, id: &str) -> Result<ReturnOutcome, LedgerError> {
        self.require_return_completion()?;
        self.execute(Operation::CompleteReturn, actor, |snap, user| {
            let ret = pending_return(&snap.returns, id, "accept")?;
            let holding = require_holding(&snap.pll, &ret.department, &ret.item)?;
            if ret.quantity > holding.quantity_held {
                return Err(LedgerError::InvalidQuantity {
                    quantity: ret.quantity,
                    reason: format!(
                        "{} now holds only {} {}",
                        ret.department, holding.quantity_held, ret.item
                    ),
                });
            }
            let stock_item = require_item(&snap.items, &ret.item)?;
            let stock = stock_item
                .stock
                .checked_add(ret.quantity)
                .ok_or_else(|| overflow(ret.quantity))?;

            let held = holding.quantity_held - ret.quantity;
            let holding = PllEntry {
                quantity_held: held,
                ..holding.clone()
            };
            let item = Item {
                stock,
                ..stock_item.clone()
            };

            snap.pll.update(&holding.key(), |h| h.quantity_held = held);
            snap.items.update(&item.key(), |i| i.stock = stock);
            let ret = set_return_status(&mut snap.returns, ret, ReturnStatus::Accepted);
            info!(id = %ret.id, held, stock, actor = %user.username, "return accepted");
            Ok(ReturnOutcome {
                ret,
                holding: Some(holding),
                item: Some(item),
            })
        })
    }

    /// Store refuses a pending return; nothing else changes
    pub fn reject_return(&self, actor: &str, id: &str) -> Result<ReturnOutcome, LedgerError> {
        self.require_return_completion()?;
        self.execute(Operation::CompleteReturn, actor, |snap, user| {
            let ret = pending_return(&snap.returns, id, "reject")?;
            let ret = set_return_status(&mut snap.returns, ret, ReturnStatus::Rejected);
            info!(id = %ret.id, actor = %user.username, "return rejected");
            Ok(ReturnOutcome {
                ret,
                holding: None,
                item: None,
            })
        })
    }

    fn require_return_completion(&self) -> Result<(), LedgerError> {
        if self.config.complete_returns {
            Ok(())
        } else {
            Err(LedgerError::NotEnabled {
                feature: "Return completion",
                key: "complete_returns",
            })
        }
    }

    // ------------------------------------------------------------------
    // Surveys and write-offs
    // ------------------------------------------------------------------

    /// Store flags loaned items as unserviceable or lost
    pub fn initiate_survey(&self, actor: &str, new_survey: NewSurvey) -> Result<Survey, LedgerError> {
        self.execute(Operation::InitiateSurvey, actor, |snap, _| {
            require_positive(new_survey.quantity)?;
            let survey_ref = require_name(&new_survey.survey_ref, "survey reference")?;
            let item = require_item(&snap.items, &new_survey.item)?.name.clone();
            require_department(&snap.departments, &new_survey.department)?;

            let survey = Survey {
                id: RecordId::new(IdPrefix::Sur),
                item,
                department: new_survey.department.clone(),
                quantity: new_survey.quantity,
                survey_ref,
                status: SurveyStatus::Pending,
                created: Utc::now(),
            };
            snap.surveys.append(survey.clone());
            info!(
                id = %survey.id,
                item = %survey.item,
                department = %survey.department,
                quantity = survey.quantity,
                actor,
                "survey initiated"
            );
            Ok(survey)
        })
    }

    /// Admin approves a pending survey and writes the quantity off the PLL
    ///
    /// Fails closed: without a matching holding large enough to cover the
    /// survey, nothing is written and the survey stays Pending.
    pub fn approve_write_off(&self, actor: &str, id: &str) -> Result<WriteOffPosting, LedgerError> {
        self.execute(Operation::ApproveWriteOff, actor, |snap, user| {
            let id = resolve_id(&snap.surveys, id, "survey")?;
            let survey = require_row(&snap.surveys, &id, "survey")?.clone();
            if survey.status != SurveyStatus::Pending {
                return Err(LedgerError::StaleState {
                    record: "survey",
                    id: id.to_string(),
                    current: survey.status.to_string(),
                    action: "approve write-off".to_string(),
                });
            }

            let holding = require_holding(&snap.pll, &survey.department, &survey.item)?;
            if survey.quantity > holding.quantity_held {
                return Err(LedgerError::InvalidQuantity {
                    quantity: survey.quantity,
                    reason: format!(
                        "{} holds only {} {}",
                        survey.department, holding.quantity_held, survey.item
                    ),
                });
            }
            let held = holding.quantity_held - survey.quantity;
            let holding = PllEntry {
                quantity_held: held,
                ..holding.clone()
            };

            snap.surveys.update(&id, |s| s.status = SurveyStatus::Approved);
            let write_off = WriteOff::from_survey(&survey, &user.username);
            snap.write_offs.append(write_off.clone());
            snap.pll.update(&holding.key(), |h| h.quantity_held = held);

            info!(
                survey = %id,
                write_off = %write_off.id,
                department = %survey.department,
                item = %survey.item,
                held,
                "write-off approved"
            );
            Ok(WriteOffPosting {
                survey: Survey {
                    status: SurveyStatus::Approved,
                    ..survey
                },
                write_off,
                holding,
            })
        })
    }

    // ------------------------------------------------------------------
    // Consumables
    // ------------------------------------------------------------------

    /// Store issues consumable stock directly to a department
    pub fn issue_consumable(
        &self,
        actor: &str,
        item: &str,
        department: &str,
        quantity: u32,
    ) -> Result<ConsumableIssue, LedgerError> {
        self.execute(Operation::IssueConsumable, actor, |snap, _| {
            require_positive(quantity)?;
            let stock_item = require_item(&snap.items, item)?;
            if stock_item.item_type != ItemType::Consumable {
                return Err(LedgerError::WrongItemType {
                    item: stock_item.name.clone(),
                    actual: stock_item.item_type,
                    operation: Operation::IssueConsumable.to_string(),
                });
            }
            require_department(&snap.departments, department)?;
            if stock_item.stock < quantity {
                return Err(LedgerError::InsufficientStock {
                    item: item.to_string(),
                    requested: quantity,
                    available: stock_item.stock,
                });
            }
            let remaining = stock_item.stock - quantity;

            snap.items.update(&item.to_string(), |i| i.stock = remaining);
            let issue = ConsumableIssue {
                id: RecordId::new(IdPrefix::Con),
                item: item.to_string(),
                department: department.to_string(),
                quantity,
                issued: Utc::now(),
            };
            snap.consumables.append(issue.clone());
            info!(id = %issue.id, item, department, quantity, stock = remaining, actor, "consumable issued");
            Ok(issue)
        })
    }
}

/// Post a request that passed receipt validation
///
/// Appends the ledger entry, credits the department's PLL row (creating it on
/// first issue) and marks the request Received. Every check happens before the
/// first write, so the three changes land together or not at all.
fn post_fulfillment(snap: &mut Snapshot, request: &Request) -> Result<Posting, LedgerError> {
    let stock_item = require_item(&snap.items, &request.item)?;
    let key = HoldingKey::new(&request.department, &request.item);
    let held = match snap.pll.find(&key) {
        Some(h) => h
            .quantity_held
            .checked_add(request.quantity)
            .ok_or_else(|| overflow(request.quantity))?,
        None => request.quantity,
    };

    let ledger_entry = LedgerEntry {
        id: RecordId::new(IdPrefix::Led),
        request: request.id,
        item: stock_item.name.clone(),
        ledger_name: stock_item.ledger_name.clone(),
        folio_number: stock_item.folio_number.clone(),
        department: request.department.clone(),
        quantity: request.quantity,
        posted: Utc::now(),
    };
    let holding = PllEntry {
        department: request.department.clone(),
        item: request.item.clone(),
        quantity_held: held,
    };

    snap.ledger.append(ledger_entry.clone());
    if !snap.pll.update(&key, |h| h.quantity_held = held) {
        snap.pll.append(holding.clone());
    }
    let request = transition(&mut snap.requests, request, RequestStatus::Received, None);

    Ok(Posting {
        request,
        ledger_entry,
        holding,
    })
}

fn authorize(
    users: &Table<User>,
    actor: &str,
    operation: Operation,
    admin_may_approve: bool,
) -> Result<User, LedgerError> {
    let user = resolve_user(users, actor).ok_or_else(|| LedgerError::UnknownUser(actor.to_string()))?;
    if !user.can(operation, admin_may_approve) {
        let roles = operation
            .allowed_roles(admin_may_approve)
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        return Err(LedgerError::Unauthorized {
            operation: operation.to_string(),
            reason: format!("requires role {} (you are {})", roles, user.role),
        });
    }
    Ok(user.clone())
}

fn user_department(user: &User, operation: Operation) -> Result<&str, LedgerError> {
    user.department
        .as_deref()
        .ok_or_else(|| LedgerError::Unauthorized {
            operation: operation.to_string(),
            reason: format!("{} has no department", user.username),
        })
}

fn check_transition(request: &Request, to: RequestStatus, action: &str) -> Result<(), LedgerError> {
    if is_valid_transition(request.status, to) {
        Ok(())
    } else {
        Err(LedgerError::StaleState {
            record: "request",
            id: request.id.to_string(),
            current: request.status.to_string(),
            action: action.to_string(),
        })
    }
}

fn transition(
    requests: &mut Table<Request>,
    request: &Request,
    to: RequestStatus,
    remarks: Option<String>,
) -> Request {
    let now = Utc::now();
    requests.update(&request.id, |r| {
        r.status = to;
        r.updated = now;
        if remarks.is_some() {
            r.remarks = remarks.clone();
        }
    });
    Request {
        status: to,
        updated: now,
        remarks: remarks.or_else(|| request.remarks.clone()),
        ..request.clone()
    }
}

fn pending_return(
    returns: &Table<ReturnRecord>,
    id: &str,
    action: &str,
) -> Result<ReturnRecord, LedgerError> {
    let id = resolve_id(returns, id, "return")?;
    let ret = require_row(returns, &id, "return")?;
    if ret.status != ReturnStatus::Pending {
        return Err(LedgerError::StaleState {
            record: "return",
            id: id.to_string(),
            current: ret.status.to_string(),
            action: format!("{} return", action),
        });
    }
    Ok(ret.clone())
}

fn set_return_status(
    returns: &mut Table<ReturnRecord>,
    ret: ReturnRecord,
    status: ReturnStatus,
) -> ReturnRecord {
    returns.update(&ret.id, |r| r.status = status);
    ReturnRecord { status, ..ret }
}

/// Resolve a full or leading-fragment id against a table
pub fn resolve_id<T>(table: &Table<T>, partial: &str, what: &'static str) -> Result<RecordId, LedgerError>
where
    T: Record<Key = RecordId>,
{
    if let Ok(id) = partial.trim().parse::<RecordId>() {
        if table.contains(&id) {
            return Ok(id);
        }
    }
    let matches: Vec<RecordId> = table
        .iter()
        .map(|row| row.key())
        .filter(|id| id.matches_partial(partial))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(LedgerError::NotFound {
            what,
            key: partial.to_string(),
        }),
        _ => Err(LedgerError::AmbiguousId {
            what,
            partial: partial.to_string(),
            count: matches.len(),
        }),
    }
}

fn require_row<'a, T>(table: &'a Table<T>, id: &RecordId, what: &'static str) -> Result<&'a T, LedgerError>
where
    T: Record<Key = RecordId>,
{
    table.find(id).ok_or_else(|| LedgerError::NotFound {
        what,
        key: id.to_string(),
    })
}

fn require_item<'a>(items: &'a Table<Item>, name: &str) -> Result<&'a Item, LedgerError> {
    items
        .find(&name.to_string())
        .ok_or_else(|| LedgerError::NotFound {
            what: "item",
            key: name.to_string(),
        })
}

fn require_department(departments: &Table<Department>, name: &str) -> Result<(), LedgerError> {
    if departments.contains(&name.to_string()) {
        Ok(())
    } else {
        Err(LedgerError::NotFound {
            what: "department",
            key: name.to_string(),
        })
    }
}

fn require_holding<'a>(
    pll: &'a Table<PllEntry>,
    department: &str,
    item: &str,
) -> Result<&'a PllEntry, LedgerError> {
    pll.find(&HoldingKey::new(department, item))
        .ok_or_else(|| LedgerError::NoSuchHolding {
            department: department.to_string(),
            item: item.to_string(),
        })
}

fn require_positive(quantity: u32) -> Result<(), LedgerError> {
    if quantity == 0 {
        Err(LedgerError::InvalidQuantity {
            quantity,
            reason: "quantity must be at least 1".to_string(),
        })
    } else {
        Ok(())
    }
}

fn require_name(value: &str, what: &str) -> Result<String, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        Err(LedgerError::InvalidInput(format!("{} is empty", what)))
    } else {
        Ok(value.to_string())
    }
}

fn overflow(quantity: u32) -> LedgerError {
    LedgerError::InvalidQuantity {
        quantity,
        reason: "total would overflow".to_string(),
    }
}
