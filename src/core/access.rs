//! Identity & access - operators, their roles, and what each role may do

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::entity::Record;
use crate::core::store::{Table, TableId};

/// Operator role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Role {
    /// Store keeper: approves requests, keeps item master, initiates surveys
    Store,
    /// Department user: raises requests, confirms receipt, returns items
    Department,
    /// Administrator: approves write-offs, manages users
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Store => write!(f, "Store"),
            Role::Department => write!(f, "Department"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "store" => Ok(Role::Store),
            "department" | "dept" => Ok(Role::Department),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// Row of the users table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
    /// Owning department, present iff role is Department
    #[serde(default)]
    pub department: Option<String>,
}

impl Record for User {
    const TABLE: TableId = TableId::Users;
    type Key = String;

    fn key(&self) -> String {
        self.username.clone()
    }
}

/// Workflow operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddItem,
    ReceiveStock,
    AddDepartment,
    AddUser,
    RaiseRequest,
    ApproveRequest,
    RejectRequest,
    ConfirmReceipt,
    SubmitReturn,
    CompleteReturn,
    InitiateSurvey,
    ApproveWriteOff,
    IssueConsumable,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::AddItem => "add item",
            Operation::ReceiveStock => "receive stock",
            Operation::AddDepartment => "add department",
            Operation::AddUser => "add user",
            Operation::RaiseRequest => "raise S-156 request",
            Operation::ApproveRequest => "approve request",
            Operation::RejectRequest => "reject request",
            Operation::ConfirmReceipt => "confirm receipt",
            Operation::SubmitReturn => "submit return",
            Operation::CompleteReturn => "complete return",
            Operation::InitiateSurvey => "initiate survey",
            Operation::ApproveWriteOff => "approve write-off",
            Operation::IssueConsumable => "issue consumable",
        };
        f.write_str(name)
    }
}

impl Operation {
    /// Roles allowed to perform the operation
    ///
    /// `admin_may_approve` lets an Admin stand in for the Store on request
    /// approval and rejection.
    pub fn allowed_roles(&self, admin_may_approve: bool) -> &'static [Role] {
        match self {
            Operation::AddItem | Operation::AddDepartment => &[Role::Store, Role::Admin],
            Operation::ReceiveStock
            | Operation::CompleteReturn
            | Operation::InitiateSurvey
            | Operation::IssueConsumable => &[Role::Store],
            Operation::ApproveRequest | Operation::RejectRequest => {
                if admin_may_approve {
                    &[Role::Store, Role::Admin]
                } else {
                    &[Role::Store]
                }
            }
            Operation::AddUser | Operation::ApproveWriteOff => &[Role::Admin],
            Operation::RaiseRequest | Operation::ConfirmReceipt | Operation::SubmitReturn => {
                &[Role::Department]
            }
        }
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this user may perform `op`
    pub fn can(&self, op: Operation, admin_may_approve: bool) -> bool {
        op.allowed_roles(admin_may_approve).contains(&self.role)
    }

    /// Whether this user belongs to `department`
    pub fn belongs_to(&self, department: &str) -> bool {
        self.role == Role::Department && self.department.as_deref() == Some(department)
    }
}

/// Look up a user by name
pub fn resolve_user<'a>(users: &'a Table<User>, username: &str) -> Option<&'a User> {
    users.iter().find(|u| u.username == username)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, dept: Option<&str>) -> User {
        User {
            username: "u".to_string(),
            role,
            department: dept.map(String::from),
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("store".parse::<Role>().unwrap(), Role::Store);
        assert_eq!("Dept".parse::<Role>().unwrap(), Role::Department);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("clerk".parse::<Role>().is_err());
    }

    #[test]
    fn test_permissions() {
        let store = user(Role::Store, None);
        let dept = user(Role::Department, Some("Physics"));
        let admin = user(Role::Admin, None);

        assert!(store.can(Operation::ApproveRequest, false));
        assert!(!admin.can(Operation::ApproveRequest, false));
        assert!(admin.can(Operation::ApproveRequest, true));
        assert!(!dept.can(Operation::ApproveRequest, true));

        assert!(dept.can(Operation::RaiseRequest, false));
        assert!(!store.can(Operation::RaiseRequest, false));

        assert!(admin.can(Operation::ApproveWriteOff, false));
        assert!(!store.can(Operation::ApproveWriteOff, false));
    }

    #[test]
    fn test_belongs_to() {
        let dept = user(Role::Department, Some("Physics"));
        assert!(dept.belongs_to("Physics"));
        assert!(!dept.belongs_to("Chemistry"));
        assert!(!user(Role::Store, None).belongs_to("Physics"));
    }

    #[test]
    fn test_resolve_user() {
        let users = Table::new(vec![User {
            username: "ravi".to_string(),
            role: Role::Store,
            department: None,
        }]);
        assert_eq!(resolve_user(&users, "ravi").unwrap().role, Role::Store);
        assert!(resolve_user(&users, "nobody").is_none());
    }
}
