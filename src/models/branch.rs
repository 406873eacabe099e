//! Branch and warehouse models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BranchId, WarehouseId};

/// A retail location that owns users, stock and transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,

    pub name: String,

    #[serde(default)]
    pub address: String,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Branch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BranchId::new(),
            name: name.into(),
            address: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Branch name cannot be empty".into());
        }
        if self.name.len() > 100 {
            return Err("Branch name cannot exceed 100 characters".into());
        }
        Ok(())
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A storage location holding stock, attached to a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,

    pub name: String,

    #[serde(default)]
    pub branch_id: Option<BranchId>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Warehouse {
    pub fn new(name: impl Into<String>, branch_id: Option<BranchId>) -> Self {
        Self {
            id: WarehouseId::new(),
            name: name.into(),
            branch_id,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Warehouse name cannot be empty".into());
        }
        Ok(())
    }
}

impl fmt::Display for Warehouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
