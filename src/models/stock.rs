//! Stock levels and stock audits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BranchId, CategoryId, ProductId, StockAuditId, StockId, UserId, WarehouseId};
use super::money::Money;

/// Quantity of one product held in one warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: StockId,

    pub product_id: ProductId,

    #[serde(default)]
    pub product_name: String,

    pub warehouse_id: WarehouseId,

    /// Branch owning the warehouse, copied at write time
    #[serde(default)]
    pub branch_id: Option<BranchId>,

    /// Product category, copied at write time
    #[serde(default)]
    pub category_id: Option<CategoryId>,

    pub quantity: i64,

    /// Product purchase price, used for valuation
    pub purchase_price: Money,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        warehouse_id: WarehouseId,
        quantity: i64,
        purchase_price: Money,
    ) -> Self {
        Self {
            id: StockId::new(),
            product_id,
            product_name: product_name.into(),
            warehouse_id,
            branch_id: None,
            category_id: None,
            quantity,
            purchase_price,
            updated_at: Utc::now(),
        }
    }

    /// Quantity times purchase price
    pub fn value(&self) -> Money {
        self.purchase_price.times(self.quantity)
    }
}

/// Review state of a stock audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Approved => write!(f, "Approved"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// A submitted inventory count awaiting review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAudit {
    pub id: StockAuditId,

    pub product_id: ProductId,

    pub warehouse_id: WarehouseId,

    /// Quantity on record when the count was submitted
    pub recorded_quantity: i64,

    /// Quantity physically counted
    pub counted_quantity: i64,

    #[serde(default)]
    pub status: AuditStatus,

    #[serde(default)]
    pub submitted_by: Option<UserId>,

    #[serde(default)]
    pub reviewed_by: Option<UserId>,

    #[serde(default)]
    pub note: String,

    /// Reason given when rejected
    #[serde(default)]
    pub reason: String,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl StockAudit {
    pub fn new(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        recorded_quantity: i64,
        counted_quantity: i64,
    ) -> Self {
        Self {
            id: StockAuditId::new(),
            product_id,
            warehouse_id,
            recorded_quantity,
            counted_quantity,
            status: AuditStatus::Pending,
            submitted_by: None,
            reviewed_by: None,
            note: String::new(),
            reason: String::new(),
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }

    /// Counted minus recorded quantity
    pub fn variance(&self) -> i64 {
        self.counted_quantity - self.recorded_quantity
    }

    pub fn is_pending(&self) -> bool {
        self.status == AuditStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_value() {
        let stock = StockRecord::new(
            ProductId::new(),
            "Soap",
            WarehouseId::new(),
            12,
            Money::from_cents(250),
        );
        assert_eq!(stock.value(), Money::from_cents(3000));
    }

    #[test]
    fn test_audit_variance() {
        let audit = StockAudit::new(ProductId::new(), WarehouseId::new(), 20, 17);
        assert_eq!(audit.variance(), -3);
        assert!(audit.is_pending());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&AuditStatus::Approved).unwrap(), "\"approved\"");
    }
}
