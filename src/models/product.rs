//! Product catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, ProductId};
use super::money::Money;

/// A product category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A sellable product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,

    pub name: String,

    #[serde(default)]
    pub sku: String,

    #[serde(default)]
    pub category_id: Option<CategoryId>,

    /// Cost used for stock valuation
    pub purchase_price: Money,

    pub selling_price: Money,

    /// Stock at or below this level is reported as low
    #[serde(default)]
    pub min_stock: i64,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, purchase_price: Money, selling_price: Money) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            sku: String::new(),
            category_id: None,
            purchase_price,
            selling_price,
            min_stock: 0,
            created_at: Utc::now(),
        }
    }

    /// Selling price minus purchase price
    pub fn unit_margin(&self) -> Money {
        self.selling_price - self.purchase_price
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name cannot be empty".into());
        }
        if self.purchase_price.is_negative() || self.selling_price.is_negative() {
            return Err("Prices cannot be negative".into());
        }
        if self.min_stock < 0 {
            return Err("Minimum stock cannot be negative".into());
        }
        Ok(())
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sku.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.sku)
        }
    }
}
