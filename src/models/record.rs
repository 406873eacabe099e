//! Transaction record model
//!
//! Sales, external sales, purchases and expenses share one shape: a date,
//! an amount, the branch it belongs to and optional line items. The date is
//! kept exactly as the data store returned it; parsing happens at report time
//! so one malformed row cannot fail a whole fetch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::ids::{BranchId, CategoryId, ProductId, RecordId, UserId, WarehouseId};
use super::money::Money;
use super::period::parse_record_date;

/// Kind of transaction record, one table per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Point-of-sale sale
    Sale,
    /// Sale recorded through the external pricing/authorization path
    ExternalSale,
    /// Stock purchase from a supplier
    Purchase,
    /// Operating expense
    Expense,
}

impl RecordKind {
    /// Data store table holding this kind
    pub fn table(&self) -> &'static str {
        match self {
            Self::Sale => "sales",
            Self::ExternalSale => "external_sales",
            Self::Purchase => "purchases",
            Self::Expense => "expenses",
        }
    }

    pub fn all() -> &'static [RecordKind] {
        &[Self::Sale, Self::ExternalSale, Self::Purchase, Self::Expense]
    }

    /// Whether this kind moves stock out of a warehouse
    pub fn is_sale(&self) -> bool {
        matches!(self, Self::Sale | Self::ExternalSale)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sale => write!(f, "Sale"),
            Self::ExternalSale => write!(f, "External Sale"),
            Self::Purchase => write!(f, "Purchase"),
            Self::Expense => write!(f, "Expense"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sale" | "sales" => Ok(Self::Sale),
            "external_sale" | "external_sales" | "external" => Ok(Self::ExternalSale),
            "purchase" | "purchases" => Ok(Self::Purchase),
            "expense" | "expenses" => Ok(Self::Expense),
            other => Err(format!(
                "Unknown record kind '{}': expected sale, external-sale, purchase or expense",
                other
            )),
        }
    }
}

/// A product line on a sale or purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,

    /// Product name at the time of the transaction
    #[serde(default)]
    pub product_name: String,

    pub quantity: i64,

    /// Unit price (selling price for sales, cost for purchases)
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(product_id: ProductId, product_name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    pub fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    pub fn checked_subtotal(&self) -> Option<Money> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// A sale, external sale, purchase or expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: RecordId,

    pub kind: RecordKind,

    /// Raw date string as stored. A missing or non-string value is kept
    /// as text that never parses.
    #[serde(default, deserialize_with = "raw_date")]
    pub date: String,

    pub amount: Money,

    #[serde(default)]
    pub branch_id: Option<BranchId>,

    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,

    /// Expense category (expenses) or primary product category
    #[serde(default)]
    pub category_id: Option<CategoryId>,

    /// User who recorded the transaction
    #[serde(default)]
    pub user_id: Option<UserId>,

    /// Invoice or receipt number
    #[serde(default)]
    pub reference: String,

    /// Customer or supplier name
    #[serde(default)]
    pub party: String,

    #[serde(default)]
    pub note: String,

    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn raw_date<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl TransactionRecord {
    /// Create a record dated `date` (formatted `YYYY-MM-DD`)
    pub fn new(kind: RecordKind, date: NaiveDate, amount: Money) -> Self {
        Self::with_raw_date(kind, date.format("%Y-%m-%d").to_string(), amount)
    }

    /// Create a record with an unparsed date string
    pub fn with_raw_date(kind: RecordKind, date: impl Into<String>, amount: Money) -> Self {
        Self {
            id: RecordId::new(),
            kind,
            date: date.into(),
            amount,
            branch_id: None,
            warehouse_id: None,
            category_id: None,
            user_id: None,
            reference: String::new(),
            party: String::new(),
            note: String::new(),
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_branch(mut self, branch_id: BranchId) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    /// The parsed date, or `None` if the stored string is malformed
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_record_date(&self.date)
    }

    /// Sum of line item subtotals
    pub fn items_total(&self) -> Money {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Sum of line item subtotals, `None` if it leaves the `i64` range
    pub fn checked_items_total(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.checked_subtotal()?))
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().fold(0i64, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Client-side checks run before a record is submitted
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.parsed_date().is_none() {
            return Err(RecordValidationError::InvalidDate(self.date.clone()));
        }

        if self.amount.is_negative() {
            return Err(RecordValidationError::NegativeAmount(self.amount));
        }

        for item in &self.items {
            if item.quantity <= 0 {
                return Err(RecordValidationError::NonPositiveQuantity {
                    product: item.product_name.clone(),
                    quantity: item.quantity,
                });
            }
            if item.unit_price.is_negative() {
                return Err(RecordValidationError::NegativeUnitPrice {
                    product: item.product_name.clone(),
                });
            }
        }

        if self.items.is_empty() {
            return Ok(());
        }
        let items_total = self
            .checked_items_total()
            .ok_or(RecordValidationError::AmountOverflow)?;
        if items_total != self.amount {
            return Err(RecordValidationError::ItemsMismatch {
                amount: self.amount,
                items_total,
            });
        }

        Ok(())
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date, self.kind, self.amount)
    }
}

/// Validation errors for transaction records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    InvalidDate(String),
    NegativeAmount(Money),
    NonPositiveQuantity { product: String, quantity: i64 },
    NegativeUnitPrice { product: String },
    ItemsMismatch { amount: Money, items_total: Money },
    AmountOverflow,
}

impl fmt::Display for RecordValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate(raw) => write!(f, "Invalid date '{}': use YYYY-MM-DD", raw),
            Self::NegativeAmount(amount) => write!(f, "Amount cannot be negative ({})", amount),
            Self::NonPositiveQuantity { product, quantity } => write!(
                f,
                "Quantity for '{}' must be greater than zero (got {})",
                product, quantity
            ),
            Self::NegativeUnitPrice { product } => {
                write!(f, "Unit price for '{}' cannot be negative", product)
            }
            Self::ItemsMismatch {
                amount,
                items_total,
            } => write!(
                f,
                "Line items total ({}) does not match amount ({})",
                items_total, amount
            ),
            Self::AmountOverflow => write!(f, "Line items total is too large to record"),
        }
    }
}

impl std::error::Error for RecordValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_new_record_formats_date() {
        let rec = TransactionRecord::new(RecordKind::Sale, jan(5), Money::from_cents(10000));
        assert_eq!(rec.date, "2025-01-05");
        assert_eq!(rec.parsed_date(), Some(jan(5)));
    }

    #[test]
    fn test_malformed_date_is_kept() {
        let rec = TransactionRecord::with_raw_date(RecordKind::Expense, "yesterday", Money::from_cents(500));
        assert_eq!(rec.parsed_date(), None);
        assert_eq!(
            rec.validate(),
            Err(RecordValidationError::InvalidDate("yesterday".into()))
        );
    }

    #[test]
    fn test_items_total_and_validation() {
        let mut rec = TransactionRecord::new(RecordKind::Purchase, jan(10), Money::from_cents(2500));
        rec.items.push(LineItem::new(ProductId::new(), "Soap", 5, Money::from_cents(300)));
        rec.items.push(LineItem::new(ProductId::new(), "Towel", 1, Money::from_cents(1000)));

        assert_eq!(rec.items_total(), Money::from_cents(2500));
        assert_eq!(rec.total_quantity(), 6);
        assert!(rec.validate().is_ok());

        rec.amount = Money::from_cents(2000);
        assert!(matches!(
            rec.validate(),
            Err(RecordValidationError::ItemsMismatch { .. })
        ));
    }

    #[test]
    fn test_oversized_line_total_rejected() {
        let mut rec = TransactionRecord::new(RecordKind::Purchase, jan(10), Money::zero());
        rec.items.push(LineItem::new(
            ProductId::new(),
            "Soap",
            100_000_000_000,
            Money::from_cents(100_000_000),
        ));

        assert_eq!(rec.checked_items_total(), None);
        assert_eq!(rec.validate(), Err(RecordValidationError::AmountOverflow));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut rec = TransactionRecord::new(RecordKind::Sale, jan(10), Money::zero());
        rec.items.push(LineItem::new(ProductId::new(), "Soap", 0, Money::from_cents(300)));
        assert!(matches!(
            rec.validate(),
            Err(RecordValidationError::NonPositiveQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn test_kind_table_and_parse() {
        assert_eq!(RecordKind::ExternalSale.table(), "external_sales");
        assert_eq!("external-sale".parse::<RecordKind>().unwrap(), RecordKind::ExternalSale);
        assert_eq!("Expenses".parse::<RecordKind>().unwrap(), RecordKind::Expense);
        assert!("refund".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_deserialize_sparse_row() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "kind": "sale",
            "date": "2025-01-05T10:00:00+00:00",
            "amount": 10000
        }"#;
        let rec: TransactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.kind, RecordKind::Sale);
        assert!(rec.branch_id.is_none());
        assert!(rec.items.is_empty());
        assert_eq!(rec.parsed_date(), Some(jan(5)));
    }

    #[test]
    fn test_deserialize_null_or_missing_date() {
        let null_date = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440001",
            "kind": "sale",
            "date": null,
            "amount": 500
        }"#;
        let rec: TransactionRecord = serde_json::from_str(null_date).unwrap();
        assert_eq!(rec.date, "");
        assert_eq!(rec.parsed_date(), None);

        let numeric = r#"{"id": "550e8400-e29b-41d4-a716-446655440002", "kind": "sale", "date": 20250105, "amount": 500}"#;
        let rec: TransactionRecord = serde_json::from_str(numeric).unwrap();
        assert_eq!(rec.date, "20250105");
        assert_eq!(rec.parsed_date(), None);

        let missing = r#"{"id": "550e8400-e29b-41d4-a716-446655440003", "kind": "sale", "amount": 500}"#;
        let rec: TransactionRecord = serde_json::from_str(missing).unwrap();
        assert_eq!(rec.parsed_date(), None);
    }
}
