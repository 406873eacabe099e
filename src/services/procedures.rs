//! Business procedures
//!
//! Operations that touch several tables at once: reviewing stock audits and
//! recording purchases and sales together with their stock movements. Each
//! operation runs inside one `JsonStore::transaction`, so either every row
//! it touches is written or none is.

use chrono::{Local, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::audit::AuditEntry;
use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{
    parse_record_date, AuditStatus, LineItem, Money, Product, ProductId, RecordKind, StockAudit,
    StockAuditId, StockRecord, TransactionRecord, UserId, Warehouse, WarehouseId,
};
use crate::storage::{tables, Filter, JsonStore, ProcedureResponse, Tables};

/// One product line of a purchase or sale request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInput {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Defaults to the product's purchase price (purchases) or selling
    /// price (sales)
    #[serde(default)]
    pub unit_price: Option<Money>,
}

impl ItemInput {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
            unit_price: None,
        }
    }

    pub fn at(mut self, unit_price: Money) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

/// Request to record a purchase into a warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseInput {
    pub warehouse_id: WarehouseId,
    /// `YYYY-MM-DD`; today when absent
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub note: String,
    pub items: Vec<ItemInput>,
}

impl PurchaseInput {
    pub fn new(warehouse_id: WarehouseId, items: Vec<ItemInput>) -> Self {
        Self {
            warehouse_id,
            date: None,
            supplier: String::new(),
            reference: String::new(),
            user_id: None,
            note: String::new(),
            items,
        }
    }

    /// Checks that need no store access
    pub fn validate(&self) -> BranchbookResult<NaiveDate> {
        validate_items(&self.items)?;
        resolve_date(self.date.as_deref())
    }
}

/// Request to record a sale out of a warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleInput {
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub note: String,
    pub items: Vec<ItemInput>,
}

impl SaleInput {
    pub fn new(warehouse_id: WarehouseId, items: Vec<ItemInput>) -> Self {
        Self {
            warehouse_id,
            date: None,
            customer: String::new(),
            reference: String::new(),
            user_id: None,
            note: String::new(),
            items,
        }
    }

    pub fn validate(&self) -> BranchbookResult<NaiveDate> {
        validate_items(&self.items)?;
        resolve_date(self.date.as_deref())
    }
}

/// A physical count submitted for review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAuditInput {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub counted_quantity: i64,
    #[serde(default)]
    pub submitted_by: Option<UserId>,
    #[serde(default)]
    pub note: String,
}

impl SubmitAuditInput {
    pub fn validate(&self) -> BranchbookResult<()> {
        if self.counted_quantity < 0 {
            return Err(BranchbookError::Validation(format!(
                "Counted quantity cannot be negative (got {})",
                self.counted_quantity
            )));
        }
        Ok(())
    }
}

/// Result of a purchase or sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub record: TransactionRecord,
    /// Stock rows after the movement, one per line item
    pub stock: Vec<StockRecord>,
}

fn validate_items(items: &[ItemInput]) -> BranchbookResult<()> {
    if items.is_empty() {
        return Err(BranchbookError::Validation(
            "At least one item is required".into(),
        ));
    }

    for item in items {
        if item.quantity <= 0 {
            return Err(BranchbookError::Validation(format!(
                "Quantity for product {} must be greater than zero (got {})",
                item.product_id, item.quantity
            )));
        }
        if item.unit_price.map_or(false, |p| p.is_negative()) {
            return Err(BranchbookError::Validation(format!(
                "Unit price for product {} cannot be negative",
                item.product_id
            )));
        }
    }

    Ok(())
}

fn resolve_date(raw: Option<&str>) -> BranchbookResult<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Local::now().date_naive()),
        Some(raw) => parse_record_date(raw).ok_or_else(|| {
            BranchbookError::Validation(format!("Invalid date '{}': use YYYY-MM-DD", raw))
        }),
    }
}

fn load_product(tx: &mut Tables<'_>, id: ProductId) -> BranchbookResult<Product> {
    tx.find_as(tables::PRODUCTS, &[Filter::eq("id", id)])?
        .ok_or_else(|| BranchbookError::product_not_found(id.to_string()))
}

fn load_warehouse(tx: &mut Tables<'_>, id: WarehouseId) -> BranchbookResult<Warehouse> {
    tx.find_as(tables::WAREHOUSES, &[Filter::eq("id", id)])?
        .ok_or_else(|| BranchbookError::warehouse_not_found(id.to_string()))
}

fn load_pending_audit(tx: &mut Tables<'_>, id: StockAuditId) -> BranchbookResult<StockAudit> {
    let audit: StockAudit = tx
        .find_as(tables::STOCK_AUDITS, &[Filter::eq("id", id)])?
        .ok_or_else(|| BranchbookError::audit_not_found(id.to_string()))?;

    if !audit.is_pending() {
        return Err(BranchbookError::Rejected(format!(
            "Stock audit {} was already {}",
            id,
            audit.status.to_string().to_lowercase()
        )));
    }

    Ok(audit)
}

fn stock_filters(product_id: ProductId, warehouse_id: WarehouseId) -> [Filter; 2] {
    [
        Filter::eq("product_id", product_id),
        Filter::eq("warehouse_id", warehouse_id),
    ]
}

/// Rewrite the stock row for (product, warehouse), creating it when
/// missing. `next` maps the current quantity to the new one; `cost`
/// replaces the valuation price when given.
fn write_stock<F>(
    tx: &mut Tables<'_>,
    product: &Product,
    warehouse: &Warehouse,
    cost: Option<Money>,
    next: F,
) -> BranchbookResult<StockRecord>
where
    F: FnOnce(i64) -> BranchbookResult<i64>,
{
    let existing: Option<StockRecord> =
        tx.find_as(tables::STOCK, &stock_filters(product.id, warehouse.id))?;

    match existing {
        Some(mut stock) => {
            stock.quantity = next(stock.quantity)?;
            if let Some(cost) = cost {
                stock.purchase_price = cost;
            }
            stock.product_name = product.name.clone();
            stock.category_id = product.category_id;
            stock.updated_at = Utc::now();
            tx.save_as(tables::STOCK, &stock)
        }
        None => {
            let quantity = next(0)?;
            let mut stock = StockRecord::new(
                product.id,
                product.name.clone(),
                warehouse.id,
                quantity,
                cost.unwrap_or(product.purchase_price),
            );
            stock.branch_id = warehouse.branch_id;
            stock.category_id = product.category_id;
            tx.insert_as(tables::STOCK, &stock)
        }
    }
}

/// Shared shape of purchases and sales
struct Trade<'i> {
    kind: RecordKind,
    warehouse_id: WarehouseId,
    date: NaiveDate,
    party: &'i str,
    reference: &'i str,
    user_id: Option<UserId>,
    note: &'i str,
    items: &'i [ItemInput],
}

fn apply_trade(tx: &mut Tables<'_>, trade: Trade<'_>) -> BranchbookResult<TradeOutcome> {
    let warehouse = load_warehouse(tx, trade.warehouse_id)?;
    let is_sale = trade.kind.is_sale();

    let mut record = TransactionRecord::new(trade.kind, trade.date, Money::zero());
    record.branch_id = warehouse.branch_id;
    record.warehouse_id = Some(warehouse.id);
    record.user_id = trade.user_id;
    record.party = trade.party.trim().to_string();
    record.reference = trade.reference.trim().to_string();
    record.note = trade.note.trim().to_string();

    let mut levels = Vec::with_capacity(trade.items.len());

    for item in trade.items {
        let product = load_product(tx, item.product_id)?;

        let unit_price = item.unit_price.unwrap_or(if is_sale {
            product.selling_price
        } else {
            product.purchase_price
        });

        if unit_price.checked_times(item.quantity).is_none() {
            return Err(BranchbookError::Validation(format!(
                "Line total for '{}' is too large ({} x {})",
                product.name, item.quantity, unit_price
            )));
        }

        let stock = if is_sale {
            write_stock(tx, &product, &warehouse, None, |available| {
                if item.quantity > available {
                    return Err(BranchbookError::InsufficientStock {
                        product: product.name.clone(),
                        needed: item.quantity,
                        available,
                    });
                }
                Ok(available - item.quantity)
            })?
        } else {
            write_stock(tx, &product, &warehouse, Some(unit_price), |current| {
                current.checked_add(item.quantity).ok_or_else(|| {
                    BranchbookError::Validation(format!(
                        "Stock of '{}' would exceed the largest supported quantity",
                        product.name
                    ))
                })
            })?
        };

        if record.category_id.is_none() {
            record.category_id = product.category_id;
        }
        record
            .items
            .push(LineItem::new(product.id, product.name.clone(), item.quantity, unit_price));
        levels.push(stock);
    }

    record.amount = record.checked_items_total().ok_or_else(|| {
        BranchbookError::Validation("Line items total is too large to record".into())
    })?;
    let record = tx.insert_as(trade.kind.table(), &record)?;

    Ok(TradeOutcome {
        record,
        stock: levels,
    })
}

/// Transactional business operations
pub struct ProcedureService<'a> {
    store: &'a JsonStore,
}

impl<'a> ProcedureService<'a> {
    pub fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    /// Submit a stock count. The current quantity is captured as the
    /// recorded quantity so the variance is fixed at submission time.
    pub fn submit_stock_audit(&self, input: SubmitAuditInput) -> BranchbookResult<StockAudit> {
        input.validate()?;

        let audit = self.store.transaction(|tx| {
            load_product(tx, input.product_id)?;
            load_warehouse(tx, input.warehouse_id)?;

            let recorded = tx
                .find_as::<StockRecord>(
                    tables::STOCK,
                    &stock_filters(input.product_id, input.warehouse_id),
                )?
                .map(|s| s.quantity)
                .unwrap_or(0);

            let mut audit = StockAudit::new(
                input.product_id,
                input.warehouse_id,
                recorded,
                input.counted_quantity,
            );
            audit.submitted_by = input.submitted_by;
            audit.note = input.note.trim().to_string();

            tx.insert_as(tables::STOCK_AUDITS, &audit)
        })?;

        info!(audit = %audit.id, variance = audit.variance(), "stock audit submitted");
        Ok(audit)
    }

    /// Approve a pending audit and set stock to the counted quantity
    pub fn approve_stock_audit(
        &self,
        audit_id: StockAuditId,
        reviewer: Option<UserId>,
    ) -> BranchbookResult<StockAudit> {
        let audit = self.store.transaction(|tx| {
            let mut audit = load_pending_audit(tx, audit_id)?;
            let product = load_product(tx, audit.product_id)?;
            let warehouse = load_warehouse(tx, audit.warehouse_id)?;

            let counted = audit.counted_quantity;
            write_stock(tx, &product, &warehouse, None, |_| Ok(counted))?;

            audit.status = AuditStatus::Approved;
            audit.reviewed_by = reviewer;
            audit.reviewed_at = Some(Utc::now());
            tx.save_as(tables::STOCK_AUDITS, &audit)
        })?;

        info!(audit = %audit.id, quantity = audit.counted_quantity, "stock audit approved");
        Ok(audit)
    }

    /// Reject a pending audit. Stock is left unchanged.
    pub fn reject_stock_audit(
        &self,
        audit_id: StockAuditId,
        reviewer: Option<UserId>,
        reason: &str,
    ) -> BranchbookResult<StockAudit> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(BranchbookError::Validation(
                "A reason is required to reject a stock audit".into(),
            ));
        }

        let audit = self.store.transaction(|tx| {
            let mut audit = load_pending_audit(tx, audit_id)?;
            audit.status = AuditStatus::Rejected;
            audit.reviewed_by = reviewer;
            audit.reviewed_at = Some(Utc::now());
            audit.reason = reason.to_string();
            tx.save_as(tables::STOCK_AUDITS, &audit)
        })?;

        info!(audit = %audit.id, "stock audit rejected");
        Ok(audit)
    }

    /// Record a purchase and add its items to warehouse stock
    pub fn record_purchase(&self, input: PurchaseInput) -> BranchbookResult<TradeOutcome> {
        let date = input.validate()?;

        let outcome = self.store.transaction(|tx| {
            apply_trade(
                tx,
                Trade {
                    kind: RecordKind::Purchase,
                    warehouse_id: input.warehouse_id,
                    date,
                    party: &input.supplier,
                    reference: &input.reference,
                    user_id: input.user_id,
                    note: &input.note,
                    items: &input.items,
                },
            )
        })?;

        info!(record = %outcome.record.id, amount = %outcome.record.amount, "purchase recorded");
        Ok(outcome)
    }

    /// Record a sale and take its items out of warehouse stock. Fails with
    /// `InsufficientStock` before anything is written if any line exceeds
    /// what the warehouse holds.
    pub fn record_sale(&self, input: SaleInput, external: bool) -> BranchbookResult<TradeOutcome> {
        let date = input.validate()?;
        let kind = if external {
            RecordKind::ExternalSale
        } else {
            RecordKind::Sale
        };

        let outcome = self.store.transaction(|tx| {
            apply_trade(
                tx,
                Trade {
                    kind,
                    warehouse_id: input.warehouse_id,
                    date,
                    party: &input.customer,
                    reference: &input.reference,
                    user_id: input.user_id,
                    note: &input.note,
                    items: &input.items,
                },
            )
        })?;

        info!(kind = %kind, record = %outcome.record.id, amount = %outcome.record.amount, "sale recorded");
        Ok(outcome)
    }
}

#[derive(Deserialize)]
struct ReviewArgs {
    audit_id: StockAuditId,
    #[serde(default)]
    reviewer: Option<UserId>,
    #[serde(default)]
    reason: String,
}

fn parse_args<T: DeserializeOwned>(procedure: &str, args: &Value) -> BranchbookResult<T> {
    serde_json::from_value(args.clone()).map_err(|e| {
        BranchbookError::Validation(format!("Invalid arguments for {}: {}", procedure, e))
    })
}

fn respond<T: Serialize>(message: &str, data: &T) -> BranchbookResult<ProcedureResponse> {
    Ok(ProcedureResponse::success(
        message,
        Some(serde_json::to_value(data)?),
    ))
}

/// Run a procedure by name, as `DataStore::call` does.
///
/// Business-rule failures come back as an error envelope; storage and I/O
/// failures are returned as `Err`. Successful calls are written to the audit
/// log with their arguments.
pub fn dispatch(store: &JsonStore, procedure: &str, args: Value) -> BranchbookResult<ProcedureResponse> {
    let service = ProcedureService::new(store);

    let result = match procedure {
        "submit_stock_audit" => parse_args(procedure, &args)
            .and_then(|input| service.submit_stock_audit(input))
            .and_then(|audit| respond("Stock audit submitted", &audit)),
        "approve_stock_audit" => parse_args::<ReviewArgs>(procedure, &args)
            .and_then(|a| service.approve_stock_audit(a.audit_id, a.reviewer))
            .and_then(|audit| respond("Stock audit approved", &audit)),
        "reject_stock_audit" => parse_args::<ReviewArgs>(procedure, &args)
            .and_then(|a| service.reject_stock_audit(a.audit_id, a.reviewer, &a.reason))
            .and_then(|audit| respond("Stock audit rejected", &audit)),
        "process_purchase_transaction" => parse_args(procedure, &args)
            .and_then(|input| service.record_purchase(input))
            .and_then(|outcome| respond("Purchase recorded", &outcome)),
        "process_sale_transaction" => {
            let external = args
                .get("external")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            parse_args(procedure, &args)
                .and_then(|input| service.record_sale(input, external))
                .and_then(|outcome| respond("Sale recorded", &outcome))
        }
        other => {
            return Ok(ProcedureResponse::error(format!(
                "Unknown procedure '{}'",
                other
            )))
        }
    };

    match result {
        Ok(response) => {
            let entry = AuditEntry::call(procedure, &args, response.data.as_ref());
            if let Err(e) = store.audit_log().log(&entry) {
                warn!(procedure, error = %e, "failed to append audit log for committed call");
            }
            Ok(response)
        }
        Err(e) if e.is_rejection() => Ok(ProcedureResponse::error(e.to_string())),
        Err(e) => Err(e),
    }
}
