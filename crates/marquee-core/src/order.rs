//! # Orders and Line Items
//!
//! The order aggregate and the invariants that hold its money columns
//! together.
//!
//! ## The One Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  gross_total  = Σ line item totals                                  │
//! │  discount     = recomputed from the stored spec against gross       │
//! │  final_amount = max(0, gross_total - discount)                      │
//! │  amount_due   = max(0, final_amount - amount_paid)                  │
//! │                                                                     │
//! │  Every mutation funnels through Order::recalculate. The derived     │
//! │  columns are stored for querying but are never ground truth.        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutation paths that touch these columns: line-item edits, discount
//! edits, direct payment edits, installment payment toggles
//! ([`crate::installment`]) and bundle insertion ([`crate::bundle`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::discount::{Discount, DiscountKind};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    validate_customer_name, validate_item_quantity, validate_order_size, validate_price_cents,
    validate_product_name,
};

// =============================================================================
// Line Item
// =============================================================================

/// One row of an order: a product, a quantity and a price.
///
/// Ordinary items carry an editable unit price looked up from the current
/// catalog. Bundle-sourced items (`bundle_name` set) carry a unit price
/// computed and frozen at insertion; only their quantity may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Always `quantity × unit_price_cents`; recomputed on quantity change.
    pub total_cents: i64,
    /// Name of the bundle this row was sourced from, if any.
    pub bundle_name: Option<String>,
}

impl LineItem {
    /// Creates an ordinary line item. Total is derived from quantity and
    /// unit price.
    pub fn new(name: impl Into<String>, quantity: i64, unit_price: Money) -> CoreResult<Self> {
        let name = name.into();
        validate_product_name(&name)?;
        validate_item_quantity(quantity)?;
        validate_price_cents(unit_price.cents())?;

        Ok(LineItem {
            id: Uuid::new_v4().to_string(),
            name,
            quantity,
            unit_price_cents: unit_price.cents(),
            total_cents: unit_price.multiply_quantity(quantity).cents(),
            bundle_name: None,
        })
    }

    /// Creates a bundle-sourced line item with a frozen unit price.
    pub fn bundle_member(
        bundle_name: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            name: product_name.into(),
            quantity,
            unit_price_cents: unit_price.cents(),
            total_cents: unit_price.multiply_quantity(quantity).cents(),
            bundle_name: Some(bundle_name.into()),
        }
    }

    /// The empty row the operator types into next. Contributes nothing to
    /// the order totals.
    pub fn placeholder() -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            quantity: 1,
            unit_price_cents: 0,
            total_cents: 0,
            bundle_name: None,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Whether this row was sourced from a bundle.
    #[inline]
    pub fn is_bundle_item(&self) -> bool {
        self.bundle_name.is_some()
    }

    /// Whether this is an empty placeholder row.
    pub fn is_placeholder(&self) -> bool {
        self.name.trim().is_empty() && self.total_cents == 0
    }

    /// Display name with the structured bundle prefix tag, e.g.
    /// `[Kit Festa] Toalha Redonda`.
    pub fn display_name(&self) -> String {
        match &self.bundle_name {
            Some(bundle) => format!("[{}] {}", bundle, self.name),
            None => self.name.clone(),
        }
    }

    /// Sets the quantity and recomputes the total from the existing unit
    /// price. The unit price is never re-derived here - for bundle members
    /// it was frozen at insertion.
    pub(crate) fn set_quantity(&mut self, quantity: i64) -> CoreResult<()> {
        validate_item_quantity(quantity)?;
        self.quantity = quantity;
        self.total_cents = self.unit_price().multiply_quantity(quantity).cents();
        Ok(())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A rental order.
///
/// Dual-key identity: `id` is the immutable UUID used for relations,
/// `order_number` is the sequential business number shown to people.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub order_number: i64,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<LineItem>,
    /// The stored discount specification. The derived amounts below are
    /// recomputed from it on every mutation.
    pub discount: Discount,
    pub gross_total_cents: i64,
    pub discount_cents: i64,
    pub final_amount_cents: i64,
    pub amount_paid_cents: i64,
    pub amount_due_cents: i64,
    pub notes: Option<String>,
    /// Who performed the last mutation. Always an explicit parameter on the
    /// mutating call, never ambient session state.
    pub last_modified_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order with a single empty placeholder line item.
    pub fn new(
        order_number: i64,
        customer_name: impl Into<String>,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let customer_name = customer_name.into();
        validate_customer_name(&customer_name)?;

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            order_number,
            customer_name,
            customer_phone: None,
            customer_address: None,
            items: vec![LineItem::placeholder()],
            discount: Discount::None,
            gross_total_cents: 0,
            discount_cents: 0,
            final_amount_cents: 0,
            amount_paid_cents: 0,
            amount_due_cents: 0,
            notes: None,
            last_modified_by: created_by.into(),
            created_at: now,
            updated_at: now,
        })
    }

    // -------------------------------------------------------------------------
    // Money accessors
    // -------------------------------------------------------------------------

    #[inline]
    pub fn gross_total(&self) -> Money {
        Money::from_cents(self.gross_total_cents)
    }

    #[inline]
    pub fn discount_amount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn final_amount(&self) -> Money {
        Money::from_cents(self.final_amount_cents)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    #[inline]
    pub fn amount_due(&self) -> Money {
        Money::from_cents(self.amount_due_cents)
    }

    // -------------------------------------------------------------------------
    // Recalculation - the single choke point
    // -------------------------------------------------------------------------

    /// Recomputes gross total, discount, final amount and amount due from
    /// the line items, the stored discount spec and the paid aggregate.
    ///
    /// Called by every mutating method on this type and by the installment
    /// reconciler after a payment toggle.
    pub fn recalculate(&mut self) {
        let gross: Money = self.items.iter().map(LineItem::total).sum();
        let breakdown = self.discount.compute(gross);

        self.gross_total_cents = gross.cents();
        self.discount_cents = breakdown.discount_amount.cents();
        self.final_amount_cents = breakdown.final_amount.cents();
        self.amount_due_cents = (breakdown.final_amount - self.amount_paid())
            .floor_zero()
            .cents();
    }

    /// Stamps attribution and modification time.
    pub fn touch(&mut self, actor: &str, now: DateTime<Utc>) {
        self.last_modified_by = actor.to_string();
        self.updated_at = now;
    }

    // -------------------------------------------------------------------------
    // Line item mutations
    // -------------------------------------------------------------------------

    /// Appends an ordinary line item.
    pub fn add_item(&mut self, name: impl Into<String>, quantity: i64, unit_price: Money) -> CoreResult<()> {
        validate_order_size(self.items.len())?;
        let item = LineItem::new(name, quantity, unit_price)?;
        self.items.push(item);
        self.recalculate();
        Ok(())
    }

    /// Edits an item's name and unit price.
    ///
    /// Bundle-sourced items refuse this: their identity and price were
    /// frozen when the bundle was merged in.
    pub fn update_item(
        &mut self,
        item_id: &str,
        name: impl Into<String>,
        unit_price: Money,
    ) -> CoreResult<()> {
        let name = name.into();
        validate_product_name(&name)?;
        validate_price_cents(unit_price.cents())?;

        let item = self.item_mut(item_id)?;
        if item.is_bundle_item() {
            return Err(CoreError::BundleItemLocked {
                name: item.name.clone(),
            });
        }

        item.name = name;
        item.unit_price_cents = unit_price.cents();
        item.total_cents = unit_price.multiply_quantity(item.quantity).cents();
        self.recalculate();
        Ok(())
    }

    /// Changes an item's quantity. Allowed for bundle-sourced items too;
    /// the total recomputes from the frozen unit price.
    pub fn set_item_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        self.item_mut(item_id)?.set_quantity(quantity)?;
        self.recalculate();
        Ok(())
    }

    /// Removes an item.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<()> {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        if self.items.len() == before {
            return Err(CoreError::ItemNotFound(item_id.to_string()));
        }
        self.recalculate();
        Ok(())
    }

    fn item_mut(&mut self, item_id: &str) -> CoreResult<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
    }

    // -------------------------------------------------------------------------
    // Bundle insertion
    // -------------------------------------------------------------------------

    /// Merges a bundle's members into this order's items and recomputes
    /// the totals. See [`crate::bundle::merge_into`] for the merge rules.
    pub fn add_bundle(&mut self, bundle: &crate::types::Bundle) -> CoreResult<()> {
        crate::bundle::merge_into(bundle, &mut self.items)?;
        self.recalculate();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Discount mutations
    // -------------------------------------------------------------------------

    /// Installs a discount specification and recomputes the derived
    /// amounts against the current gross.
    pub fn set_discount(&mut self, discount: Discount) -> CoreResult<()> {
        discount.validate()?;
        self.discount = discount;
        self.recalculate();
        Ok(())
    }

    /// Switches the discount kind, resetting the value to zero.
    pub fn set_discount_kind(&mut self, kind: DiscountKind) {
        self.discount = Discount::zeroed(kind);
        self.recalculate();
    }

    // -------------------------------------------------------------------------
    // Direct payment edits
    // -------------------------------------------------------------------------

    /// Sets the aggregate amount paid directly (the non-installment payment
    /// path).
    ///
    /// Rejects negatives and amounts above the final amount. Installment
    /// toggles bypass this method on purpose - see
    /// [`crate::installment::toggle_payment`].
    pub fn set_amount_paid(&mut self, amount: Money) -> CoreResult<()> {
        if amount.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "amount_paid".to_string(),
            }
            .into());
        }
        if amount > self.final_amount() {
            return Err(CoreError::PaymentExceedsBalance {
                final_amount_cents: self.final_amount_cents,
                requested_cents: amount.cents(),
            });
        }

        self.amount_paid_cents = amount.cents();
        self.recalculate();
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
