//! # Bundle Pricing Resolver
//!
//! Computes the proportional per-unit price for a bundle's members and
//! merges them into an order's line items.
//!
//! ## Pricing Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  unit price = round(promotional price / total member units)         │
//! │                                                                     │
//! │  Kit A: {X: 2, Y: 1} at $30.00                                      │
//! │    -> 3 units, $10.00 per unit                                      │
//! │    -> X (qty 2, total $20.00), Y (qty 1, total $10.00)              │
//! │                                                                     │
//! │  One shared proportional rate for every member - NOT weighted by    │
//! │  each product's individual catalog value.                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unit price is frozen at first insertion (snapshot pattern: the same
//! reason a sale item snapshots its price at sale time). Re-inserting the
//! bundle accumulates quantities against the frozen price; it never
//! re-derives the rate.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::order::LineItem;
use crate::types::Bundle;

// =============================================================================
// Pricing
// =============================================================================

/// The shared per-unit price for every member of the bundle.
///
/// ## Errors
/// - [`CoreError::BundleHasNoUnits`] when the member quantities sum to zero
///   (the division is undefined; such a bundle is not insertable).
pub fn unit_price(bundle: &Bundle) -> CoreResult<Money> {
    let units = bundle.total_units();
    if units <= 0 {
        return Err(CoreError::BundleHasNoUnits {
            name: bundle.name.clone(),
        });
    }

    Ok(bundle.price().per_unit(units))
}

// =============================================================================
// Merging
// =============================================================================

/// Merges a bundle's members into an order's line items.
///
/// ## Rules
/// - Inactive bundles are rejected.
/// - A row already present for the same (bundle name, product) accumulates
///   quantity; its total recomputes from the *existing* frozen unit price.
/// - New members get rows tagged with the bundle name.
/// - A lone empty placeholder row is removed; otherwise a trailing empty
///   placeholder is preserved so the operator can still add an ordinary
///   item after the merge.
pub fn merge_into(bundle: &Bundle, items: &mut Vec<LineItem>) -> CoreResult<()> {
    if !bundle.is_active {
        return Err(CoreError::BundleInactive {
            name: bundle.name.clone(),
        });
    }
    let unit = unit_price(bundle)?;

    let lone_placeholder = items.len() == 1 && items[0].is_placeholder();
    if lone_placeholder {
        items.clear();
    }

    // Keep a trailing placeholder out of the way while merging, then put it
    // back at the end.
    let trailing_placeholder = if items.last().is_some_and(LineItem::is_placeholder) {
        items.pop()
    } else {
        None
    };

    for member in &bundle.items {
        let existing = items.iter_mut().find(|item| {
            item.bundle_name.as_deref() == Some(bundle.name.as_str())
                && item.name == member.product_name
        });

        match existing {
            Some(item) => {
                // Accumulate quantity against the unit price frozen at the
                // first insertion.
                item.quantity += member.quantity;
                item.total_cents = item.unit_price().multiply_quantity(item.quantity).cents();
            }
            None => {
                items.push(LineItem::bundle_member(
                    &bundle.name,
                    &member.product_name,
                    member.quantity,
                    unit,
                ));
            }
        }
    }

    if let Some(placeholder) = trailing_placeholder {
        items.push(placeholder);
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
