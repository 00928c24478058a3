//! Pricing and stock derivation rules.
//!
//! Pure functions only: no I/O. The catalog calls these on every product write
//! and checkout calls [`unit_price`] to pick the tier price for a buyer.

use crate::entities::{
    product::{self, StockStatus},
    user::CustomerType,
};

/// Stock strictly below this (and above zero) counts as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Rounds a currency amount to two decimal places.
#[must_use]
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Maps a stock count to its bucket.
///
/// - `stock <= 0` is out of stock
/// - `stock < 10` is low stock
/// - anything else is in stock
#[must_use]
pub const fn stock_status_for(stock: i32) -> StockStatus {
    if stock <= 0 {
        StockStatus::OutOfStock
    } else if stock < LOW_STOCK_THRESHOLD {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

/// Whole-percent discount of `sale` relative to `price`.
///
/// Returns 0 when there is no sale price or the list price is not positive.
#[must_use]
pub fn discount_percentage(price: f64, sale: Option<f64>) -> i32 {
    match sale {
        Some(sale) if price > 0.0 => {
            // Cast safety: rounded percentage of two catalog prices, far inside i32.
            #[allow(clippy::cast_possible_truncation)]
            let percent = ((price - sale) / price * 100.0).round() as i32;
            percent
        }
        _ => 0,
    }
}

/// List and sale prices of one product for both tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPrices {
    /// List price for licensees
    pub licensed: f64,
    /// List price for unlicensed customers
    pub unlicensed: f64,
    /// Sale price for licensees
    pub sale_licensed: Option<f64>,
    /// Sale price for unlicensed customers
    pub sale_unlicensed: Option<f64>,
}

/// Values derived from a product's prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedPricing {
    /// Discount for licensees, whole percent
    pub licensed_discount: i32,
    /// Discount for unlicensed customers, whole percent
    pub unlicensed_discount: i32,
    /// Either tier's sale price is strictly below its list price
    pub on_sale: bool,
}

impl TierPrices {
    /// Reads the four price columns of a stored product.
    #[must_use]
    pub const fn of(product: &product::Model) -> Self {
        Self {
            licensed: product.licensed_price,
            unlicensed: product.unlicensed_price,
            sale_licensed: product.sale_licensed_price,
            sale_unlicensed: product.sale_unlicensed_price,
        }
    }

    /// Computes both tiers' discounts and the `on_sale` flag independently.
    #[must_use]
    pub fn derive(&self) -> DerivedPricing {
        let below = |price: f64, sale: Option<f64>| sale.is_some_and(|s| s < price);
        DerivedPricing {
            licensed_discount: discount_percentage(self.licensed, self.sale_licensed),
            unlicensed_discount: discount_percentage(self.unlicensed, self.sale_unlicensed),
            on_sale: below(self.licensed, self.sale_licensed)
                || below(self.unlicensed, self.sale_unlicensed),
        }
    }

    /// Unit price a customer of `tier` pays: the tier's sale price if set, else its list price.
    #[must_use]
    pub fn for_tier(&self, tier: CustomerType) -> f64 {
        match tier {
            CustomerType::Licensee => self.sale_licensed.unwrap_or(self.licensed),
            CustomerType::Unlicensed => self.sale_unlicensed.unwrap_or(self.unlicensed),
        }
    }
}

/// Unit price of `product` for a buyer of the given tier.
#[must_use]
pub fn unit_price(product: &product::Model, tier: CustomerType) -> f64 {
    TierPrices::of(product).for_tier(tier)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn prices(
        licensed: f64,
        unlicensed: f64,
        sale_licensed: Option<f64>,
        sale_unlicensed: Option<f64>,
    ) -> TierPrices {
        TierPrices {
            licensed,
            unlicensed,
            sale_licensed,
            sale_unlicensed,
        }
    }

    #[test]
    fn test_stock_status_boundaries() {
        assert_eq!(stock_status_for(-3), StockStatus::OutOfStock);
        assert_eq!(stock_status_for(0), StockStatus::OutOfStock);
        assert_eq!(stock_status_for(1), StockStatus::LowStock);
        assert_eq!(stock_status_for(9), StockStatus::LowStock);
        assert_eq!(stock_status_for(10), StockStatus::InStock);
        assert_eq!(stock_status_for(500), StockStatus::InStock);
    }

    #[test]
    fn test_unlicensed_sale_sets_discount_and_on_sale() {
        let derived = prices(90.0, 100.0, None, Some(80.0)).derive();
        assert_eq!(derived.unlicensed_discount, 20);
        assert_eq!(derived.licensed_discount, 0);
        assert!(derived.on_sale);
    }

    #[test]
    fn test_discount_rounds_to_whole_percent() {
        assert_eq!(discount_percentage(30.0, Some(20.0)), 33);
        assert_eq!(discount_percentage(3.0, Some(1.0)), 67);
    }

    #[test]
    fn test_discount_without_sale_or_price() {
        assert_eq!(discount_percentage(50.0, None), 0);
        assert_eq!(discount_percentage(0.0, Some(10.0)), 0);
    }

    #[test]
    fn test_sale_equal_to_price_is_not_on_sale() {
        let derived = prices(50.0, 60.0, Some(50.0), Some(60.0)).derive();
        assert!(!derived.on_sale);
        assert_eq!(derived.licensed_discount, 0);
    }

    #[test]
    fn test_tier_price_selection() {
        let p = prices(50.0, 60.0, None, None);
        assert_eq!(p.for_tier(CustomerType::Licensee), 50.0);
        assert_eq!(p.for_tier(CustomerType::Unlicensed), 60.0);

        let on_sale = prices(50.0, 60.0, Some(45.0), None);
        assert_eq!(on_sale.for_tier(CustomerType::Licensee), 45.0);
        assert_eq!(on_sale.for_tier(CustomerType::Unlicensed), 60.0);
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(10.005_1), 10.01);
        assert_eq!(round_currency(0.1 + 0.2), 0.3);
        assert_eq!(round_currency(120.0), 120.0);
    }
}
