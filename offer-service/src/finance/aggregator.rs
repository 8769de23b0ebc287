//! Offer-level totals across a list of equipment lines.

use rust_decimal::Decimal;
use serde::Serialize;
use service_core::money::round_cents;

use crate::models::{CreateEquipmentLine, EquipmentLine};

/// Line shape consumed by the aggregator, implemented by both stored lines
/// and not-yet-persisted wizard input.
pub trait AggregatableLine {
    fn purchase_price(&self) -> Decimal;
    fn quantity(&self) -> i32;
    fn margin_percent(&self) -> Decimal;
    fn monthly_payment_total(&self) -> Decimal;
}

impl AggregatableLine for EquipmentLine {
    fn purchase_price(&self) -> Decimal {
        self.purchase_price
    }
    fn quantity(&self) -> i32 {
        self.quantity
    }
    fn margin_percent(&self) -> Decimal {
        self.margin_percent
    }
    fn monthly_payment_total(&self) -> Decimal {
        self.monthly_payment_total
    }
}

impl AggregatableLine for CreateEquipmentLine {
    fn purchase_price(&self) -> Decimal {
        self.purchase_price
    }
    fn quantity(&self) -> i32 {
        self.quantity
    }
    fn margin_percent(&self) -> Decimal {
        self.margin_percent
    }
    fn monthly_payment_total(&self) -> Decimal {
        self.monthly_payment_total
    }
}

/// Aggregate totals for an equipment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipmentTotals {
    pub total_quantity: i32,
    pub total_purchase_price: Decimal,
    pub total_monthly_payment: Decimal,
    pub total_margin: Decimal,
}

impl EquipmentTotals {
    /// Margin shown to the user: a caller-supplied override takes precedence
    /// over the computed total.
    pub fn display_margin(&self, margin_with_difference: Option<Decimal>) -> Decimal {
        margin_with_difference.unwrap_or(self.total_margin)
    }
}

/// Sums per-line purchase price, margin and monthly payment.
///
/// `monthly_payment_total` is already a per-line total and is summed as-is,
/// never re-multiplied by quantity. An empty list yields all zeros.
pub fn totals<L: AggregatableLine>(lines: &[L]) -> EquipmentTotals {
    let mut total_quantity = 0i32;
    let mut total_purchase_price = Decimal::ZERO;
    let mut total_monthly_payment = Decimal::ZERO;
    let mut total_margin = Decimal::ZERO;

    for line in lines {
        let quantity = Decimal::from(line.quantity());
        total_quantity += line.quantity();
        total_purchase_price += line.purchase_price() * quantity;
        total_monthly_payment += line.monthly_payment_total();
        total_margin += line.purchase_price() * quantity * line.margin_percent()
            / Decimal::ONE_HUNDRED;
    }

    EquipmentTotals {
        total_quantity,
        total_purchase_price: round_cents(total_purchase_price),
        total_monthly_payment: round_cents(total_monthly_payment),
        total_margin: round_cents(total_margin),
    }
}
