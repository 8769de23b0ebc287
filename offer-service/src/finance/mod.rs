//! Financial derivation for offers: margin/coefficient arithmetic and
//! equipment-list aggregation.

pub mod aggregator;
pub mod calculator;

pub use aggregator::{totals, AggregatableLine, EquipmentTotals};
pub use calculator::{
    financed_amount, margin_amount, monthly_payment, selling_price, FinanceError,
    DEFAULT_COEFFICIENT,
};
