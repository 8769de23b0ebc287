//! Margin and coefficient arithmetic.
//!
//! All results pass through `service_core::money::round_cents`, the single
//! two-decimal rounding point for the platform. Negative inputs fail fast
//! instead of propagating incorrect totals.

use rust_decimal::Decimal;
use service_core::money::round_cents;
use thiserror::Error;

/// Multiplier applied when no financing partner supplies one. Business-policy
/// constant, not derived from a rate table.
pub const DEFAULT_COEFFICIENT: Decimal = Decimal::from_parts(327, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinanceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<FinanceError> for service_core::error::AppError {
    fn from(err: FinanceError) -> Self {
        service_core::error::AppError::BadRequest(anyhow::anyhow!(err.to_string()))
    }
}

/// `purchase_price × (1 + margin_percent / 100)`.
pub fn selling_price(
    purchase_price: Decimal,
    margin_percent: Decimal,
) -> Result<Decimal, FinanceError> {
    if purchase_price.is_sign_negative() {
        return Err(FinanceError::InvalidArgument(format!(
            "purchase price must not be negative, got {}",
            purchase_price
        )));
    }
    if margin_percent.is_sign_negative() {
        return Err(FinanceError::InvalidArgument(format!(
            "margin percent must not be negative, got {}",
            margin_percent
        )));
    }

    Ok(round_cents(
        purchase_price * (Decimal::ONE + margin_percent / Decimal::ONE_HUNDRED),
    ))
}

/// Implied financed amount: `monthly_payment × 100 / coefficient`.
pub fn financed_amount(
    monthly_payment: Decimal,
    coefficient: Decimal,
) -> Result<Decimal, FinanceError> {
    if monthly_payment.is_sign_negative() {
        return Err(FinanceError::InvalidArgument(format!(
            "monthly payment must not be negative, got {}",
            monthly_payment
        )));
    }
    ensure_positive_coefficient(coefficient)?;

    Ok(round_cents(
        monthly_payment * Decimal::ONE_HUNDRED / coefficient,
    ))
}

/// Inverse derivation: `financed_amount × coefficient / 100`.
pub fn monthly_payment(
    financed_amount: Decimal,
    coefficient: Decimal,
) -> Result<Decimal, FinanceError> {
    if financed_amount.is_sign_negative() {
        return Err(FinanceError::InvalidArgument(format!(
            "financed amount must not be negative, got {}",
            financed_amount
        )));
    }
    ensure_positive_coefficient(coefficient)?;

    Ok(round_cents(
        financed_amount * coefficient / Decimal::ONE_HUNDRED,
    ))
}

/// Margin in currency for one line:
/// `purchase_price × quantity × margin_percent / 100`.
pub fn margin_amount(
    purchase_price: Decimal,
    quantity: i32,
    margin_percent: Decimal,
) -> Result<Decimal, FinanceError> {
    if purchase_price.is_sign_negative() {
        return Err(FinanceError::InvalidArgument(format!(
            "purchase price must not be negative, got {}",
            purchase_price
        )));
    }
    if quantity < 1 {
        return Err(FinanceError::InvalidArgument(format!(
            "quantity must be at least 1, got {}",
            quantity
        )));
    }
    if margin_percent.is_sign_negative() {
        return Err(FinanceError::InvalidArgument(format!(
            "margin percent must not be negative, got {}",
            margin_percent
        )));
    }

    Ok(round_cents(
        purchase_price * Decimal::from(quantity) * margin_percent / Decimal::ONE_HUNDRED,
    ))
}

fn ensure_positive_coefficient(coefficient: Decimal) -> Result<(), FinanceError> {
    if coefficient <= Decimal::ZERO {
        return Err(FinanceError::InvalidArgument(format!(
            "coefficient must be positive, got {}",
            coefficient
        )));
    }
    Ok(())
}
