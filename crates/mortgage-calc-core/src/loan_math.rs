//! Closed-form loan arithmetic shared by every calculator.
//!
//! Rates come in as lender-quoted percentages (6.5 = 6.5%) and are converted
//! to per-payment decimals here. Nothing in this module rounds except
//! [`to_dollars`] and [`round_down_to_hundred`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::MortgageError;
use crate::types::{Money, Percent, Rate};
use crate::MortgageResult;

/// Loan-to-value above which private mortgage insurance is charged.
pub const PMI_LTV_THRESHOLD: Decimal = dec!(80);

pub const MONTHS_PER_YEAR: u32 = 12;

const HUNDRED: Decimal = dec!(100);

fn compound(base: Decimal, periods: u64, context: &str) -> MortgageResult<Decimal> {
    base.checked_powu(periods).ok_or_else(|| {
        MortgageError::FinancialImpossibility(format!(
            "{context}: compounding overflowed after {periods} periods"
        ))
    })
}

/// Effective per-payment rate for a nominal annual rate.
///
/// `(1 + annual/100/compounds)^(compounds/payments) - 1`. With monthly
/// payments and monthly compounding this is simply `annual / 1200`.
pub fn periodic_rate(
    annual_rate: Percent,
    payments_per_year: u32,
    compounds_per_year: u32,
) -> MortgageResult<Rate> {
    if payments_per_year == 0 {
        return Err(MortgageError::invalid(
            "payments_per_year",
            "Payment frequency must be a positive value",
        ));
    }
    if compounds_per_year == 0 {
        return Err(MortgageError::invalid(
            "compounds_per_year",
            "Compounding frequency must be a positive value",
        ));
    }

    let compounds = Decimal::from(compounds_per_year);
    let base = Decimal::ONE + annual_rate / HUNDRED / compounds;
    let exponent = compounds / Decimal::from(payments_per_year);

    let growth = if exponent.fract().is_zero() {
        let whole = exponent.to_u64().ok_or_else(|| {
            MortgageError::invalid("compounds_per_year", "Compounding exponent out of range")
        })?;
        compound(base, whole, "periodic rate")?
    } else {
        base.checked_powd(exponent).ok_or_else(|| {
            MortgageError::FinancialImpossibility(format!(
                "periodic rate: cannot raise {base} to {exponent}"
            ))
        })?
    };

    Ok(growth - Decimal::ONE)
}

/// Simple monthly rate (`annual / 100 / 12`) used to accrue interest on a
/// running balance.
pub fn simple_monthly_rate(annual_rate: Percent) -> Rate {
    annual_rate / HUNDRED / Decimal::from(MONTHS_PER_YEAR)
}

/// Level annuity payment for `periods` payments at a per-period `rate`.
pub fn level_payment(principal: Money, rate: Rate, periods: u32) -> MortgageResult<Money> {
    if periods == 0 {
        return Err(MortgageError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let factor = compound(Decimal::ONE + rate, periods as u64, "level payment")?;
    let discount = Decimal::ONE - Decimal::ONE / factor;

    if discount.is_zero() {
        return Err(MortgageError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    Ok(principal * (rate / discount))
}

/// Constant periodic principal-and-interest payment.
pub fn payment(
    principal: Money,
    annual_rate: Percent,
    term_years: u32,
    payments_per_year: u32,
    compounds_per_year: u32,
) -> MortgageResult<Money> {
    if term_years == 0 {
        return Err(MortgageError::invalid(
            "term_years",
            "Loan term must be a positive value",
        ));
    }
    let rate = periodic_rate(annual_rate, payments_per_year, compounds_per_year)?;
    let periods = term_years.checked_mul(payments_per_year).ok_or_else(|| {
        MortgageError::invalid("term_years", "Total number of payments is out of range")
    })?;
    level_payment(principal, rate, periods)
}

/// [`payment`] with monthly payments and monthly compounding.
pub fn monthly_payment(principal: Money, annual_rate: Percent, term_years: u32) -> MortgageResult<Money> {
    payment(
        principal,
        annual_rate,
        term_years,
        MONTHS_PER_YEAR,
        MONTHS_PER_YEAR,
    )
}

/// Loan principal a given periodic payment will amortize. Inverse of [`payment`].
pub fn principal_from_payment(
    period_payment: Money,
    annual_rate: Percent,
    term_years: u32,
    payments_per_year: u32,
    compounds_per_year: u32,
) -> MortgageResult<Money> {
    if term_years == 0 || payments_per_year == 0 || compounds_per_year == 0 {
        return Err(MortgageError::invalid(
            "term_years",
            "Term, payment frequency, and compounding frequency must be positive values",
        ));
    }

    let rate = periodic_rate(annual_rate, payments_per_year, compounds_per_year)?;
    let periods = term_years.checked_mul(payments_per_year).ok_or_else(|| {
        MortgageError::invalid("term_years", "Total number of payments is out of range")
    })?;

    if rate.is_zero() {
        return Ok(period_payment * Decimal::from(periods));
    }

    let factor = compound(Decimal::ONE + rate, periods as u64, "principal from payment")?;
    Ok(period_payment * (factor - Decimal::ONE) / (rate * factor))
}

/// [`principal_from_payment`] with monthly payments and monthly compounding.
pub fn monthly_principal_from_payment(
    period_payment: Money,
    annual_rate: Percent,
    term_years: u32,
) -> MortgageResult<Money> {
    principal_from_payment(
        period_payment,
        annual_rate,
        term_years,
        MONTHS_PER_YEAR,
        MONTHS_PER_YEAR,
    )
}

/// Loan-to-value as a percentage.
pub fn loan_to_value(balance: Money, home_value: Money) -> MortgageResult<Percent> {
    if home_value.is_zero() {
        return Err(MortgageError::DivisionByZero {
            context: "loan-to-value (home value is zero)".into(),
        });
    }
    Ok(balance / home_value * HUNDRED)
}

/// Annual PMI premium in dollars; zero when no PMI rate is quoted.
pub fn pmi_annual_amount(balance: Money, annual_pmi: Percent) -> Money {
    if annual_pmi > Decimal::ZERO {
        balance * annual_pmi / HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Whether PMI is charged at the given LTV.
///
/// LTV above 100 is accepted: an underwater loan still carries PMI.
pub fn has_pmi(loan_to_value: Percent, annual_pmi: Percent) -> MortgageResult<bool> {
    if loan_to_value < Decimal::ZERO {
        return Err(MortgageError::invalid(
            "loan_to_value",
            "Loan-to-value cannot be negative",
        ));
    }
    Ok(loan_to_value > PMI_LTV_THRESHOLD && annual_pmi > Decimal::ZERO)
}

/// `floor(amount / 100) * 100`
pub fn round_down_to_hundred(amount: Money) -> Money {
    (amount / HUNDRED).floor() * HUNDRED
}

fn validate_percentage(field: &str, percentage: Percent) -> MortgageResult<()> {
    if percentage < Decimal::ZERO || percentage > HUNDRED {
        return Err(MortgageError::invalid(
            field,
            "Percentage must be between 0 and 100",
        ));
    }
    Ok(())
}

/// Dollar cost of discount points.
pub fn points(principal: Money, points_percent: Percent) -> MortgageResult<Money> {
    validate_percentage("points", points_percent)?;
    Ok(principal * points_percent / HUNDRED)
}

/// Dollar cost of origination fees.
pub fn origination_fees(principal: Money, fee_percent: Percent) -> MortgageResult<Money> {
    validate_percentage("origination_fees", fee_percent)?;
    Ok(principal * fee_percent / HUNDRED)
}

/// Round to cents (banker's rounding) for presentation.
pub fn to_dollars(value: Money) -> Money {
    value.round_dp(2)
}
