//! Amortization engine: period-by-period payment schedule with PMI tagging.
//!
//! Interest accrues on the unrounded running balance and the totals are summed
//! unrounded; only the per-period fields and the summary are rounded to cents.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::loan_math::{
    has_pmi, level_payment, loan_to_value, periodic_rate, pmi_annual_amount,
    simple_monthly_rate, to_dollars, MONTHS_PER_YEAR,
};
use crate::types::{Money, Percent, Rate};
use crate::MortgageResult;

/// One payment period of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationPeriod {
    /// 1-based period number.
    pub period: u32,
    pub date: NaiveDate,
    /// Interest portion of the payment.
    pub interest: Money,
    /// Principal portion of the payment.
    pub principal: Money,
    /// Balance after the payment is applied.
    pub balance: Money,
    /// PMI charged with this payment, zero once PMI has been removed.
    pub pmi: Money,
}

/// Loan amortization summary and full schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amortization {
    /// Opening principal.
    pub principal: Money,
    /// Monthly interest rate as a decimal (0.005 = 0.5%).
    pub periodic_interest: Rate,
    pub periods: u32,
    /// Constant principal-and-interest payment.
    pub periodic_payment: Money,
    pub total_interest: Money,
    pub total_payment: Money,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Number of periods carrying a positive PMI charge.
    pub months_with_pmi: u32,
    pub schedule: Vec<AmortizationPeriod>,
}

impl Amortization {
    /// Balance after `month` payments. Month 0 is the opening principal; past
    /// the end of the schedule the loan is paid off.
    pub fn balance_after(&self, month: u32) -> Money {
        if month == 0 {
            return to_dollars(self.principal);
        }
        self.schedule
            .get((month - 1) as usize)
            .map(|p| p.balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Interest paid in periods `after < period <= through`.
    pub fn interest_between(&self, after: u32, through: u32) -> Money {
        self.schedule
            .iter()
            .filter(|p| p.period > after && p.period <= through)
            .map(|p| p.interest)
            .sum()
    }

    /// Total PMI charged across the schedule.
    pub fn total_pmi(&self) -> Money {
        self.schedule.iter().map(|p| p.pmi).sum()
    }

    /// Date of the last payment that carries PMI.
    pub fn last_pmi_date(&self) -> Option<NaiveDate> {
        self.schedule
            .iter()
            .rev()
            .find(|p| p.pmi > Decimal::ZERO)
            .map(|p| p.date)
    }

    /// Overwrite the PMI column and keep `months_with_pmi` consistent with it.
    pub fn retag_pmi<F>(&mut self, mut tag: F) -> MortgageResult<()>
    where
        F: FnMut(&AmortizationPeriod) -> MortgageResult<Money>,
    {
        for period in self.schedule.iter_mut() {
            let pmi = tag(period)?;
            period.pmi = pmi;
        }
        self.months_with_pmi = count_pmi_months(&self.schedule);
        Ok(())
    }
}

fn count_pmi_months(schedule: &[AmortizationPeriod]) -> u32 {
    schedule.iter().filter(|p| p.pmi > Decimal::ZERO).count() as u32
}

pub fn add_months(date: NaiveDate, months: u32) -> MortgageResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| MortgageError::DateError(format!("{date} + {months} months is out of range")))
}

pub fn sub_months(date: NaiveDate, months: u32) -> MortgageResult<NaiveDate> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| MortgageError::DateError(format!("{date} - {months} months is out of range")))
}

/// Build the monthly schedule for a fully amortizing fixed-rate loan.
///
/// Monthly PMI is fixed from the opening principal and charged while the
/// post-payment LTV stays above the PMI threshold.
pub fn build_amortization(
    principal: Money,
    annual_rate: Percent,
    periods: u32,
    start_date: NaiveDate,
    home_value: Money,
    annual_pmi: Percent,
) -> MortgageResult<Amortization> {
    if periods == 0 {
        return Err(MortgageError::invalid(
            "periods",
            "Amortization requires at least one period",
        ));
    }

    let periodic_interest = simple_monthly_rate(annual_rate);
    let periodic_payment = level_payment(
        principal,
        periodic_rate(annual_rate, MONTHS_PER_YEAR, MONTHS_PER_YEAR)?,
        periods,
    )?;

    let starts_with_pmi = has_pmi(loan_to_value(principal, home_value)?, annual_pmi)?;
    let monthly_pmi = if starts_with_pmi {
        to_dollars(pmi_annual_amount(principal, annual_pmi) / dec!(12))
    } else {
        Decimal::ZERO
    };

    let mut balance = principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_payment = Decimal::ZERO;
    let mut schedule = Vec::with_capacity(periods as usize);

    for i in 0..periods {
        let interest = balance * periodic_interest;
        let principal_portion = periodic_payment - interest;
        balance = balance + interest - periodic_payment;

        total_interest += interest;
        total_payment += periodic_payment;

        let pmi = if monthly_pmi > Decimal::ZERO
            && balance > Decimal::ZERO
            && has_pmi(loan_to_value(balance, home_value)?, annual_pmi)?
        {
            monthly_pmi
        } else {
            Decimal::ZERO
        };

        schedule.push(AmortizationPeriod {
            period: i + 1,
            date: add_months(start_date, i)?,
            interest: to_dollars(interest),
            principal: to_dollars(principal_portion),
            balance: to_dollars(balance),
            pmi,
        });
    }

    let end_date = schedule.last().map(|p| p.date).unwrap_or(start_date);
    let months_with_pmi = count_pmi_months(&schedule);

    Ok(Amortization {
        principal,
        periodic_interest,
        periods,
        periodic_payment: to_dollars(periodic_payment),
        total_interest: to_dollars(total_interest),
        total_payment: to_dollars(total_payment),
        start_date,
        end_date,
        months_with_pmi,
        schedule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn jan_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn pmi_loan() -> Amortization {
        build_amortization(
            dec!(300_000),
            dec!(6.5),
            360,
            jan_first(),
            dec!(350_000),
            dec!(1),
        )
        .unwrap()
    }

    #[test]
    fn test_schedule_length_and_dates() {
        let a = pmi_loan();
        assert_eq!(a.schedule.len(), 360);
        assert_eq!(a.periods, 360);
        assert_eq!(a.start_date, jan_first());
        assert_eq!(a.schedule[0].date, jan_first());
        assert_eq!(a.end_date, NaiveDate::from_ymd_opt(2054, 12, 1).unwrap());
        assert_eq!(a.schedule.last().unwrap().period, 360);
    }

    #[test]
    fn test_month_end_dates_clamp() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let a = build_amortization(dec!(100_000), dec!(5), 12, start, dec!(200_000), dec!(0))
            .unwrap();
        assert_eq!(a.schedule[1].date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(a.end_date, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_principal_portions_sum_to_principal() {
        let a = pmi_loan();
        let repaid: Decimal = a.schedule.iter().map(|p| p.principal).sum();
        assert_close(repaid, dec!(300_000), dec!(1), "sum of principal portions");
        assert_close(
            a.schedule.last().unwrap().balance,
            Decimal::ZERO,
            dec!(0.01),
            "final balance",
        );
    }

    #[test]
    fn test_totals() {
        let a = pmi_loan();
        assert_eq!(a.periodic_payment, dec!(1896.20));
        assert_close(a.total_payment, dec!(682_633.47), dec!(0.01), "total payment");
        assert_close(a.total_interest, dec!(382_633.47), dec!(0.01), "total interest");
        assert_close(
            a.total_payment - a.total_interest,
            dec!(300_000),
            dec!(0.02),
            "payment less interest",
        );
    }

    #[test]
    fn test_pmi_removed_once_and_never_returns() {
        let a = pmi_loan();
        assert_eq!(a.schedule[0].pmi, dec!(250));
        assert_eq!(a.months_with_pmi, 62);

        let first_without = a
            .schedule
            .iter()
            .position(|p| p.pmi.is_zero())
            .expect("PMI should drop off");
        assert!(a.schedule[first_without..].iter().all(|p| p.pmi.is_zero()));
        assert_eq!(a.last_pmi_date(), Some(a.schedule[first_without - 1].date));
        assert_eq!(a.total_pmi(), dec!(250) * Decimal::from(62));
    }

    #[test]
    fn test_no_pmi_at_exactly_eighty_ltv() {
        let a = build_amortization(
            dec!(280_000),
            dec!(6.5),
            360,
            jan_first(),
            dec!(350_000),
            dec!(1),
        )
        .unwrap();
        assert_eq!(a.months_with_pmi, 0);
        assert_eq!(a.last_pmi_date(), None);
    }

    #[test]
    fn test_zero_periods_rejected() {
        let result = build_amortization(
            dec!(100_000),
            dec!(5),
            0,
            jan_first(),
            dec!(200_000),
            Decimal::ZERO,
        );
        assert!(matches!(result, Err(MortgageError::InvalidInput { .. })));
    }

    #[test]
    fn test_balance_after_and_interest_window() {
        let a = pmi_loan();
        assert_eq!(a.balance_after(0), dec!(300_000));
        assert_eq!(a.balance_after(12), a.schedule[11].balance);
        assert_eq!(a.balance_after(361), Decimal::ZERO);

        let first_year: Decimal = a.schedule[..12].iter().map(|p| p.interest).sum();
        assert_eq!(a.interest_between(0, 12), first_year);
        assert_eq!(a.interest_between(12, 12), Decimal::ZERO);
    }

    #[test]
    fn test_retag_pmi_recounts_months() {
        let mut a = pmi_loan();
        a.retag_pmi(|p| Ok(if p.period <= 10 { dec!(99) } else { Decimal::ZERO }))
            .unwrap();
        assert_eq!(a.months_with_pmi, 10);
        assert_eq!(a.schedule[9].pmi, dec!(99));
        assert_eq!(a.schedule[10].pmi, Decimal::ZERO);
    }

    #[test]
    fn test_month_arithmetic() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(sub_months(d, 1).unwrap(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(add_months(d, 24).unwrap(), NaiveDate::from_ymd_opt(2027, 3, 31).unwrap());
    }
}
