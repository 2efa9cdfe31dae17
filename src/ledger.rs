//! Installment planning for split ledger entries.
//!
//! A total is divided evenly across `n` monthly installments. Amounts are
//! plain `total / n`; no installment absorbs the rounding remainder.

use chrono::{DateTime, Datelike, Months, Utc};
use thiserror::Error;

pub const MAX_INSTALLMENTS: u32 = 360;

/// Last year that still renders as a four-digit RFC 3339 timestamp.
pub const MAX_YEAR: i32 = 9999;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("an installment split needs at least 2 installments, got {0}")]
    TooFewInstallments(u32),
    #[error("at most {MAX_INSTALLMENTS} installments are allowed, got {0}")]
    TooManyInstallments(u32),
    #[error("installment {0} falls outside the supported date range")]
    DateOutOfRange(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Installment {
    /// 1-based position within the split.
    pub number: u32,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

pub fn plan_installments(
    total: f64,
    count: u32,
    start: DateTime<Utc>,
) -> Result<Vec<Installment>, LedgerError> {
    if count < 2 {
        return Err(LedgerError::TooFewInstallments(count));
    }
    if count > MAX_INSTALLMENTS {
        return Err(LedgerError::TooManyInstallments(count));
    }

    let amount = total / f64::from(count);

    (1..=count)
        .map(|number| {
            let date = start
                .checked_add_months(Months::new(number - 1))
                .filter(|date| date.year() <= MAX_YEAR)
                .ok_or(LedgerError::DateOutOfRange(number))?;
            Ok(Installment {
                number,
                amount,
                date,
            })
        })
        .collect()
}

/// Description carried by installment `number` of `count`.
pub fn installment_description(base: &str, number: u32, count: u32) -> String {
    format!("{base} ({number}/{count})")
}
