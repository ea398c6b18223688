//! Billing periods ("competências").
//!
//! A billing run covers executions in the selected month and the month before it. Requisitions
//! that have not been executed are always in scope.

use crate::requisition::Requisition;
use crate::{OciError, OciResult};
use chrono::Datelike;

/// A calendar month, written `MM/YYYY`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> OciResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(OciError::InvalidPeriod(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: &impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Whether `date` falls in this period or in the month before it.
    pub fn covers(&self, date: &impl Datelike) -> bool {
        let period = Self::of(date);
        period == *self || period == self.previous()
    }
}

impl std::str::FromStr for BillingPeriod {
    type Err = OciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OciError::InvalidPeriod(format!("expected MM/YYYY, got {s:?}"));
        let (month, year) = s.trim().split_once('/').ok_or_else(invalid)?;
        let month = month.trim().parse::<u32>().map_err(|_| invalid())?;
        let year = year.trim().parse::<i32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

/// Every month from the earliest to the latest execution date, ascending.
pub fn available_periods(rows: &[Requisition]) -> Vec<BillingPeriod> {
    let mut executed = rows.iter().filter_map(|r| r.executed_at);
    let Some(first) = executed.next() else {
        return Vec::new();
    };
    let (min, max) = executed.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

    let last = BillingPeriod::of(&max);
    let mut current = BillingPeriod::of(&min);
    let mut periods = vec![current];
    while current < last {
        current = current.next();
        periods.push(current);
    }
    periods
}

/// Keeps unexecuted rows and rows executed within `period` or the month before.
pub fn filter_by_period(rows: Vec<Requisition>, period: BillingPeriod) -> Vec<Requisition> {
    let before = rows.len();
    let kept: Vec<Requisition> = rows
        .into_iter()
        .filter(|r| r.executed_at.map_or(true, |d| period.covers(&d)))
        .collect();
    tracing::info!(
        "billing period {period}: kept {} of {} requisitions",
        kept.len(),
        before
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requisition::{ingest, RawRequisition};
    use crate::CoreConfig;

    fn rows(executions: &[Option<&str>]) -> Vec<Requisition> {
        let raw = executions
            .iter()
            .enumerate()
            .map(|(i, executed)| RawRequisition {
                record_id: Some(i.to_string()),
                patient_id: Some("P1".into()),
                procedure_code: Some("A".into()),
                executed_at: executed.map(str::to_string),
                ..Default::default()
            })
            .collect();
        ingest(raw, &CoreConfig::default())
    }

    #[test]
    fn parses_and_displays_mm_yyyy() {
        let period: BillingPeriod = "3/2025".parse().expect("parse period");
        assert_eq!(period.month(), 3);
        assert_eq!(period.year(), 2025);
        assert_eq!(period.to_string(), "03/2025");
    }

    #[test]
    fn rejects_malformed_periods() {
        for input in ["2025", "13/2025", "00/2025", "ab/2025", "03/"] {
            let err = input.parse::<BillingPeriod>().expect_err("malformed period");
            assert!(matches!(err, OciError::InvalidPeriod(_)), "{input}");
        }
    }

    #[test]
    fn previous_wraps_january() {
        let jan = BillingPeriod::new(2025, 1).expect("valid period");
        assert_eq!(jan.previous(), BillingPeriod::new(2024, 12).expect("valid period"));
    }

    #[test]
    fn filter_keeps_current_previous_and_unexecuted() {
        let input = rows(&[
            Some("2025-01-15"),
            Some("2024-12-31"),
            Some("2024-11-30"),
            Some("2025-02-01"),
            None,
        ]);
        let period = BillingPeriod::new(2025, 1).expect("valid period");

        let kept: Vec<String> = filter_by_period(input, period)
            .into_iter()
            .map(|r| r.record_id)
            .collect();
        assert_eq!(kept, vec!["0", "1", "4"]);
    }

    #[test]
    fn available_periods_span_min_to_max() {
        let input = rows(&[Some("2025-02-10"), None, Some("2024-11-03"), Some("2024-12-24")]);
        let periods: Vec<String> = available_periods(&input)
            .iter()
            .map(BillingPeriod::to_string)
            .collect();
        assert_eq!(periods, vec!["11/2024", "12/2024", "01/2025", "02/2025"]);
    }

    #[test]
    fn no_executions_means_no_periods() {
        assert!(available_periods(&rows(&[None, None])).is_empty());
    }
}
