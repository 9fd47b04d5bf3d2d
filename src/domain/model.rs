use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::error::{EtlError, Result};

/// One parsed offer cell: day of month, points price, optional tax string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPrice {
    pub day: u32,
    pub points: u32,
    pub tax: Option<String>,
}

/// One calendar month of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthSlot {
    pub year: i32,
    pub month: u32,
}

impl MonthSlot {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Sheet-style label, e.g. "Mar 2026".
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(d) => d.format("%b %Y").to_string(),
            None => format!("{}-{:02}", self.year, self.month),
        }
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.next();
        match (
            NaiveDate::from_ymd_opt(self.year, self.month, 1),
            NaiveDate::from_ymd_opt(next.year, next.month, 1),
        ) {
            (Some(first), Some(after)) => after.signed_duration_since(first).num_days() as u32,
            _ => 31,
        }
    }

    pub fn prev(&self) -> MonthSlot {
        if self.month == 1 {
            MonthSlot::new(self.year - 1, 12)
        } else {
            MonthSlot::new(self.year, self.month - 1)
        }
    }

    pub fn next(&self) -> MonthSlot {
        if self.month == 12 {
            MonthSlot::new(self.year + 1, 1)
        } else {
            MonthSlot::new(self.year, self.month + 1)
        }
    }

    /// First-of-month date string the calendar endpoint expects.
    pub fn first_day(&self) -> String {
        format!("{}-{:02}-01", self.year, self.month)
    }
}

/// Ordered list of months to scan. The month before the first slot and the
/// month after the last exist only as always-empty output columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWindow {
    slots: Vec<MonthSlot>,
}

impl ScanWindow {
    pub fn new(slots: Vec<MonthSlot>) -> Result<Self> {
        if slots.is_empty() {
            return Err(EtlError::ConfigValidationError {
                field: "window.months".to_string(),
                message: "The scan window must contain at least one month".to_string(),
            });
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[MonthSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn boundary_before(&self) -> MonthSlot {
        self.slots[0].prev()
    }

    pub fn boundary_after(&self) -> MonthSlot {
        self.slots[self.slots.len() - 1].next()
    }
}

/// Raw per-month day prices for one route direction. Built during extract,
/// read once by the reducer, then discarded. `months` is aligned
/// index-for-index with the window slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteCache {
    pub origin: String,
    pub destination: String,
    pub months: Vec<Vec<DayPrice>>,
}

/// Everything fetched for one configured airport: the route to the
/// destination (`D` columns) and back from it (`R` columns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirportScrape {
    pub code: String,
    pub max_points: u32,
    pub outbound: RouteCache,
    pub inbound: RouteCache,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDays {
    pub label: String,
    pub days: Vec<u32>,
}

/// Reduced result for one route direction. Every day listed in `month_days`
/// was priced at exactly `absolute_minimum`; when the minimum is `None` all
/// day lists are empty and no tax is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResult {
    pub month_days: Vec<MonthDays>,
    pub absolute_minimum: Option<u32>,
    pub typical_tax: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub destination: String,
    pub airports: usize,
    pub routes_with_availability: usize,
    pub offers_cached: usize,
}

/// Transform output: the finished table plus its CSV rendering.
#[derive(Debug, Clone)]
pub struct TableResult {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub csv: String,
    pub summary: RunSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_slot_label() {
        assert_eq!(MonthSlot::new(2026, 3).label(), "Mar 2026");
        assert_eq!(MonthSlot::new(2027, 1).label(), "Jan 2027");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(MonthSlot::new(2026, 3).days_in_month(), 31);
        assert_eq!(MonthSlot::new(2026, 4).days_in_month(), 30);
        assert_eq!(MonthSlot::new(2026, 2).days_in_month(), 28);
        assert_eq!(MonthSlot::new(2028, 2).days_in_month(), 29);
        assert_eq!(MonthSlot::new(2026, 12).days_in_month(), 31);
    }

    #[test]
    fn test_window_boundaries_cross_year() {
        let window = ScanWindow::new(vec![
            MonthSlot::new(2026, 3),
            MonthSlot::new(2026, 12),
            MonthSlot::new(2027, 1),
        ])
        .unwrap();
        assert_eq!(window.boundary_before(), MonthSlot::new(2026, 2));
        assert_eq!(window.boundary_after(), MonthSlot::new(2027, 2));
    }

    #[test]
    fn test_empty_window_rejected() {
        assert!(ScanWindow::new(Vec::new()).is_err());
    }
}
