use regex::Regex;

use crate::domain::model::DayPrice;

/// Parses raw calendar-cell text such as `"1\n4.5k +$19"` or `"9\n20k +$6"`.
///
/// A cell is an offer only if it starts with a day number and carries a
/// `<n>k` points token somewhere; the `+ $<amount>` tax is optional. Cells
/// that don't match (disabled days, sold-out days, decorations) parse to
/// `None` and are skipped by callers. Day-in-month bounds are the caller's
/// concern: calendar grids render stray cells from adjacent months.
pub struct CellParser {
    day_re: Regex,
    points_re: Regex,
    tax_re: Regex,
}

impl CellParser {
    pub fn new() -> Self {
        Self {
            day_re: Regex::new(r"^(\d{1,2})").unwrap(),
            points_re: Regex::new(r"(?i)([\d.]+)k").unwrap(),
            tax_re: Regex::new(r"\+\s*\$(\d+(?:\.\d{1,2})?)").unwrap(),
        }
    }

    pub fn parse(&self, text: &str) -> Option<DayPrice> {
        let text = text.trim();

        let day = self.day_re.captures(text)?[1].parse::<u32>().ok()?;

        // "4.5k" -> 4500, truncated. A mantissa that isn't a valid decimal
        // (e.g. "4.5.2k") rejects the whole cell.
        let mantissa: f64 = self.points_re.captures(text)?[1].parse().ok()?;
        let points = (mantissa * 1000.0) as u32;

        let tax = self
            .tax_re
            .captures(text)
            .map(|caps| format!("${}", &caps[1]));

        Some(DayPrice { day, points, tax })
    }
}

impl Default for CellParser {
    fn default() -> Self {
        Self::new()
    }
}
