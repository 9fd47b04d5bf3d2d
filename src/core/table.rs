use crate::core::reducer::{compress_days, format_points};
use crate::domain::model::{RouteResult, ScanWindow};
use crate::utils::error::{EtlError, Result};

/// Assembles the per-airport rows into the sheet's fixed column order:
/// identity columns, a `D`/`R` pair per month (boundary months included,
/// always empty), then the four points/taxes summary columns. Absent values
/// are empty strings, never a placeholder.
pub struct TableBuilder<'a> {
    destination: &'a str,
    window: &'a ScanWindow,
}

impl<'a> TableBuilder<'a> {
    pub fn new(destination: &'a str, window: &'a ScanWindow) -> Self {
        Self {
            destination,
            window,
        }
    }

    pub fn header(&self) -> Vec<String> {
        let mut columns = vec![
            "To".to_string(),
            "From".to_string(),
            "Alt Origins".to_string(),
        ];
        push_month_pair(&mut columns, &self.window.boundary_before().label());
        for slot in self.window.slots() {
            push_month_pair(&mut columns, &slot.label());
        }
        push_month_pair(&mut columns, &self.window.boundary_after().label());
        columns.push(format!("Points (To {})", self.destination));
        columns.push(format!("Points (From {})", self.destination));
        columns.push(format!("Taxes (To {})", self.destination));
        columns.push(format!("Taxes (From {})", self.destination));
        columns
    }

    pub fn row(&self, origin: &str, outbound: &RouteResult, inbound: &RouteResult) -> Vec<String> {
        let mut row = vec![
            self.destination.to_string(),
            origin.to_string(),
            String::new(),
        ];

        // Boundary month before the window: template placeholder, never data
        row.push(String::new());
        row.push(String::new());

        for index in 0..self.window.len() {
            row.push(compressed_days(outbound, index));
            row.push(compressed_days(inbound, index));
        }

        row.push(String::new());
        row.push(String::new());

        row.push(formatted_minimum(outbound));
        row.push(formatted_minimum(inbound));
        row.push(outbound.typical_tax.clone().unwrap_or_default());
        row.push(inbound.typical_tax.clone().unwrap_or_default());
        row
    }
}

fn push_month_pair(columns: &mut Vec<String>, label: &str) {
    columns.push(format!("{} D", label));
    columns.push(format!("{} R", label));
}

fn compressed_days(result: &RouteResult, month_index: usize) -> String {
    result
        .month_days
        .get(month_index)
        .map(|month| compress_days(&month.days))
        .unwrap_or_default()
}

fn formatted_minimum(result: &RouteResult) -> String {
    result
        .absolute_minimum
        .map(format_points)
        .unwrap_or_default()
}

/// Renders header and rows through the CSV writer into one string.
pub fn render_csv(header: &[String], rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("CSV writer flush failed: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("CSV output was not valid UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MonthDays, MonthSlot};

    fn window() -> ScanWindow {
        ScanWindow::new(vec![MonthSlot::new(2026, 3), MonthSlot::new(2026, 4)]).unwrap()
    }

    fn route(days: Vec<(&str, Vec<u32>)>, minimum: Option<u32>, tax: Option<&str>) -> RouteResult {
        RouteResult {
            month_days: days
                .into_iter()
                .map(|(label, days)| MonthDays {
                    label: label.to_string(),
                    days,
                })
                .collect(),
            absolute_minimum: minimum,
            typical_tax: tax.map(str::to_string),
        }
    }

    #[test]
    fn test_header_order_matches_template() {
        let window = window();
        let builder = TableBuilder::new("PHX", &window);
        assert_eq!(
            builder.header(),
            vec![
                "To",
                "From",
                "Alt Origins",
                "Feb 2026 D",
                "Feb 2026 R",
                "Mar 2026 D",
                "Mar 2026 R",
                "Apr 2026 D",
                "Apr 2026 R",
                "May 2026 D",
                "May 2026 R",
                "Points (To PHX)",
                "Points (From PHX)",
                "Taxes (To PHX)",
                "Taxes (From PHX)",
            ]
        );
    }

    #[test]
    fn test_row_with_availability() {
        let window = window();
        let builder = TableBuilder::new("PHX", &window);

        let outbound = route(
            vec![("Mar 2026", vec![1, 2, 3, 9]), ("Apr 2026", vec![])],
            Some(4500),
            Some("$19"),
        );
        let inbound = route(
            vec![("Mar 2026", vec![]), ("Apr 2026", vec![5])],
            Some(5000),
            Some("$6"),
        );

        let row = builder.row("DEN", &outbound, &inbound);
        assert_eq!(
            row,
            vec![
                "PHX", "DEN", "", "", "", "1-3,9", "", "", "5", "", "", "4.5k", "5k", "$19", "$6",
            ]
        );
    }

    #[test]
    fn test_row_without_availability_is_all_empty() {
        let window = window();
        let builder = TableBuilder::new("PHX", &window);

        let empty = route(
            vec![("Mar 2026", vec![]), ("Apr 2026", vec![])],
            None,
            None,
        );
        let row = builder.row("XNA", &empty, &empty);

        assert_eq!(row[0], "PHX");
        assert_eq!(row[1], "XNA");
        assert!(row[2..].iter().all(|cell| cell.is_empty()));
        assert_eq!(row.len(), builder.header().len());
    }

    #[test]
    fn test_render_csv() {
        let header = vec!["To".to_string(), "From".to_string()];
        let rows = vec![vec!["PHX".to_string(), "DEN".to_string()]];
        let csv = render_csv(&header, &rows).unwrap();
        assert_eq!(csv, "To,From\nPHX,DEN\n");
    }
}
