use std::collections::HashMap;

use async_trait::async_trait;
use award_etl::utils::error::Result;
use award_etl::{AwardPipeline, AwardsConfig, CalendarSource, EtlEngine, LocalStorage};

/// Replays canned cell text keyed by (origin, destination, year, month).
/// Unknown months come back empty, like a failed or unrendered calendar.
struct ScriptedSource {
    cells: HashMap<(String, String, i32, u32), Vec<String>>,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    fn script(&mut self, origin: &str, destination: &str, year: i32, month: u32, cells: &[&str]) {
        self.cells.insert(
            (origin.to_string(), destination.to_string(), year, month),
            cells.iter().map(|c| c.to_string()).collect(),
        );
    }
}

#[async_trait]
impl CalendarSource for ScriptedSource {
    async fn fetch_month(
        &mut self,
        origin: &str,
        destination: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<String>> {
        let key = (origin.to_string(), destination.to_string(), year, month);
        Ok(self.cells.get(&key).cloned().unwrap_or_default())
    }
}

fn config(output_path: &str) -> AwardsConfig {
    let toml = format!(
        r#"
[pipeline]
name = "award-scan-test"
description = "integration test scan"
version = "0.0.0"

[search]
destination = "PHX"
politeness_delay_ms = 0

[window]
months = [{{ year = 2026, month = 3 }}, {{ year = 2026, month = 4 }}]

[[airports]]
code = "DEN"
max_points = 7500

[[airports]]
code = "XNA"
max_points = 7500

[load]
output_path = "{}"
"#,
        output_path
    );
    AwardsConfig::from_toml_str(&toml).unwrap()
}

fn scripted_source() -> ScriptedSource {
    let mut source = ScriptedSource::new();

    // DEN→PHX: 4.5k minimum in March; April's cheapest (7.5k) is eligible
    // but not the minimum, so April must contribute no days.
    source.script(
        "DEN",
        "PHX",
        2026,
        3,
        &[
            "1\n4.5k +$19",
            "2\n4.5k +$19",
            "3\n4.5k +$19",
            "9\n7.5k +$6",
            "Sold out",
        ],
    );
    source.script("DEN", "PHX", 2026, 4, &["5\n7.5k +$6"]);

    // PHX→DEN: flat 5k
    source.script("PHX", "DEN", 2026, 3, &["14\n5k +$6"]);
    source.script("PHX", "DEN", 2026, 4, &["15\n5k +$6", "16\n5k +$6"]);

    // XNA both ways: everything over the threshold
    source.script("XNA", "PHX", 2026, 3, &["2\n20k +$19"]);
    source.script("XNA", "PHX", 2026, 4, &["2\n20k +$19"]);
    source.script("PHX", "XNA", 2026, 3, &["2\n20k +$19"]);
    source.script("PHX", "XNA", 2026, 4, &["2\n20k +$19"]);

    source
}

async fn run_and_read_csv() -> (Vec<String>, Vec<Vec<String>>) {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().to_string_lossy().to_string();

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = AwardPipeline::new(scripted_source(), storage, config(&output_path));
    let mut engine = EtlEngine::new(pipeline);

    let written = engine.run().await.unwrap();
    assert_eq!(written, format!("{}/award_calendar_PHX.csv", output_path));

    let csv_text = std::fs::read_to_string(written).unwrap();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(csv_text.as_bytes());
    let mut records: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    let header = records.remove(0);
    (header, records)
}

#[tokio::test]
async fn test_full_scan_produces_expected_table() {
    let (header, rows) = run_and_read_csv().await;

    assert_eq!(
        header,
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

    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        vec![
            "PHX", "DEN", "", "", "", "1-3", "14", "", "15-16", "", "", "4.5k", "5k", "$19", "$6",
        ]
    );
}

#[tokio::test]
async fn test_no_availability_still_yields_a_row() {
    let (header, rows) = run_and_read_csv().await;

    // XNA never had an eligible price: the row exists, everything after the
    // identity columns is empty.
    let xna = &rows[1];
    assert_eq!(xna.len(), header.len());
    assert_eq!(xna[0], "PHX");
    assert_eq!(xna[1], "XNA");
    assert!(xna[2..].iter().all(|cell| cell.is_empty()));
}

#[tokio::test]
async fn test_listed_days_all_cost_the_absolute_minimum() {
    let (header, rows) = run_and_read_csv().await;

    // The 7.5k day (Apr 5, DEN→PHX) was under the threshold but not at the
    // minimum, so no April day may appear in the D column.
    let apr_d = header.iter().position(|c| c == "Apr 2026 D").unwrap();
    assert_eq!(rows[0][apr_d], "");

    let mar_d = header.iter().position(|c| c == "Mar 2026 D").unwrap();
    assert_eq!(rows[0][mar_d], "1-3");
}
