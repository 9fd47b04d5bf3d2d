use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use zip::write::{FileOptions, ZipWriter};

use crate::config::{AirportConfig, AwardsConfig};
use crate::core::parser::CellParser;
use crate::core::reducer::{format_points, reduce_route};
use crate::core::table::{render_csv, TableBuilder};
use crate::domain::model::{
    AirportScrape, DayPrice, RouteCache, RouteResult, RunSummary, ScanWindow, TableResult,
};
use crate::domain::ports::{CalendarSource, Pipeline, Storage};
use crate::utils::error::Result;

/// The award-calendar pipeline: extract walks every configured airport in
/// both directions, one month at a time, through the calendar session;
/// transform reduces each direction and assembles the table; load writes the
/// CSV (and the optional zip bundle) through storage.
pub struct AwardPipeline<C: CalendarSource, S: Storage> {
    source: C,
    storage: S,
    config: AwardsConfig,
    parser: CellParser,
}

impl<C: CalendarSource, S: Storage> AwardPipeline<C, S> {
    pub fn new(source: C, storage: S, config: AwardsConfig) -> Self {
        Self {
            source,
            storage,
            config,
            parser: CellParser::new(),
        }
    }

    /// Fetches and parses one route direction across the whole window.
    /// A failed fetch is an empty month, never a route abort.
    async fn scrape_route(
        &mut self,
        origin: &str,
        destination: &str,
        window: &ScanWindow,
        max_points: u32,
        delay: Duration,
    ) -> RouteCache {
        let mut months = Vec::with_capacity(window.len());

        for slot in window.slots() {
            let cells = match self
                .source
                .fetch_month(origin, destination, slot.year, slot.month)
                .await
            {
                Ok(cells) => cells,
                Err(e) => {
                    tracing::warn!(
                        "{}→{} {}: fetch failed, treating month as empty: {}",
                        origin,
                        destination,
                        slot.label(),
                        e
                    );
                    Vec::new()
                }
            };

            let max_day = slot.days_in_month();
            let mut prices: Vec<DayPrice> = Vec::new();
            for cell in &cells {
                let Some(price) = self.parser.parse(cell) else {
                    continue;
                };
                // The rendered grid includes stray cells from adjacent months
                if (1..=max_day).contains(&price.day) {
                    prices.push(price);
                }
            }

            let eligible: Vec<u32> = {
                let mut points: Vec<u32> = prices
                    .iter()
                    .filter(|p| p.points <= max_points)
                    .map(|p| p.points)
                    .collect();
                points.sort_unstable();
                points.dedup();
                points
            };
            tracing::debug!(
                "{}→{} {}: {} cells, {} offers, eligible prices {:?}",
                origin,
                destination,
                slot.label(),
                cells.len(),
                prices.len(),
                eligible
            );

            months.push(prices);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        RouteCache {
            origin: origin.to_string(),
            destination: destination.to_string(),
            months,
        }
    }
}

#[async_trait]
impl<C: CalendarSource, S: Storage> Pipeline for AwardPipeline<C, S> {
    async fn extract(&mut self) -> Result<Vec<AirportScrape>> {
        let destination = self.config.destination().to_string();
        let window = self.config.scan_window()?;
        let delay = self.config.politeness_delay();
        let airports: Vec<AirportConfig> = self.config.airports().to_vec();

        let mut scrapes = Vec::with_capacity(airports.len());
        for airport in &airports {
            tracing::info!(
                "✈️  {} ↔ {} (threshold {} pts)",
                airport.code,
                destination,
                airport.max_points
            );

            let outbound = self
                .scrape_route(&airport.code, &destination, &window, airport.max_points, delay)
                .await;
            let inbound = self
                .scrape_route(&destination, &airport.code, &window, airport.max_points, delay)
                .await;

            scrapes.push(AirportScrape {
                code: airport.code.clone(),
                max_points: airport.max_points,
                outbound,
                inbound,
            });
        }

        Ok(scrapes)
    }

    async fn transform(&self, data: Vec<AirportScrape>) -> Result<TableResult> {
        let window = self.config.scan_window()?;
        let destination = self.config.destination();
        let builder = TableBuilder::new(destination, &window);
        let header = builder.header();

        let mut rows = Vec::with_capacity(data.len());
        let mut routes_with_availability = 0;
        let mut offers_cached = 0;

        for scrape in &data {
            offers_cached += scrape.outbound.months.iter().map(Vec::len).sum::<usize>();
            offers_cached += scrape.inbound.months.iter().map(Vec::len).sum::<usize>();

            let outbound = reduce_route(&scrape.outbound, &window, scrape.max_points);
            let inbound = reduce_route(&scrape.inbound, &window, scrape.max_points);

            log_route(&scrape.outbound, &outbound);
            log_route(&scrape.inbound, &inbound);
            routes_with_availability += [&outbound, &inbound]
                .into_iter()
                .filter(|r| r.absolute_minimum.is_some())
                .count();

            rows.push(builder.row(&scrape.code, &outbound, &inbound));
        }

        let csv = render_csv(&header, &rows)?;
        let summary = RunSummary {
            destination: destination.to_string(),
            airports: data.len(),
            routes_with_availability,
            offers_cached,
        };

        Ok(TableResult {
            header,
            rows,
            csv,
            summary,
        })
    }

    async fn load(&self, result: TableResult) -> Result<String> {
        let filename = self.config.output_filename();
        self.storage
            .write_file(&filename, result.csv.as_bytes())
            .await?;

        let output_path = format!("{}/{}", self.config.output_path(), filename);
        tracing::debug!("Wrote {} rows to {}", result.rows.len(), output_path);

        if let Some(zip_name) = self.config.compression_filename() {
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

                zip.start_file::<_, ()>(filename.as_str(), FileOptions::default())?;
                zip.write_all(result.csv.as_bytes())?;

                zip.start_file::<_, ()>("run_summary.json", FileOptions::default())?;
                let json_data = serde_json::to_string_pretty(&result.summary)?;
                zip.write_all(json_data.as_bytes())?;

                let cursor = zip.finish()?;
                cursor.into_inner()
            };
            self.storage.write_file(zip_name, &zip_data).await?;
            tracing::debug!("Wrote compressed bundle {}", zip_name);
        }

        Ok(output_path)
    }
}

fn log_route(cache: &RouteCache, result: &RouteResult) {
    match result.absolute_minimum {
        Some(minimum) => tracing::info!(
            "{}→{}: absolute minimum {}, typical tax {}",
            cache.origin,
            cache.destination,
            format_points(minimum),
            result.typical_tax.as_deref().unwrap_or("n/a")
        ),
        None => tracing::info!(
            "{}→{}: no availability within threshold",
            cache.origin,
            cache.destination
        ),
    }
}
