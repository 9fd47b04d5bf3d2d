use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use url::Url;

use crate::domain::ports::CalendarSource;
use crate::utils::error::{EtlError, Result};

/// Fetches one month of the award calendar over HTTP.
///
/// Builds the calendar URL the booking site expects (one-way award shopping,
/// month anchored at the 1st) and extracts day-cell text from the response
/// markup. Anything that goes wrong with a single request — transport error,
/// non-success status, unreadable body, no recognizable cells — degrades to
/// an empty month; the site renders some months client-side and an empty
/// answer is indistinguishable from no availability either way.
pub struct HttpCalendarSource {
    client: reqwest::Client,
    endpoint: Url,
    user_agent: String,
    debug_capture: Option<PathBuf>,
    captured: bool,
}

impl HttpCalendarSource {
    pub fn new(
        endpoint: &str,
        user_agent: &str,
        timeout: Duration,
        debug_capture: Option<PathBuf>,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| EtlError::InvalidConfigValueError {
            field: "search.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            user_agent: user_agent.to_string(),
            debug_capture,
            captured: false,
        })
    }

    fn month_url(&self, origin: &str, destination: &str, year: i32, month: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("O", origin)
            .append_pair("D", destination)
            .append_pair("OD", &format!("{}-{:02}-01", year, month))
            .append_pair("A", "1")
            .append_pair("RT", "false")
            .append_pair("RequestType", "Calendar")
            .append_pair("ShoppingMethod", "onlineaward")
            .append_pair("locale", "en-us");
        url
    }

    // One body dump per session, for diagnosing selector drift when the site
    // changes its markup.
    fn capture_once(&mut self, body: &str) {
        let Some(path) = &self.debug_capture else {
            return;
        };
        if self.captured {
            return;
        }
        self.captured = true;
        match std::fs::write(path, body) {
            Ok(()) => tracing::info!("📄 Saved first response body to {}", path.display()),
            Err(e) => tracing::warn!("Debug capture failed: {}", e),
        }
    }
}

#[async_trait]
impl CalendarSource for HttpCalendarSource {
    async fn fetch_month(
        &mut self,
        origin: &str,
        destination: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<String>> {
        let url = self.month_url(origin, destination, year, month);
        tracing::debug!("GET {}", url);

        let response = match self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{}→{} {}-{:02}: request failed: {}", origin, destination, year, month, e);
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "{}→{} {}-{:02}: calendar returned {}",
                origin,
                destination,
                year,
                month,
                response.status()
            );
            return Ok(Vec::new());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("{}→{} {}-{:02}: unreadable body: {}", origin, destination, year, month, e);
                return Ok(Vec::new());
            }
        };

        self.capture_once(&body);
        Ok(extract_cells(&body))
    }
}

/// Pulls day-cell text out of the calendar markup. Server-rendered grids use
/// `<td>`; the site's web components render gridcell divs instead, so those
/// are the fallback when no table cells carry content.
fn extract_cells(body: &str) -> Vec<String> {
    let mut cells = Vec::new();

    for (tag, inner) in tag_blocks(body, "<td", "</td>") {
        if is_disabled(tag) {
            continue;
        }
        let text = strip_tags(inner);
        if !text.is_empty() {
            cells.push(text);
        }
    }

    if cells.is_empty() {
        for (tag, inner) in tag_blocks(body, "<div", "</div>") {
            if !is_day_cell(tag) || is_disabled(tag) {
                continue;
            }
            let text = strip_tags(inner);
            if !text.is_empty() {
                cells.push(text);
            }
        }
    }

    cells
}

/// Case-insensitive `open ... close` scan returning (open tag, inner markup)
/// pairs. Matching is naive: a nested same-name tag closes the block early.
/// Calendar day cells don't nest, so that trade is fine here.
fn tag_blocks<'a>(body: &'a str, open: &str, close: &str) -> Vec<(&'a str, &'a str)> {
    let lower = body.to_ascii_lowercase();
    let open = open.to_ascii_lowercase();
    let close = close.to_ascii_lowercase();

    let mut blocks = Vec::new();
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&open) {
        let start = from + rel;
        let Some(tag_end_rel) = body[start..].find('>') else {
            break;
        };
        let tag_end = start + tag_end_rel + 1;
        let Some(close_rel) = lower[tag_end..].find(&close) else {
            break;
        };
        let inner_end = tag_end + close_rel;
        blocks.push((&body[start..tag_end], &body[tag_end..inner_end]));
        from = inner_end + close.len();
    }
    blocks
}

fn is_day_cell(open_tag: &str) -> bool {
    let tag = open_tag.to_ascii_lowercase();
    tag.contains("gridcell") || tag.contains("calendar-day") || tag.contains("day-cell")
}

fn is_disabled(open_tag: &str) -> bool {
    let tag = open_tag.to_ascii_lowercase();
    tag.contains("disabled") || tag.contains("empty") || tag.contains("outside")
}

fn strip_tags(block: &str) -> String {
    let mut out = String::with_capacity(block.len());
    let mut in_tag = false;
    for ch in block.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&out)
}

fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}
