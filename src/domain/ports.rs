use crate::domain::model::{AirportScrape, TableResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// One stateful calendar session (browser, HTTP client, fixture replay).
/// Fetches take `&mut self`: a session serves one request at a time, and the
/// exclusive borrow keeps callers from interleaving fetches on it.
///
/// A month that cannot be fetched may be reported either as an error or as an
/// empty cell list; callers treat both as "no offers this month".
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_month(
        &mut self,
        origin: &str,
        destination: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<String>>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Pipeline: Send {
    async fn extract(&mut self) -> Result<Vec<AirportScrape>>;
    async fn transform(&self, data: Vec<AirportScrape>) -> Result<TableResult>;
    async fn load(&self, result: TableResult) -> Result<String>;
}
