pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::fixture::FixtureCalendarSource;
pub use crate::adapters::http::HttpCalendarSource;
pub use crate::adapters::storage::LocalStorage;
pub use crate::config::AwardsConfig;
pub use crate::core::{etl::EtlEngine, pipeline::AwardPipeline};
pub use crate::domain::ports::{CalendarSource, Pipeline, Storage};
pub use crate::utils::error::{EtlError, Result};
