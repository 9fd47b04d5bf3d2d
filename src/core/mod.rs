pub mod etl;
pub mod parser;
pub mod pipeline;
pub mod reducer;
pub mod table;

pub use crate::domain::model::{DayPrice, RouteResult, TableResult};
pub use crate::domain::ports::{CalendarSource, Pipeline, Storage};
pub use crate::utils::error::Result;
