//! Domain model, validation and job-queue bookkeeping for a manga scraping
//! pipeline: providers, series, chapters, scrape requests and cron jobs,
//! with a SQLite store and a runner that drains the request queue.

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod runner;
pub mod traits;

pub use config::Config;
pub use database::Database;
pub use error::{ErrorKind, Result, ShelfError};
pub use query::{Page, QueryParams, SortOrder};
pub use runner::{RunSummary, Runner};
pub use traits::{
    ChapterRepository, CronJobRepository, ProviderRepository, ScrapeFetcher, ScrapeRequestRepository,
    SeriesRepository, Store,
};
