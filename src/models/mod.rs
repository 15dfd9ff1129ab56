pub mod chapter;
pub mod cron_job;
pub mod provider;
pub mod results;
pub mod scrape_request;
pub mod series;

pub use chapter::{link_chapters, Chapter, CreateInitChapterParams, FindChapterParams, UpdateInitChapterParams};
pub use cron_job::{CronJob, CronJobStatus, CronRunStatus, NewCronJob};
pub use provider::{FindProviderParams, Provider, ProviderParams};
pub use results::{
    ChapterDetailResult, ChapterListItem, ChapterListResult, ReaderScript, ScrapeOutcome,
    SeriesDetailResult, SeriesListItem, SeriesListResult,
};
pub use scrape_request::{
    CreateScrapeRequestParams, FindScrapeRequestParams, NewScrapeRequest, ScrapeRequest,
    ScrapeRequestStatus, ScrapeRequestType, ScrapeTarget, UpdateScrapeRequestParams,
};
pub use series::{
    CreateInitSeriesParams, FindSeriesParams, Series, UpdateInitSeriesParams, UpdateLatestSeriesParams,
};

use crate::error::{Result, ShelfError};

/// Fails with `"<field> is required"` when `value` is empty.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ShelfError::required(field));
    }
    Ok(())
}

pub(crate) fn require_some<T>(field: &str, value: &Option<T>) -> Result<()> {
    if value.is_none() {
        return Err(ShelfError::required(field));
    }
    Ok(())
}
