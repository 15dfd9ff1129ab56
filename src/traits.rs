use crate::error::Result;
use crate::models::*;
use crate::query::{Page, QueryParams};

/// Persistence for providers
#[async_trait::async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn create_provider(&self, params: &ProviderParams) -> Result<Provider>;

    /// Update name, url parts and (when given) the active flag of an existing provider
    async fn update_provider(&self, params: &ProviderParams) -> Result<Provider>;

    async fn get_provider(&self, slug: &str) -> Result<Provider>;

    async fn find_providers(&self, params: &FindProviderParams) -> Result<Page<Provider>>;
}

/// Persistence for series
#[async_trait::async_trait]
pub trait SeriesRepository: Send + Sync {
    async fn create_init_series(&self, params: &CreateInitSeriesParams) -> Result<Series>;

    async fn update_init_series(&self, params: &UpdateInitSeriesParams) -> Result<Series>;

    /// Add chapters to the count and move the latest chapter in one step
    async fn update_latest_series(&self, params: &UpdateLatestSeriesParams) -> Result<Series>;

    async fn get_series(&self, provider: &str, slug: &str) -> Result<Series>;

    async fn find_series(&self, params: &FindSeriesParams) -> Result<Page<Series>>;
}

/// Persistence for chapters
#[async_trait::async_trait]
pub trait ChapterRepository: Send + Sync {
    async fn create_init_chapter(&self, params: &CreateInitChapterParams) -> Result<Chapter>;

    async fn update_init_chapter(&self, params: &UpdateInitChapterParams) -> Result<Chapter>;

    /// Rewrite prev/next links of every chapter in a series by chapter number
    async fn relink_chapters(&self, provider: &str, series: &str) -> Result<()>;

    /// Store the listed chapters that are new, relink the series and advance
    /// its count and latest chapter as one unit. Returns the new chapters.
    async fn add_chapters(
        &self,
        provider: &str,
        series: &str,
        chapters: &[CreateInitChapterParams],
    ) -> Result<Vec<Chapter>>;

    async fn get_chapter(&self, provider: &str, series: &str, slug: &str) -> Result<Chapter>;

    async fn find_chapters(&self, params: &FindChapterParams) -> Result<Page<Chapter>>;
}

/// Persistence for the scrape request queue
#[async_trait::async_trait]
pub trait ScrapeRequestRepository: Send + Sync {
    async fn create_scrape_request(&self, request: &NewScrapeRequest) -> Result<ScrapeRequest>;

    /// Record an outcome; rejects status changes the lifecycle does not allow
    async fn update_scrape_request(&self, params: &UpdateScrapeRequestParams) -> Result<ScrapeRequest>;

    async fn get_scrape_request(&self, id: &str) -> Result<ScrapeRequest>;

    async fn find_scrape_requests(&self, params: &FindScrapeRequestParams) -> Result<Page<ScrapeRequest>>;
}

/// Persistence for cron jobs and their run history
#[async_trait::async_trait]
pub trait CronJobRepository: Send + Sync {
    async fn create_cron_job(&self, job: &NewCronJob) -> Result<CronJob>;

    async fn list_cron_jobs(&self) -> Result<Vec<CronJob>>;

    async fn append_cron_job_status(&self, status: &CronJobStatus) -> Result<()>;

    async fn cron_job_history(&self, job_id: &str, query: &QueryParams) -> Result<Page<CronJobStatus>>;
}

/// Fetches and parses the page a scrape request points at
#[async_trait::async_trait]
pub trait ScrapeFetcher: Send + Sync {
    async fn fetch(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome>;
}

/// Everything the runner needs from a store
pub trait Store: ProviderRepository + SeriesRepository + ChapterRepository + ScrapeRequestRepository {}

impl<T> Store for T where T: ProviderRepository + SeriesRepository + ChapterRepository + ScrapeRequestRepository {}
