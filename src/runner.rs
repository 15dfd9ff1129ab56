use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::error::{ErrorKind, Result, ShelfError};
use crate::models::*;
use crate::query::{QueryParams, SortOrder};
use crate::traits::{ScrapeFetcher, Store};

/// Counters for one pass over the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Follow-up requests queued while applying outcomes
    pub enqueued: usize,
    /// Requests whose outcome could not be recorded because the row was
    /// settled or removed elsewhere
    pub skipped: usize,
}

/// Drives pending scrape requests through a fetcher and writes the results
/// back into the store.
pub struct Runner<S, F> {
    store: S,
    fetcher: F,
    config: RunnerConfig,
}

impl<S: Store, F: ScrapeFetcher> Runner<S, F> {
    pub fn new(store: S, fetcher: F, config: RunnerConfig) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Processes one batch of the configured size.
    pub async fn run_batch(&self) -> Result<RunSummary> {
        self.run_pending(self.config.batch_size).await
    }

    /// Processes up to `limit` pending requests, oldest first. A request that
    /// fails is marked FAILED and does not stop the pass. A request that can no
    /// longer be moved out of PENDING is counted as skipped; other store errors
    /// while recording an outcome are returned.
    pub async fn run_pending(&self, limit: u32) -> Result<RunSummary> {
        let params = FindScrapeRequestParams {
            status: Some(ScrapeRequestStatus::Pending),
            query: QueryParams {
                size: Some(limit),
                ..QueryParams::ordered(SortOrder::Asc)
            },
            ..FindScrapeRequestParams::default()
        };
        let pending = self.store.find_scrape_requests(&params).await?.items;

        info!("Processing {} pending scrape requests", pending.len());
        let mut summary = RunSummary::default();

        for request in pending {
            summary.processed += 1;
            let start_time = Instant::now();
            let result = self.process(&request).await;
            let total_time = request.total_time + start_time.elapsed().as_millis() as i64;

            match result {
                Ok(enqueued) => {
                    summary.enqueued += enqueued;
                    let recorded = self
                        .record(&UpdateScrapeRequestParams::completed(
                            &request.id,
                            request.retries,
                            total_time,
                        ))
                        .await?;
                    if !recorded {
                        summary.skipped += 1;
                        continue;
                    }
                    summary.completed += 1;
                    debug!(
                        "{} request {} completed in {}ms ({} queued)",
                        request.request_type(),
                        request.id,
                        total_time,
                        enqueued
                    );
                }
                Err(e) => {
                    warn!("{} request {} failed: {}", request.request_type(), request.id, e);
                    let recorded = self
                        .record(&UpdateScrapeRequestParams::failed(
                            &request.id,
                            request.retries + 1,
                            total_time,
                            e.to_string(),
                        ))
                        .await?;
                    if recorded {
                        summary.failed += 1;
                    } else {
                        summary.skipped += 1;
                    }
                }
            }
        }

        info!(
            "Run finished: {} completed, {} failed, {} skipped, {} queued",
            summary.completed, summary.failed, summary.skipped, summary.enqueued
        );
        Ok(summary)
    }

    /// Writes an outcome back. Returns false when the request was already
    /// moved on or deleted by someone else.
    async fn record(&self, params: &UpdateScrapeRequestParams) -> Result<bool> {
        match self.store.update_scrape_request(params).await {
            Ok(_) => Ok(true),
            Err(e) if e.is(ErrorKind::InvalidInput) || e.is(ErrorKind::NotFound) => {
                error!("Could not record outcome of request {}: {}", params.id, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Puts failed requests that still have attempts left back in the queue.
    pub async fn requeue_failed(&self) -> Result<usize> {
        let failed = self
            .store
            .find_scrape_requests(&FindScrapeRequestParams::with_status(ScrapeRequestStatus::Failed))
            .await?
            .items;

        let mut requeued = 0;
        for request in failed {
            if request.retries >= self.config.retry_attempts {
                debug!("Request {} exhausted its {} retries", request.id, request.retries);
                continue;
            }

            self.store
                .update_scrape_request(&UpdateScrapeRequestParams {
                    id: request.id.clone(),
                    status: Some(ScrapeRequestStatus::Pending),
                    retries: request.retries,
                    total_time: request.total_time,
                    error: false,
                    message: String::new(),
                })
                .await?;
            requeued += 1;
        }

        if requeued > 0 {
            info!("Requeued {} failed scrape requests", requeued);
        }
        Ok(requeued)
    }

    /// Fetches one request and applies the outcome. Returns how many
    /// follow-up requests were queued.
    async fn process(&self, request: &ScrapeRequest) -> Result<usize> {
        let outcome = self.fetcher.fetch(request).await?;

        match (&request.target, outcome) {
            (ScrapeTarget::SeriesList { provider }, ScrapeOutcome::SeriesList(result)) => {
                self.apply_series_list(request, provider, result).await
            }
            (ScrapeTarget::SeriesDetail { provider, series }, ScrapeOutcome::SeriesDetail(result)) => {
                self.store
                    .update_init_series(&result.into_update_params(provider, series))
                    .await?;
                Ok(0)
            }
            (ScrapeTarget::ChapterList { provider, series }, ScrapeOutcome::ChapterList(result)) => {
                self.apply_chapter_list(request, provider, series, result).await
            }
            (
                ScrapeTarget::ChapterDetail {
                    provider,
                    series,
                    chapter,
                },
                ScrapeOutcome::ChapterDetail(result),
            ) => {
                self.apply_chapter_detail(provider, series, chapter, result).await?;
                Ok(0)
            }
            (target, outcome) => Err(ShelfError::invalid_input(format!(
                "fetcher returned {} for a {} request",
                outcome.request_type(),
                target.request_type()
            ))),
        }
    }

    async fn apply_series_list(
        &self,
        request: &ScrapeRequest,
        provider: &str,
        result: SeriesListResult,
    ) -> Result<usize> {
        let listed = result.create_params(provider);
        for params in &listed {
            match self.store.create_init_series(params).await {
                Ok(series) => info!("New series {}/{}", provider, series.slug),
                Err(e) if e.is(ErrorKind::UniqueConstraint) => {}
                Err(e) => return Err(e),
            }
        }

        // Follow-ups come from what is already queued, so a listing that died
        // halfway picks up the series it created but never queued.
        let mut requested = self
            .requested_targets(provider, None, ScrapeRequestType::SeriesDetail)
            .await?;
        requested.extend(
            self.requested_targets(provider, None, ScrapeRequestType::ChapterList)
                .await?,
        );

        let mut enqueued = 0;
        for params in &listed {
            for target in [
                ScrapeTarget::SeriesDetail {
                    provider: provider.to_string(),
                    series: params.slug.clone(),
                },
                ScrapeTarget::ChapterList {
                    provider: provider.to_string(),
                    series: params.slug.clone(),
                },
            ] {
                if requested.contains(&target) {
                    continue;
                }
                self.enqueue(target, &request.base_url, &params.source_path).await?;
                enqueued += 1;
            }
        }

        if let Some(next_page) = result.next_page.filter(|p| !p.is_empty()) {
            let target = ScrapeTarget::SeriesList {
                provider: provider.to_string(),
            };
            self.enqueue(target, &request.base_url, &next_page).await?;
            enqueued += 1;
        }

        Ok(enqueued)
    }

    async fn apply_chapter_list(
        &self,
        request: &ScrapeRequest,
        provider: &str,
        series: &str,
        result: ChapterListResult,
    ) -> Result<usize> {
        let created = self
            .store
            .add_chapters(provider, series, &result.create_params(provider, series))
            .await?;
        if created.is_empty() {
            debug!("No new chapters for {}/{}", provider, series);
        } else {
            info!("{} new chapters for {}/{}", created.len(), provider, series);
        }

        // Every chapter still without content gets a detail request unless
        // one exists, whether it is new or left over from an earlier pass.
        let requested = self
            .requested_targets(provider, Some(series), ScrapeRequestType::ChapterDetail)
            .await?;
        let stored = self
            .store
            .find_chapters(&FindChapterParams::by_series(provider, series))
            .await?
            .items;

        let mut enqueued = 0;
        for chapter in stored.into_iter().filter(|c| c.full_title.is_none()) {
            let target = ScrapeTarget::ChapterDetail {
                provider: provider.to_string(),
                series: series.to_string(),
                chapter: chapter.slug,
            };
            if requested.contains(&target) {
                continue;
            }
            self.enqueue(target, &request.base_url, &chapter.source_path).await?;
            enqueued += 1;
        }
        Ok(enqueued)
    }

    /// Targets that already have a request of `request_type`, in any status.
    async fn requested_targets(
        &self,
        provider: &str,
        series: Option<&str>,
        request_type: ScrapeRequestType,
    ) -> Result<HashSet<ScrapeTarget>> {
        let params = FindScrapeRequestParams {
            provider: Some(provider.to_string()),
            series: series.map(str::to_string),
            request_type: Some(request_type),
            ..FindScrapeRequestParams::default()
        };
        let requests = self.store.find_scrape_requests(&params).await?.items;
        Ok(requests.into_iter().map(|r| r.target).collect())
    }

    async fn apply_chapter_detail(
        &self,
        provider: &str,
        series: &str,
        slug: &str,
        result: ChapterDetailResult,
    ) -> Result<()> {
        let current = self.store.get_chapter(provider, series, slug).await?;
        let mut params = result.into_update_params(provider, series, slug);

        // Pages without navigation keep the links computed from the listing
        params.next_slug = params.next_slug.or(current.next_slug);
        params.next_path = params.next_path.or(current.next_path);
        params.prev_slug = params.prev_slug.or(current.prev_slug);
        params.prev_path = params.prev_path.or(current.prev_path);

        self.store.update_init_chapter(&params).await?;
        Ok(())
    }

    async fn enqueue(&self, target: ScrapeTarget, base_url: &str, request_path: &str) -> Result<()> {
        let request = NewScrapeRequest::new(target, base_url, request_path);
        if let Err(e) = self.store.create_scrape_request(&request).await {
            error!("Failed to queue {} request: {}", request.target.request_type(), e);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::Database;
    use crate::traits::*;
    use std::collections::{HashMap, VecDeque};
    use tokio::sync::Mutex;
    use tokio_test::assert_ok;

    const BASE_URL: &str = "https://asura.example";

    #[derive(Default)]
    struct StubFetcher {
        fixtures: HashMap<(ScrapeRequestType, String), ScrapeOutcome>,
    }

    impl StubFetcher {
        fn with(mut self, path: &str, outcome: ScrapeOutcome) -> Self {
            self.fixtures
                .insert((outcome.request_type(), path.to_string()), outcome);
            self
        }
    }

    #[async_trait::async_trait]
    impl ScrapeFetcher for StubFetcher {
        async fn fetch(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome> {
            self.fixtures
                .get(&(request.request_type(), request.request_path.clone()))
                .cloned()
                .ok_or_else(|| ShelfError::not_found(format!("no fixture for {}", request.request_path)))
        }
    }

    /// Hands out outcomes in order, one per fetch.
    struct SequenceFetcher {
        outcomes: Mutex<VecDeque<ScrapeOutcome>>,
    }

    impl SequenceFetcher {
        fn new(outcomes: Vec<ScrapeOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ScrapeFetcher for SequenceFetcher {
        async fn fetch(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome> {
            self.outcomes
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| ShelfError::not_found(format!("nothing left for {}", request.request_path)))
        }
    }

    /// Settles "/race" requests through its own store handle before failing,
    /// like a second worker finishing the row first.
    struct RacingFetcher {
        store: Database,
    }

    #[async_trait::async_trait]
    impl ScrapeFetcher for RacingFetcher {
        async fn fetch(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome> {
            if request.request_path != "/race" {
                return Ok(ScrapeOutcome::SeriesList(SeriesListResult::default()));
            }
            self.store
                .update_scrape_request(&UpdateScrapeRequestParams::completed(&request.id, 0, 5))
                .await?;
            Err(ShelfError::unknown("connection reset"))
        }
    }

    fn chapter_item(slug: &str, number: f64) -> ChapterListItem {
        ChapterListItem {
            slug: slug.to_string(),
            number,
            short_title: format!("Chapter {}", number),
            source_href: format!("/read/{}", slug),
        }
    }

    fn fixtures() -> StubFetcher {
        StubFetcher::default()
            .with(
                "/series",
                ScrapeOutcome::SeriesList(SeriesListResult {
                    series: vec![SeriesListItem {
                        slug: "solo-leveling".to_string(),
                        title: "Solo Leveling".to_string(),
                        source_path: "/series/solo-leveling".to_string(),
                        thumbnail_url: None,
                    }],
                    next_page: None,
                }),
            )
            .with(
                "/series/solo-leveling",
                ScrapeOutcome::SeriesDetail(SeriesDetailResult {
                    thumbnail_url: "https://cdn.example/solo.webp".to_string(),
                    synopsis: Some("A weak hunter gets stronger.".to_string()),
                    genres: vec!["Action".to_string()],
                }),
            )
            .with(
                "/series/solo-leveling",
                ScrapeOutcome::ChapterList(ChapterListResult {
                    chapters: vec![chapter_item("chapter-2", 2.0), chapter_item("chapter-1", 1.0)],
                }),
            )
            .with(
                "/read/chapter-1",
                ScrapeOutcome::ChapterDetail(ChapterDetailResult {
                    full_title: "Solo Leveling Chapter 1".to_string(),
                    source_path: "/read/chapter-1".to_string(),
                    content_paths: vec!["/img/1-1.jpg".to_string()],
                    ..ChapterDetailResult::default()
                }),
            )
    }

    async fn store() -> Database {
        let db = Database::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .unwrap();
        db.init().await.unwrap();
        db.create_provider(&ProviderParams {
            slug: "asura".to_string(),
            name: "Asura Scans".to_string(),
            scheme: "https".to_string(),
            host: "asura.example".to_string(),
            list_path: "/series".to_string(),
            is_active: None,
        })
        .await
        .unwrap();
        db
    }

    fn config(retry_attempts: i32) -> RunnerConfig {
        RunnerConfig {
            batch_size: 10,
            retry_attempts,
        }
    }

    async fn runner<F: ScrapeFetcher>(fetcher: F, retry_attempts: i32) -> Runner<Database, F> {
        Runner::new(store().await, fetcher, config(retry_attempts))
    }

    async fn enqueue<F: ScrapeFetcher>(runner: &Runner<Database, F>, target: ScrapeTarget, path: &str) -> ScrapeRequest {
        runner
            .store()
            .create_scrape_request(&NewScrapeRequest::new(target, BASE_URL, path))
            .await
            .unwrap()
    }

    async fn enqueue_list<F: ScrapeFetcher>(runner: &Runner<Database, F>) -> ScrapeRequest {
        let target = ScrapeTarget::SeriesList {
            provider: "asura".to_string(),
        };
        enqueue(runner, target, "/series").await
    }

    async fn with_series<F: ScrapeFetcher>(runner: &Runner<Database, F>) {
        runner
            .store()
            .create_init_series(&CreateInitSeriesParams {
                provider: "asura".to_string(),
                slug: "solo-leveling".to_string(),
                title: "Solo Leveling".to_string(),
                source_path: "/series/solo-leveling".to_string(),
            })
            .await
            .unwrap();
    }

    fn chapter_list_target() -> ScrapeTarget {
        ScrapeTarget::ChapterList {
            provider: "asura".to_string(),
            series: "solo-leveling".to_string(),
        }
    }

    async fn chapter_detail_requests<F: ScrapeFetcher>(runner: &Runner<Database, F>) -> Vec<ScrapeRequest> {
        runner
            .store()
            .find_scrape_requests(&FindScrapeRequestParams {
                request_type: Some(ScrapeRequestType::ChapterDetail),
                ..FindScrapeRequestParams::default()
            })
            .await
            .unwrap()
            .items
    }

    #[tokio::test]
    async fn empty_queue_is_a_no_op() {
        let runner = runner(StubFetcher::default(), 3).await;
        let summary = runner.run_batch().await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn pipeline_walks_from_listing_to_chapters() {
        let runner = runner(fixtures(), 3).await;
        let list = enqueue_list(&runner).await;

        let first = runner.run_pending(10).await.unwrap();
        assert_eq!(first.completed, 1);
        assert_eq!(first.enqueued, 2);

        let done = runner.store().get_scrape_request(&list.id).await.unwrap();
        assert_eq!(done.status, ScrapeRequestStatus::Completed);
        assert!(!done.error);

        let second = runner.run_pending(10).await.unwrap();
        assert_eq!(second.processed, 2);
        assert_eq!(second.completed, 2);
        assert_eq!(second.enqueued, 2);

        let series = runner.store().get_series("asura", "solo-leveling").await.unwrap();
        assert_eq!(series.chapters_count, 2);
        assert_eq!(series.latest_chapter.as_deref(), Some("chapter-2"));
        assert_eq!(series.genres, vec!["Action".to_string()]);

        // chapter-2 has no fixture and fails
        let third = runner.run_pending(10).await.unwrap();
        assert_eq!(third.completed, 1);
        assert_eq!(third.failed, 1);

        let chapter = runner
            .store()
            .get_chapter("asura", "solo-leveling", "chapter-1")
            .await
            .unwrap();
        assert_eq!(chapter.full_title.as_deref(), Some("Solo Leveling Chapter 1"));
        assert_eq!(chapter.next_slug.as_deref(), Some("chapter-2"));
        assert_eq!(chapter.prev_slug, None);

        let failed = runner
            .store()
            .find_scrape_requests(&FindScrapeRequestParams::with_status(ScrapeRequestStatus::Failed))
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        let failed = &failed.items[0];
        assert_eq!(failed.target.chapter(), Some("chapter-2"));
        assert_eq!(failed.retries, 1);
        assert!(failed.error);
        assert!(failed.message.as_deref().unwrap_or_default().contains("no fixture"));
    }

    #[tokio::test]
    async fn relisting_known_series_queues_nothing() {
        let runner = runner(fixtures(), 3).await;
        enqueue_list(&runner).await;
        runner.run_pending(1).await.unwrap();

        enqueue_list(&runner).await;
        let pending = runner
            .store()
            .find_scrape_requests(&FindScrapeRequestParams::with_status(ScrapeRequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 3);

        // oldest first: detail and chapter list run before the second listing
        let summary = runner.run_pending(3).await.unwrap();
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.enqueued, 2);

        let details = runner
            .store()
            .find_scrape_requests(&FindScrapeRequestParams {
                request_type: Some(ScrapeRequestType::SeriesDetail),
                ..FindScrapeRequestParams::default()
            })
            .await
            .unwrap();
        assert_eq!(details.len(), 1);
    }

    #[tokio::test]
    async fn mismatched_outcome_fails_the_request() {
        let mut fetcher = StubFetcher::default();
        fetcher.fixtures.insert(
            (ScrapeRequestType::SeriesList, "/series".to_string()),
            ScrapeOutcome::ChapterList(ChapterListResult::default()),
        );
        let runner = runner(fetcher, 3).await;
        let list = enqueue_list(&runner).await;

        let summary = runner.run_pending(10).await.unwrap();
        assert_eq!(summary.failed, 1);

        let request = runner.store().get_scrape_request(&list.id).await.unwrap();
        assert_eq!(request.status, ScrapeRequestStatus::Failed);
        assert_eq!(
            request.message.as_deref(),
            Some("fetcher returned CHAPTER_LIST for a SERIES_LIST request")
        );
    }

    #[tokio::test]
    async fn requeue_respects_retry_attempts() {
        let runner = runner(StubFetcher::default(), 2).await;
        let list = enqueue_list(&runner).await;

        runner.run_pending(10).await.unwrap();
        assert_eq!(runner.requeue_failed().await.unwrap(), 1);

        let requeued = runner.store().get_scrape_request(&list.id).await.unwrap();
        assert_eq!(requeued.status, ScrapeRequestStatus::Pending);
        assert_eq!(requeued.retries, 1);
        assert!(!requeued.error);
        assert_eq!(requeued.message, None);

        runner.run_pending(10).await.unwrap();
        let exhausted = runner.store().get_scrape_request(&list.id).await.unwrap();
        assert_eq!(exhausted.retries, 2);
        assert_eq!(runner.requeue_failed().await.unwrap(), 0);

        assert_ok!(runner.run_pending(10).await);
        let still_failed = runner.store().get_scrape_request(&list.id).await.unwrap();
        assert_eq!(still_failed.status, ScrapeRequestStatus::Failed);
    }

    #[tokio::test]
    async fn broken_chapter_listing_is_retried_in_full() {
        let fetcher = SequenceFetcher::new(vec![
            ScrapeOutcome::ChapterList(ChapterListResult {
                chapters: vec![
                    chapter_item("chapter-1", 1.0),
                    chapter_item("chapter-2", 2.0),
                    chapter_item("", 3.0),
                ],
            }),
            ScrapeOutcome::ChapterList(ChapterListResult {
                chapters: vec![chapter_item("chapter-1", 1.0), chapter_item("chapter-2", 2.0)],
            }),
        ]);
        let runner = runner(fetcher, 3).await;
        with_series(&runner).await;
        enqueue(&runner, chapter_list_target(), "/series/solo-leveling").await;

        let first = runner.run_pending(10).await.unwrap();
        assert_eq!(first.failed, 1);
        let chapters = runner
            .store()
            .find_chapters(&FindChapterParams::by_series("asura", "solo-leveling"))
            .await
            .unwrap();
        assert!(chapters.is_empty());

        assert_eq!(runner.requeue_failed().await.unwrap(), 1);
        let second = runner.run_pending(10).await.unwrap();
        assert_eq!(second.completed, 1);
        assert_eq!(second.enqueued, 2);

        let series = runner.store().get_series("asura", "solo-leveling").await.unwrap();
        assert_eq!(series.chapters_count, 2);
        assert_eq!(series.latest_chapter.as_deref(), Some("chapter-2"));

        let first_chapter = runner
            .store()
            .get_chapter("asura", "solo-leveling", "chapter-1")
            .await
            .unwrap();
        assert_eq!(first_chapter.next_slug.as_deref(), Some("chapter-2"));
        assert_eq!(chapter_detail_requests(&runner).await.len(), 2);
    }

    #[tokio::test]
    async fn chapter_listing_queues_details_left_behind() {
        let listing = ChapterListResult {
            chapters: vec![chapter_item("chapter-1", 1.0), chapter_item("chapter-2", 2.0)],
        };
        let runner = runner(SequenceFetcher::new(vec![ScrapeOutcome::ChapterList(listing.clone())]), 3).await;
        with_series(&runner).await;

        // chapters stored by a pass that stopped before queueing details
        runner
            .store()
            .add_chapters(
                "asura",
                "solo-leveling",
                &listing.create_params("asura", "solo-leveling"),
            )
            .await
            .unwrap();
        enqueue(&runner, chapter_list_target(), "/series/solo-leveling").await;

        let summary = runner.run_pending(10).await.unwrap();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.enqueued, 2);

        let series = runner.store().get_series("asura", "solo-leveling").await.unwrap();
        assert_eq!(series.chapters_count, 2);
        assert_eq!(chapter_detail_requests(&runner).await.len(), 2);
    }

    #[tokio::test]
    async fn series_listing_queues_follow_ups_left_behind() {
        let runner = runner(fixtures(), 3).await;
        with_series(&runner).await;
        enqueue_list(&runner).await;

        let summary = runner.run_pending(1).await.unwrap();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.enqueued, 2);

        let pending = runner
            .store()
            .find_scrape_requests(&FindScrapeRequestParams::with_status(ScrapeRequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn settled_request_is_skipped_not_fatal() {
        let db = store().await;
        let fetcher = RacingFetcher {
            store: Database { pool: db.pool.clone() },
        };
        let runner = Runner::new(db, fetcher, config(3));

        let target = ScrapeTarget::SeriesList {
            provider: "asura".to_string(),
        };
        let raced = enqueue(&runner, target.clone(), "/race").await;
        enqueue(&runner, target, "/series").await;

        let summary = runner.run_pending(10).await.unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 0);

        let raced = runner.store().get_scrape_request(&raced.id).await.unwrap();
        assert_eq!(raced.status, ScrapeRequestStatus::Completed);
        assert!(!raced.error);
    }
}
