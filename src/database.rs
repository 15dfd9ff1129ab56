use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{Result, ShelfError};
use crate::models::*;
use crate::query::{Page, QueryParams};
use crate::traits::*;

const CURSOR_PREFIX: &str = "off:";

pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database: {}", config.url);

        // Extract directory path from database URL
        if let Some(path) = config.url.strip_prefix("sqlite:") {
            let path = std::path::Path::new(path.trim_start_matches("//"));
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !is_memory_url(&config.url) {
                    info!("Creating directory: {:?}", parent);
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections.max(1));
        if is_memory_url(&config.url) {
            // An in-memory database lives only as long as its connection
            pool_options = pool_options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = pool_options.connect_with(options).await?;
        info!("Database connected successfully");
        Ok(Self { pool })
    }

    pub async fn init(&self) -> Result<()> {
        info!("Initializing database schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS providers (
                slug TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                scheme TEXT NOT NULL,
                host TEXT NOT NULL,
                list_path TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS series (
                provider TEXT NOT NULL,
                slug TEXT NOT NULL,
                title TEXT NOT NULL,
                source_path TEXT NOT NULL,
                thumbnail_url TEXT,
                synopsis TEXT,
                genres TEXT NOT NULL DEFAULT '[]',
                chapters_count INTEGER NOT NULL DEFAULT 0,
                latest_chapter TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (provider) REFERENCES providers (slug),
                UNIQUE(provider, slug)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chapters (
                provider TEXT NOT NULL,
                series TEXT NOT NULL,
                slug TEXT NOT NULL,
                number REAL NOT NULL,
                short_title TEXT NOT NULL,
                full_title TEXT,
                source_path TEXT NOT NULL,
                content_paths TEXT NOT NULL DEFAULT '[]',
                next_slug TEXT,
                next_path TEXT,
                prev_slug TEXT,
                prev_path TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (provider, series) REFERENCES series (provider, slug),
                UNIQUE(provider, series, slug)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scrape_requests (
                id TEXT PRIMARY KEY,
                request_type TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                base_url TEXT NOT NULL,
                request_path TEXT NOT NULL,
                provider TEXT NOT NULL,
                series TEXT,
                chapter TEXT,
                retries INTEGER NOT NULL DEFAULT 0,
                total_time INTEGER NOT NULL DEFAULT 0,
                error INTEGER NOT NULL DEFAULT 0,
                message TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cron_jobs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                crontab TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cron_job_statuses (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL,
                status TEXT NOT NULL,
                message TEXT,
                duration INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (job_id) REFERENCES cron_jobs (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chapters_number ON chapters (provider, series, number)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scrape_requests_status ON scrape_requests (status, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cron_job_statuses_job_id ON cron_job_statuses (job_id, created_at)")
            .execute(&self.pool)
            .await?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Creates the configured providers that are not stored yet. Returns how
    /// many were added.
    pub async fn seed_providers(&self, providers: &[ProviderParams]) -> Result<usize> {
        let mut added = 0;
        for params in providers {
            params.validate()?;
            match self.get_provider(&params.slug).await {
                Ok(_) => {
                    info!("Provider '{}' already exists in database", params.slug);
                }
                Err(e) if e.is(crate::error::ErrorKind::NotFound) => {
                    self.create_provider(params).await?;
                    info!("Added provider '{}' to database", params.slug);
                    added += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn encode_cursor(offset: u64) -> String {
    format!("{}{}", CURSOR_PREFIX, offset)
}

fn decode_cursor(cursor: &str) -> Result<u64> {
    cursor
        .strip_prefix(CURSOR_PREFIX)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| ShelfError::invalid_input(format!("invalid cursor: {}", cursor)))
}

/// Appends ORDER BY / LIMIT / OFFSET. A cursor, when present, takes the
/// place of page and size-derived offsets. Returns the offset in use.
fn paginate(qb: &mut QueryBuilder<'_, Sqlite>, query: &QueryParams, order_by: &str) -> Result<u64> {
    let direction = query.order.as_sql();
    qb.push(format!(" ORDER BY {} {}, rowid {}", order_by, direction, direction));

    let offset = match &query.cursor {
        Some(cursor) => decode_cursor(cursor)?,
        None => query.offset().unwrap_or(0),
    };

    match query.size {
        Some(size) => {
            qb.push(" LIMIT ").push_bind(size as i64);
        }
        None => {
            qb.push(" LIMIT -1");
        }
    }
    qb.push(" OFFSET ").push_bind(offset as i64);

    Ok(offset)
}

fn into_page<T>(items: Vec<T>, query: &QueryParams, offset: u64) -> Page<T> {
    let next_cursor = match query.size {
        Some(size) if size > 0 && items.len() == size as usize => {
            Some(encode_cursor(offset + size as u64))
        }
        _ => None,
    };
    Page { items, next_cursor }
}

fn json_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

fn parse_list(raw: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(raw)?)
}

fn optional(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(FromRow)]
struct SeriesRow {
    provider: String,
    slug: String,
    title: String,
    source_path: String,
    thumbnail_url: Option<String>,
    synopsis: Option<String>,
    genres: String,
    chapters_count: i64,
    latest_chapter: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SeriesRow> for Series {
    type Error = ShelfError;

    fn try_from(row: SeriesRow) -> Result<Self> {
        Ok(Series {
            genres: parse_list(&row.genres)?,
            provider: row.provider,
            slug: row.slug,
            title: row.title,
            source_path: row.source_path,
            thumbnail_url: row.thumbnail_url,
            synopsis: row.synopsis,
            chapters_count: row.chapters_count,
            latest_chapter: row.latest_chapter,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ChapterRow {
    provider: String,
    series: String,
    slug: String,
    number: f64,
    short_title: String,
    full_title: Option<String>,
    source_path: String,
    content_paths: String,
    next_slug: Option<String>,
    next_path: Option<String>,
    prev_slug: Option<String>,
    prev_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ChapterRow> for Chapter {
    type Error = ShelfError;

    fn try_from(row: ChapterRow) -> Result<Self> {
        Ok(Chapter {
            content_paths: parse_list(&row.content_paths)?,
            provider: row.provider,
            series: row.series,
            slug: row.slug,
            number: row.number,
            short_title: row.short_title,
            full_title: row.full_title,
            source_path: row.source_path,
            next_slug: row.next_slug,
            next_path: row.next_path,
            prev_slug: row.prev_slug,
            prev_path: row.prev_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ScrapeRequestRow {
    id: String,
    request_type: ScrapeRequestType,
    status: ScrapeRequestStatus,
    base_url: String,
    request_path: String,
    provider: String,
    series: Option<String>,
    chapter: Option<String>,
    retries: i32,
    total_time: i64,
    error: bool,
    message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ScrapeRequestRow> for ScrapeRequest {
    type Error = ShelfError;

    fn try_from(row: ScrapeRequestRow) -> Result<Self> {
        let target = ScrapeTarget::from_parts(row.request_type, row.provider, row.series, row.chapter)
            .map_err(|e| {
                ShelfError::wrap(
                    crate::error::ErrorKind::Unknown,
                    e,
                    format!("stored scrape request {} is inconsistent", row.id),
                )
            })?;

        Ok(ScrapeRequest {
            id: row.id,
            target,
            status: row.status,
            base_url: row.base_url,
            request_path: row.request_path,
            retries: row.retries,
            total_time: row.total_time,
            error: row.error,
            message: row.message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CronJobRow {
    id: String,
    name: String,
    crontab: String,
    tags: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CronJobRow> for CronJob {
    type Error = ShelfError;

    fn try_from(row: CronJobRow) -> Result<Self> {
        Ok(CronJob {
            tags: parse_list(&row.tags)?,
            id: row.id,
            name: row.name,
            crontab: row.crontab,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = ShelfError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Recomputes the prev/next links of a series inside `conn` and returns the
/// chapters in number order.
async fn relink_series(conn: &mut SqliteConnection, provider: &str, series: &str) -> Result<Vec<Chapter>> {
    let rows = sqlx::query_as::<_, ChapterRow>(
        "SELECT * FROM chapters WHERE provider = ? AND series = ? ORDER BY number, rowid",
    )
    .bind(provider)
    .bind(series)
    .fetch_all(&mut *conn)
    .await?;

    let mut chapters: Vec<Chapter> = convert_all(rows)?;
    link_chapters(&mut chapters);

    let now = Utc::now();
    for chapter in &chapters {
        sqlx::query(
            r#"
            UPDATE chapters
            SET next_slug = ?, next_path = ?, prev_slug = ?, prev_path = ?, updated_at = ?
            WHERE provider = ? AND series = ? AND slug = ?
            "#,
        )
        .bind(&chapter.next_slug)
        .bind(&chapter.next_path)
        .bind(&chapter.prev_slug)
        .bind(&chapter.prev_path)
        .bind(now)
        .bind(&chapter.provider)
        .bind(&chapter.series)
        .bind(&chapter.slug)
        .execute(&mut *conn)
        .await?;
    }

    Ok(chapters)
}

#[async_trait::async_trait]
impl ProviderRepository for Database {
    async fn create_provider(&self, params: &ProviderParams) -> Result<Provider> {
        params.validate()?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO providers (slug, name, is_active, scheme, host, list_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&params.slug)
        .bind(&params.name)
        .bind(params.is_active.unwrap_or(true))
        .bind(&params.scheme)
        .bind(&params.host)
        .bind(&params.list_path)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!("Created provider {}", params.slug);
        self.get_provider(&params.slug).await
    }

    async fn update_provider(&self, params: &ProviderParams) -> Result<Provider> {
        params.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE providers
            SET name = ?, scheme = ?, host = ?, list_path = ?, is_active = COALESCE(?, is_active), updated_at = ?
            WHERE slug = ?
            "#,
        )
        .bind(&params.name)
        .bind(&params.scheme)
        .bind(&params.host)
        .bind(&params.list_path)
        .bind(params.is_active)
        .bind(Utc::now())
        .bind(&params.slug)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShelfError::not_found(format!("provider {} not found", params.slug)));
        }
        self.get_provider(&params.slug).await
    }

    async fn get_provider(&self, slug: &str) -> Result<Provider> {
        sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ShelfError::not_found(format!("provider {} not found", slug)))
    }

    async fn find_providers(&self, params: &FindProviderParams) -> Result<Page<Provider>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM providers WHERE 1 = 1");
        if let Some(is_active) = params.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        let offset = paginate(&mut qb, &params.query, "slug")?;

        let providers = qb.build_query_as::<Provider>().fetch_all(&self.pool).await?;
        Ok(into_page(providers, &params.query, offset))
    }
}

#[async_trait::async_trait]
impl SeriesRepository for Database {
    async fn create_init_series(&self, params: &CreateInitSeriesParams) -> Result<Series> {
        params.validate()?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO series (provider, slug, title, source_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&params.provider)
        .bind(&params.slug)
        .bind(&params.title)
        .bind(&params.source_path)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!("Created series {}/{}", params.provider, params.slug);
        self.get_series(&params.provider, &params.slug).await
    }

    async fn update_init_series(&self, params: &UpdateInitSeriesParams) -> Result<Series> {
        params.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE series
            SET thumbnail_url = ?, synopsis = ?, genres = ?, updated_at = ?
            WHERE provider = ? AND slug = ?
            "#,
        )
        .bind(&params.thumbnail_url)
        .bind(&params.synopsis)
        .bind(json_list(&params.genres)?)
        .bind(Utc::now())
        .bind(&params.provider)
        .bind(&params.slug)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShelfError::not_found(format!(
                "series {}/{} not found",
                params.provider, params.slug
            )));
        }
        self.get_series(&params.provider, &params.slug).await
    }

    async fn update_latest_series(&self, params: &UpdateLatestSeriesParams) -> Result<Series> {
        params.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE series
            SET chapters_count = chapters_count + ?, latest_chapter = ?, updated_at = ?
            WHERE provider = ? AND slug = ?
            "#,
        )
        .bind(params.add_chapters)
        .bind(&params.latest_chapter)
        .bind(Utc::now())
        .bind(&params.provider)
        .bind(&params.slug)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShelfError::not_found(format!(
                "series {}/{} not found",
                params.provider, params.slug
            )));
        }

        debug!(
            "Series {}/{} advanced by {} to {}",
            params.provider, params.slug, params.add_chapters, params.latest_chapter
        );
        self.get_series(&params.provider, &params.slug).await
    }

    async fn get_series(&self, provider: &str, slug: &str) -> Result<Series> {
        sqlx::query_as::<_, SeriesRow>("SELECT * FROM series WHERE provider = ? AND slug = ?")
            .bind(provider)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ShelfError::not_found(format!("series {}/{} not found", provider, slug)))?
            .try_into()
    }

    async fn find_series(&self, params: &FindSeriesParams) -> Result<Page<Series>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM series WHERE 1 = 1");
        if let Some(provider) = &params.provider {
            qb.push(" AND provider = ").push_bind(provider.clone());
        }
        if let Some(slug) = &params.slug {
            qb.push(" AND slug = ").push_bind(slug.clone());
        }
        let offset = paginate(&mut qb, &params.query, "title")?;

        let rows = qb.build_query_as::<SeriesRow>().fetch_all(&self.pool).await?;
        Ok(into_page(convert_all(rows)?, &params.query, offset))
    }
}

#[async_trait::async_trait]
impl ChapterRepository for Database {
    async fn create_init_chapter(&self, params: &CreateInitChapterParams) -> Result<Chapter> {
        params.validate()?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO chapters (provider, series, slug, number, short_title, source_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&params.provider)
        .bind(&params.series)
        .bind(&params.slug)
        .bind(params.number)
        .bind(&params.short_title)
        .bind(&params.source_href)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!("Created chapter {}/{}/{}", params.provider, params.series, params.slug);
        self.get_chapter(&params.provider, &params.series, &params.slug).await
    }

    async fn update_init_chapter(&self, params: &UpdateInitChapterParams) -> Result<Chapter> {
        params.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE chapters
            SET full_title = ?, source_path = ?, content_paths = ?,
                next_slug = ?, next_path = ?, prev_slug = ?, prev_path = ?, updated_at = ?
            WHERE provider = ? AND series = ? AND slug = ?
            "#,
        )
        .bind(&params.full_title)
        .bind(&params.source_path)
        .bind(json_list(&params.content_paths)?)
        .bind(&params.next_slug)
        .bind(&params.next_path)
        .bind(&params.prev_slug)
        .bind(&params.prev_path)
        .bind(Utc::now())
        .bind(&params.provider)
        .bind(&params.series)
        .bind(&params.slug)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShelfError::not_found(format!(
                "chapter {}/{}/{} not found",
                params.provider, params.series, params.slug
            )));
        }
        self.get_chapter(&params.provider, &params.series, &params.slug).await
    }

    async fn relink_chapters(&self, provider: &str, series: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let chapters = relink_series(&mut tx, provider, series).await?;
        tx.commit().await?;

        debug!("Relinked {} chapters of {}/{}", chapters.len(), provider, series);
        Ok(())
    }

    async fn add_chapters(
        &self,
        provider: &str,
        series: &str,
        chapters: &[CreateInitChapterParams],
    ) -> Result<Vec<Chapter>> {
        for params in chapters {
            params.validate()?;
            if params.provider != provider || params.series != series {
                return Err(ShelfError::invalid_input(format!(
                    "chapter {} is not part of {}/{}",
                    params.slug, provider, series
                )));
            }
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut added = HashSet::new();
        for params in chapters {
            let result = sqlx::query(
                r#"
                INSERT INTO chapters (provider, series, slug, number, short_title, source_path, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (provider, series, slug) DO NOTHING
                "#,
            )
            .bind(&params.provider)
            .bind(&params.series)
            .bind(&params.slug)
            .bind(params.number)
            .bind(&params.short_title)
            .bind(&params.source_href)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                added.insert(params.slug.as_str());
            }
        }

        if added.is_empty() {
            return Ok(Vec::new());
        }

        let linked = relink_series(&mut tx, provider, series).await?;
        let latest = UpdateLatestSeriesParams {
            provider: provider.to_string(),
            slug: series.to_string(),
            add_chapters: added.len() as i64,
            latest_chapter: linked.last().map(|c| c.slug.clone()).unwrap_or_default(),
        };
        latest.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE series
            SET chapters_count = chapters_count + ?, latest_chapter = ?, updated_at = ?
            WHERE provider = ? AND slug = ?
            "#,
        )
        .bind(latest.add_chapters)
        .bind(&latest.latest_chapter)
        .bind(now)
        .bind(provider)
        .bind(series)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShelfError::not_found(format!("series {}/{} not found", provider, series)));
        }

        tx.commit().await?;

        debug!(
            "Added {} chapters to {}/{}, latest {}",
            added.len(),
            provider,
            series,
            latest.latest_chapter
        );
        Ok(linked
            .into_iter()
            .filter(|c| added.contains(c.slug.as_str()))
            .collect())
    }

    async fn get_chapter(&self, provider: &str, series: &str, slug: &str) -> Result<Chapter> {
        sqlx::query_as::<_, ChapterRow>(
            "SELECT * FROM chapters WHERE provider = ? AND series = ? AND slug = ?",
        )
        .bind(provider)
        .bind(series)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            ShelfError::not_found(format!("chapter {}/{}/{} not found", provider, series, slug))
        })?
        .try_into()
    }

    async fn find_chapters(&self, params: &FindChapterParams) -> Result<Page<Chapter>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM chapters WHERE 1 = 1");
        if let Some(provider) = &params.provider {
            qb.push(" AND provider = ").push_bind(provider.clone());
        }
        if let Some(series) = &params.series {
            qb.push(" AND series = ").push_bind(series.clone());
        }
        if let Some(slug) = &params.slug {
            qb.push(" AND slug = ").push_bind(slug.clone());
        }
        let offset = paginate(&mut qb, &params.query, "number")?;

        let rows = qb.build_query_as::<ChapterRow>().fetch_all(&self.pool).await?;
        Ok(into_page(convert_all(rows)?, &params.query, offset))
    }
}

#[async_trait::async_trait]
impl ScrapeRequestRepository for Database {
    async fn create_scrape_request(&self, request: &NewScrapeRequest) -> Result<ScrapeRequest> {
        request.validate()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO scrape_requests (id, request_type, status, base_url, request_path, provider, series, chapter, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(request.target.request_type())
        .bind(request.status())
        .bind(&request.base_url)
        .bind(&request.request_path)
        .bind(request.target.provider())
        .bind(request.target.series())
        .bind(request.target.chapter())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!("Queued {} request {} for {}", request.target.request_type(), id, request.target.provider());
        self.get_scrape_request(&id).await
    }

    async fn update_scrape_request(&self, params: &UpdateScrapeRequestParams) -> Result<ScrapeRequest> {
        params.validate()?;
        let next = params.status.ok_or_else(|| ShelfError::required("status"))?;

        let mut tx = self.pool.begin().await?;

        let current: ScrapeRequestStatus =
            sqlx::query_scalar("SELECT status FROM scrape_requests WHERE id = ?")
                .bind(&params.id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ShelfError::not_found(format!("scrape request {} not found", params.id)))?;

        current.transition_to(next)?;

        sqlx::query(
            r#"
            UPDATE scrape_requests
            SET status = ?, retries = ?, total_time = ?, error = ?, message = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(next)
        .bind(params.retries)
        .bind(params.total_time)
        .bind(params.error)
        .bind(optional(&params.message))
        .bind(Utc::now())
        .bind(&params.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!("Scrape request {} moved from {} to {}", params.id, current, next);
        self.get_scrape_request(&params.id).await
    }

    async fn get_scrape_request(&self, id: &str) -> Result<ScrapeRequest> {
        sqlx::query_as::<_, ScrapeRequestRow>("SELECT * FROM scrape_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ShelfError::not_found(format!("scrape request {} not found", id)))?
            .try_into()
    }

    async fn find_scrape_requests(&self, params: &FindScrapeRequestParams) -> Result<Page<ScrapeRequest>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM scrape_requests WHERE 1 = 1");
        if let Some(provider) = &params.provider {
            qb.push(" AND provider = ").push_bind(provider.clone());
        }
        if let Some(series) = &params.series {
            qb.push(" AND series = ").push_bind(series.clone());
        }
        if let Some(request_type) = params.request_type {
            qb.push(" AND request_type = ").push_bind(request_type);
        }
        if let Some(status) = params.status {
            qb.push(" AND status = ").push_bind(status);
        }
        let offset = paginate(&mut qb, &params.query, "created_at")?;

        let rows = qb.build_query_as::<ScrapeRequestRow>().fetch_all(&self.pool).await?;
        Ok(into_page(convert_all(rows)?, &params.query, offset))
    }
}

#[async_trait::async_trait]
impl CronJobRepository for Database {
    async fn create_cron_job(&self, job: &NewCronJob) -> Result<CronJob> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO cron_jobs (id, name, crontab, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&job.name)
        .bind(&job.crontab)
        .bind(json_list(&job.tags)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, CronJobRow>("SELECT * FROM cron_jobs WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    async fn list_cron_jobs(&self) -> Result<Vec<CronJob>> {
        let rows = sqlx::query_as::<_, CronJobRow>("SELECT * FROM cron_jobs ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn append_cron_job_status(&self, status: &CronJobStatus) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cron_job_statuses (id, job_id, status, message, duration, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&status.id)
        .bind(&status.job_id)
        .bind(status.status)
        .bind(&status.message)
        .bind(status.duration)
        .bind(status.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cron_job_history(&self, job_id: &str, query: &QueryParams) -> Result<Page<CronJobStatus>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM cron_job_statuses WHERE job_id = ");
        qb.push_bind(job_id.to_string());
        let offset = paginate(&mut qb, query, "created_at")?;

        let statuses = qb.build_query_as::<CronJobStatus>().fetch_all(&self.pool).await?;
        Ok(into_page(statuses, query, offset))
    }
}
