use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use super::{require, require_some};
use crate::error::{Result, ShelfError};
use crate::query::QueryParams;

/// The four kinds of scrape job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "scrape_request_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrapeRequestType {
    SeriesList,
    SeriesDetail,
    ChapterList,
    ChapterDetail,
}

impl ScrapeRequestType {
    pub const ALL: [ScrapeRequestType; 4] = [
        ScrapeRequestType::SeriesList,
        ScrapeRequestType::SeriesDetail,
        ScrapeRequestType::ChapterList,
        ScrapeRequestType::ChapterDetail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeRequestType::SeriesList => "SERIES_LIST",
            ScrapeRequestType::SeriesDetail => "SERIES_DETAIL",
            ScrapeRequestType::ChapterList => "CHAPTER_LIST",
            ScrapeRequestType::ChapterDetail => "CHAPTER_DETAIL",
        }
    }

    pub fn requires_series(&self) -> bool {
        !matches!(self, ScrapeRequestType::SeriesList)
    }

    pub fn requires_chapter(&self) -> bool {
        matches!(self, ScrapeRequestType::ChapterDetail)
    }
}

impl fmt::Display for ScrapeRequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeRequestType {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self> {
        ScrapeRequestType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ShelfError::invalid_input(format!("unknown scrape request type: {}", s)))
    }
}

/// Lifecycle state of a scrape request.
///
/// ```text
/// PENDING ──► COMPLETED
///    │  ▲
///    ▼  │ (retry)
///   FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "scrape_request_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrapeRequestStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl ScrapeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeRequestStatus::Pending => "PENDING",
            ScrapeRequestStatus::Completed => "COMPLETED",
            ScrapeRequestStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScrapeRequestStatus::Pending)
    }

    pub fn can_transition_to(&self, next: ScrapeRequestStatus) -> bool {
        use ScrapeRequestStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Failed) | (Failed, Pending)
        )
    }

    /// Checked transition. A completed request stays completed; a failed one
    /// may only go back to pending for another attempt.
    pub fn transition_to(self, next: ScrapeRequestStatus) -> Result<ScrapeRequestStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ShelfError::invalid_input(format!(
                "cannot move scrape request from {} to {}",
                self, next
            )))
        }
    }
}

impl fmt::Display for ScrapeRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeRequestStatus {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(ScrapeRequestStatus::Pending),
            "COMPLETED" => Ok(ScrapeRequestStatus::Completed),
            "FAILED" => Ok(ScrapeRequestStatus::Failed),
            _ => Err(ShelfError::invalid_input(format!(
                "unknown scrape request status: {}",
                s
            ))),
        }
    }
}

/// What a request scrapes. Each variant carries exactly the identifiers its
/// job kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrapeTarget {
    SeriesList {
        provider: String,
    },
    SeriesDetail {
        provider: String,
        series: String,
    },
    ChapterList {
        provider: String,
        series: String,
    },
    ChapterDetail {
        provider: String,
        series: String,
        chapter: String,
    },
}

impl ScrapeTarget {
    /// Builds a target from loose identifiers, checking the ones the type
    /// needs. Empty strings count as missing.
    pub fn from_parts(
        request_type: ScrapeRequestType,
        provider: String,
        series: Option<String>,
        chapter: Option<String>,
    ) -> Result<Self> {
        require("provider", &provider)?;
        let series = series.filter(|s| !s.is_empty());
        let chapter = chapter.filter(|c| !c.is_empty());

        let series = || series.clone().ok_or_else(|| ShelfError::required("series"));

        let target = match request_type {
            ScrapeRequestType::SeriesList => ScrapeTarget::SeriesList { provider },
            ScrapeRequestType::SeriesDetail => ScrapeTarget::SeriesDetail {
                provider,
                series: series()?,
            },
            ScrapeRequestType::ChapterList => ScrapeTarget::ChapterList {
                provider,
                series: series()?,
            },
            ScrapeRequestType::ChapterDetail => ScrapeTarget::ChapterDetail {
                provider,
                series: series()?,
                chapter: chapter.ok_or_else(|| ShelfError::required("chapter"))?,
            },
        };
        Ok(target)
    }

    pub fn request_type(&self) -> ScrapeRequestType {
        match self {
            ScrapeTarget::SeriesList { .. } => ScrapeRequestType::SeriesList,
            ScrapeTarget::SeriesDetail { .. } => ScrapeRequestType::SeriesDetail,
            ScrapeTarget::ChapterList { .. } => ScrapeRequestType::ChapterList,
            ScrapeTarget::ChapterDetail { .. } => ScrapeRequestType::ChapterDetail,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            ScrapeTarget::SeriesList { provider }
            | ScrapeTarget::SeriesDetail { provider, .. }
            | ScrapeTarget::ChapterList { provider, .. }
            | ScrapeTarget::ChapterDetail { provider, .. } => provider,
        }
    }

    pub fn series(&self) -> Option<&str> {
        match self {
            ScrapeTarget::SeriesList { .. } => None,
            ScrapeTarget::SeriesDetail { series, .. }
            | ScrapeTarget::ChapterList { series, .. }
            | ScrapeTarget::ChapterDetail { series, .. } => Some(series),
        }
    }

    pub fn chapter(&self) -> Option<&str> {
        match self {
            ScrapeTarget::ChapterDetail { chapter, .. } => Some(chapter),
            _ => None,
        }
    }
}

/// A unit of scraping work as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub id: String,
    #[serde(flatten)]
    pub target: ScrapeTarget,
    pub status: ScrapeRequestStatus,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    pub request_path: String,
    pub retries: i32,
    /// Milliseconds.
    pub total_time: i64,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScrapeRequest {
    pub fn request_type(&self) -> ScrapeRequestType {
        self.target.request_type()
    }

    /// Absolute URL the request points at.
    pub fn url(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?.join(&self.request_path)?)
    }
}

/// Loose creation input, as it arrives from callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScrapeRequestParams {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<ScrapeRequestType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ScrapeRequestStatus>,
    #[serde(rename = "baseURL", default)]
    pub base_url: String,
    #[serde(default)]
    pub request_path: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub series: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chapter: String,
}

impl CreateScrapeRequestParams {
    /// Checks the base fields in the order type, baseURL, requestPath,
    /// status, provider, then the fields the type requires. The first
    /// missing field is reported.
    pub fn validate(&self) -> Result<()> {
        require_some("type", &self.request_type)?;
        require("baseURL", &self.base_url)?;
        require("requestPath", &self.request_path)?;
        require_some("status", &self.status)?;
        require("provider", &self.provider)?;

        match self.request_type {
            Some(ScrapeRequestType::SeriesDetail) | Some(ScrapeRequestType::ChapterList) => {
                require("series", &self.series)?;
            }
            Some(ScrapeRequestType::ChapterDetail) => {
                require("series", &self.series)?;
                require("chapter", &self.chapter)?;
            }
            Some(ScrapeRequestType::SeriesList) | None => {}
        }
        Ok(())
    }
}

/// A validated, typed request ready to be enqueued. Always starts pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScrapeRequest {
    pub target: ScrapeTarget,
    pub base_url: String,
    pub request_path: String,
}

impl NewScrapeRequest {
    pub fn new(target: ScrapeTarget, base_url: impl Into<String>, request_path: impl Into<String>) -> Self {
        Self {
            target,
            base_url: base_url.into(),
            request_path: request_path.into(),
        }
    }

    pub fn status(&self) -> ScrapeRequestStatus {
        ScrapeRequestStatus::Pending
    }

    pub fn validate(&self) -> Result<()> {
        require("baseURL", &self.base_url)?;
        require("requestPath", &self.request_path)?;
        require("provider", self.target.provider())?;
        Ok(())
    }
}

impl TryFrom<CreateScrapeRequestParams> for NewScrapeRequest {
    type Error = ShelfError;

    fn try_from(params: CreateScrapeRequestParams) -> Result<Self> {
        params.validate()?;

        if params.status != Some(ScrapeRequestStatus::Pending) {
            return Err(ShelfError::invalid_input(
                "status must be PENDING for a new scrape request",
            ));
        }

        let request_type = params
            .request_type
            .ok_or_else(|| ShelfError::required("type"))?;
        let target = ScrapeTarget::from_parts(
            request_type,
            params.provider,
            Some(params.series),
            Some(params.chapter),
        )?;

        Ok(Self {
            target,
            base_url: params.base_url,
            request_path: params.request_path,
        })
    }
}

/// Outcome bookkeeping for a request. Only `id` and `status` are checked;
/// the telemetry fields are written as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScrapeRequestParams {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ScrapeRequestStatus>,
    #[serde(default)]
    pub retries: i32,
    #[serde(default)]
    pub total_time: i64,
    #[serde(default)]
    pub error: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl UpdateScrapeRequestParams {
    pub fn completed(id: impl Into<String>, retries: i32, total_time: i64) -> Self {
        Self {
            id: id.into(),
            status: Some(ScrapeRequestStatus::Completed),
            retries,
            total_time,
            error: false,
            message: String::new(),
        }
    }

    pub fn failed(id: impl Into<String>, retries: i32, total_time: i64, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: Some(ScrapeRequestStatus::Failed),
            retries,
            total_time,
            error: true,
            message: message.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("id", &self.id)?;
        require_some("status", &self.status)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindScrapeRequestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<ScrapeRequestType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ScrapeRequestStatus>,
    #[serde(flatten)]
    pub query: QueryParams,
}

impl FindScrapeRequestParams {
    pub fn with_status(status: ScrapeRequestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}
