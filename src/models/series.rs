use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require;
use crate::error::{Result, ShelfError};
use crate::query::QueryParams;

/// A titled work under a provider, keyed by `(provider, slug)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub provider: String,
    pub slug: String,
    pub title: String,
    pub source_path: String,
    #[serde(rename = "thumbnailURL", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub chapters_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_chapter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInitSeriesParams {
    pub provider: String,
    pub slug: String,
    pub title: String,
    pub source_path: String,
}

impl CreateInitSeriesParams {
    pub fn validate(&self) -> Result<()> {
        require("provider", &self.provider)?;
        require("slug", &self.slug)?;
        require("title", &self.title)?;
        require("sourcePath", &self.source_path)?;
        Ok(())
    }
}

/// Detail fields scraped from a series page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInitSeriesParams {
    pub provider: String,
    pub slug: String,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
}

impl UpdateInitSeriesParams {
    pub fn validate(&self) -> Result<()> {
        require("provider", &self.provider)?;
        require("slug", &self.slug)?;
        require("thumbnailURL", &self.thumbnail_url)?;
        Ok(())
    }
}

/// Advances a series by `add_chapters` and points it at a new latest chapter.
///
/// Only zero is rejected; a negative delta passes validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLatestSeriesParams {
    pub provider: String,
    pub slug: String,
    pub add_chapters: i64,
    pub latest_chapter: String,
}

impl UpdateLatestSeriesParams {
    pub fn validate(&self) -> Result<()> {
        require("provider", &self.provider)?;
        require("slug", &self.slug)?;
        if self.add_chapters == 0 {
            return Err(ShelfError::required("addChapters"));
        }
        require("latestChapter", &self.latest_chapter)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindSeriesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(flatten)]
    pub query: QueryParams,
}

impl FindSeriesParams {
    pub fn by_provider(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::default()
        }
    }
}
