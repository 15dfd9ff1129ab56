use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::require;
use crate::error::Result;
use crate::query::QueryParams;

/// An installment of a series, keyed by `(provider, series, slug)`.
///
/// `number` orders chapters within a series; fractional values are extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub provider: String,
    pub series: String,
    pub slug: String,
    pub number: f64,
    pub short_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_title: Option<String>,
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    pub fn cmp_number(&self, other: &Self) -> Ordering {
        self.number.total_cmp(&other.number)
    }
}

/// Sorts chapters by number and rewrites their prev/next links from their
/// neighbours. The first chapter loses its prev link, the last its next link.
pub fn link_chapters(chapters: &mut [Chapter]) {
    chapters.sort_by(Chapter::cmp_number);

    let keys: Vec<(String, String)> = chapters
        .iter()
        .map(|c| (c.slug.clone(), c.source_path.clone()))
        .collect();

    for (i, chapter) in chapters.iter_mut().enumerate() {
        let prev = i.checked_sub(1).and_then(|p| keys.get(p));
        let next = keys.get(i + 1);

        chapter.prev_slug = prev.map(|(slug, _)| slug.clone());
        chapter.prev_path = prev.map(|(_, path)| path.clone());
        chapter.next_slug = next.map(|(slug, _)| slug.clone());
        chapter.next_path = next.map(|(_, path)| path.clone());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInitChapterParams {
    pub provider: String,
    pub series: String,
    pub slug: String,
    #[serde(default)]
    pub number: f64,
    pub short_title: String,
    pub source_href: String,
}

impl CreateInitChapterParams {
    pub fn validate(&self) -> Result<()> {
        require("provider", &self.provider)?;
        require("series", &self.series)?;
        require("slug", &self.slug)?;
        require("shortTitle", &self.short_title)?;
        require("sourceHref", &self.source_href)?;
        Ok(())
    }
}

/// Full content and navigation for a chapter. Navigation is optional since a
/// chapter may be the first or last of its series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInitChapterParams {
    pub provider: String,
    pub series: String,
    pub slug: String,
    pub full_title: String,
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_path: Option<String>,
}

impl UpdateInitChapterParams {
    pub fn validate(&self) -> Result<()> {
        require("provider", &self.provider)?;
        require("series", &self.series)?;
        require("slug", &self.slug)?;
        require("fullTitle", &self.full_title)?;
        require("sourcePath", &self.source_path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindChapterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(flatten)]
    pub query: QueryParams,
}

impl FindChapterParams {
    pub fn by_series(provider: impl Into<String>, series: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            series: Some(series.into()),
            ..Self::default()
        }
    }
}
