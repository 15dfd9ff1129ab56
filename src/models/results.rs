//! Shapes produced by a fetcher for each kind of scrape request, and their
//! mapping onto the create/update parameters of the model.

use serde::{Deserialize, Serialize};

use super::chapter::{CreateInitChapterParams, UpdateInitChapterParams};
use super::scrape_request::ScrapeRequestType;
use super::series::{CreateInitSeriesParams, UpdateInitSeriesParams};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesListItem {
    pub slug: String,
    pub title: String,
    pub source_path: String,
    #[serde(rename = "thumbnailURL", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesListResult {
    pub series: Vec<SeriesListItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

impl SeriesListResult {
    pub fn create_params(&self, provider: &str) -> Vec<CreateInitSeriesParams> {
        self.series
            .iter()
            .map(|item| CreateInitSeriesParams {
                provider: provider.to_string(),
                slug: item.slug.clone(),
                title: item.title.clone(),
                source_path: item.source_path.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDetailResult {
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
}

impl SeriesDetailResult {
    pub fn into_update_params(self, provider: &str, slug: &str) -> UpdateInitSeriesParams {
        UpdateInitSeriesParams {
            provider: provider.to_string(),
            slug: slug.to_string(),
            thumbnail_url: self.thumbnail_url,
            synopsis: self.synopsis,
            genres: self.genres,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterListItem {
    pub slug: String,
    pub number: f64,
    pub short_title: String,
    pub source_href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterListResult {
    pub chapters: Vec<ChapterListItem>,
}

impl ChapterListResult {
    pub fn create_params(&self, provider: &str, series: &str) -> Vec<CreateInitChapterParams> {
        self.chapters
            .iter()
            .map(|item| CreateInitChapterParams {
                provider: provider.to_string(),
                series: series.to_string(),
                slug: item.slug.clone(),
                number: item.number,
                short_title: item.short_title.clone(),
                source_href: item.source_href.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDetailResult {
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

impl ChapterDetailResult {
    pub fn into_update_params(self, provider: &str, series: &str, slug: &str) -> UpdateInitChapterParams {
        UpdateInitChapterParams {
            provider: provider.to_string(),
            series: series.to_string(),
            slug: slug.to_string(),
            full_title: self.full_title,
            source_path: self.source_path,
            content_paths: self.content_paths,
            next_slug: self.next_slug,
            next_path: self.next_path,
            prev_slug: self.prev_slug,
            prev_path: self.prev_path,
        }
    }
}

/// Reader payload of image-based chapters that page through a script
/// instead of linking chapters by slug.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReaderScript {
    #[serde(rename = "prevURL", default, skip_serializing_if = "Option::is_none")]
    pub prev_url: Option<String>,
    #[serde(rename = "nextURL", default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ReaderScript {
    pub fn into_detail(self, full_title: impl Into<String>, source_path: impl Into<String>) -> ChapterDetailResult {
        ChapterDetailResult {
            full_title: full_title.into(),
            source_path: source_path.into(),
            content_paths: self.images,
            next_slug: None,
            next_path: self.next_url.filter(|u| !u.is_empty()),
            prev_slug: None,
            prev_path: self.prev_url.filter(|u| !u.is_empty()),
        }
    }
}

/// What a fetcher returns for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrapeOutcome {
    SeriesList(SeriesListResult),
    SeriesDetail(SeriesDetailResult),
    ChapterList(ChapterListResult),
    ChapterDetail(ChapterDetailResult),
}

impl ScrapeOutcome {
    pub fn request_type(&self) -> ScrapeRequestType {
        match self {
            ScrapeOutcome::SeriesList(_) => ScrapeRequestType::SeriesList,
            ScrapeOutcome::SeriesDetail(_) => ScrapeRequestType::SeriesDetail,
            ScrapeOutcome::ChapterList(_) => ScrapeRequestType::ChapterList,
            ScrapeOutcome::ChapterDetail(_) => ScrapeRequestType::ChapterDetail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_list_maps_to_create_params() {
        let list = ChapterListResult {
            chapters: vec![
                ChapterListItem {
                    slug: "chapter-2".to_string(),
                    number: 2.0,
                    short_title: "Ch. 2".to_string(),
                    source_href: "/c/2".to_string(),
                },
                ChapterListItem {
                    slug: "chapter-2-5".to_string(),
                    number: 2.5,
                    short_title: "Ch. 2.5".to_string(),
                    source_href: "/c/2-5".to_string(),
                },
                ChapterListItem {
                    slug: "chapter-1".to_string(),
                    number: 1.0,
                    short_title: "Ch. 1".to_string(),
                    source_href: "/c/1".to_string(),
                },
            ],
        };

        let params = list.create_params("asura", "solo-leveling");
        assert_eq!(params.len(), 3);
        assert!(params.iter().all(|p| p.validate().is_ok()));
    }

    #[test]
    fn series_detail_maps_to_update_params() {
        let detail = SeriesDetailResult {
            thumbnail_url: "https://cdn.example/a.webp".to_string(),
            synopsis: Some("A hunter levels up.".to_string()),
            genres: vec!["Action".to_string()],
        };

        let params = detail.into_update_params("asura", "solo-leveling");
        assert!(params.validate().is_ok());
        assert_eq!(params.genres, vec!["Action".to_string()]);
    }

    #[test]
    fn reader_script_becomes_chapter_detail() {
        let script: ReaderScript = serde_json::from_str(
            r#"{"prevURL":"/read/1","nextURL":"","images":["/img/1.jpg","/img/2.jpg"]}"#,
        )
        .unwrap();

        let detail = script.into_detail("Chapter 2", "/read/2");
        assert_eq!(detail.content_paths.len(), 2);
        assert_eq!(detail.prev_path.as_deref(), Some("/read/1"));
        assert_eq!(detail.next_path, None);

        let params = detail.into_update_params("asura", "solo-leveling", "chapter-2");
        assert!(params.validate().is_ok());
    }

    #[test]
    fn outcome_reports_its_type() {
        let outcome = ScrapeOutcome::ChapterList(ChapterListResult::default());
        assert_eq!(outcome.request_type(), ScrapeRequestType::ChapterList);
    }
}
