use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;

use super::require;
use crate::error::Result;
use crate::query::QueryParams;

/// A content source, keyed by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub slug: String,
    pub name: String,
    pub is_active: bool,
    pub scheme: String,
    pub host: String,
    pub list_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    /// `scheme://host` of the provider.
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}://{}", self.scheme, self.host))?)
    }

    pub fn list_url(&self) -> Result<Url> {
        Ok(self.base_url()?.join(&self.list_path)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderParams {
    pub slug: String,
    pub name: String,
    pub scheme: String,
    pub host: String,
    pub list_path: String,
    /// `None` leaves the flag to the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ProviderParams {
    pub fn validate(&self) -> Result<()> {
        require("slug", &self.slug)?;
        require("name", &self.name)?;
        require("scheme", &self.scheme)?;
        require("host", &self.host)?;
        require("listPath", &self.list_path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindProviderParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub query: QueryParams,
}
