use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses `"asc"`/`"desc"`. Anything else falls back to ascending.
    pub fn parse(value: &str) -> Self {
        match value {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl From<&str> for SortOrder {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for SortOrder {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Ordering and pagination shared by every find operation.
///
/// No validation happens here; whether page/size and cursor may be combined
/// is up to the store that consumes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl QueryParams {
    pub fn ordered(order: SortOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn paged(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn after(cursor: impl Into<String>, size: u32) -> Self {
        Self {
            size: Some(size),
            cursor: Some(cursor.into()),
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Row offset for offset pagination. Page numbers are 1-based; page 0 is
    /// treated as the first page.
    pub fn offset(&self) -> Option<u64> {
        let size = self.size? as u64;
        let page = self.page.unwrap_or(1).max(1) as u64;
        Some((page - 1) * size)
    }
}

/// One page of results plus the cursor for the page after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sort_order_is_total() {
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse(""), SortOrder::Asc);
        assert_eq!(SortOrder::parse("DESC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Asc);
        assert_eq!(SortOrder::from("desc"), SortOrder::Desc);
    }

    #[test]
    fn wire_order_never_fails() {
        for (raw, expected) in [
            ("desc", SortOrder::Desc),
            ("asc", SortOrder::Asc),
            ("DESC", SortOrder::Asc),
            ("", SortOrder::Asc),
            ("sideways", SortOrder::Asc),
        ] {
            let json = format!(r#"{{"order":"{}"}}"#, raw);
            let params: QueryParams = serde_json::from_str(&json).unwrap();
            assert_eq!(params.order, expected, "order {:?}", raw);
        }

        assert_eq!(serde_json::to_string(&SortOrder::Desc).unwrap(), r#""desc""#);
    }

    #[test]
    fn offset_is_one_based() {
        assert_eq!(QueryParams::paged(1, 20).offset(), Some(0));
        assert_eq!(QueryParams::paged(3, 20).offset(), Some(40));
        assert_eq!(QueryParams::paged(0, 10).offset(), Some(0));
        assert_eq!(QueryParams::default().offset(), None);
    }

    #[test]
    fn query_params_deserialize_with_defaults() {
        let params: QueryParams = serde_json::from_str(r#"{"page":2,"size":5}"#).unwrap();
        assert_eq!(params.order, SortOrder::Asc);
        assert_eq!(params.offset(), Some(5));
        assert!(params.cursor.is_none());
    }
}
