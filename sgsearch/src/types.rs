//! Normalized search result records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchResultKind {
    Organic,
    KnowledgeGraph,
    FeaturedSnippet,
    Local,
}

/// One search hit, in the shape handed to the model as a tool result.
///
/// Absent fields are left out of the JSON form entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: SearchResultKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub source: String,
}

impl SearchResult {
    pub fn new(kind: SearchResultKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            title: None,
            url: None,
            address: None,
            snippet: None,
            description: None,
            phone: None,
            website: None,
            rating: None,
            reviews: None,
            hours: None,
            position: None,
            source: source.into(),
        }
    }

    pub fn organic(title: impl Into<String>, url: impl Into<String>) -> Self {
        let mut result = Self::new(SearchResultKind::Organic, "SearchAPI");
        result.title = Some(title.into());
        result.url = Some(url.into());
        result
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }
}

/// Serializes a result list for a `tool` message; an empty list is `[]`.
pub fn results_to_json(results: &[SearchResult]) -> String {
    serde_json::to_string(results).unwrap_or_else(|_| "[]".to_string())
}
