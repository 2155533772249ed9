//! SearchAPI.io backend for web and Google Maps searches.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use sgprovider::SecretString;

use crate::{SearchError, SearchFuture, SearchProvider, SearchResult, SearchResultKind};

pub const DEFAULT_SEARCHAPI_BASE_URL: &str = "https://www.searchapi.io/api/v1/search";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const WEB_SOURCE: &str = "SearchAPI";
const KNOWLEDGE_GRAPH_SOURCE: &str = "SearchAPI Knowledge Graph";
const FEATURED_SNIPPET_SOURCE: &str = "SearchAPI Featured Snippet";
const MAPS_SOURCE: &str = "SearchAPI Google Maps";

#[derive(Debug, Clone)]
pub struct SearchApiProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl SearchApiProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Result<Self, SearchError> {
        let api_key = SecretString::new(api_key.into().trim());
        if api_key.is_empty() {
            return Err(SearchError::authentication(
                "SearchAPI key must not be empty",
            ));
        }

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_SEARCHAPI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the key with a one-result web query.
    pub async fn validate(&self) -> Result<(), SearchError> {
        let results = self.search("test", 1).await?;
        if results.is_empty() {
            return Err(SearchError::api("validation query returned no results"));
        }

        Ok(())
    }

    async fn fetch(&self, params: &[(&str, String)]) -> Result<SearchApiResponse, SearchError> {
        let engine = params
            .iter()
            .find(|(key, _)| *key == "engine")
            .map(|(_, value)| value.as_str())
            .unwrap_or_default();
        tracing::debug!(
            phase = "search",
            event = "request_start",
            engine,
            "sending SearchAPI request"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("api_key", self.api_key.expose())])
            .query(params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| SearchError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("SearchAPI request failed with status {status}");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SearchError::authentication(message)
                }
                _ => SearchError::api(message),
            });
        }

        let body: SearchApiResponse = response
            .json()
            .await
            .map_err(|err| SearchError::transport(format!("malformed SearchAPI response: {err}")))?;

        let status = body
            .search_metadata
            .as_ref()
            .and_then(|metadata| metadata.status.as_deref());
        if status != Some("Success") {
            return Err(SearchError::api(format!(
                "SearchAPI returned unsuccessful status: {}",
                status.unwrap_or("missing")
            )));
        }

        Ok(body)
    }
}

impl SearchProvider for SearchApiProvider {
    fn search<'a>(
        &'a self,
        query: &'a str,
        max_results: usize,
    ) -> SearchFuture<'a, Result<Vec<SearchResult>, SearchError>> {
        Box::pin(async move {
            let params = [
                ("engine", "google".to_string()),
                ("q", query.to_string()),
                ("num", max_results.to_string()),
                ("gl", "us".to_string()),
                ("hl", "en".to_string()),
            ];
            let body = self.fetch(&params).await?;
            let mut results = format_web_results(body);
            results.truncate(max_results);
            Ok(results)
        })
    }

    fn search_address<'a>(
        &'a self,
        query: &'a str,
        max_results: usize,
    ) -> SearchFuture<'a, Result<Vec<SearchResult>, SearchError>> {
        Box::pin(async move {
            let params = [
                ("engine", "google_maps".to_string()),
                ("q", query.to_string()),
                ("num", max_results.to_string()),
            ];
            let body = self.fetch(&params).await?;
            let mut results = format_address_results(body);
            results.truncate(max_results);
            Ok(results)
        })
    }
}

fn format_web_results(body: SearchApiResponse) -> Vec<SearchResult> {
    let mut results = organic_results(body.organic_results, WEB_SOURCE);

    if let Some(graph) = body.knowledge_graph {
        let mut result = SearchResult::new(SearchResultKind::KnowledgeGraph, KNOWLEDGE_GRAPH_SOURCE);
        result.title = graph.title;
        result.description = graph.description;
        result.url = graph.source.and_then(|source| source.link);
        results.push(result);
    }

    if let Some(answer) = body.answer_box {
        let mut result =
            SearchResult::new(SearchResultKind::FeaturedSnippet, FEATURED_SNIPPET_SOURCE);
        result.title = answer.title;
        result.snippet = answer.answer;
        result.url = answer.link;
        results.push(result);
    }

    results
}

fn format_address_results(body: SearchApiResponse) -> Vec<SearchResult> {
    let mut results = body
        .local_results
        .into_iter()
        .enumerate()
        .map(|(index, local)| {
            let mut result = SearchResult::new(SearchResultKind::Local, MAPS_SOURCE);
            result.title = local.title;
            result.address = local.address;
            result.phone = local.phone;
            result.website = local.website;
            result.rating = local.rating.as_ref().and_then(Value::as_f64);
            result.reviews = local.reviews.as_ref().and_then(Value::as_u64);
            result.hours = local.hours.and_then(hours_text);
            result.position = Some(position(index));
            result
        })
        .collect::<Vec<_>>();

    results.extend(organic_results(body.organic_results, MAPS_SOURCE));
    results
}

fn organic_results(raw: Vec<RawOrganicResult>, source: &str) -> Vec<SearchResult> {
    raw.into_iter()
        .enumerate()
        .map(|(index, organic)| {
            let mut result = SearchResult::new(SearchResultKind::Organic, source);
            result.title = organic.title;
            result.url = organic.link;
            result.snippet = organic.snippet;
            result.position = Some(position(index));
            result
        })
        .collect()
}

fn position(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn hours_text(hours: Value) -> Option<String> {
    match hours {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct SearchApiResponse {
    search_metadata: Option<SearchMetadata>,
    #[serde(default)]
    organic_results: Vec<RawOrganicResult>,
    #[serde(default)]
    local_results: Vec<RawLocalResult>,
    knowledge_graph: Option<RawKnowledgeGraph>,
    answer_box: Option<RawAnswerBox>,
}

#[derive(Debug, Deserialize)]
struct SearchMetadata {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLocalResult {
    title: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    rating: Option<Value>,
    reviews: Option<Value>,
    hours: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawKnowledgeGraph {
    title: Option<String>,
    description: Option<String>,
    source: Option<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAnswerBox {
    title: Option<String>,
    answer: Option<String>,
    link: Option<String>,
}
