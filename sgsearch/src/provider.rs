//! Search capability consumed by the chat engine.

use std::future::Future;
use std::pin::Pin;

use crate::{SearchError, SearchResult};

pub type SearchFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A web and address search backend.
///
/// "No results" is an empty list, never an error. Transport and
/// authentication failures are errors.
pub trait SearchProvider: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a str,
        max_results: usize,
    ) -> SearchFuture<'a, Result<Vec<SearchResult>, SearchError>>;

    fn search_address<'a>(
        &'a self,
        query: &'a str,
        max_results: usize,
    ) -> SearchFuture<'a, Result<Vec<SearchResult>, SearchError>>;
}
