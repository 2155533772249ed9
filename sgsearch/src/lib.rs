//! Search capability for the chat engine: the `SearchProvider` contract,
//! normalized results, the SearchAPI.io backend and the tool definitions
//! the model calls.

mod args;
mod error;
mod provider;
mod searchapi;
mod tools;
mod types;

pub use args::{parse_json_object, parse_query, required_string};
pub use error::{SearchError, SearchErrorKind};
pub use provider::{SearchFuture, SearchProvider};
pub use searchapi::{DEFAULT_SEARCHAPI_BASE_URL, SearchApiProvider};
pub use tools::{SearchTool, search_tool_definitions};
pub use types::{SearchResult, SearchResultKind, results_to_json};
