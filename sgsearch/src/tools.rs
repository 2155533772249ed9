//! Search tools exposed to the model through function calling.
//!
//! ```rust
//! use sgsearch::SearchTool;
//!
//! let tool = SearchTool::from_name("search_address").expect("tool should be known");
//! assert_eq!(tool, SearchTool::Address);
//! assert_eq!(tool.definition().name, "search_address");
//! ```

use sgprovider::ToolDefinition;

use crate::{SearchError, SearchFuture, SearchProvider, SearchResult, parse_query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchTool {
    Web,
    Address,
}

impl SearchTool {
    pub const ALL: [SearchTool; 2] = [SearchTool::Web, SearchTool::Address];

    pub fn name(self) -> &'static str {
        match self {
            Self::Web => "search_web",
            Self::Address => "search_address",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, SearchError> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| SearchError::unknown_tool(name))
    }

    fn description(self) -> &'static str {
        match self {
            Self::Web => {
                "Search the web for current information, news, facts, or any topic that needs up-to-date data."
            }
            Self::Address => {
                "Find the address, location, phone number, or opening hours of a business or place."
            }
        }
    }

    fn query_description(self) -> &'static str {
        match self {
            Self::Web => "The search query to look up on the web",
            Self::Address => "The business or place to look up, including a city when known",
        }
    }

    pub fn definition(self) -> ToolDefinition {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": self.query_description(),
                }
            },
            "required": ["query"],
        });

        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: schema.to_string(),
        }
    }

    /// Extracts the `query` argument, naming this tool in any error.
    pub fn parse_query(self, args_json: &str) -> Result<String, SearchError> {
        parse_query(args_json).map_err(|error| error.for_tool(self.name()))
    }

    /// Runs this tool's search against `provider`.
    pub fn execute<'a>(
        self,
        provider: &'a dyn SearchProvider,
        query: &'a str,
        max_results: usize,
    ) -> SearchFuture<'a, Result<Vec<SearchResult>, SearchError>> {
        match self {
            Self::Web => provider.search(query, max_results),
            Self::Address => provider.search_address(query, max_results),
        }
    }
}

/// Definitions for every search tool, in declaration order.
pub fn search_tool_definitions() -> Vec<ToolDefinition> {
    SearchTool::ALL
        .into_iter()
        .map(SearchTool::definition)
        .collect()
}
