//! Executes a batch of search tool calls and runs the single finalization.

use std::sync::Arc;

use sgprovider::Message;
use sgsearch::{SearchProvider, SearchTool, results_to_json};

use crate::{
    ChatConfig, ChatError, ChatEvent, RequestPhase, StreamingOrator, ToolCallRef, TurnSink,
};

/// What happened to one tool-call batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolBatchOutcome {
    /// Calls whose assistant/tool message pair was appended.
    pub executed: usize,
    /// Calls dropped for bad arguments or an unknown tool name.
    pub skipped: usize,
}

#[derive(Clone)]
pub struct ToolExecutionCoordinator {
    search: Arc<dyn SearchProvider>,
}

impl ToolExecutionCoordinator {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self { search }
    }

    /// Runs each call in order and appends its message pair to `working`.
    ///
    /// Argument and tool-name problems skip that call only. A failing search
    /// still appends the pair, with an empty result list.
    pub async fn execute_batch(
        &self,
        calls: Vec<ToolCallRef>,
        working: &mut Vec<Message>,
        max_results: usize,
        sink: &mut dyn TurnSink,
    ) -> ToolBatchOutcome {
        let mut outcome = ToolBatchOutcome::default();

        for call in calls {
            let prepared = SearchTool::from_name(&call.function_name)
                .and_then(|tool| tool.parse_query(&call.arguments_text).map(|query| (tool, query)))
                .map_err(ChatError::from);

            let (tool, query) = match prepared {
                Ok(prepared) => prepared,
                Err(error) => {
                    tracing::warn!(
                        phase = "tooling",
                        event = "tool_call_skipped",
                        tool = %call.function_name,
                        call_id = %call.id,
                        error = %error.message,
                        "skipping tool call"
                    );
                    sink.emit(ChatEvent::Notice(format!(
                        "Skipped tool call '{}': {}",
                        call.function_name, error.message
                    )));
                    outcome.skipped += 1;
                    continue;
                }
            };

            tracing::debug!(
                phase = "tooling",
                event = "tool_call_start",
                tool = tool.name(),
                call_id = %call.id,
                query = %query
            );

            let results = match tool.execute(self.search.as_ref(), &query, max_results).await {
                Ok(results) => results,
                Err(error) => {
                    let error = ChatError::from(error.for_tool(tool.name()));
                    tracing::warn!(
                        phase = "tooling",
                        event = "search_failed",
                        tool = tool.name(),
                        call_id = %call.id,
                        error = %error.message,
                        "search failed; continuing without results"
                    );
                    sink.emit(ChatEvent::Notice(format!(
                        "Search for '{query}' failed; continuing without results"
                    )));
                    Vec::new()
                }
            };

            sink.emit(ChatEvent::ToolExecuted {
                name: tool.name().to_string(),
                query,
                result_count: results.len(),
            });

            working.push(Message::assistant_tool_calls(vec![call.to_tool_call()]));
            working.push(Message::tool(call.id, results_to_json(&results)));
            outcome.executed += 1;
        }

        outcome
    }

    /// The one streamed answer over the batch's results. No tools are declared.
    pub async fn finalize(
        &self,
        orator: &StreamingOrator,
        config: &ChatConfig,
        working: &mut Vec<Message>,
        sink: &mut dyn TurnSink,
    ) -> Result<String, ChatError> {
        let text = orator
            .stream_plain(config, working, RequestPhase::Finalize, sink)
            .await?;
        working.push(Message::assistant(text.clone()));
        Ok(text)
    }
}
