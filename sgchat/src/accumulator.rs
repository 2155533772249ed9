//! Reassembly of streamed tool-call fragments.
//!
//! ```rust
//! use sgchat::ToolCallAccumulator;
//! use sgprovider::ToolCallFragment;
//!
//! let mut accumulator = ToolCallAccumulator::new();
//! accumulator.push(ToolCallFragment::new(0).with_id("call_1").with_name("search_web"));
//! accumulator.push(ToolCallFragment::new(0).with_arguments("{\"query\":"));
//! accumulator.push(ToolCallFragment::new(0).with_arguments("\"rust\"}"));
//!
//! let calls = accumulator.finalize();
//! assert_eq!(calls[0].arguments_text, "{\"query\":\"rust\"}");
//! ```

use std::collections::HashMap;

use sgprovider::{ToolCall, ToolCallFragment};

/// A tool call as assembled from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRef {
    pub id: String,
    pub index: u32,
    pub function_name: String,
    pub arguments_text: String,
}

impl ToolCallRef {
    pub fn from_call(index: u32, call: ToolCall) -> Self {
        Self {
            id: call.id,
            index,
            function_name: call.name,
            arguments_text: call.arguments,
        }
    }

    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall::new(
            self.id.clone(),
            self.function_name.clone(),
            self.arguments_text.clone(),
        )
    }
}

#[derive(Debug, Default)]
struct SlotBuilder {
    index: u32,
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Merges raw fragments keyed by their `index`.
///
/// Slots are created on first sight of an index and finalized in that same
/// first-seen order. Later fragments append to `arguments` and only fill `id`
/// or `name` while they are still empty.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    positions: HashMap<u32, usize>,
    slots: Vec<SlotBuilder>,
    ignored: usize,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one fragment in. Returns `false` when the fragment had no index
    /// and was ignored.
    pub fn push(&mut self, fragment: ToolCallFragment) -> bool {
        let Some(index) = fragment.index else {
            self.ignored += 1;
            return false;
        };

        let position = match self.positions.get(&index) {
            Some(position) => *position,
            None => {
                self.slots.push(SlotBuilder {
                    index,
                    ..SlotBuilder::default()
                });
                let position = self.slots.len() - 1;
                self.positions.insert(index, position);
                position
            }
        };

        let slot = &mut self.slots[position];
        if slot.id.is_none() {
            slot.id = fragment.id.filter(|id| !id.is_empty());
        }
        if slot.name.is_none() {
            slot.name = fragment.name.filter(|name| !name.is_empty());
        }
        if let Some(arguments) = fragment.arguments {
            slot.arguments.push_str(&arguments);
        }

        true
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn ignored(&self) -> usize {
        self.ignored
    }

    pub fn finalize(self) -> Vec<ToolCallRef> {
        self.slots
            .into_iter()
            .map(|slot| ToolCallRef {
                id: slot.id.unwrap_or_else(|| format!("call_{}", slot.index)),
                index: slot.index,
                function_name: slot.name.unwrap_or_default(),
                arguments_text: slot.arguments,
            })
            .collect()
    }
}
