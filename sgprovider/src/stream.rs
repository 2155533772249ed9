//! Events a provider emits while a response is generated.
//!
//! A stream yields text and raw tool-call fragments in generation order and
//! ends with at most one [`StreamEvent::ResponseComplete`]. Fragments are
//! passed through as received; reassembling them is the caller's job.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, StopReason, ToolCallFragment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    ToolCallDelta(ToolCallFragment),
    ResponseComplete { model: String, stop_reason: StopReason },
}

pub type BoxedEventStream<'a> =
    Pin<Box<dyn Stream<Item = Result<StreamEvent, ProviderError>> + Send + 'a>>;

/// Replays a fixed list of results, then ends.
///
/// ```rust
/// use sgprovider::{BoxedEventStream, ScriptedEventStream};
///
/// let events: BoxedEventStream<'static> =
///     ScriptedEventStream::text_chunks(["Hel", "lo"]).boxed_events();
/// assert_eq!(futures_core::Stream::size_hint(&events), (2, Some(2)));
/// ```
#[derive(Debug)]
pub struct ScriptedEventStream {
    events: std::vec::IntoIter<Result<StreamEvent, ProviderError>>,
}

impl ScriptedEventStream {
    pub fn new(events: Vec<Result<StreamEvent, ProviderError>>) -> Self {
        Self {
            events: events.into_iter(),
        }
    }

    /// Text deltas with no closing event.
    pub fn text_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            chunks
                .into_iter()
                .map(|chunk| Ok(StreamEvent::TextDelta(chunk.into())))
                .collect(),
        )
    }

    pub fn boxed_events<'a>(self) -> BoxedEventStream<'a> {
        Box::pin(self)
    }
}

impl Stream for ScriptedEventStream {
    type Item = Result<StreamEvent, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().events.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}
