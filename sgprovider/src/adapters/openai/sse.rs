//! Line framing for `text/event-stream` bodies.

use crate::ProviderError;

/// A decoded `data:` line from the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseData {
    Payload(String),
    Done,
}

/// Buffers raw bytes and yields complete `data:` lines.
///
/// Bytes are only decoded once a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub(crate) struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Pops the next complete `data:` line, skipping comments and blank lines.
    pub(crate) fn next_data(&mut self) -> Result<Option<SseData>, ProviderError> {
        while let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line = self.pending.drain(..=newline).collect::<Vec<_>>();
            if let Some(data) = decode_line(&line)? {
                return Ok(Some(data));
            }
        }

        Ok(None)
    }

    /// Drains whatever is left once the body ends without a trailing newline.
    pub(crate) fn finish(&mut self) -> Result<Option<SseData>, ProviderError> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        let line = std::mem::take(&mut self.pending);
        decode_line(&line)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<SseData>, ProviderError> {
    let line = std::str::from_utf8(line)
        .map_err(|err| ProviderError::transport(format!("invalid UTF-8 in stream: {err}")))?;
    let line = line.trim();

    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };

    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(None);
    }

    if payload == "[DONE]" {
        return Ok(Some(SseData::Done));
    }

    Ok(Some(SseData::Payload(payload.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_lines_only_when_complete() {
        let mut buffer = SseLineBuffer::new();
        buffer.push(b"data: {\"a\":");
        assert_eq!(buffer.next_data().expect("decode"), None);

        buffer.push(b"1}\n\n");
        assert_eq!(
            buffer.next_data().expect("decode"),
            Some(SseData::Payload("{\"a\":1}".to_string()))
        );
        assert_eq!(buffer.next_data().expect("decode"), None);
    }

    #[test]
    fn multibyte_characters_split_across_chunks_decode() {
        let line = "data: héllo\n".as_bytes();
        let split = line.iter().position(|byte| *byte == 0xC3).expect("lead byte") + 1;

        let mut buffer = SseLineBuffer::new();
        buffer.push(&line[..split]);
        assert_eq!(buffer.next_data().expect("decode"), None);
        buffer.push(&line[split..]);

        assert_eq!(
            buffer.next_data().expect("decode"),
            Some(SseData::Payload("héllo".to_string()))
        );
    }

    #[test]
    fn skips_comments_and_recognizes_done() {
        let mut buffer = SseLineBuffer::new();
        buffer.push(b": keep-alive\nevent: message\ndata: [DONE]\n");

        assert_eq!(buffer.next_data().expect("decode"), Some(SseData::Done));
    }

    #[test]
    fn finish_flushes_unterminated_tail() {
        let mut buffer = SseLineBuffer::new();
        buffer.push(b"data: tail");

        assert_eq!(buffer.next_data().expect("decode"), None);
        assert_eq!(
            buffer.finish().expect("decode"),
            Some(SseData::Payload("tail".to_string()))
        );
        assert_eq!(buffer.finish().expect("decode"), None);
    }
}
