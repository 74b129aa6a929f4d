//! Incremental line splitting over a chunked byte stream.
//!
//! Network reads land at arbitrary byte offsets, so a UTF-8 sequence or a
//! line can straddle two chunks. [`LineBuffer`] holds back both the
//! undecoded tail bytes and the unterminated tail text until the rest
//! arrives, and only ever emits fully received lines.

/// Streaming UTF-8 decoder that carries incomplete trailing sequences over
/// to the next chunk.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Appends the decodable prefix of `pending + chunk` to `out`.
    ///
    /// Invalid sequences become U+FFFD; an incomplete sequence at the end is
    /// kept for the next call.
    fn decode_into(&mut self, chunk: &[u8], out: &mut String) {
        self.pending.extend_from_slice(chunk);

        let mut start = 0usize;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid_end = start + err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
    }

    /// Flushes a dangling incomplete sequence at end of stream.
    fn flush_into(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            out.push(char::REPLACEMENT_CHARACTER);
            self.pending.clear();
        }
    }
}

/// Splits decoded stream text into complete lines.
///
/// `\n` terminates a line; a `\r` directly before it is dropped. Text after
/// the last terminator stays buffered until more bytes arrive or
/// [`LineBuffer::finish`] is called.
#[derive(Debug, Default)]
pub struct LineBuffer {
    decoder: Utf8Decoder,
    buffer: String,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the lines it completed, in order.
    ///
    /// Only the newly decoded text is searched for a terminator, so a long
    /// line arriving in many small chunks is scanned once overall.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // The carried text never holds a '\n'.
        let scan_from = self.buffer.len();
        self.decoder.decode_into(chunk, &mut self.buffer);

        let Some(last_newline) = self.buffer[scan_from..]
            .rfind('\n')
            .map(|offset| scan_from + offset)
        else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);
        complete.lines().map(str::to_owned).collect()
    }

    /// Ends the stream, returning the unterminated trailing fragment if any.
    pub fn finish(&mut self) -> Option<String> {
        self.decoder.flush_into(&mut self.buffer);
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Text received after the last line terminator.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_all(chunks: &[&[u8]]) -> Vec<String> {
        let mut buffer = LineBuffer::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(buffer.push(chunk));
        }
        lines.extend(buffer.finish());
        lines
    }

    #[test]
    fn emits_complete_lines_and_keeps_fragment() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"data: one\ndata: tw");
        assert_eq!(lines, vec!["data: one"]);
        assert_eq!(buffer.pending(), "data: tw");

        let lines = buffer.push(b"o\n");
        assert_eq!(lines, vec!["data: two"]);
        assert_eq!(buffer.pending(), "");
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let lines = collect_all(&[b"data: a\ndata: b"]);
        assert_eq!(lines, vec!["data: a", "data: b"]);
    }

    #[test]
    fn finish_returns_none_when_nothing_pending() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"data: a\n");
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn strips_carriage_returns() {
        let lines = collect_all(&[b"data: a\r\ndata: b\r", b"\ndata: c\r"]);
        assert_eq!(lines, vec!["data: a", "data: b", "data: c"]);
    }

    #[test]
    fn preserves_blank_lines_between_events() {
        let lines = collect_all(&[b"data: a\n\ndata: b\n"]);
        assert_eq!(lines, vec!["data: a", "", "data: b"]);
    }

    #[test]
    fn decodes_multibyte_sequence_split_across_chunks() {
        // "é" is 0xC3 0xA9; "🍽" is four bytes.
        let text = "data: café 🍽\n";
        let bytes = text.as_bytes();
        let split = text.find('é').unwrap() + 1;
        let emoji = text.find('🍽').unwrap() + 2;
        let lines = collect_all(&[&bytes[..split], &bytes[split..emoji], &bytes[emoji..]]);
        assert_eq!(lines, vec!["data: café 🍽"]);
    }

    #[test]
    fn one_byte_at_a_time_matches_single_chunk() {
        let text = "data: {\"type\":\"start\"}\n: heartbeat\ndata: {\"type\":\"chunk\",\"data\":\"Olá\"}\n";
        let whole = collect_all(&[text.as_bytes()]);
        let bytes: Vec<&[u8]> = text.as_bytes().chunks(1).collect();
        let split = collect_all(&bytes);
        assert_eq!(whole, split);
        assert_eq!(whole.len(), 3);
    }

    #[test]
    fn long_line_fed_byte_by_byte_is_emitted_once_terminated() {
        let payload = format!("data: {}", "x".repeat(64 * 1024));
        let mut buffer = LineBuffer::new();

        for byte in payload.as_bytes() {
            assert!(buffer.push(std::slice::from_ref(byte)).is_empty());
        }
        assert_eq!(buffer.pending().len(), payload.len());

        let lines = buffer.push(b"\ndata: next");
        assert_eq!(lines, vec![payload]);
        assert_eq!(buffer.pending(), "data: next");

        assert_eq!(buffer.push(b" part\n"), vec!["data: next part"]);
        assert_eq!(buffer.pending(), "");
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        let lines = collect_all(&[b"data: a\xFFb\n"]);
        assert_eq!(lines, vec!["data: a\u{FFFD}b"]);
    }

    #[test]
    fn truncated_sequence_at_end_of_stream_is_replaced() {
        let lines = collect_all(&[b"data: a\xE2\x82"]);
        assert_eq!(lines, vec!["data: a\u{FFFD}"]);
    }
}
