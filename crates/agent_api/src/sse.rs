use tracing::{debug, warn};

/// Marker that introduces a data line inside a frame.
pub const DATA_PREFIX: &str = "data: ";
/// Payload that ends the stream cleanly.
pub const DONE_SENTINEL: &str = "[DONE]";
/// Payload prefix that ends the stream with a failure message.
pub const ERROR_SENTINEL: &str = "[ERROR]";

/// Lifecycle of one decoded response body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    Idle,
    Accumulating,
    Completed,
    Failed(String),
}

impl DecoderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// What a single complete frame turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Token(String),
    Done,
    Failed(String),
}

/// Result of decoding a complete payload in one shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub tokens: Vec<String>,
    pub state: DecoderState,
}

/// Incremental decoder for blank-line delimited `data: ` frames.
///
/// Bytes are buffered raw and only split on the frame delimiter, so a multi-byte
/// character cut in half by a chunk boundary decodes the same as an unsplit one.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already searched for a delimiter.
    scanned: usize,
    state: DecoderState,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Bytes held back because their frame has not been terminated yet.
    pub fn carry_len(&self) -> usize {
        self.buffer.len()
    }

    /// Append a chunk to the carry buffer without processing any frame.
    ///
    /// Input arriving after the decoder reached a terminal state is dropped.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.state.is_terminal() {
            return;
        }
        if self.state == DecoderState::Idle {
            self.state = DecoderState::Accumulating;
        }
        self.buffer.extend_from_slice(bytes);
    }

    /// Pop the next signal from the complete frames currently buffered.
    ///
    /// Frames without a data line are skipped. Returns `None` once the buffer holds no
    /// complete frame or the decoder is terminal.
    pub fn next_signal(&mut self) -> Option<StreamSignal> {
        while !self.state.is_terminal() {
            let from = self.scanned.saturating_sub(DELIMITER_OVERLAP);
            let Some((end, delimiter_len)) = find_delimiter(&self.buffer, from) else {
                self.scanned = self.buffer.len();
                return None;
            };
            let frame: Vec<u8> = self.buffer.drain(..end + delimiter_len).take(end).collect();
            self.scanned = 0;
            let frame = String::from_utf8_lossy(&frame);

            let Some(payload) = extract_data_payload(&frame) else {
                continue;
            };

            let signal = classify_payload(payload);
            match &signal {
                StreamSignal::Done => {
                    debug!("stream reached done sentinel");
                    self.state = DecoderState::Completed;
                    self.clear_carry();
                }
                StreamSignal::Failed(message) => {
                    debug!(%message, "stream reached error sentinel");
                    self.state = DecoderState::Failed(message.clone());
                    self.clear_carry();
                }
                StreamSignal::Token(_) => {}
            }
            return Some(signal);
        }
        None
    }

    /// Feed arbitrary bytes into the decoder and drain every complete frame.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamSignal> {
        self.push(bytes);
        std::iter::from_fn(|| self.next_signal()).collect()
    }

    /// Signal natural end-of-data from the source.
    ///
    /// An unterminated trailing fragment is discarded without producing a token.
    pub fn finish(&mut self) -> &DecoderState {
        if self.state.is_terminal() {
            return &self.state;
        }
        if !self.buffer.is_empty() {
            warn!(
                discarded_bytes = self.buffer.len(),
                "discarding unterminated frame at end of stream"
            );
            self.clear_carry();
        }
        self.state = DecoderState::Completed;
        &self.state
    }

    /// Abort decoding because the source itself failed.
    ///
    /// Buffered bytes are dropped and the decoder becomes `Failed(reason)`. A decoder
    /// that already reached a terminal state keeps it.
    pub fn fail(&mut self, reason: impl Into<String>) -> &DecoderState {
        if !self.state.is_terminal() {
            self.clear_carry();
            self.state = DecoderState::Failed(reason.into());
        }
        &self.state
    }

    fn clear_carry(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Decode a complete payload string in one shot, including end-of-data handling.
    pub fn decode_all(input: &str) -> DecodeOutcome {
        let mut decoder = Self::default();
        let mut tokens = Vec::new();
        for signal in decoder.feed(input.as_bytes()) {
            if let StreamSignal::Token(token) = signal {
                tokens.push(token);
            }
        }
        let state = decoder.finish().clone();
        DecodeOutcome { tokens, state }
    }
}

/// Bytes of an already searched prefix that may still start a delimiter.
const DELIMITER_OVERLAP: usize = 3;

/// Earliest frame delimiter in `buffer` at or after `from`: `\n\n`, or `\r\n\r\n` for
/// CRLF servers. Returned offsets are relative to the start of `buffer`.
fn find_delimiter(buffer: &[u8], from: usize) -> Option<(usize, usize)> {
    let from = from.min(buffer.len());
    buffer[from..]
        .windows(2)
        .enumerate()
        .find_map(|(offset, window)| {
            let index = from + offset;
            match window {
                b"\n\n" => Some((index, 2)),
                b"\r\n" if buffer[index..].starts_with(b"\r\n\r\n") => Some((index, 4)),
                _ => None,
            }
        })
}

/// First data line wins; later data lines in the same frame are ignored.
fn extract_data_payload(frame: &str) -> Option<&str> {
    frame
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .find_map(|line| line.strip_prefix(DATA_PREFIX))
}

fn classify_payload(payload: &str) -> StreamSignal {
    if payload == DONE_SENTINEL {
        return StreamSignal::Done;
    }
    if let Some(rest) = payload.strip_prefix(ERROR_SENTINEL) {
        let message = rest.strip_prefix(' ').unwrap_or(rest);
        return StreamSignal::Failed(message.to_owned());
    }
    StreamSignal::Token(payload.to_owned())
}
