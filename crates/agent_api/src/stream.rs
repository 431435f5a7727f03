use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{FusedStream, Stream};
use tracing::debug;

use crate::error::AgentApiError;
use crate::sse::{DecoderState, FrameDecoder, StreamSignal};

/// Response body chunks as handed over by the transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, AgentApiError>> + Send>>;

/// Lazily decoded token sequence over one response body.
///
/// The source is only polled when the caller asks for the next token. It is dropped as
/// soon as the decoder reaches a terminal state or the source fails, and dropping the
/// `TokenStream` itself releases it on early abandonment.
pub struct TokenStream<S = ByteStream> {
    source: Option<S>,
    decoder: FrameDecoder,
}

impl<S> TokenStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            decoder: FrameDecoder::default(),
        }
    }

    pub fn state(&self) -> &DecoderState {
        self.decoder.state()
    }

    /// `true` while the underlying source is still held.
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    fn release(&mut self) {
        if self.source.take().is_some() {
            debug!(state = ?self.decoder.state(), "released response stream");
        }
    }
}

impl<S> std::fmt::Debug for TokenStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("open", &self.source.is_some())
            .field("decoder", &self.decoder)
            .finish()
    }
}

impl<S, B> Stream for TokenStream<S>
where
    S: Stream<Item = Result<B, AgentApiError>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<String, AgentApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(signal) = this.decoder.next_signal() {
                return Poll::Ready(match signal {
                    StreamSignal::Token(token) => Some(Ok(token)),
                    StreamSignal::Done => {
                        this.release();
                        None
                    }
                    StreamSignal::Failed(message) => {
                        this.release();
                        Some(Err(AgentApiError::stream(message)))
                    }
                });
            }

            let Some(source) = this.source.as_mut() else {
                return Poll::Ready(None);
            };

            match Pin::new(source).poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => this.decoder.push(chunk.as_ref()),
                Poll::Ready(Some(Err(error))) => {
                    this.decoder.fail(error.to_string());
                    this.release();
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(None) => {
                    this.decoder.finish();
                    this.release();
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl<S, B> FusedStream for TokenStream<S>
where
    S: Stream<Item = Result<B, AgentApiError>> + Unpin,
    B: AsRef<[u8]>,
{
    fn is_terminated(&self) -> bool {
        self.source.is_none()
    }
}
