use bevy::log::*;
use bevy::tasks::futures_lite::Stream;
use futures_sink::Sink;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Typed view of a byte stream/sink: decodes incoming frames into `R` and
/// encodes outgoing `W` messages, both as postcard.
///
/// Frames that fail to decode are logged and skipped rather than killing the
/// connection; a peer speaking a different protocol version gets refused
/// during the handshake instead.
#[derive(Debug, Clone)]
pub struct Codec<R, W, S> {
    inner: S,
    _marker: PhantomData<fn(W) -> R>,
}
impl<R, W, S> Codec<R, W, S> {
    /// Wrap a raw byte transport.
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
    /// Get the underlying transport back, e.g. to close it.
    pub fn into_inner(self) -> S {
        self.inner
    }
    fn inner_pinned(self: Pin<&mut Self>) -> Pin<&mut S> {
        unsafe { self.map_unchecked_mut(|s| &mut s.inner) }
    }
}

impl<R: DeserializeOwned, W, S: Stream<Item: AsRef<[u8]>>> Stream for Codec<R, W, S> {
    type Item = R;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner_pinned().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(v)) => match postcard::from_bytes(v.as_ref()) {
                Ok(v) => Poll::Ready(Some(v)),
                Err(err) => {
                    warn!(%err, "Error decoding message, skipping frame");
                    Poll::Pending
                }
            },
        }
    }
}
impl<R, W: Serialize, S: Sink<Vec<u8>>> Sink<W> for Codec<R, W, S> {
    type Error = S::Error;

    fn start_send(self: Pin<&mut Self>, item: W) -> Result<(), Self::Error> {
        match postcard::to_stdvec(&item) {
            Ok(bytes) => self.inner_pinned().start_send(bytes),
            Err(err) => {
                error!(%err, "Error encoding message, dropping it");
                Ok(())
            }
        }
    }
    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner_pinned().poll_ready(cx)
    }
    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner_pinned().poll_flush(cx)
    }
    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner_pinned().poll_close(cx)
    }
}
