//! Request body wrapper that reports when the upload is over.
//!
//! The response deadline must not run while a slow client is still sending a
//! multipart upload, so the dispatcher arms it from this signal.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use tokio::sync::watch;

/// Streams `inner` upstream and flips the watch to `true` once it has ended,
/// failed, or been dropped.
pub struct UploadBody {
    inner: Body,
    finished: watch::Sender<bool>,
}

impl UploadBody {
    /// Wrap `inner`; the receiver resolves when the upload is over.
    pub fn wrap(inner: Body) -> (Self, UploadFinished) {
        let (finished, rx) = watch::channel(false);
        let body = Self { inner, finished };
        if body.inner.is_end_stream() {
            body.finish();
        }
        (body, UploadFinished(rx))
    }

    fn finish(&self) {
        self.finished.send_replace(true);
    }
}

impl HttpBody for UploadBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        if matches!(polled, Poll::Ready(None) | Poll::Ready(Some(Err(_)))) {
            self.finish();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        let ended = self.inner.is_end_stream();
        if ended {
            self.finish();
        }
        ended
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for UploadBody {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Resolves once the wrapped request body is fully sent (or abandoned).
pub struct UploadFinished(watch::Receiver<bool>);

impl UploadFinished {
    pub async fn wait(mut self) {
        // A closed channel means the body is gone, which also ends the upload.
        let _ = self.0.wait_for(|finished| *finished).await;
    }
}
