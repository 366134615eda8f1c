//! Response body module
//!
//! A response body is either bytes already in memory or an asset's content
//! read lazily chunk by chunk while hyper writes it out.
//!
//! `Chunks` reads the file on whatever thread polls it. Bodies handed to
//! hyper go through [`AssetBody::offload`] first so each read runs on the
//! blocking pool instead of a runtime worker.

use crate::asset::AssetChunks;
use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub enum AssetBody {
    Full(Bytes),
    Chunks(AssetChunks),
    Offloaded(OffloadedChunks),
}

impl AssetBody {
    pub const fn empty() -> Self {
        Self::Full(Bytes::new())
    }

    /// Move chunk reads onto the blocking pool; other bodies are unchanged
    #[must_use]
    pub fn offload(self) -> Self {
        match self {
            Self::Chunks(chunks) => Self::Offloaded(OffloadedChunks::new(chunks)),
            other => other,
        }
    }

    /// Drain the body into memory
    pub fn collect_bytes(self) -> io::Result<Bytes> {
        match self {
            Self::Full(bytes) => Ok(bytes),
            Self::Chunks(chunks) => drain(chunks),
            Self::Offloaded(offloaded) => match offloaded.into_idle() {
                Some(chunks) => drain(chunks),
                None => Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "chunk read still in flight",
                )),
            },
        }
    }
}

fn drain(chunks: AssetChunks) -> io::Result<Bytes> {
    let mut buffer = Vec::new();
    for chunk in chunks {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(Bytes::from(buffer))
}

type ChunkRead = (AssetChunks, Option<io::Result<Bytes>>);

/// Lazy chunks whose reads each run in `spawn_blocking`
///
/// Must be polled inside a tokio runtime.
#[derive(Debug)]
pub struct OffloadedChunks {
    chunks: Option<AssetChunks>,
    pending: Option<JoinHandle<ChunkRead>>,
}

impl OffloadedChunks {
    const fn new(chunks: AssetChunks) -> Self {
        Self {
            chunks: Some(chunks),
            pending: None,
        }
    }

    /// The remaining chunks, unless a read is in flight
    fn into_idle(self) -> Option<AssetChunks> {
        match self.pending {
            Some(_) => None,
            None => Some(self.chunks.unwrap_or_else(AssetChunks::exhausted)),
        }
    }

    fn poll_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Option<io::Result<Bytes>>> {
        if self.pending.is_none() {
            let Some(mut chunks) = self.chunks.take() else {
                return Poll::Ready(None);
            };
            self.pending = Some(tokio::task::spawn_blocking(move || {
                let next = chunks.next();
                (chunks, next)
            }));
        }

        let Some(pending) = self.pending.as_mut() else {
            return Poll::Ready(None);
        };
        let joined = match Pin::new(pending).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(joined) => joined,
        };
        self.pending = None;

        match joined {
            Ok((chunks, next)) => {
                if next.is_some() {
                    self.chunks = Some(chunks);
                }
                Poll::Ready(next)
            }
            Err(e) => Poll::Ready(Some(Err(io::Error::other(e)))),
        }
    }
}

impl From<Bytes> for AssetBody {
    fn from(bytes: Bytes) -> Self {
        Self::Full(bytes)
    }
}

impl From<&'static str> for AssetBody {
    fn from(text: &'static str) -> Self {
        Self::Full(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for AssetBody {
    fn from(text: String) -> Self {
        Self::Full(Bytes::from(text))
    }
}

impl Body for AssetBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Full(bytes) => {
                if bytes.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(Frame::data(std::mem::take(bytes)))))
                }
            }
            Self::Chunks(chunks) => Poll::Ready(chunks.next().map(|chunk| chunk.map(Frame::data))),
            Self::Offloaded(offloaded) => offloaded
                .poll_chunk(cx)
                .map(|next| next.map(|chunk| chunk.map(Frame::data))),
        }
    }

    fn is_end_stream(&self) -> bool {
        matches!(self, Self::Full(bytes) if bytes.is_empty())
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Full(bytes) => SizeHint::with_exact(bytes.len() as u64),
            Self::Chunks(_) | Self::Offloaded(_) => SizeHint::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{FileEnvironment, Resolver};
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn chunks_of(dir: &TempDir, content: &str) -> AssetChunks {
        std::fs::write(dir.path().join("big.js"), content).unwrap();
        let env = FileEnvironment::new(dir.path(), "1");
        let asset = env.find_asset("big.js").unwrap().unwrap();
        asset.chunks().unwrap()
    }

    #[tokio::test]
    async fn test_offloaded_body_streams_whole_file() {
        let dir = TempDir::new().unwrap();
        let content = "x".repeat(40_000);
        let body = AssetBody::Chunks(chunks_of(&dir, &content)).offload();
        assert!(matches!(body, AssetBody::Offloaded(_)));

        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(collected.len(), content.len());
    }

    #[test]
    fn test_offload_keeps_full_bodies() {
        let body = AssetBody::from("Not found").offload();
        assert!(matches!(body, AssetBody::Full(_)));
    }

    #[test]
    fn test_idle_offloaded_body_drains() {
        let dir = TempDir::new().unwrap();
        let body = AssetBody::Chunks(chunks_of(&dir, "ok();")).offload();
        assert_eq!(&body.collect_bytes().unwrap()[..], b"ok();");
    }

    #[test]
    fn test_full_body() {
        let body = AssetBody::from("Not found");
        assert!(!body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(9));
        assert_eq!(body.collect_bytes().unwrap(), Bytes::from_static(b"Not found"));
    }

    #[test]
    fn test_empty_body() {
        let body = AssetBody::empty();
        assert!(body.is_end_stream());
        assert!(body.collect_bytes().unwrap().is_empty());
    }
}
