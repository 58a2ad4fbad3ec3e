//! Raw transport writer.
//!
//! Owns a connection exclusively and plays a [`RawFrame`] onto it: for each
//! segment it waits the declared delay, writes the bytes, and flushes. The
//! connection is always shut down when the frame ends, whether it completed,
//! was terminated on purpose, or failed.
//!
//! ```text
//! Idle ──head──▶ HeadersSent ──body──▶ PartialBodySent
//!   │                 │                      │
//!   └────────────┬────┴──────────────────────┘
//!                ▼
//!      Completed | Terminated
//! ```

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{Directive, RawFrame, SegmentKind};

/// Progress of a raw response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Idle,
    HeadersSent,
    PartialBodySent,
    /// Every segment written and the connection shut down cleanly.
    Completed,
    /// The response was abandoned, deliberately or by a write failure.
    Terminated,
}

impl WriterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriterState::Idle => "idle",
            WriterState::HeadersSent => "headers_sent",
            WriterState::PartialBodySent => "partial_body_sent",
            WriterState::Completed => "completed",
            WriterState::Terminated => "terminated",
        }
    }
}

/// Result of a frame that reached its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOutcome {
    pub state: WriterState,
    pub bytes_written: usize,
}

/// A write failure, with the state the writer had reached before it.
#[derive(Debug, thiserror::Error)]
#[error("raw write failed after {bytes_written} bytes in state {}: {source}", .reached.as_str())]
pub struct RawWriteError {
    pub reached: WriterState,
    pub bytes_written: usize,
    #[source]
    pub source: std::io::Error,
}

impl RawWriteError {
    /// A failed write always leaves the response abandoned.
    pub fn state(&self) -> WriterState {
        WriterState::Terminated
    }
}

/// Writes literal frames onto an exclusively owned transport.
pub struct RawWriter<W> {
    io: W,
    state: WriterState,
    bytes_written: usize,
}

impl<W> RawWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(io: W) -> Self {
        Self {
            io,
            state: WriterState::Idle,
            bytes_written: 0,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Play `frame` onto the transport, then shut it down.
    pub async fn emit(mut self, frame: &RawFrame) -> Result<RawOutcome, RawWriteError> {
        for segment in frame.segments() {
            if !segment.delay.is_zero() {
                tokio::time::sleep(segment.delay).await;
            }

            if let Err(source) = self.write_segment(&segment.bytes).await {
                let reached = self.state;
                self.state = WriterState::Terminated;
                self.close().await;
                return Err(RawWriteError {
                    reached,
                    bytes_written: self.bytes_written,
                    source,
                });
            }
            self.advance(segment.kind);

            if segment.directive == Directive::Terminate {
                self.state = WriterState::Terminated;
                break;
            }
        }

        if self.state != WriterState::Terminated {
            self.state = WriterState::Completed;
        }
        self.close().await;

        Ok(RawOutcome {
            state: self.state,
            bytes_written: self.bytes_written,
        })
    }

    async fn write_segment(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        if !bytes.is_empty() {
            self.io.write_all(bytes).await?;
            self.bytes_written += bytes.len();
        }
        self.io.flush().await
    }

    fn advance(&mut self, kind: SegmentKind) {
        self.state = match (self.state, kind) {
            (WriterState::Idle, SegmentKind::PartialHead) => WriterState::Idle,
            (_, SegmentKind::Head) => WriterState::HeadersSent,
            (_, SegmentKind::Body) => WriterState::PartialBodySent,
            (state, _) => state,
        };
    }

    async fn close(&mut self) {
        if let Err(e) = self.io.shutdown().await {
            tracing::debug!(error = %e, "Shutdown of raw connection failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawHead;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::time::Instant;

    fn head() -> RawHead {
        RawHead::new("HTTP/1.1 200 OK")
            .header("Content-Encoding", "identity")
            .header("Connection", "close")
    }

    #[tokio::test(start_paused = true)]
    async fn segments_are_delayed_and_flushed_in_order() {
        let (client, server) = tokio::io::duplex(4096);
        let frame = RawFrame::new()
            .head(&head())
            .body(Duration::from_secs(1), "[first")
            .body(Duration::from_secs(1), ",second]");

        let writer = tokio::spawn(async move { RawWriter::new(server).emit(&frame).await });

        let start = Instant::now();
        let mut client = client;
        let mut received = Vec::new();
        let mut chunk = [0u8; 256];
        let mut arrivals = Vec::new();
        loop {
            let n = client.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
            arrivals.push(start.elapsed());
        }

        let outcome = writer.await.unwrap().unwrap();
        assert_eq!(outcome.state, WriterState::Completed);
        assert_eq!(outcome.bytes_written, received.len());
        assert_eq!(
            received,
            b"HTTP/1.1 200 OK\nContent-Encoding: identity\nConnection: close\n\n[first,second]"
        );
        assert_eq!(arrivals.first().copied(), Some(Duration::ZERO));
        assert!(arrivals.last().copied().unwrap() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn terminate_stops_after_hold() {
        let (mut client, server) = tokio::io::duplex(4096);
        let frame = RawFrame::new()
            .head(&head())
            .body(Duration::ZERO, "[partial")
            .hang_up_after(Duration::from_secs(2));

        let start = Instant::now();
        let outcome = RawWriter::new(server).emit(&frame).await.unwrap();
        assert_eq!(outcome.state, WriterState::Terminated);
        assert!(start.elapsed() >= Duration::from_secs(2));

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert!(received.ends_with(b"\n\n[partial"));
    }

    #[tokio::test]
    async fn partial_head_leaves_state_idle() {
        let (_client, server) = tokio::io::duplex(4096);
        let mut writer = RawWriter::new(server);
        writer.advance(SegmentKind::PartialHead);
        assert_eq!(writer.state(), WriterState::Idle);
        writer.advance(SegmentKind::Head);
        assert_eq!(writer.state(), WriterState::HeadersSent);
        writer.advance(SegmentKind::Body);
        assert_eq!(writer.state(), WriterState::PartialBodySent);
    }

    #[tokio::test(start_paused = true)]
    async fn peer_disconnect_surfaces_as_terminated_error() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);

        let frame = RawFrame::new()
            .head(&head())
            .body(Duration::from_secs(1), "never arrives");
        let err = RawWriter::new(server).emit(&frame).await.unwrap_err();
        assert_eq!(err.reached, WriterState::Idle);
        assert_eq!(err.state(), WriterState::Terminated);
        assert_eq!(err.bytes_written, 0);
    }
}
