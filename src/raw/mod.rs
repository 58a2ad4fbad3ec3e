//! Raw response frames.
//!
//! # Responsibilities
//! - Describe a response as an ordered list of literal byte segments
//! - Attach a pre-write delay and a flush/terminate directive to each segment
//! - Render response heads exactly as given (LF line endings, no rewriting)
//!
//! # Data Flow
//! ```text
//! behavior (behaviors::raw)
//!     → RawHead + body fragments
//!     → RawFrame (segments in wire order)
//!     → writer.rs (sleep, write, flush per segment, then shut down)
//! ```
//!
//! # Design Decisions
//! - Frames are plain data so tests can assert the exact bytes without a socket
//! - Nothing here ever touches a transport

pub mod writer;

use std::time::Duration;

use bytes::Bytes;

pub use writer::{RawOutcome, RawWriteError, RawWriter, WriterState};

/// What part of a response a segment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Status line and headers with no terminating blank line.
    PartialHead,
    /// Status line, headers and the blank line.
    Head,
    Body,
}

/// What the writer does once a segment is on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Flush,
    /// Flush, then abandon the rest of the response.
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub delay: Duration,
    pub kind: SegmentKind,
    pub bytes: Bytes,
    pub directive: Directive,
}

/// An ordered, immutable description of everything written to a raw connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    segments: Vec<Segment>,
}

impl RawFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a complete head, written immediately.
    pub fn head(self, head: &RawHead) -> Self {
        self.push(Duration::ZERO, SegmentKind::Head, head.render(), Directive::Flush)
    }

    /// Append a head cut off before its terminating blank line.
    pub fn partial_head(self, head: &RawHead) -> Self {
        self.push(
            Duration::ZERO,
            SegmentKind::PartialHead,
            head.render_partial(),
            Directive::Flush,
        )
    }

    /// Append a body fragment written after `delay`.
    pub fn body(self, delay: Duration, bytes: impl Into<Bytes>) -> Self {
        self.push(delay, SegmentKind::Body, bytes.into(), Directive::Flush)
    }

    /// Hold the connection open for `delay`, then hang up.
    pub fn hang_up_after(self, delay: Duration) -> Self {
        let kind = self
            .segments
            .last()
            .map(|s| s.kind)
            .unwrap_or(SegmentKind::PartialHead);
        self.push(delay, kind, Bytes::new(), Directive::Terminate)
    }

    fn push(mut self, delay: Duration, kind: SegmentKind, bytes: Bytes, directive: Directive) -> Self {
        self.segments.push(Segment {
            delay,
            kind,
            bytes,
            directive,
        });
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the frame ends by abandoning the connection.
    pub fn terminates(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.directive == Directive::Terminate)
    }

    /// All segment bytes concatenated in wire order.
    pub fn wire_bytes(&self) -> Vec<u8> {
        self.segments
            .iter()
            .flat_map(|s| s.bytes.iter().copied())
            .collect()
    }

    /// Number of body bytes the frame writes.
    pub fn body_len(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Body)
            .map(|s| s.bytes.len())
            .sum()
    }

    pub fn total_delay(&self) -> Duration {
        self.segments.iter().map(|s| s.delay).sum()
    }
}

/// A literal response head.
///
/// Lines are joined with a bare `\n`, and header order and spelling are
/// kept exactly as added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHead {
    status_line: String,
    headers: Vec<(String, String)>,
}

impl RawHead {
    pub fn new(status_line: impl Into<String>) -> Self {
        Self {
            status_line: status_line.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status line and headers, no trailing newline.
    pub fn render_partial(&self) -> Bytes {
        let mut out = self.status_line.clone();
        for (name, value) in &self.headers {
            out.push('\n');
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
        }
        Bytes::from(out)
    }

    /// Status line, headers and the terminating blank line.
    pub fn render(&self) -> Bytes {
        let mut out = self.render_partial().to_vec();
        out.extend_from_slice(b"\n\n");
        Bytes::from(out)
    }
}
