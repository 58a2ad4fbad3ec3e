//! Behaviors that write literal bytes on the bare transport.
//!
//! Each one is a [`RawFrame`] built from the request head and the
//! [`BehaviorContext`], then played by the [`RawWriter`]. The connection
//! never reaches hyper, so the bytes on the wire are exactly the frame.

use std::time::Duration;

use tokio::io::AsyncWrite;

use super::BehaviorContext;
use crate::net::RequestHead;
use crate::observability::metrics;
use crate::raw::{RawFrame, RawHead, RawWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawBehavior {
    /// Complete head, then the body in two halves separated by the wait.
    SlowBody,
    /// Announces more body than it sends.
    BadContentLength,
    /// Hangs up before the head is complete.
    HangupDuringHeader,
    /// Hangs up after the head, before any body.
    HangupAfterHeader,
    /// Hangs up partway through the body.
    HangupDuringBody,
    /// Accepts a CONNECT, with a marker body only when `body` is queried.
    Connect,
}

impl RawBehavior {
    pub fn name(&self) -> &'static str {
        match self {
            RawBehavior::SlowBody => "slowbody",
            RawBehavior::BadContentLength => "badcontentlength",
            RawBehavior::HangupDuringHeader => "hangupduringheader",
            RawBehavior::HangupAfterHeader => "hangupafterheader",
            RawBehavior::HangupDuringBody => "hangupduringbody",
            RawBehavior::Connect => "connect",
        }
    }

    /// The exact frame this behavior writes for `head`.
    pub fn frame(&self, ctx: &BehaviorContext, head: &RequestHead) -> RawFrame {
        let (half, rest) = ctx.wait.resolve_halves(head.query_param("wait").as_deref());
        let wait = half + rest;

        match self {
            RawBehavior::SlowBody => RawFrame::new()
                .head(&base_head(ctx).header("Connection", "close"))
                .body(half, r#"[{"wirefault":"Hello from the slowbody endpoint"}"#)
                .body(
                    rest,
                    format!(
                        r#",{{"wirefault":"and some more data from the slowbody endpoint", "waitSeconds":"{}"}}]"#,
                        wait.as_secs()
                    ),
                ),
            RawBehavior::BadContentLength => RawFrame::new()
                .head(
                    &base_head(ctx)
                        .header("Content-Length", "2048")
                        .header("Connection", "close"),
                )
                .body(half, r#"[{"wirefault":"Hello from the badcontentlength endpoint"}"#)
                .body(
                    rest,
                    r#",{"wirefault":"and some more data from the badcontentlength endpoint"}]"#,
                ),
            RawBehavior::HangupDuringHeader => RawFrame::new()
                .partial_head(&hangup_head(ctx))
                .hang_up_after(ctx.hangup),
            RawBehavior::HangupAfterHeader => RawFrame::new()
                .head(&hangup_head(ctx))
                .hang_up_after(ctx.hangup),
            RawBehavior::HangupDuringBody => RawFrame::new()
                .head(&hangup_head(ctx))
                .body(
                    Duration::ZERO,
                    r#"[{"wirefault":"Hello from the /hangupduringbody endpoint"}"#,
                )
                .hang_up_after(ctx.hangup),
            RawBehavior::Connect => {
                let frame = RawFrame::new().head(
                    &RawHead::new("HTTP/1.1 200 OK")
                        .header("Server", ctx.server.as_str())
                        .header("Connection", "close"),
                );
                if head.query_param("body").is_some() {
                    frame.body(Duration::ZERO, r#"{"wirefault":"Hello from the connect endpoint"}"#)
                } else {
                    frame
                }
            }
        }
    }

    /// Take over `io` and play this behavior's frame onto it.
    pub async fn serve<W>(self, ctx: &BehaviorContext, head: &RequestHead, io: W)
    where
        W: AsyncWrite + Unpin,
    {
        let frame = self.frame(ctx, head);
        let request_id = head.header("x-request-id").unwrap_or("none");

        match RawWriter::new(io).emit(&frame).await {
            Ok(outcome) => {
                tracing::info!(
                    behavior = self.name(),
                    request_id = %request_id,
                    state = outcome.state.as_str(),
                    bytes_written = outcome.bytes_written,
                    delay_secs = frame.total_delay().as_secs(),
                    "Served raw behavior"
                );
                metrics::record_raw_outcome(self.name(), outcome.state.as_str());
            }
            Err(e) => {
                tracing::warn!(
                    behavior = self.name(),
                    request_id = %request_id,
                    error = %e,
                    "Raw behavior aborted"
                );
                metrics::record_raw_outcome(self.name(), e.state().as_str());
            }
        }
        metrics::record_behavior(self.name());
    }
}

fn base_head(ctx: &BehaviorContext) -> RawHead {
    RawHead::new("HTTP/1.1 200 OK")
        .header("Server", ctx.server.as_str())
        .header("Content-Encoding", "identity")
}

fn hangup_head(ctx: &BehaviorContext) -> RawHead {
    base_head(ctx).header("Content-Length", "1024")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::raw::{Directive, SegmentKind};

    fn ctx() -> BehaviorContext {
        let mut ctx = BehaviorContext::from_config(&ServerConfig::default(), 8081);
        ctx.server = "wirefault 9.9.9".into();
        ctx
    }

    fn request(target: &str) -> RequestHead {
        RequestHead::parse(format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n").as_bytes()).unwrap()
    }

    #[test]
    fn slowbody_bytes_and_timing() {
        let frame = RawBehavior::SlowBody.frame(&ctx(), &request("/wirefault/slowbody?wait=4"));
        assert_eq!(
            String::from_utf8(frame.wire_bytes()).unwrap(),
            concat!(
                "HTTP/1.1 200 OK\nServer: wirefault 9.9.9\nContent-Encoding: identity\nConnection: close\n\n",
                r#"[{"wirefault":"Hello from the slowbody endpoint"}"#,
                r#",{"wirefault":"and some more data from the slowbody endpoint", "waitSeconds":"4"}]"#,
            )
        );
        let delays: Vec<_> = frame.segments().iter().map(|s| s.delay.as_secs()).collect();
        assert_eq!(delays, [0, 2, 2]);
        assert!(!frame.terminates());
    }

    #[test]
    fn slowbody_falls_back_to_default_wait() {
        let frame = RawBehavior::SlowBody.frame(&ctx(), &request("/wirefault/slowbody?wait=nope"));
        assert!(String::from_utf8(frame.wire_bytes()).unwrap().contains(r#""waitSeconds":"3""#));
        assert_eq!(frame.total_delay(), Duration::from_secs(3));
    }

    #[test]
    fn badcontentlength_sends_less_than_announced() {
        let frame = RawBehavior::BadContentLength.frame(&ctx(), &request("/wirefault/badcontentlength"));
        let wire = String::from_utf8(frame.wire_bytes()).unwrap();
        assert!(wire.starts_with(
            "HTTP/1.1 200 OK\nServer: wirefault 9.9.9\nContent-Encoding: identity\nContent-Length: 2048\nConnection: close\n\n"
        ));
        assert!(frame.body_len() < 2048);
        assert_eq!(frame.segments().len(), 3);
    }

    #[test]
    fn hangup_during_header_never_finishes_head() {
        let frame = RawBehavior::HangupDuringHeader.frame(&ctx(), &request("/wirefault/hangupduringheader"));
        assert_eq!(
            frame.wire_bytes(),
            b"HTTP/1.1 200 OK\nServer: wirefault 9.9.9\nContent-Encoding: identity\nContent-Length: 1024"
        );
        let last = frame.segments().last().unwrap();
        assert_eq!(last.directive, Directive::Terminate);
        assert_eq!(last.delay, Duration::from_secs(2));
    }

    #[test]
    fn hangup_after_header_sends_no_body() {
        let frame = RawBehavior::HangupAfterHeader.frame(&ctx(), &request("/wirefault/hangupafterheader"));
        assert!(frame.wire_bytes().ends_with(b"Content-Length: 1024\n\n"));
        assert_eq!(frame.body_len(), 0);
        assert!(frame.terminates());
    }

    #[test]
    fn hangup_during_body_sends_partial_body() {
        let frame = RawBehavior::HangupDuringBody.frame(&ctx(), &request("/wirefault/hangupduringbody"));
        assert!(frame
            .wire_bytes()
            .ends_with(br#"Content-Length: 1024

[{"wirefault":"Hello from the /hangupduringbody endpoint"}"#));
        assert!(frame.body_len() < 1024);
        assert_eq!(frame.segments().last().unwrap().kind, SegmentKind::Body);
    }

    fn connect(target: &str) -> RequestHead {
        RequestHead::parse(format!("CONNECT {target} HTTP/1.1\r\nHost: localhost\r\n\r\n").as_bytes()).unwrap()
    }

    #[test]
    fn connect_body_only_when_asked() {
        let frame = RawBehavior::Connect.frame(&ctx(), &connect("/wirefault/connect"));
        assert_eq!(
            frame.wire_bytes(),
            b"HTTP/1.1 200 OK\nServer: wirefault 9.9.9\nConnection: close\n\n"
        );
        assert_eq!(frame.total_delay(), Duration::ZERO);

        let frame = RawBehavior::Connect.frame(&ctx(), &connect("/wirefault/connect?body"));
        assert!(frame
            .wire_bytes()
            .ends_with(br#"Connection: close

{"wirefault":"Hello from the connect endpoint"}"#));
        assert!(!frame.terminates());
    }
}
