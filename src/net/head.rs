//! Request head peeking.
//!
//! The dispatcher has to know which behavior a connection targets before
//! deciding who owns it. This module reads just far enough to see the first
//! request head and hands back every byte it consumed, so the connection
//! can be replayed into hyper untouched.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on how much is buffered while looking for the end of a head.
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Error type for reading and parsing request heads.
#[derive(Debug, thiserror::Error)]
pub enum HeadError {
    /// The peer closed before sending anything.
    #[error("connection closed before a request head arrived")]
    Closed,
    #[error("failed to read request head: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed request head: {0}")]
    Malformed(String),
}

/// Most headers accepted in one head, matching hyper's default.
const MAX_HEADERS: usize = 100;

/// The parsed first line and headers of a request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Parse a head from a buffer that starts with the request line.
    ///
    /// Uses the same parser as hyper, so a head accepted here is accepted
    /// there. Anything after the blank line is ignored.
    pub fn parse(buf: &[u8]) -> Result<Self, HeadError> {
        parse_head(buf)?.ok_or_else(|| HeadError::Malformed("incomplete request head".into()))
    }

    /// The path component of the request target.
    pub fn path(&self) -> &str {
        let target = strip_authority(&self.target);
        match target.split_once('?') {
            Some((path, _)) => path,
            None => target,
        }
    }

    /// The raw query string, if present.
    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    /// First value of `name` in the query string, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// `Ok(None)` while the head is still incomplete.
fn parse_head(buf: &[u8]) -> Result<Option<RequestHead>, HeadError> {
    let mut slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut slots);
    match req.parse(buf) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(HeadError::Malformed(e.to_string())),
    }

    let (Some(method), Some(target), Some(version)) = (req.method, req.path, req.version) else {
        return Err(HeadError::Malformed("incomplete request line".into()));
    };
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| HeadError::Malformed(format!("invalid method: {method}")))?;
    let version = match version {
        0 => Version::HTTP_10,
        _ => Version::HTTP_11,
    };

    let mut headers = HeaderMap::with_capacity(req.headers.len());
    for header in req.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|_| HeadError::Malformed(format!("invalid header name: {}", header.name)))?;
        let value = HeaderValue::from_bytes(header.value)
            .map_err(|_| HeadError::Malformed(format!("invalid value for header {name}")))?;
        headers.append(name, value);
    }

    Ok(Some(RequestHead {
        method,
        target: target.to_string(),
        version,
        headers,
    }))
}

/// `http://host:port/path` → `/path`
fn strip_authority(target: &str) -> &str {
    let Some((_, rest)) = target.split_once("://") else {
        return target;
    };
    match rest.find('/') {
        Some(idx) => &rest[idx..],
        None => "/",
    }
}

/// Read from `io` until a complete request head is buffered.
///
/// Returns everything read so far, which may include the start of the body.
/// Stops early, returning what it has, once the bytes can no longer become
/// a valid head or `limit` bytes are buffered; the caller's parse then
/// rejects them.
pub async fn read_head<S>(io: &mut S, limit: usize) -> Result<BytesMut, HeadError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(1024);
    loop {
        let n = io.read_buf(&mut buf).await?;
        if n == 0 {
            return if buf.is_empty() {
                Err(HeadError::Closed)
            } else {
                Ok(buf)
            };
        }
        if !matches!(parse_head(&buf), Ok(None)) || buf.len() >= limit {
            return Ok(buf);
        }
    }
}
