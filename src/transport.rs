//! HTTP transport to the camera.
//!
//! All device traffic is plain `GET` against the camera's own access point.
//! Every control call carries its own timeout; downloads are streamed to disk
//! in fixed-size chunks so a multi-gigabyte video never sits in memory.
//!
//! The [`Transport`] trait is the seam the session talks through, so the
//! session logic can be driven by a scripted fake in tests.

use std::path::Path;
use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{GoProError, Result};

/// Connection establishment limit for the shared client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text.
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String>;

    /// GET `url` and return the raw body.
    async fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Bytes>;

    /// GET `url` and stream the body into `dest` in `chunk_size` pieces.
    /// Returns the number of bytes written.
    async fn download(&self, url: &str, dest: &Path, chunk_size: usize) -> Result<u64>;
}

/// Error body the camera returns alongside a non-200 status.
#[derive(Debug, Deserialize)]
struct DeviceErrorBody {
    error_code: i64,
    #[serde(default)]
    error_msg:  String,
}

/// Classify a non-success response body.
pub fn device_error(status: u16, url: &str, body: &str) -> GoProError {
    match serde_json::from_str::<DeviceErrorBody>(body) {
        Ok(e) => GoProError::DeviceReported {
            status,
            code:    e.error_code,
            message: e.error_msg,
        },
        Err(_) => GoProError::HttpStatus { status, url: url.to_string() },
    }
}

/// reqwest-backed transport.  The client (and its connection pool) lives as
/// long as the owning session.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(GoProError::Http)?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str, timeout: Option<Duration>) -> Result<Response> {
        let mut req = self.client.get(url);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let resp = req.send().await.map_err(|e| GoProError::from_reqwest(url, e))?;
        let status = resp.status();
        debug!("GET {url} → {status}");
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(device_error(status.as_u16(), url, &body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String> {
        let resp = self.send(url, Some(timeout)).await?;
        resp.text().await.map_err(|e| GoProError::from_reqwest(url, e))
    }

    async fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Bytes> {
        let resp = self.send(url, Some(timeout)).await?;
        resp.bytes().await.map_err(|e| GoProError::from_reqwest(url, e))
    }

    async fn download(&self, url: &str, dest: &Path, chunk_size: usize) -> Result<u64> {
        let resp = self.send(url, None).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let copied = copy_chunked(
            resp.bytes_stream().map(|piece| piece.map_err(|e| GoProError::from_reqwest(url, e))),
            &mut file,
            chunk_size,
        ).await;
        match copied {
            Ok(n) => {
                file.sync_all().await?;
                Ok(n)
            }
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    warn!("cannot remove partial download {}: {rm}", dest.display());
                }
                Err(e)
            }
        }
    }
}

/// Copy a byte stream into `writer`, issuing writes of exactly `chunk_size`
/// bytes (the final write may be shorter).  At most one chunk plus one
/// incoming piece is held in memory.
pub async fn copy_chunked<S, E, W>(stream: S, writer: &mut W, chunk_size: usize) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<GoProError>,
    W: AsyncWrite + Unpin,
{
    let chunk_size = chunk_size.max(1);
    let mut stream = pin!(stream);
    let mut buf: Vec<u8> = Vec::with_capacity(chunk_size);
    let mut total = 0u64;

    while let Some(piece) = stream.next().await {
        let mut piece = piece.map_err(Into::into)?;
        while !piece.is_empty() {
            let take = (chunk_size - buf.len()).min(piece.len());
            buf.extend_from_slice(&piece.split_to(take));
            if buf.len() == chunk_size {
                writer.write_all(&buf).await?;
                total += buf.len() as u64;
                buf.clear();
            }
        }
    }
    if !buf.is_empty() {
        writer.write_all(&buf).await?;
        total += buf.len() as u64;
    }
    writer.flush().await?;
    Ok(total)
}

/// Characters of an opaque catalog token that would break the request line.
/// `/ ? & = %` pass through: tokens carry query strings and pre-encoded
/// values.  Non-ASCII is always encoded.
const TOKEN_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub fn encode_token(token: &str) -> String {
    utf8_percent_encode(token, TOKEN_UNSAFE).to_string()
}
