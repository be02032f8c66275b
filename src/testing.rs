//! Scripted in-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::error::{GoProError, Result};
use crate::session::Session;
use crate::transport::{copy_chunked, device_error, Transport};

pub const BASE: &str = "http://10.5.5.9/gp/gpControl";

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Timeout,
    Status(u16, String),
}

/// Replies are queued per URL; the last queued reply repeats.  Unscripted
/// URLs answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes:         Mutex<HashMap<String, VecDeque<Reply>>>,
    calls:          Mutex<Vec<String>>,
    download_delay: Duration,
    active:         AtomicUsize,
    pub max_active: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    pub fn on(&self, url: impl Into<String>, reply: Reply) {
        self.routes.lock().unwrap().entry(url.into()).or_default().push_back(reply);
    }

    pub fn on_json(&self, url: impl Into<String>, body: Value) {
        self.on(url, Reply::Text(body.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    fn next(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(Reply::Text(body)) => Ok(body),
            Some(Reply::Timeout) => Err(GoProError::TransportTimeout(url.to_string())),
            Some(Reply::Status(status, body)) => Err(device_error(status, url, &body)),
            None => Err(GoProError::HttpStatus { status: 404, url: url.to_string() }),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_text(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.next(url)
    }

    async fn get_bytes(&self, url: &str, _timeout: Duration) -> Result<Bytes> {
        self.next(url).map(Bytes::from)
    }

    async fn download(&self, url: &str, dest: &Path, chunk_size: usize) -> Result<u64> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if !self.download_delay.is_zero() {
            tokio::time::sleep(self.download_delay).await;
        }
        let body = self.next(url);
        self.active.fetch_sub(1, Ordering::SeqCst);

        let body = body?;
        let mut file = tokio::fs::File::create(dest).await?;
        let pieces = vec![Ok::<_, GoProError>(Bytes::from(body))];
        copy_chunked(stream::iter(pieces), &mut file, chunk_size).await
    }
}

/// Configuration with no backoff and tight polling.
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        resolve_attempts:       3,
        resolve_backoff_ms:     0,
        resolve_backoff_max_ms: 0,
        poll_interval_ms:       0,
        poll_max:               20,
        ..SessionConfig::default()
    }
}

pub fn session_with(transport: Arc<ScriptedTransport>) -> Session {
    Session::with_transport(fast_config(), transport)
}

/// `/gp/gpControl` probe body.
pub fn probe(model: &str, firmware: &str) -> Value {
    json!({ "info": { "model_name": model, "firmware_version": firmware } })
}

/// `/gp/gpControl/status` body with the given IsBusy value.
pub fn busy_status(busy: i64) -> Value {
    json!({ "status": { "8": busy, "31": 1, "43": 0 }, "settings": { "2": 9, "3": 8 } })
}
