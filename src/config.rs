//! Session configuration file parser.
//!
//! Parses a flat `key = value` file.  Every key is optional; anything absent
//! keeps the compiled-in default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GoProError, Result};
use crate::poll::{PollPolicy, RetryPolicy};

// Defaults
const IP_ADDR:              &str  = "10.5.5.9";
const MAC_ADDR:             &str  = "AA:BB:CC:DD:EE:FF";
const DOWNLOAD_CONCURRENCY: usize = 4;
const CHUNK_SIZE:           usize = 64 * 1024;
const CONTROL_TIMEOUT:      u64   = 5;
const REQUEST_TIMEOUT:      u64   = 30;
const RESOLVE_ATTEMPTS:     u32   = 6;
const RESOLVE_BACKOFF_MS:   u64   = 500;
const RESOLVE_BACKOFF_MAX:  u64   = 8_000;
const POLL_INTERVAL_MS:     u64   = 100;
const POLL_MAX:             u32   = 3_000;

/// Full session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    // ── Device ────────────────────────────────────────────────────────────────
    /// Camera address on its own access point.
    pub ip_addr: String,
    /// Camera MAC, used for wake-on-LAN.
    pub mac_addr: String,
    // ── Downloads ─────────────────────────────────────────────────────────────
    pub working_dir:          PathBuf,
    pub download_concurrency: usize,
    pub chunk_size:           usize,
    // ── Timeouts (seconds) ────────────────────────────────────────────────────
    pub control_timeout: u64,
    pub request_timeout: u64,
    // ── Retry / poll budgets ──────────────────────────────────────────────────
    pub resolve_attempts:       u32,
    pub resolve_backoff_ms:     u64,
    pub resolve_backoff_max_ms: u64,
    pub poll_interval_ms:       u64,
    pub poll_max:               u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ip_addr:                IP_ADDR.to_string(),
            mac_addr:               MAC_ADDR.to_string(),
            working_dir:            PathBuf::from("."),
            download_concurrency:   DOWNLOAD_CONCURRENCY,
            chunk_size:             CHUNK_SIZE,
            control_timeout:        CONTROL_TIMEOUT,
            request_timeout:        REQUEST_TIMEOUT,
            resolve_attempts:       RESOLVE_ATTEMPTS,
            resolve_backoff_ms:     RESOLVE_BACKOFF_MS,
            resolve_backoff_max_ms: RESOLVE_BACKOFF_MAX,
            poll_interval_ms:       POLL_INTERVAL_MS,
            poll_max:               POLL_MAX,
        }
    }
}

impl SessionConfig {
    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts:    self.resolve_attempts,
            initial_backoff: Duration::from_millis(self.resolve_backoff_ms),
            max_backoff:     Duration::from_millis(self.resolve_backoff_max_ms),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval:  Duration::from_millis(self.poll_interval_ms),
            max_polls: self.poll_max,
        }
    }
}

/// Parse `path` as a `key = value` session configuration file.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| GoProError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(parse_config(&content))
}

/// Parse configuration text.  Unknown keys are ignored.
pub fn parse_config(content: &str) -> SessionConfig {
    let mut cfg = SessionConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = match parts.next() {
            Some(k) => k.trim().to_ascii_lowercase(),
            None => continue,
        };
        let val = match parts.next() {
            Some(v) => v.trim().to_string(),
            None => continue,
        };
        if val.is_empty() {
            continue;
        }

        match key.as_str() {
            "ip_addr"                => cfg.ip_addr                = val,
            "mac_addr"               => cfg.mac_addr               = val,
            "working_dir"            => cfg.working_dir            = PathBuf::from(&val),
            "download_concurrency"   => cfg.download_concurrency   = val.parse().unwrap_or(DOWNLOAD_CONCURRENCY),
            "chunk_size"             => cfg.chunk_size             = val.parse().unwrap_or(CHUNK_SIZE),
            "control_timeout"        => cfg.control_timeout        = val.parse().unwrap_or(CONTROL_TIMEOUT),
            "request_timeout"        => cfg.request_timeout        = val.parse().unwrap_or(REQUEST_TIMEOUT),
            "resolve_attempts"       => cfg.resolve_attempts       = val.parse().unwrap_or(RESOLVE_ATTEMPTS),
            "resolve_backoff_ms"     => cfg.resolve_backoff_ms     = val.parse().unwrap_or(RESOLVE_BACKOFF_MS),
            "resolve_backoff_max_ms" => cfg.resolve_backoff_max_ms = val.parse().unwrap_or(RESOLVE_BACKOFF_MAX),
            "poll_interval_ms"       => cfg.poll_interval_ms       = val.parse().unwrap_or(POLL_INTERVAL_MS),
            "poll_max"               => cfg.poll_max               = val.parse().unwrap_or(POLL_MAX),
            _ => {} // ignore unknown keys
        }
    }

    cfg
}

/// Validate that the configured values are usable.
pub fn validate_config(cfg: &SessionConfig) -> Result<()> {
    if cfg.ip_addr.is_empty() {
        return Err(GoProError::Config("ip_addr is required".into()));
    }
    if cfg.download_concurrency == 0 {
        return Err(GoProError::Config("download_concurrency must be at least 1".into()));
    }
    if cfg.chunk_size == 0 {
        return Err(GoProError::Config("chunk_size must be at least 1".into()));
    }
    if cfg.resolve_attempts == 0 {
        return Err(GoProError::Config("resolve_attempts must be at least 1".into()));
    }
    if cfg.poll_max == 0 {
        return Err(GoProError::Config("poll_max must be at least 1".into()));
    }
    let mac_digits = cfg.mac_addr.chars().filter(|c| c.is_ascii_hexdigit()).count();
    if mac_digits != 12 {
        return Err(GoProError::Config(format!("mac_addr {:?} is not a MAC address", cfg.mac_addr)));
    }
    Ok(())
}
