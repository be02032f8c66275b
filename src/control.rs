//! Camera control operations.
//!
//! Each operation picks the gpcontrol or legacy form from the resolved
//! dialect.  Operations the legacy dialect has no endpoint for fail with
//! `UnsupportedCamera`.

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use futures_util::future::join_all;
use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::UdpSocket;

use crate::constants::{info as info_key, legacy, mode, section, setting, status, SHUTTER_START, SHUTTER_STOP};
use crate::dialect::Dialect;
use crate::dispatch::{require_gpcontrol, sanitize_token, status_number};
use crate::error::{GoProError, Result};
use crate::poll::{poll_until, PollPolicy};
use crate::session::Session;

/// Wake-on-LAN destination ports (9 is discard; 7 is what HERO5 listens on).
const WOL_PORTS: [u16; 2] = [9, 7];

/// UDP port of the preview stream.
const PREVIEW_PORT: u16 = 8554;
const KEEP_ALIVE: &[u8] = b"_GPHD_:0:0:2:0.000000\n";

/// Pause after a mode change before the shutter is accepted.
const MODE_SETTLE: Duration = Duration::from_secs(1);

/// Shorter recordings are left running.
const MIN_TIMED_RECORDING: Duration = Duration::from_secs(2);

/// Status payload with codes replaced by names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub status:   BTreeMap<String, Value>,
    pub settings: BTreeMap<String, Value>,
}

impl DeviceStatus {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.status.get(name)
    }
}

/// Remap a `/gp/gpControl/status` payload.  Unknown status codes are
/// dropped; of the settings only resolution and frame rate are kept.
pub fn remap_status(payload: &Value) -> DeviceStatus {
    let mut out = DeviceStatus::default();
    if let Some(raw) = payload.get(section::STATUS).and_then(Value::as_object) {
        for (code, name) in status::NAMES {
            if let Some(v) = raw.get(*code) {
                out.status.insert(name.to_string(), v.clone());
            }
        }
    }
    if let Some(raw) = payload.get(section::SETTINGS).and_then(Value::as_object) {
        if let Some(v) = raw.get(setting::FRAME_RATE) {
            out.settings.insert("Framerate".into(), v.clone());
        }
        if let Some(v) = raw.get(setting::RESOLUTION) {
            out.settings.insert("Resolution".into(), v.clone());
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Last,
    All,
    /// The last file, `n` times.  A burst or timelapse counts as one.
    LastN(u32),
    File { folder: String, name: String },
}

/// `%yy%m%d%h%m%s`, every field in lowercase hex.
pub fn camera_time_token(now: &NaiveDateTime) -> String {
    format!(
        "%{:x}%{:x}%{:x}%{:x}%{:x}%{:x}",
        now.year().rem_euclid(100),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Wake-on-LAN magic packet: six `0xFF` then the MAC sixteen times.
pub fn magic_packet(mac: &str) -> Result<Vec<u8>> {
    let digits: String = mac.chars().filter(|c| !matches!(c, ':' | '-' | '.')).collect();
    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GoProError::Config(format!("invalid MAC address {mac:?}")));
    }
    let mut addr = [0u8; 6];
    for (i, byte) in addr.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|e| GoProError::Config(format!("invalid MAC address {mac:?}: {e}")))?;
    }
    let mut packet = vec![0xFF; 6];
    for _ in 0..16 {
        packet.extend_from_slice(&addr);
    }
    Ok(packet)
}

/// Legacy codes are two digits.
fn pad2(value: &str) -> String {
    if value.len() == 1 {
        format!("0{value}")
    } else {
        value.to_string()
    }
}

fn unsupported(op: &str) -> GoProError {
    GoProError::UnsupportedCamera(format!("{op} is not available on legacy cameras"))
}

impl Session {
    async fn dialect_now(&self) -> Result<Dialect> {
        Ok(self.camera().await?.dialect)
    }

    /// Sleep between steps of a sequence.  Long pauses are reported.
    async fn pace(&self, period: Duration) -> Result<()> {
        if period > MIN_TIMED_RECORDING {
            self.log(format!("sleeping for {} seconds", period.as_secs()), Value::Null)?;
        }
        tokio::time::sleep(period).await;
        Ok(())
    }

    // ── Status ────────────────────────────────────────────────────────────────

    /// Named status and settings.
    pub async fn status(&self) -> Result<DeviceStatus> {
        require_gpcontrol(self.camera().await?, "status")?;
        Ok(remap_status(&self.fetch_status().await?))
    }

    /// One raw field, `payload[section][code]`.
    pub async fn status_value(&self, section: &str, code: &str) -> Result<Value> {
        require_gpcontrol(self.camera().await?, "status")?;
        let payload = self.fetch_status().await?;
        payload
            .get(section)
            .and_then(|s| s.get(code))
            .cloned()
            .ok_or_else(|| GoProError::Payload(format!("status payload has no {section}.{code}")))
    }

    /// Integer status code from the `status` section.
    pub async fn status_code(&self, code: &str) -> Result<i64> {
        require_gpcontrol(self.camera().await?, "status")?;
        let payload = self.fetch_status().await?;
        status_number(&payload, section::STATUS, code)
    }

    /// Status as served: JSON for gpcontrol, hex of `/camera/sx` for legacy.
    pub async fn status_raw(&self) -> Result<String> {
        match self.dialect_now().await? {
            Dialect::GpControl => {
                self.transport()
                    .get_text(&self.endpoints().status(), self.config().control_timeout())
                    .await
            }
            Dialect::Auth => self.legacy_status_hex().await,
        }
    }

    /// Slice of the hex-encoded legacy status block.
    pub async fn legacy_status(&self, range: Range<usize>) -> Result<String> {
        let hex = self.legacy_status_hex().await?;
        hex.get(range.clone())
            .map(str::to_string)
            .ok_or_else(|| GoProError::Payload(format!("legacy status has no range {range:?}")))
    }

    async fn legacy_status_hex(&self) -> Result<String> {
        let token = self.auth_token().await;
        let url = format!("{}?t={token}", self.endpoints().legacy_path("camera/sx"));
        let raw = self.transport().get_bytes(&url, self.config().control_timeout()).await?;
        Ok(hex::encode_upper(&raw))
    }

    pub async fn is_busy(&self) -> Result<bool> {
        Ok(self.status_code(status::IS_BUSY).await? != 0)
    }

    /// Poll status `code` until `predicate` holds.  Returns the polls made.
    pub async fn await_condition<P>(&self, code: &str, predicate: P, policy: &PollPolicy) -> Result<u32>
    where
        P: Fn(i64) -> bool,
    {
        require_gpcontrol(self.camera().await?, "status polling")?;
        let (_, polls) = poll_until(policy, code, || self.read_status_code(code), |v| predicate(*v)).await?;
        Ok(polls)
    }

    /// Wait for IsBusy to clear under the configured poll policy.
    pub async fn wait_until_idle(&self) -> Result<u32> {
        self.await_condition(status::IS_BUSY, |v| v == 0, &self.config().poll_policy()).await
    }

    // ── Info ──────────────────────────────────────────────────────────────────

    /// The `info` object of `/gp/gpControl`, fetched fresh.
    pub async fn info(&self) -> Result<Value> {
        require_gpcontrol(self.camera().await?, "info")?;
        let body = self
            .transport()
            .get_text(&self.endpoints().gp_control(), self.config().control_timeout())
            .await?;
        let probe: Value = serde_json::from_str(&body)?;
        probe
            .get("info")
            .cloned()
            .ok_or_else(|| GoProError::Payload("gpControl payload has no info".into()))
    }

    /// One info field.  Legacy cameras answer model, firmware and SSID only.
    pub async fn info_value(&self, key: &str) -> Result<Value> {
        match self.dialect_now().await? {
            Dialect::GpControl => self
                .info()
                .await?
                .get(key)
                .cloned()
                .ok_or_else(|| GoProError::Payload(format!("info has no {key}"))),
            Dialect::Auth => {
                let path = match key {
                    info_key::MODEL_NAME | info_key::FIRMWARE_VERSION => "camera/cv",
                    info_key::AP_SSID | "ssid" => "bacpac/cv",
                    _ => return Err(unsupported(&format!("info {key}"))),
                };
                Ok(Value::String(self.legacy_info(path).await?))
            }
        }
    }

    pub(crate) async fn legacy_info(&self, path: &str) -> Result<String> {
        let url = self.endpoints().legacy_path(path);
        let raw = self.transport().get_bytes(&url, self.config().control_timeout()).await?;
        Ok(sanitize_token(&String::from_utf8_lossy(&raw)))
    }

    // ── Capture ───────────────────────────────────────────────────────────────

    pub async fn mode(&self, mode: &str, sub_mode: &str) -> Result<()> {
        match self.dialect_now().await? {
            Dialect::GpControl => {
                self.run_command(&format!("sub_mode?mode={mode}&sub_mode={sub_mode}")).await?;
            }
            Dialect::Auth => {
                self.send_camera(legacy::MODE, &pad2(mode)).await?;
            }
        }
        Ok(())
    }

    pub async fn shutter(&self, on: bool) -> Result<()> {
        let param = if on { SHUTTER_START } else { SHUTTER_STOP };
        match self.dialect_now().await? {
            Dialect::GpControl => {
                self.run_command(&format!("shutter?p={param}")).await?;
            }
            Dialect::Auth => {
                self.send_bacpac(legacy::SHUTTER, &pad2(param)).await?;
            }
        }
        Ok(())
    }

    /// Take a photo after `timer` and return the URL(s) of the result once
    /// the camera is idle again.
    pub async fn take_photo(&self, timer: Duration) -> Result<Vec<String>> {
        let camera = self.camera().await?;
        let single_h5 = camera.model_name.contains("HERO5 Black") || camera.model_name.contains("HERO6");
        let sub_mode = if single_h5 { mode::SUB_SINGLE_H5 } else { "0" };
        self.mode(mode::PHOTO, sub_mode).await?;
        if !timer.is_zero() {
            self.pace(timer).await?;
        }
        self.shutter(true).await?;

        if camera.dialect == Dialect::Auth {
            return Err(unsupported("photo completion"));
        }
        self.wait_until_idle().await?;
        self.latest_urls().await
    }

    /// Start recording.  For durations over two seconds, stop after
    /// `duration` and return the URL(s) of the clip; shorter durations leave
    /// the camera recording and return `None`.
    pub async fn shoot_video(&self, duration: Duration) -> Result<Option<Vec<String>>> {
        self.mode(mode::VIDEO, "0").await?;
        self.pace(MODE_SETTLE).await?;
        self.shutter(true).await?;

        if duration <= MIN_TIMED_RECORDING {
            return Ok(None);
        }
        self.pace(duration).await?;
        self.shutter(false).await?;
        if self.dialect_now().await? == Dialect::Auth {
            return Err(unsupported("recording completion"));
        }
        self.wait_until_idle().await?;
        Ok(Some(self.latest_urls().await?))
    }

    // ── Storage ───────────────────────────────────────────────────────────────

    pub async fn delete(&self, target: DeleteTarget) -> Result<()> {
        let dialect = self.dialect_now().await?;
        match (dialect, target) {
            (Dialect::GpControl, DeleteTarget::Last) => {
                self.run_command("storage/delete/last").await?;
            }
            (Dialect::GpControl, DeleteTarget::All) => {
                self.run_command("storage/delete/all").await?;
            }
            (Dialect::GpControl, DeleteTarget::LastN(n)) => {
                let jobs = (0..n).map(|_| self.run_command("storage/delete/last"));
                for outcome in join_all(jobs).await {
                    outcome?;
                }
            }
            (Dialect::GpControl, DeleteTarget::File { folder, name }) => {
                self.run_command(&format!("storage/delete?p={folder}/{name}")).await?;
            }
            (Dialect::Auth, DeleteTarget::Last) => {
                self.send_camera(legacy::DELETE_LAST, "").await?;
            }
            (Dialect::Auth, DeleteTarget::All) => {
                self.send_camera(legacy::DELETE_ALL, "").await?;
            }
            (Dialect::Auth, DeleteTarget::LastN(n)) => {
                let jobs = (0..n).map(|_| self.send_camera(legacy::DELETE_LAST, ""));
                for outcome in join_all(jobs).await {
                    outcome?;
                }
            }
            (Dialect::Auth, DeleteTarget::File { folder, name }) => {
                self.send_camera(legacy::DELETE_ALL, &format!("{folder}/{name}")).await?;
            }
        }
        Ok(())
    }

    /// Tag a HiLight moment in the current recording.
    pub async fn hilight(&self) -> Result<()> {
        match self.dialect_now().await? {
            Dialect::GpControl => self.run_command("storage/tag_moment").await.map(drop),
            Dialect::Auth => Err(unsupported("hilight")),
        }
    }

    // ── System ────────────────────────────────────────────────────────────────

    /// Beep and blink so the camera can be found.
    pub async fn locate(&self, on: bool) -> Result<()> {
        let param = if on { "1" } else { "0" };
        match self.dialect_now().await? {
            Dialect::GpControl => self.run_command(&format!("system/locate?p={param}")).await.map(drop),
            Dialect::Auth => self.send_camera(legacy::LOCATE, &pad2(param)).await.map(drop),
        }
    }

    pub async fn power_off(&self) -> Result<()> {
        match self.dialect_now().await? {
            Dialect::GpControl => self.run_command("system/sleep").await.map(drop),
            Dialect::Auth => self.send_bacpac(legacy::POWER, "00").await.map(drop),
        }
    }

    /// Send the wake-on-LAN packet to the camera.  Works before connect.
    pub async fn power_on(&self) -> Result<()> {
        let packet = magic_packet(&self.config().mac_addr)?;
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.set_broadcast(true)?;
        for port in WOL_PORTS {
            socket.send_to(&packet, (self.config().ip_addr.as_str(), port)).await?;
        }
        info!("wake-on-LAN sent to {} ({})", self.config().ip_addr, self.config().mac_addr);
        self.log("waking up", json!({ "mac": self.config().mac_addr, "ip": self.config().ip_addr }))
    }

    /// One keep-alive datagram for the preview stream.  The camera stops
    /// streaming when these stop arriving (send every 2.5 s).
    pub async fn keep_alive(&self) -> Result<()> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.send_to(KEEP_ALIVE, (self.config().ip_addr.as_str(), PREVIEW_PORT)).await?;
        Ok(())
    }

    /// Set the camera clock to local time.
    pub async fn sync_time(&self) -> Result<()> {
        let token = camera_time_token(&Local::now().naive_local());
        match self.dialect_now().await? {
            Dialect::GpControl => match self.run_command(&format!("setup/date_time?p={token}")).await {
                Ok(_) => Ok(()),
                Err(GoProError::DeviceReported { code, message, .. }) => {
                    warn!("camera refused time sync: {code} {message}");
                    self.log(format!("Error {code} syncing time"), json!({ "message": message }))
                }
                Err(e) => Err(e),
            },
            Dialect::Auth => self
                .send_camera(legacy::TIME, token.trim_start_matches('%'))
                .await
                .map(drop),
        }
    }

    /// Digital zoom, 0–100 percent.
    pub async fn set_zoom(&self, percent: u8) -> Result<()> {
        if percent > 100 {
            return Err(GoProError::InvalidArgument(format!("zoom {percent}% is outside 0-100")));
        }
        self.run_command(&format!("digital_zoom?range_pcnt={percent}")).await.map(drop)
    }

    pub async fn change_wifi(&self, ssid: &str, password: &str) -> Result<()> {
        match self.dialect_now().await? {
            Dialect::GpControl => self
                .run_command(&format!("wireless/ap/ssid?ssid={ssid}&pw={password}"))
                .await
                .map(drop),
            Dialect::Auth => Err(unsupported("wifi settings")),
        }
    }

    // ── Settings ──────────────────────────────────────────────────────────────

    /// Video resolution and optional frame rate, as catalog value ids.
    pub async fn video_settings(&self, resolution: &str, frame_rate: Option<&str>) -> Result<()> {
        match self.dialect_now().await? {
            Dialect::GpControl => {
                self.set_parameter(setting::RESOLUTION, resolution).await?;
                if let Some(fps) = frame_rate {
                    self.set_parameter(setting::FRAME_RATE, fps).await?;
                }
            }
            Dialect::Auth => {
                self.send_camera(legacy::VIDEO_RESOLUTION, resolution).await?;
                if let Some(fps) = frame_rate {
                    self.send_camera(legacy::FRAME_RATE, fps).await?;
                }
            }
        }
        Ok(())
    }

    pub async fn stream_settings(&self, bitrate: &str, window: &str) -> Result<()> {
        self.set_parameter(setting::STREAM_BITRATE, bitrate).await?;
        self.set_parameter(setting::STREAM_WINDOW, window).await?;
        Ok(())
    }

    pub async fn livestream(&self, start: bool) -> Result<()> {
        match self.dialect_now().await? {
            Dialect::GpControl => {
                let action = if start { "restart" } else { "stop" };
                self.run_execute(&format!("p1=gpStream&a1=proto_v2&c1={action}")).await.map(drop)
            }
            Dialect::Auth => {
                let value = if start { "02" } else { "00" };
                self.send_camera(legacy::PREVIEW, value).await.map(drop)
            }
        }
    }

    /// Reset pro-tune for a mode (`video`, `photo`, `multi_shot`).
    pub async fn reset_protune(&self, mode: &str) -> Result<()> {
        self.run_command(&format!("{mode}/protune/reset")).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::testing::{busy_status, probe, session_with, Reply, ScriptedTransport, BASE};

    fn hero7() -> Arc<ScriptedTransport> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_json(BASE, probe("HERO7 Black", "HD7.01.01.51.00"));
        transport
    }

    #[test]
    fn status_is_remapped_by_name() {
        let payload = json!({
            "status": { "8": 1, "31": 1, "43": 0, "999": 5 },
            "settings": { "2": 9, "3": 8, "10": 1 }
        });
        let s = remap_status(&payload);
        assert_eq!(s.get("IsBusy"), Some(&json!(1)));
        assert_eq!(s.get("Mode"), Some(&json!(0)));
        assert_eq!(s.status.len(), 3);
        assert_eq!(s.settings["Resolution"], json!(9));
        assert_eq!(s.settings["Framerate"], json!(8));
        assert_eq!(s.settings.len(), 2);
    }

    #[tokio::test]
    async fn legacy_status_is_uppercase_hex() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on("http://10.5.5.9/bacpac/sd", Reply::Text("pw".into()));
        transport.on("http://10.5.5.9/bacpac/PW?t=pw&p=%01", Reply::Text(String::new()));
        transport.on("http://10.5.5.9/camera/cv", Reply::Text("HERO3 Black".into()));
        transport.on("http://10.5.5.9/camera/sx?t=pw", Reply::Text("\u{0}\u{1}\u{7f}A".into()));
        let session = session_with(Arc::clone(&transport));
        session.connect(crate::session::ConnectMode::Legacy).await.unwrap();

        assert_eq!(session.status_raw().await.unwrap(), "00017F41");
        assert_eq!(session.legacy_status(2..6).await.unwrap(), "017F");
        assert!(matches!(session.legacy_status(6..12).await, Err(GoProError::Payload(_))));
    }

    #[test]
    fn time_token_is_hex() {
        let t = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap().and_hms_opt(23, 59, 10).unwrap();
        assert_eq!(camera_time_token(&t), "%18%c%1f%17%3b%a");
    }

    #[test]
    fn magic_packet_repeats_mac() {
        let p = magic_packet("AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(p.len(), 102);
        assert_eq!(&p[..6], &[0xFF; 6]);
        assert_eq!(&p[6..12], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(&p[96..], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(magic_packet("aabbccddeeff").unwrap(), p);
        assert!(magic_packet("AA:BB").is_err());
    }

    #[tokio::test]
    async fn busy_wait_counts_polls() {
        let transport = hero7();
        let url = format!("{BASE}/status");
        transport.on_json(&url, busy_status(1));
        transport.on_json(&url, busy_status(1));
        transport.on_json(&url, busy_status(0));
        let session = session_with(Arc::clone(&transport));

        let polls = session
            .await_condition(status::IS_BUSY, |v| v == 0, &PollPolicy::tight(10))
            .await
            .unwrap();
        assert_eq!(polls, 3);
        assert_eq!(transport.count(&url), 3);
    }

    #[tokio::test]
    async fn take_photo_waits_then_returns_latest() {
        let transport = hero7();
        transport.on_json(format!("{BASE}/command/sub_mode?mode=1&sub_mode=0"), json!({}));
        transport.on_json(format!("{BASE}/command/shutter?p=1"), json!({}));
        let status_url = format!("{BASE}/status");
        transport.on_json(&status_url, busy_status(1));
        transport.on_json(&status_url, busy_status(0));
        transport.on_json(
            "http://10.5.5.9:8080/gp/gpMediaList",
            json!({ "media": [ { "d": "100GOPRO", "fs": [ { "n": "GOPR0007.JPG", "s": "1" } ] } ] }),
        );
        let session = session_with(Arc::clone(&transport));

        let urls = session.take_photo(Duration::ZERO).await.unwrap();
        assert_eq!(urls, ["http://10.5.5.9:8080/videos/DCIM/100GOPRO/GOPR0007.JPG"]);
        assert_eq!(transport.count(&status_url), 2);
    }

    #[tokio::test]
    async fn hero5_photo_uses_single_sub_mode() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_json(BASE, probe("HERO5 Black", "HD5.02.01.02.00"));
        let url = format!("{BASE}/command/sub_mode?mode=1&sub_mode=1");
        transport.on_json(&url, json!({}));
        let session = session_with(Arc::clone(&transport));

        session.mode(mode::PHOTO, mode::SUB_SINGLE_H5).await.unwrap();
        assert_eq!(transport.count(&url), 1);
    }

    #[tokio::test]
    async fn delete_last_n_issues_n_requests() {
        let transport = hero7();
        let url = format!("{BASE}/command/storage/delete/last");
        transport.on(&url, Reply::Text(String::new()));
        let session = session_with(Arc::clone(&transport));

        session.delete(DeleteTarget::LastN(3)).await.unwrap();
        assert_eq!(transport.count(&url), 3);
    }

    #[tokio::test]
    async fn zoom_outside_range_is_rejected_without_request() {
        let transport = hero7();
        let session = session_with(Arc::clone(&transport));
        assert!(matches!(session.set_zoom(101).await, Err(GoProError::InvalidArgument(_))));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn stream_settings_set_bitrate_and_window() {
        let transport = hero7();
        transport.on_json(format!("{BASE}/setting/62/1000000"), json!({}));
        transport.on_json(format!("{BASE}/setting/64/4"), json!({}));
        let session = session_with(Arc::clone(&transport));

        session.stream_settings("1000000", "4").await.unwrap();
        assert_eq!(transport.count(&format!("{BASE}/setting/64/4")), 1);
    }

    #[tokio::test]
    async fn short_recording_keeps_running() {
        let transport = hero7();
        transport.on_json(format!("{BASE}/command/sub_mode?mode=0&sub_mode=0"), json!({}));
        transport.on_json(format!("{BASE}/command/shutter?p=1"), json!({}));
        let session = session_with(Arc::clone(&transport));

        let out = session.shoot_video(Duration::from_secs(1)).await.unwrap();
        assert_eq!(out, None);
        assert_eq!(transport.count(&format!("{BASE}/command/shutter?p=0")), 0);
    }
}
