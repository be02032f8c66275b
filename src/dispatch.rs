//! Command dispatch.
//!
//! URL templates for both dialects, and the raw setting / command / execute
//! calls every higher-level operation goes through.

use log::{debug, warn};
use serde_json::{json, Value};

use crate::constants::{section, setting};
use crate::dialect::{CapabilityDescriptor, Dialect};
use crate::error::{GoProError, Result};
use crate::session::Session;
use crate::transport::encode_token;

/// HTTP port of the media server.
const MEDIA_PORT: u16 = 8080;

/// (family, setting) pairs the camera rejects; sending them is skipped.
const UNSUPPORTED_SETTINGS: &[(&str, &str)] = &[
    ("HD7", setting::PROTUNE_VIDEO),
    ("HX",  setting::PROTUNE_VIDEO),
    ("FS",  setting::PROTUNE_VIDEO),
    ("H18", setting::PROTUNE_VIDEO),
];

pub fn setting_supported(family: &str, param: &str) -> bool {
    !UNSUPPORTED_SETTINGS.iter().any(|(f, p)| *f == family && *p == param)
}

/// URL builder for one camera address.
#[derive(Debug, Clone)]
pub struct Endpoints {
    ip: String,
}

impl Endpoints {
    pub fn new(ip: impl Into<String>) -> Self {
        Self { ip: ip.into() }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn gp_control(&self) -> String {
        format!("http://{}/gp/gpControl", self.ip)
    }

    pub fn status(&self) -> String {
        format!("{}/status", self.gp_control())
    }

    pub fn setting(&self, param: &str, value: &str) -> String {
        format!("{}/setting/{}/{}", self.gp_control(), encode_token(param), encode_token(value))
    }

    pub fn command(&self, cmd: &str) -> String {
        format!("{}/command/{}", self.gp_control(), encode_token(cmd))
    }

    pub fn execute(&self, cmd: &str) -> String {
        format!("{}/execute?{}", self.gp_control(), encode_token(cmd))
    }

    /// `/camera/<code>` or `/bacpac/<code>` with the auth token and an
    /// optional `%`-prefixed value.
    pub fn legacy(&self, root: &str, code: &str, token: &str, value: &str) -> String {
        let mut url = format!("http://{}/{root}/{code}?t={token}", self.ip);
        if !value.is_empty() {
            url.push_str("&p=%");
            url.push_str(&encode_token(value));
        }
        url
    }

    /// Plain legacy path without token (`bacpac/sd`, `camera/cv`, …).
    pub fn legacy_path(&self, path: &str) -> String {
        format!("http://{}/{path}", self.ip)
    }

    pub fn media_list(&self) -> String {
        format!("http://{}:{MEDIA_PORT}/gp/gpMediaList", self.ip)
    }

    /// Listing of both lenses on dual-lens cameras.
    pub fn media_list_ex(&self) -> String {
        format!("http://{}:{MEDIA_PORT}/gp/gpMediaListEx", self.ip)
    }

    pub fn media_prefix(&self) -> String {
        format!("http://{}:{MEDIA_PORT}/videos/DCIM/", self.ip)
    }

    pub fn media(&self, folder: &str, name: &str) -> String {
        format!("{}{folder}/{name}", self.media_prefix())
    }

    /// Second-lens file of a dual-lens capture.
    pub fn media_second_lens(&self, folder: &str, name: &str) -> String {
        format!("http://{}:{MEDIA_PORT}/videos2/DCIM/{folder}/{name}", self.ip)
    }

    pub fn metadata(&self, folder: &str, name: &str, kind: &str) -> String {
        format!("http://{}:{MEDIA_PORT}/gp/gpMediaMetadata?p={folder}/{name}&t={kind}", self.ip)
    }

    /// Finished transcode output, served by the port-80 web server.
    pub fn clip_output(&self, output: &str) -> String {
        format!("http://{}:80/videos/{output}", self.ip)
    }
}

/// Parse a command response.  Some firmware escapes path separators as `\`,
/// which is not valid JSON; an empty body is `null`.
pub fn repair_json(raw: &str) -> Result<Value> {
    let fixed = raw.replace('\\', "/");
    if fixed.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&fixed)?)
}

/// Read `payload[section][code]` as an integer.
pub fn status_number(payload: &Value, section: &str, code: &str) -> Result<i64> {
    let field = payload.get(section).and_then(|s| s.get(code));
    match field {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| GoProError::Payload(format!("{section}.{code} is not an integer"))),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| GoProError::Payload(format!("{section}.{code} is not an integer: {s}"))),
        _ => Err(GoProError::Payload(format!("status payload has no {section}.{code}"))),
    }
}

pub(crate) fn require_gpcontrol(camera: &CapabilityDescriptor, op: &str) -> Result<()> {
    if camera.dialect == Dialect::GpControl {
        Ok(())
    } else {
        Err(GoProError::UnsupportedCamera(format!("{op} needs a gpcontrol camera ({camera})")))
    }
}

/// Keep word characters only (`[A-Za-z0-9_]` and other alphanumerics).
pub fn sanitize_token(raw: &str) -> String {
    raw.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect()
}

impl Session {
    /// Set a camera setting.  Returns `None` without touching the network
    /// for (family, setting) pairs the camera is known to reject.
    pub async fn set_parameter(&self, param: &str, value: &str) -> Result<Option<String>> {
        let camera = self.camera().await?;
        require_gpcontrol(camera, "setting")?;

        if !setting_supported(&camera.model_family, param) {
            debug!("setting {param} not supported on {}; skipped", camera.model_family);
            self.log(
                format!("setting {param} skipped"),
                json!({ "param": param, "value": value, "model_family": camera.model_family }),
            )?;
            return Ok(None);
        }

        let url = self.endpoints().setting(param, value);
        let body = self.transport().get_text(&url, self.config().control_timeout()).await?;
        self.log(
            format!("set {param}={value}"),
            json!({ "param": param, "value": value, "response": body }),
        )?;
        Ok(Some(body))
    }

    /// Run `/command/<cmd>` and parse the (repaired) JSON response.
    pub async fn run_command(&self, cmd: &str) -> Result<Value> {
        require_gpcontrol(self.camera().await?, "command")?;
        let url = self.endpoints().command(cmd);
        let body = self.transport().get_text(&url, self.config().control_timeout()).await?;
        let parsed = repair_json(&body)?;
        self.log(format!("command {cmd}"), json!({ "command": cmd, "response": parsed }))?;
        Ok(parsed)
    }

    /// Run `/execute?<cmd>`; the raw body is returned.
    pub async fn run_execute(&self, cmd: &str) -> Result<String> {
        require_gpcontrol(self.camera().await?, "execute")?;
        let url = self.endpoints().execute(cmd);
        let body = self.transport().get_text(&url, self.config().control_timeout()).await?;
        self.log(format!("execute {cmd}"), json!({ "command": cmd, "response": body }))?;
        Ok(body)
    }

    /// Legacy `/camera/<code>` call.
    pub async fn send_camera(&self, code: &str, value: &str) -> Result<String> {
        self.send_legacy("camera", code, value).await
    }

    /// Legacy `/bacpac/<code>` call.
    pub async fn send_bacpac(&self, code: &str, value: &str) -> Result<String> {
        self.send_legacy("bacpac", code, value).await
    }

    async fn send_legacy(&self, root: &str, code: &str, value: &str) -> Result<String> {
        let token = self.auth_token().await;
        let url = self.endpoints().legacy(root, code, &token, value);
        let body = self.transport().get_text(&url, self.config().control_timeout()).await?;
        self.log(format!("{root} {code}={value}"), json!({ "code": code, "value": value }))?;
        Ok(body)
    }

    /// Token for the legacy dialect, read from `/bacpac/sd`.  Empty when the
    /// camera does not answer.
    pub async fn auth_token(&self) -> String {
        let url = self.endpoints().legacy_path("bacpac/sd");
        match self.transport().get_bytes(&url, self.config().control_timeout()).await {
            Ok(raw) => sanitize_token(&String::from_utf8_lossy(&raw)),
            Err(e) => {
                warn!("cannot read auth token: {e}");
                String::new()
            }
        }
    }

    /// Raw `/gp/gpControl/status` payload, without resolving the dialect.
    pub(crate) async fn fetch_status(&self) -> Result<Value> {
        let body = self
            .transport()
            .get_text(&self.endpoints().status(), self.config().control_timeout())
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn read_status_code(&self, code: &str) -> Result<i64> {
        let payload = self.fetch_status().await?;
        status_number(&payload, section::STATUS, code)
    }
}
