//! Camera identification.
//!
//! The camera is probed once per session through `/gp/gpControl`.  The
//! firmware string decides the command dialect:
//!
//!   HX… / FS… / H18…   exception families (Session, Fusion, HERO 2018) → gpcontrol
//!   HD<n>.…, n > 3      HERO4 and later                                → gpcontrol
//!   HD<n>.…, n ≤ 3      HERO3 and older                                → refused
//!
//! Older cameras speak the legacy `/camera/` + `/bacpac/` dialect, which is
//! only reachable by pinning it explicitly (see `ConnectMode::Legacy`).

use std::fmt;

use log::info;
use serde::Serialize;
use serde_json::{json, Value};

use crate::constants::{info as info_key, status};
use crate::error::{GoProError, Result};
use crate::poll::poll_until;
use crate::session::Session;

/// Families identified by substring rather than by the `HD` tier digit.
pub const EXCEPTION_FAMILIES: [&str; 3] = ["HX", "FS", "H18"];

const FAMILY_MARKER: &str = "HD";

/// Highest `HD` tier that is refused.
const LEGACY_TIER: u32 = 3;

/// Family that must report IsConnected before it accepts commands.
const SESSION_FAMILY: &str = "HX";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `/gp/gpControl/…` (HERO4 and later).
    GpControl,
    /// `/camera/<code>?t=<token>` (HERO3 and older).
    Auth,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::GpControl => f.write_str("gpcontrol"),
            Dialect::Auth      => f.write_str("auth"),
        }
    }
}

/// What the session knows about the connected camera.  Written once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityDescriptor {
    pub model_name:       String,
    /// `HD7`, `HX`, `FS`, … (empty for a pinned legacy camera).
    pub model_family:     String,
    pub firmware_version: String,
    pub dialect:          Dialect,
    /// Raw `info` object of the probe.
    pub info:             Value,
}

impl CapabilityDescriptor {
    /// Descriptor for a camera pinned to the legacy dialect.
    pub fn legacy(model_name: String) -> Self {
        Self {
            model_name,
            model_family:     String::new(),
            firmware_version: String::new(),
            dialect:          Dialect::Auth,
            info:             Value::Null,
        }
    }

    /// Fusion: two lenses, two storage listings.
    pub fn is_dual_lens(&self) -> bool {
        self.model_family == "FS"
    }

    pub fn is_hero4(&self) -> bool {
        self.model_name.contains("HERO4")
    }
}

impl fmt::Display for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, api:{}", self.model_name, self.dialect)?;
        if !self.firmware_version.is_empty() {
            write!(f, ", fw:{}", self.firmware_version)?;
        }
        Ok(())
    }
}

/// Outcome of parsing a firmware string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareClass {
    pub family: String,
    pub tier:   Option<u32>,
}

/// Classify a firmware string, refusing anything below the gpcontrol tier.
pub fn classify_firmware(firmware: &str) -> Result<FirmwareClass> {
    if let Some(exception) = EXCEPTION_FAMILIES.iter().find(|e| firmware.contains(*e)) {
        let tier = marker_tier(firmware);
        return Ok(FirmwareClass { family: exception.to_string(), tier });
    }

    let Some((_, after)) = firmware.split_once(FAMILY_MARKER) else {
        return Err(GoProError::CameraIdentification(format!("unsupported camera: {firmware}")));
    };
    let tier = after
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .ok_or_else(|| GoProError::CameraIdentification(format!("unparsable firmware: {firmware}")))?;
    if tier <= LEGACY_TIER {
        return Err(GoProError::CameraIdentification(format!("unsupported camera: {firmware}")));
    }
    let family = firmware.split('.').next().unwrap_or(firmware).to_string();
    Ok(FirmwareClass { family, tier: Some(tier) })
}

fn marker_tier(firmware: &str) -> Option<u32> {
    firmware
        .split_once(FAMILY_MARKER)
        .and_then(|(_, after)| after.chars().next())
        .and_then(|c| c.to_digit(10))
}

/// Build the descriptor from a `/gp/gpControl` probe payload.
pub fn identify(probe: &Value) -> Result<CapabilityDescriptor> {
    let info = probe.get("info").cloned().unwrap_or(Value::Null);
    let firmware = info
        .get(info_key::FIRMWARE_VERSION)
        .and_then(Value::as_str)
        .ok_or_else(|| GoProError::CameraIdentification("probe has no firmware_version".into()))?;
    let class = classify_firmware(firmware)?;
    let model_name = info
        .get(info_key::MODEL_NAME)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(CapabilityDescriptor {
        model_name,
        model_family: class.family,
        firmware_version: firmware.to_string(),
        dialect: Dialect::GpControl,
        info,
    })
}

impl Session {
    /// Probe and identify the camera, retrying transport failures under the
    /// configured policy.  Called once per session through `camera()`.
    pub(crate) async fn resolve(&self) -> Result<CapabilityDescriptor> {
        let retry = self.config().retry_policy();
        let (camera, probe) = retry
            .run("camera detection", || self.detect_once())
            .await
            .map_err(|e| {
                if e.is_transport() {
                    GoProError::CameraIdentification(format!(
                        "no camera reachable at {}: {e}",
                        self.config().ip_addr
                    ))
                } else {
                    e
                }
            })?;

        info!("detected camera: {camera}");
        self.log(
            format!("detected camera {}", camera.model_name),
            json!({ "camera": camera, "data": probe }),
        )?;
        Ok(camera)
    }

    /// One detection attempt: probe, classify, and for the Session family
    /// wait for IsConnected.
    async fn detect_once(&self) -> Result<(CapabilityDescriptor, Value)> {
        let text = self
            .transport()
            .get_text(&self.endpoints().gp_control(), self.config().control_timeout())
            .await?;
        let probe: Value = serde_json::from_str(&text)
            .map_err(|e| GoProError::CameraIdentification(format!("bad probe payload: {e}")))?;
        let camera = identify(&probe)?;

        if camera.model_family == SESSION_FAMILY {
            let policy = self.config().poll_policy();
            poll_until(
                &policy,
                "IsConnected",
                || self.read_status_code(status::IS_CONNECTED),
                |v| *v >= 1,
            )
            .await
            .map_err(|e| match e {
                GoProError::PollExhausted { polls, .. } => GoProError::CameraIdentification(
                    format!("camera never reported connected after {polls} polls"),
                ),
                other => other,
            })?;
        }
        Ok((camera, probe))
    }
}
