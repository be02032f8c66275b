//! On-camera transcode jobs ("clips").
//!
//! A clip is requested with a source file and an in/out range, then polled
//! through `transcode/status` until it completes, fails or is canceled.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{GoProError, Result};
use crate::poll::{poll_until, PollPolicy};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TranscodeStage {
    Queued,
    InProgress,
    Complete,
    Canceled,
    Failed,
}

impl TranscodeStage {
    pub fn from_code(code: i64) -> Result<Self> {
        Ok(match code {
            0 => TranscodeStage::Queued,
            1 => TranscodeStage::InProgress,
            2 => TranscodeStage::Complete,
            3 => TranscodeStage::Canceled,
            4 => TranscodeStage::Failed,
            other => return Err(GoProError::Payload(format!("unknown transcode status {other}"))),
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TranscodeStage::Complete | TranscodeStage::Canceled | TranscodeStage::Failed)
    }
}

impl fmt::Display for TranscodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TranscodeStage::Queued     => "started",
            TranscodeStage::InProgress => "in progress",
            TranscodeStage::Complete   => "complete",
            TranscodeStage::Canceled   => "canceled",
            TranscodeStage::Failed     => "failed",
        };
        f.write_str(s)
    }
}

/// Parameters of a clip request.  Values are passed through as the camera
/// expects them (catalog ids and milliseconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    /// `<folder>/<file>` under DCIM.
    pub source:      String,
    pub resolution:  String,
    pub fps_divisor: String,
    pub in_ms:       u64,
    pub out_ms:      u64,
}

/// A transcode job.  `url` is set only once the job is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingOperation {
    pub id:    String,
    pub stage: TranscodeStage,
    pub url:   Option<String>,
}

fn job_id(resp: &Value) -> Result<String> {
    match resp.pointer("/status/id") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(GoProError::Payload("transcode response has no status.id".into())),
    }
}

impl Session {
    /// Ask the camera to cut a clip.  The job starts queued.
    pub async fn request_clip(&self, req: &ClipRequest) -> Result<PendingOperation> {
        let endpoint = if self.camera().await?.is_hero4() {
            "transcode/request"
        } else {
            "transcode/video_to_video"
        };
        let resp = self
            .run_command(&format!(
                "{endpoint}?source=DCIM/{}&res={}&fps_divisor={}&in_ms={}&out_ms={}",
                req.source, req.resolution, req.fps_divisor, req.in_ms, req.out_ms
            ))
            .await?;
        let id = job_id(&resp)?;
        Ok(PendingOperation { id, stage: TranscodeStage::Queued, url: None })
    }

    /// Current state of job `id`.
    pub async fn clip_status(&self, id: &str) -> Result<PendingOperation> {
        let resp = self.run_command(&format!("transcode/status?id={id}")).await?;
        let code = resp
            .pointer("/status/status")
            .and_then(Value::as_i64)
            .ok_or_else(|| GoProError::Payload("transcode status has no status.status".into()))?;
        let stage = TranscodeStage::from_code(code)?;
        let url = match (stage, resp.pointer("/status/output").and_then(Value::as_str)) {
            (TranscodeStage::Complete, Some(output)) => Some(self.endpoints().clip_output(output)),
            _ => None,
        };
        Ok(PendingOperation { id: id.to_string(), stage, url })
    }

    /// Poll `job` until it reaches a terminal stage.
    pub async fn await_clip(&self, job: &PendingOperation, policy: &PollPolicy) -> Result<PendingOperation> {
        let (done, polls) = poll_until(policy, "transcode", || self.clip_status(&job.id), |j| j.stage.is_terminal()).await?;
        self.log(
            format!("clip {} {} after {polls} polls", done.id, done.stage),
            serde_json::json!({ "job": done }),
        )?;
        Ok(done)
    }

    pub async fn cancel_clip(&self, id: &str) -> Result<()> {
        self.run_command(&format!("transcode/cancel?id={id}")).await.map(drop)
    }
}
