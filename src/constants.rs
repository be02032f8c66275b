//! Camera parameter ids and status codes the session logic relies on.
//!
//! The full setting catalog is consumed as opaque strings; only the codes
//! referenced by the session itself are named here.

pub const SHUTTER_START: &str = "1";
pub const SHUTTER_STOP:  &str = "0";

/// Top-level sections of the `/gp/gpControl/status` payload.
pub mod section {
    pub const STATUS:   &str = "status";
    pub const SETTINGS: &str = "settings";
}

/// Keys of the `info` object returned by `/gp/gpControl`.
pub mod info {
    pub const MODEL_NAME:       &str = "model_name";
    pub const FIRMWARE_VERSION: &str = "firmware_version";
    pub const AP_SSID:          &str = "ap_ssid";
}

/// Status codes (`status` section).
pub mod status {
    pub const IS_BUSY:      &str = "8";
    pub const IS_CONNECTED: &str = "31";

    /// Code → name table used to remap a raw status payload.
    pub const NAMES: &[(&str, &str)] = &[
        ("1",  "Battery"),
        ("2",  "BatteryLevel"),
        ("3",  "IsBatteryBacPac"),
        ("4",  "BatteryBacPacLevel"),
        ("8",  "IsBusy"),
        ("9",  "QuikCapture"),
        ("13", "RecordElapsed"),
        ("30", "CamName"),
        ("31", "IsConnected"),
        ("33", "SdCardInserted"),
        ("34", "RemPhotos"),
        ("35", "RemVideoTime"),
        ("36", "BatchPhotosTaken"),
        ("38", "PhotosTaken"),
        ("39", "VideosTaken"),
        ("43", "Mode"),
        ("44", "SubMode"),
        ("54", "RemainingSpace"),
        ("58", "TotalHiLights"),
        ("59", "LastHiLight"),
        ("64", "RemainingTimelapseTime"),
        ("68", "GPS"),
        ("70", "BattPercent"),
        ("75", "DigitalZoom"),
        ("82", "SystemReady"),
        ("86", "Orientation"),
    ];
}

/// Setting ids (`settings` section, and `setting/<id>/<value>`).
pub mod setting {
    pub const RESOLUTION:     &str = "2";
    pub const FRAME_RATE:     &str = "3";
    pub const PROTUNE_VIDEO:  &str = "10";
    pub const STREAM_BITRATE: &str = "62";
    pub const STREAM_WINDOW:  &str = "64";
}

pub mod mode {
    pub const VIDEO: &str = "0";
    pub const PHOTO: &str = "1";

    /// Single photo sub-mode on HERO5 Black / HERO6.
    pub const SUB_SINGLE_H5: &str = "1";
}

/// Two-letter codes of the legacy `/camera/` and `/bacpac/` endpoints.
pub mod legacy {
    pub const SHUTTER:          &str = "SH";
    pub const MODE:             &str = "CM";
    pub const DELETE_LAST:      &str = "DL";
    pub const DELETE_ALL:       &str = "DA";
    pub const LOCATE:           &str = "LL";
    pub const POWER:            &str = "PW";
    pub const TIME:             &str = "TM";
    pub const PREVIEW:          &str = "PV";
    pub const VIDEO_RESOLUTION: &str = "VV";
    pub const FRAME_RATE:       &str = "FS";
}
