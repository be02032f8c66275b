//! Session manager for WiFi-connected GoPro cameras.
//!
//! A [`Session`] identifies the camera's command dialect, dispatches
//! settings and commands through it, polls status until operations finish,
//! reads the media catalog and downloads media with bounded concurrency.

pub mod catalog;
pub mod clip;
pub mod config;
pub mod constants;
pub mod control;
pub mod dialect;
pub mod dispatch;
pub mod download;
pub mod error;
pub mod events;
pub mod poll;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use catalog::{MediaRecord, MetadataKind};
pub use clip::{ClipRequest, PendingOperation, TranscodeStage};
pub use config::SessionConfig;
pub use control::{DeleteTarget, DeviceStatus};
pub use dialect::{CapabilityDescriptor, Dialect};
pub use download::MediaFilter;
pub use error::{GoProError, Result};
pub use events::LogEvent;
pub use poll::{PollPolicy, RetryPolicy};
pub use session::{ConnectMode, Session};
pub use transport::{HttpTransport, Transport};
