//! Camera session.
//!
//! A `Session` owns everything one connection needs: the address, the
//! HTTP transport (and its connection pool), the write-once capability
//! descriptor, the event handlers and the download slots.  Every operation
//! takes `&self`, so independent operations can be joined concurrently.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use serde_json::json;
use tokio::sync::{OnceCell, Semaphore};

use crate::config::SessionConfig;
use crate::constants::legacy;
use crate::dialect::{CapabilityDescriptor, Dialect};
use crate::dispatch::Endpoints;
use crate::error::{GoProError, Result};
use crate::events::{Event, EventNotifier, LogEvent};
use crate::transport::{HttpTransport, Transport};

/// Pause after the legacy power-on before the camera answers.
const LEGACY_WAKE_DELAY: Duration = Duration::from_secs(2);

/// How `connect` establishes the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectMode {
    /// Probe `/gp/gpControl` and classify the firmware.
    #[default]
    Detect,
    /// Skip detection and pin the legacy `/camera/` dialect.
    Legacy,
    /// Send a wake-on-LAN packet, then detect.
    WakeAndDetect,
}

pub struct Session {
    config:         SessionConfig,
    endpoints:      Endpoints,
    transport:      Arc<dyn Transport>,
    camera:         OnceCell<CapabilityDescriptor>,
    events:         EventNotifier,
    download_slots: Semaphore,
}

impl Session {
    /// Session over the reqwest transport.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new()?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: SessionConfig, transport: Arc<dyn Transport>) -> Self {
        let endpoints = Endpoints::new(config.ip_addr.clone());
        let download_slots = Semaphore::new(config.download_concurrency.max(1));
        Self {
            config,
            endpoints,
            transport,
            camera: OnceCell::new(),
            events: EventNotifier::default(),
            download_slots,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn download_slots(&self) -> &Semaphore {
        &self.download_slots
    }

    pub fn on_connect<F>(&mut self, handler: F)
    where
        F: Fn(&CapabilityDescriptor) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.on_connect(handler);
    }

    pub fn on_log<F>(&mut self, handler: F)
    where
        F: Fn(&LogEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.on_log(handler);
    }

    pub(crate) fn log(&self, message: impl Into<String>, context: serde_json::Value) -> Result<()> {
        self.events.log(message, context)
    }

    /// Dialect, if already resolved.
    pub fn dialect(&self) -> Option<Dialect> {
        self.camera.get().map(|c| c.dialect)
    }

    /// The capability descriptor, resolving it on first use.  Concurrent
    /// first callers share one resolution.
    pub async fn camera(&self) -> Result<&CapabilityDescriptor> {
        self.camera.get_or_try_init(|| self.resolve()).await
    }

    /// Establish the dialect and emit the connect event.
    pub async fn connect(&self, mode: ConnectMode) -> Result<&CapabilityDescriptor> {
        self.log(format!("#connect - {mode:?}"), json!({ "ip": self.config.ip_addr }))?;

        let camera = match mode {
            ConnectMode::Detect => self.camera().await?,
            ConnectMode::WakeAndDetect => {
                self.power_on().await?;
                self.camera().await?
            }
            ConnectMode::Legacy => {
                self.camera
                    .get_or_try_init(|| async {
                        self.send_bacpac(legacy::POWER, "01").await?;
                        tokio::time::sleep(LEGACY_WAKE_DELAY).await;
                        let model = self.legacy_info("camera/cv").await.unwrap_or_default();
                        Ok::<_, GoProError>(CapabilityDescriptor::legacy(model))
                    })
                    .await?
            }
        };

        info!("connected to {} ({camera})", self.config.ip_addr);
        self.events.notify(Event::Connect(camera))?;
        Ok(camera)
    }

    /// End the session.  The transport and its connection pool are dropped.
    pub fn close(self) {
        info!("closing session to {}", self.config.ip_addr);
    }
}
