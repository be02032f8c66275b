//! Connect / log callbacks.
//!
//! One handler slot per event kind.  Registering again replaces the previous
//! handler.  Handlers run synchronously in the caller's task and an error
//! returned by a handler aborts the operation that raised the event.

use std::fmt;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::dialect::CapabilityDescriptor;
use crate::error::Result;

/// A diagnostic message with structured context.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub message: String,
    pub context: Value,
}

#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    Connect(&'a CapabilityDescriptor),
    Log(&'a LogEvent),
}

pub type ConnectHandler = Box<dyn Fn(&CapabilityDescriptor) -> anyhow::Result<()> + Send + Sync>;
pub type LogHandler     = Box<dyn Fn(&LogEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
pub struct EventNotifier {
    connect: Option<ConnectHandler>,
    log:     Option<LogHandler>,
}

impl EventNotifier {
    pub fn on_connect<F>(&mut self, handler: F)
    where
        F: Fn(&CapabilityDescriptor) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.connect = Some(Box::new(handler));
    }

    pub fn on_log<F>(&mut self, handler: F)
    where
        F: Fn(&LogEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.log = Some(Box::new(handler));
    }

    /// Invoke the handler registered for `event`, if any.
    pub fn notify(&self, event: Event<'_>) -> Result<()> {
        match event {
            Event::Connect(camera) => {
                if let Some(handler) = &self.connect {
                    handler(camera)?;
                }
            }
            Event::Log(entry) => {
                if let Some(handler) = &self.log {
                    handler(entry)?;
                }
            }
        }
        Ok(())
    }

    /// Build and dispatch a log event.  Also mirrored to the `log` facade.
    pub fn log(&self, message: impl Into<String>, context: Value) -> Result<()> {
        let entry = LogEvent { message: message.into(), context };
        debug!("{}", entry.message);
        self.notify(Event::Log(&entry))
    }
}

impl fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNotifier")
            .field("connect", &self.connect.is_some())
            .field("log", &self.log.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::GoProError;

    #[test]
    fn no_handler_is_a_noop() {
        let events = EventNotifier::default();
        events.log("nothing listens", Value::Null).unwrap();
    }

    #[test]
    fn second_registration_replaces_first() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut events = EventNotifier::default();

        let f = Arc::clone(&first);
        events.on_log(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let s = Arc::clone(&second);
        events.on_log(move |e| {
            assert_eq!(e.context["param"], "2");
            s.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        events.log("set", json!({ "param": "2" })).unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_error_propagates_to_caller() {
        let mut events = EventNotifier::default();
        events.on_log(|_| Err(anyhow::anyhow!("handler refused")));
        let err = events.log("boom", Value::Null).unwrap_err();
        assert!(matches!(err, GoProError::Handler(_)));
        assert!(err.to_string().contains("handler refused"));
    }
}
