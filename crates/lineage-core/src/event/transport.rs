use std::sync::{Arc, Mutex};

use log::debug;

use super::RunEvent;
use crate::errors::TransportError;

/// Envío de eventos al colector. La red (y su timeout) es asunto de cada
/// implementación; el core sólo llama `send` de forma bloqueante.
pub trait Transport: Send + Sync {
    fn send(&self, event: &RunEvent) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, event: &RunEvent) -> Result<(), TransportError> {
        (**self).send(event)
    }
}

/// Buffer en memoria (orden de envío). Clonar comparte el buffer, así un test
/// conserva un handle mientras el hook es dueño del otro.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTransport {
    inner: Arc<Mutex<Vec<RunEvent>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn events_for(&self, run_id: &str) -> Vec<RunEvent> {
        self.events().into_iter().filter(|e| e.run.run_id == run_id).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut v) = self.inner.lock() {
            v.clear();
        }
    }
}

impl Transport for InMemoryTransport {
    fn send(&self, event: &RunEvent) -> Result<(), TransportError> {
        let mut v = self.inner
                        .lock()
                        .map_err(|_| TransportError::Rejected("in-memory buffer poisoned".into()))?;
        v.push(event.clone());
        Ok(())
    }
}

/// Una línea JSON por evento en stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTransport;

impl Transport for ConsoleTransport {
    fn send(&self, event: &RunEvent) -> Result<(), TransportError> {
        let line = serde_json::to_string(event)?;
        debug!("console:send type={} run_id={} job={}",
               event.event_type.as_str(),
               event.run.run_id,
               event.job.name);
        println!("{line}");
        Ok(())
    }
}
