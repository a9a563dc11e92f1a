//! Ensamblado del hook a partir de `LineageConfig`.
use std::sync::Arc;

use lineage_core::{ConsoleTransport, InMemoryTransport, LineageBackendHook, LogDiagnostics, RunEvent, Transport,
                   TransportError};
use lineage_extractors::default_registry;
use log::info;

use crate::config::{LineageConfig, TransportKind};
use crate::errors::ConfigError;

/// Transporte elegido en configuración.
#[derive(Debug, Clone)]
pub enum BackendTransport {
    Console(ConsoleTransport),
    Memory(InMemoryTransport),
}

impl BackendTransport {
    pub fn from_kind(kind: TransportKind) -> Self {
        match kind {
            TransportKind::Console => Self::Console(ConsoleTransport),
            TransportKind::Memory => Self::Memory(InMemoryTransport::new()),
        }
    }

    /// Eventos retenidos (sólo el transporte en memoria los guarda).
    pub fn retained(&self) -> Vec<RunEvent> {
        match self {
            Self::Console(_) => Vec::new(),
            Self::Memory(m) => m.events(),
        }
    }
}

impl Transport for BackendTransport {
    fn send(&self, event: &RunEvent) -> Result<(), TransportError> {
        match self {
            Self::Console(t) => t.send(event),
            Self::Memory(t) => t.send(event),
        }
    }
}

/// Registry por defecto + overrides, diagnósticos vía `log` y el transporte
/// configurado. Un override que no resuelve es error de arranque.
pub fn build_backend(config: &LineageConfig) -> Result<LineageBackendHook<BackendTransport>, ConfigError> {
    let registry = default_registry(&config.overrides)?;
    info!("backend:build namespace={} transport={:?} task_types={}",
          config.namespace,
          config.transport,
          registry.len());
    Ok(LineageBackendHook::builder(registry, BackendTransport::from_kind(config.transport)).namespace(config.namespace.clone())
                                                                                          .producer(config.producer.clone())
                                                                                          .diagnostics(Arc::new(LogDiagnostics))
                                                                                          .build())
}
