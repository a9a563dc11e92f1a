//! Sumidero de diagnósticos inyectable.
//!
//! Cada componente recibe un `Arc<dyn Diagnostics>` en vez de usar un logger
//! global. En producción se usa `LogDiagnostics` (reenvía al facade `log`);
//! en tests `RecordingDiagnostics` permite afirmar sobre lo emitido.
use std::fmt;
use std::sync::{Arc, Mutex};

use log::{debug, error, warn};

use crate::model::TaskInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Debug,
    Warning,
    Error,
}

/// Qué ocurrió. Cada variante lleva los datos que un test necesita verificar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Se encontró extractor para la task.
    ExtractorSelected { extractor: String },
    /// Tipo de task sin extractor registrado (esperado, no es error).
    ExtractorNotFound,
    /// El extractor falló (Err o panic); el linaje de la task queda vacío.
    ExtractionFailed { extractor: String, cause: String },
    /// El extractor devolvió más de un step; sólo se conserva el primero.
    ExtraStepsDropped { extractor: String, kept: String, dropped: Vec<String> },
    /// El evento de run no pudo enviarse.
    TransportFailed { event_type: String, cause: String },
    /// El callback llegó sin descriptor de run del workflow.
    MissingRunContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub kind: DiagnosticKind,
    pub task: TaskInfo,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, kind: DiagnosticKind, task: TaskInfo) -> Self {
        Self { level, kind, task }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::ExtractorSelected { extractor } => {
                write!(f, "using extractor {extractor} {}", self.task)
            }
            DiagnosticKind::ExtractorNotFound => write!(f, "unable to find an extractor {}", self.task),
            DiagnosticKind::ExtractionFailed { extractor, cause } => {
                write!(f, "failed to extract metadata extractor={extractor} {} cause={cause}", self.task)
            }
            DiagnosticKind::ExtraStepsDropped { extractor, kept, dropped } => {
                write!(f,
                       "extractor {extractor} {} returned {} steps, keeping {kept} and dropping {:?}",
                       self.task,
                       dropped.len() + 1,
                       dropped)
            }
            DiagnosticKind::TransportFailed { event_type, cause } => {
                write!(f, "failed to send {event_type} event {} cause={cause}", self.task)
            }
            DiagnosticKind::MissingRunContext => {
                write!(f, "task event without workflow run context {}", self.task)
            }
        }
    }
}

/// Destino de los diagnósticos de linaje.
pub trait Diagnostics: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Reenvía cada diagnóstico al facade `log` con target `lineage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Debug => debug!(target: "lineage", "{diagnostic}"),
            DiagnosticLevel::Warning => warn!(target: "lineage", "{diagnostic}"),
            DiagnosticLevel::Error => error!(target: "lineage", "{diagnostic}"),
        }
    }
}

/// Acumula diagnósticos en memoria. Clonar comparte el mismo buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnostics {
    inner: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Diagnostic> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Registros con nivel >= `level`.
    pub fn at_least(&self, level: DiagnosticLevel) -> Vec<Diagnostic> {
        self.records().into_iter().filter(|d| d.level >= level).collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut v) = self.inner.lock() {
            v.push(diagnostic);
        }
    }
}
