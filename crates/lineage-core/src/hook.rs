//! `LineageBackendHook`: único punto de entrada que invoca el orquestador al
//! completar cada task.
//!
//! Por cada callback: run id nuevo, nombre canónico del job, resolución de
//! metadata (con fallback sólo-nombre) y el par RUNNING -> COMPLETE. El par se
//! emite aunque no haya extractor: que la task corrió ya es un hecho de
//! linaje. Si el transporte no acepta el RUNNING no se envía el COMPLETE, así
//! el backend nunca ve un cierre de un run que no empezó. Nada de lo que falle
//! aquí dentro llega al host.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::adapter::{resolve_code_location, CompleteTask, RunAdapter, StartTask};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLevel, Diagnostics, LogDiagnostics};
use crate::errors::AdapterError;
use crate::event::{EventType, Transport};
use crate::extractor::ExtractorVariant;
use crate::model::{Facets, TaskEvent, TaskInfo};
use crate::registry::ExtractorRegistry;
use crate::resolver::MetadataResolver;

/// Namespace por defecto de los jobs.
pub const DEFAULT_NAMESPACE: &str = "default";
/// Identificador del productor de eventos.
pub const DEFAULT_PRODUCER: &str = "https://github.com/flowlineage/flowlineage";
/// Facet de run con los argumentos del run del workflow.
pub const RUN_ARGS_FACET: &str = "runArgs";

/// Resumen de lo emitido para una task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub run_id: Uuid,
    pub job_name: String,
    /// Eventos aceptados por el transporte (0..=2).
    pub events_sent: u8,
}

pub struct LineageBackendHook<T: Transport> {
    resolver: MetadataResolver,
    adapter: RunAdapter<T>,
    diagnostics: Arc<dyn Diagnostics>,
}

/// Builder del hook; namespace, productor y diagnósticos tienen defaults.
pub struct LineageBackendHookBuilder<T: Transport> {
    registry: ExtractorRegistry,
    transport: T,
    namespace: String,
    producer: String,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<T: Transport> LineageBackendHookBuilder<T> {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn build(self) -> LineageBackendHook<T> {
        LineageBackendHook { resolver: MetadataResolver::new(Arc::new(self.registry), self.diagnostics.clone()),
                             adapter: RunAdapter::new(self.transport, self.namespace, self.producer),
                             diagnostics: self.diagnostics }
    }
}

impl<T: Transport> LineageBackendHook<T> {
    pub fn builder(registry: ExtractorRegistry, transport: T) -> LineageBackendHookBuilder<T> {
        LineageBackendHookBuilder { registry,
                                    transport,
                                    namespace: DEFAULT_NAMESPACE.to_string(),
                                    producer: DEFAULT_PRODUCER.to_string(),
                                    diagnostics: Arc::new(LogDiagnostics) }
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut MetadataResolver {
        &mut self.resolver
    }

    pub fn adapter(&self) -> &RunAdapter<T> {
        &self.adapter
    }

    /// Patcher para un tipo de task (lo usa el host al construir el DAG).
    pub fn patcher_for(&self, task_type: &str) -> Option<&ExtractorVariant> {
        self.resolver.registry().resolve_patcher(task_type)
    }

    /// Procesa la finalización de una task. Nunca falla.
    pub fn on_task_event(&mut self, event: &TaskEvent) -> HookOutcome {
        let run_id = Uuid::new_v4();
        let run_id_str = run_id.to_string();
        let job_name = event.job_name();
        let info = event.task_info();

        if event.run.is_none() {
            self.emit(DiagnosticLevel::Warning, DiagnosticKind::MissingRunContext, &info);
        }

        let step = self.resolver.resolve_step_or_default(&event.task,
                                                         &event.workflow,
                                                         event.run.as_ref(),
                                                         event.task_instance.as_ref());

        let now = Utc::now();
        let ti = event.task_instance.as_ref();
        let event_time = ti.and_then(|t| t.start_date).unwrap_or(now);
        // COMPLETE nunca antes que RUNNING, aunque el host reporte relojes raros.
        let end_time = ti.and_then(|t| t.end_date).unwrap_or(now).max(event_time);

        let nominal_start_time = event.run.as_ref().map(|r| r.execution_date);
        let nominal_end_time = nominal_start_time.and_then(|ts| event.workflow.schedule.following(ts));
        let code_location = resolve_code_location(&event.task, &event.workflow);

        let mut run_facets = Facets::new();
        if let Some(run) = &event.run {
            run_facets.insert(RUN_ARGS_FACET.to_string(), json!({ "externalTrigger": run.external_trigger }));
        }

        let start = StartTask { run_id: &run_id_str,
                                job_name: &job_name,
                                job_description: event.workflow.description.as_deref(),
                                event_time,
                                parent_run_id: event.run.as_ref().map(|r| r.run_id.as_str()),
                                parent_job_name: Some(event.workflow.workflow_id.as_str()),
                                code_location: code_location.as_deref(),
                                nominal_start_time,
                                nominal_end_time,
                                step: &step,
                                run_facets };
        let complete = CompleteTask { run_id: &run_id_str,
                                      job_name: &job_name,
                                      end_time,
                                      step: &step };

        let mut events_sent = 0;
        if self.guarded_send(EventType::Running, &info, || self.adapter.start_task(start)) {
            events_sent += 1;
            if self.guarded_send(EventType::Complete, &info, || self.adapter.complete_task(complete)) {
                events_sent += 1;
            }
        }

        HookOutcome { run_id,
                      job_name,
                      events_sent }
    }

    /// Ejecuta un envío absorbiendo errores y panics del transporte.
    fn guarded_send<F, R>(&self, event_type: EventType, info: &TaskInfo, send: F) -> bool
        where F: FnOnce() -> Result<R, AdapterError>
    {
        let cause = match catch_unwind(AssertUnwindSafe(send)) {
            Ok(Ok(_)) => return true,
            Ok(Err(e)) => e.to_string(),
            Err(_) => "transport panicked".to_string(),
        };
        self.emit(DiagnosticLevel::Error,
                  DiagnosticKind::TransportFailed { event_type: event_type.as_str().to_string(),
                                                    cause },
                  info);
        false
    }

    fn emit(&self, level: DiagnosticLevel, kind: DiagnosticKind, info: &TaskInfo) {
        self.diagnostics.emit(Diagnostic::new(level, kind, info.clone()));
    }
}
