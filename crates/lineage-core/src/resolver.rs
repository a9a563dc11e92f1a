//! `MetadataResolver`: encontrar extractor -> invocar -> normalizar ->
//! absorber fallos, para una única task.
//!
//! Invariantes:
//! - Un tipo de task sin extractor no es error: diagnóstico warning y `None`.
//! - Un fallo del extractor (Err o panic) nunca se propaga: diagnóstico error
//!   y `None`.
//! - Varios steps devueltos: gana el primero (orden del extractor) y se avisa
//!   qué se descartó. Nunca se mezclan.
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLevel, Diagnostics};
use crate::errors::ExtractorError;
use crate::extractor::{Extracted, Extractor};
use crate::model::{job_name, StepMetadata, TaskDescriptor, TaskInfo, TaskInstanceDescriptor, WorkflowDescriptor,
                   WorkflowRunDescriptor};
use crate::registry::ExtractorRegistry;

/// Clave de cache: la task dentro de su workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub workflow_id: String,
    pub task_id: String,
}

impl TaskKey {
    pub fn new(workflow_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self { workflow_id: workflow_id.into(),
               task_id: task_id.into() }
    }
}

/// Cache de extractores ligados, propiedad del resolver. Vive lo mismo que
/// la instancia de backend que lo contiene.
#[derive(Debug, Default)]
pub struct ExtractorCache {
    entries: HashMap<TaskKey, Arc<dyn Extractor>>,
}

impl ExtractorCache {
    pub fn get(&self, key: &TaskKey) -> Option<Arc<dyn Extractor>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: TaskKey, extractor: Arc<dyn Extractor>) {
        self.entries.insert(key, extractor);
    }

    pub fn evict(&mut self, key: &TaskKey) -> Option<Arc<dyn Extractor>> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct MetadataResolver {
    registry: Arc<ExtractorRegistry>,
    cache: ExtractorCache,
    diagnostics: Arc<dyn Diagnostics>,
}

impl MetadataResolver {
    pub fn new(registry: Arc<ExtractorRegistry>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { registry,
               cache: ExtractorCache::default(),
               diagnostics }
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ExtractorCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ExtractorCache {
        &mut self.cache
    }

    /// Extractor ligado a la task; lo crea y cachea en el primer uso.
    /// `Ok(None)` si el tipo no tiene extractor. Un constructor que hace
    /// panic se reporta como `ExtractorError::Panicked` y no se cachea.
    pub fn extractor_for(&mut self,
                         task: &TaskDescriptor,
                         workflow: &WorkflowDescriptor)
                         -> Result<Option<Arc<dyn Extractor>>, ExtractorError> {
        let key = TaskKey::new(&workflow.workflow_id, &task.task_id);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Some(cached));
        }
        let Some(variant) = self.registry.resolve(&task.task_type) else {
            return Ok(None);
        };
        let extractor = catch_unwind(AssertUnwindSafe(|| variant.instantiate(task, workflow))).map_err(|panic| {
                            ExtractorError::Panicked(format!("constructor of {}: {}",
                                                             variant.reference(),
                                                             panic_message(panic.as_ref())))
                        })?;
        self.cache.insert(key, extractor.clone());
        Ok(Some(extractor))
    }

    /// Metadata de la task, o `None` si no hay extractor o éste falló.
    pub fn resolve_step(&mut self,
                        task: &TaskDescriptor,
                        workflow: &WorkflowDescriptor,
                        run: Option<&WorkflowRunDescriptor>,
                        task_instance: Option<&TaskInstanceDescriptor>)
                        -> Option<StepMetadata> {
        let info = TaskInfo::new(task, workflow, run);
        let extractor = match self.extractor_for(task, workflow) {
            Ok(Some(extractor)) => extractor,
            Ok(None) => {
                self.emit(DiagnosticLevel::Warning, DiagnosticKind::ExtractorNotFound, &info);
                return None;
            }
            Err(failure) => {
                let reference = self.registry
                                    .resolve(&task.task_type)
                                    .map_or_else(|| task.task_type.clone(), |v| v.reference().to_string());
                self.emit(DiagnosticLevel::Error,
                          DiagnosticKind::ExtractionFailed { extractor: reference,
                                                             cause: failure.to_string() },
                          &info);
                return None;
            }
        };
        self.emit(DiagnosticLevel::Debug,
                  DiagnosticKind::ExtractorSelected { extractor: extractor.name().to_string() },
                  &info);

        let name = job_name(&workflow.workflow_id, &task.task_id);
        let outcome = catch_unwind(AssertUnwindSafe(|| {
                          invoke(extractor.as_ref(), task_instance).map(|raw| self.normalize(extractor.as_ref(), raw, &name, &info))
                      }));
        let failure = match outcome {
            Ok(Ok(step)) => return step,
            Ok(Err(e)) => e,
            Err(panic) => ExtractorError::Panicked(panic_message(panic.as_ref())),
        };
        self.emit(DiagnosticLevel::Error,
                  DiagnosticKind::ExtractionFailed { extractor: extractor.name().to_string(),
                                                     cause: failure.to_string() },
                  &info);
        None
    }

    /// Igual que `resolve_step` pero nunca vacío: sin metadata se devuelve el
    /// registro sólo-nombre de la task.
    pub fn resolve_step_or_default(&mut self,
                                   task: &TaskDescriptor,
                                   workflow: &WorkflowDescriptor,
                                   run: Option<&WorkflowRunDescriptor>,
                                   task_instance: Option<&TaskInstanceDescriptor>)
                                   -> StepMetadata {
        self.resolve_step(task, workflow, run, task_instance)
            .unwrap_or_else(|| StepMetadata::named(job_name(&workflow.workflow_id, &task.task_id)))
    }

    fn normalize(&self, extractor: &dyn Extractor, raw: Option<Extracted>, name: &str, info: &TaskInfo) -> Option<StepMetadata> {
        match raw? {
            Extracted::Step(step) => Some(step),
            Extracted::Steps(steps) => {
                let mut steps = steps.into_iter();
                let Some(first) = steps.next() else {
                    return Some(StepMetadata::named(name));
                };
                let dropped: Vec<String> = steps.map(|s| s.name).collect();
                if !dropped.is_empty() {
                    self.emit(DiagnosticLevel::Warning,
                              DiagnosticKind::ExtraStepsDropped { extractor: extractor.name().to_string(),
                                                                  kept: first.name.clone(),
                                                                  dropped },
                              info);
                }
                Some(first)
            }
        }
    }

    fn emit(&self, level: DiagnosticLevel, kind: DiagnosticKind, info: &TaskInfo) {
        self.diagnostics.emit(Diagnostic::new(level, kind, info.clone()));
    }
}

/// Hook de finalización si hay instancia y su resultado no es vacío; si no,
/// el hook previo a la ejecución.
fn invoke(extractor: &dyn Extractor, task_instance: Option<&TaskInstanceDescriptor>) -> Result<Option<Extracted>, ExtractorError> {
    if let Some(ti) = task_instance {
        match extractor.extract_on_complete(ti)? {
            Some(found) if !found.is_empty() => return Ok(Some(found)),
            _ => {}
        }
    }
    extractor.extract()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
