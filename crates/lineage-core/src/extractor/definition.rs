use std::fmt::Debug;

use crate::errors::ExtractorError;
use crate::model::{StepMetadata, TaskDescriptor, TaskInstanceDescriptor, WorkflowDescriptor};

/// Resultado crudo de un hook de extracción.
///
/// Los extractores pueden devolver un único step o una lista (compatibilidad
/// con extractores que reportan varios); el `MetadataResolver` normaliza a
/// un único `StepMetadata`.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Step(StepMetadata),
    Steps(Vec<StepMetadata>),
}

impl Extracted {
    /// Vacío = lista sin elementos. Un step único nunca está vacío.
    pub fn is_empty(&self) -> bool {
        matches!(self, Extracted::Steps(steps) if steps.is_empty())
    }
}

impl From<StepMetadata> for Extracted {
    fn from(step: StepMetadata) -> Self {
        Extracted::Step(step)
    }
}

impl From<Vec<StepMetadata>> for Extracted {
    fn from(steps: Vec<StepMetadata>) -> Self {
        Extracted::Steps(steps)
    }
}

/// Capacidad de un extractor ligado a una task concreta.
///
/// Una instancia se construye por task y el resolver la reutiliza mientras
/// viva. `Ok(None)` significa "nada que reportar en este punto".
pub trait Extractor: Send + Sync + Debug {
    /// Nombre usado en diagnósticos.
    fn name(&self) -> &str;

    /// Extracción previa a la ejecución (sólo estado declarado de la task).
    fn extract(&self) -> Result<Option<Extracted>, ExtractorError>;

    /// Extracción tras completar la task, con artefactos de la instancia.
    /// Por defecto no aporta nada y el resolver cae a `extract`.
    fn extract_on_complete(&self, _task_instance: &TaskInstanceDescriptor) -> Result<Option<Extracted>, ExtractorError> {
        Ok(None)
    }
}

/// Contrato estático de un extractor concreto: cómo se referencia, qué tipos
/// de task soporta y cómo se liga a una task.
pub trait ExtractorSpec: Extractor + Sized + 'static {
    /// Referencia totalmente calificada (la que usan los overrides de entorno).
    const REFERENCE: &'static str;

    fn operator_classnames() -> &'static [&'static str];

    fn bind(task: &TaskDescriptor, workflow: &WorkflowDescriptor) -> Self;
}
