//! lineage-core: motor de extracción y emisión de linaje por task.
//!
//! Flujo: host -> `LineageBackendHook::on_task_event` -> `MetadataResolver`
//! (registry + extractor) -> `StepMetadata` -> `RunAdapter` (RUNNING, luego
//! COMPLETE) -> `Transport`.
pub mod adapter;
pub mod diagnostics;
pub mod errors;
pub mod event;
pub mod extractor;
pub mod hook;
pub mod model;
pub mod registry;
pub mod resolver;

pub use adapter::{CompleteTask, RunAdapter, StartTask};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLevel, Diagnostics, LogDiagnostics, RecordingDiagnostics};
pub use errors::{AdapterError, ExtractorError, RegistryError, TransportError};
pub use event::{ConsoleTransport, EventType, InMemoryTransport, RunEvent, Transport};
pub use extractor::{Extracted, Extractor, ExtractorCatalog, ExtractorSpec, ExtractorVariant};
pub use hook::{HookOutcome, LineageBackendHook, LineageBackendHookBuilder};
pub use model::{job_name, Dataset, Facets, Schedule, StepMetadata, TaskDescriptor, TaskEvent, TaskInstanceDescriptor,
                WorkflowDescriptor, WorkflowRunDescriptor};
pub use registry::{overrides_from_vars, ExtractorOverride, ExtractorRegistry, EXTRACTOR_ENV_PREFIX};
pub use resolver::{ExtractorCache, MetadataResolver, TaskKey};
