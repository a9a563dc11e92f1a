//! Modelos neutrales (StepMetadata, Dataset, descriptores del host, Schedule).

pub mod schedule;
pub mod step_metadata;
pub mod task;

pub use schedule::Schedule;
pub use step_metadata::{job_name, Dataset, Facets, StepMetadata};
pub use task::{TaskDescriptor, TaskEvent, TaskInfo, TaskInstanceDescriptor, WorkflowDescriptor, WorkflowRunDescriptor};
