//! Eventos de run y trait Transport.

mod transport;
mod types;

pub use transport::{ConsoleTransport, InMemoryTransport, Transport};
pub use types::{EventType, JobInfo, RunEvent, RunInfo, PARENT_RUN_FACET};
