//! Errores del core de linaje.

use thiserror::Error;

/// Fallo de un extractor al interpretar el estado de su task.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ExtractorError {
    #[error("missing task property: {0}")] MissingProperty(String),
    #[error("invalid task property {key}: {reason}")] InvalidProperty { key: String, reason: String },
    #[error("invalid completion artifact {key}: {reason}")] InvalidArtifact { key: String, reason: String },
    #[error("extractor panicked: {0}")] Panicked(String),
    #[error("internal: {0}")] Internal(String),
}

/// Configuración inválida del registry (fatal en construcción).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RegistryError {
    #[error("malformed extractor override {key}: empty task type")]
    MalformedOverride { key: String },
    #[error("extractor override for {task_type} references unknown extractor {reference}")]
    UnresolvedReference { task_type: String, reference: String },
}

/// Error del transporte hacia el colector.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("event serialization failed: {0}")] Serialization(#[from] serde_json::Error),
    #[error("transport io: {0}")] Io(#[from] std::io::Error),
    #[error("collector rejected event: {0}")] Rejected(String),
}

/// Error al emitir un evento de ciclo de vida.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to send {event_type} event for run {run_id}: {source}")]
    Send {
        event_type: &'static str,
        run_id: String,
        #[source]
        source: TransportError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_names_task_type_and_reference() {
        let e = RegistryError::UnresolvedReference { task_type: "PostgresOperator".into(),
                                                     reference: "custom::Missing".into() };
        assert_eq!(e.to_string(),
                   "extractor override for PostgresOperator references unknown extractor custom::Missing");
    }

    #[test]
    fn adapter_error_keeps_transport_cause() {
        let e = AdapterError::Send { event_type: "RUNNING",
                                     run_id: "r1".into(),
                                     source: TransportError::Rejected("503".into()) };
        assert_eq!(e.to_string(), "failed to send RUNNING event for run r1: collector rejected event: 503");
        assert!(std::error::Error::source(&e).is_some());
    }
}
