use lineage_core::RegistryError;
use thiserror::Error;

/// Errores al construir el backend desde configuración. Son fatales: se
/// reportan al arrancar, nunca durante el procesamiento de eventos.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Transporte desconocido: {0} (esperado console | memory)")]
    UnknownTransport(String),
    #[error("Valor vacío para {0}")]
    EmptyValue(&'static str),
    #[error("Registry inválido: {0}")]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_transport_format() {
        let err = ConfigError::UnknownTransport("kafka".into());
        assert_eq!(err.to_string(), "Transporte desconocido: kafka (esperado console | memory)");
    }

    #[test]
    fn test_registry_variant_from() {
        let err: ConfigError = RegistryError::MalformedOverride { key: "OPENLINEAGE_EXTRACTOR_".into() }.into();
        assert_eq!(err.to_string(),
                   "Registry inválido: malformed extractor override OPENLINEAGE_EXTRACTOR_: empty task type");
    }
}
