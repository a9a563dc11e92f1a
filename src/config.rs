//! Configuración del backend de linaje.
//! Carga variables de entorno (.env) una vez y expone `LineageConfig`.
//!
//! Variables:
//! - `OPENLINEAGE_NAMESPACE` (por defecto `default`)
//! - `OPENLINEAGE_PRODUCER`
//! - `OPENLINEAGE_TRANSPORT`: `console` | `memory` (por defecto `console`)
//! - `OPENLINEAGE_EXTRACTOR_<TaskType>=<referencia>`: overrides de extractor
use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use lineage_core::hook::{DEFAULT_NAMESPACE, DEFAULT_PRODUCER};
use lineage_core::{overrides_from_vars, ExtractorOverride};
use once_cell::sync::Lazy;

use crate::errors::ConfigError;

pub const NAMESPACE_VAR: &str = "OPENLINEAGE_NAMESPACE";
pub const PRODUCER_VAR: &str = "OPENLINEAGE_PRODUCER";
pub const TRANSPORT_VAR: &str = "OPENLINEAGE_TRANSPORT";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Destino de los eventos emitidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    #[default]
    Console,
    Memory,
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownTransport(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineageConfig {
    pub namespace: String,
    pub producer: String,
    pub transport: TransportKind,
    /// Ordenados por tipo de task.
    pub overrides: Vec<ExtractorOverride>,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self { namespace: DEFAULT_NAMESPACE.to_string(),
               producer: DEFAULT_PRODUCER.to_string(),
               transport: TransportKind::default(),
               overrides: Vec::new() }
    }
}

impl LineageConfig {
    /// Lee la configuración del entorno del proceso (incluido `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        init_dotenv();
        Self::from_vars(env::vars())
    }

    /// Igual que `from_env` pero sobre pares explícitos.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
        where I: IntoIterator<Item = (K, V)>,
              K: AsRef<str>,
              V: AsRef<str>
    {
        let vars: Vec<(String, String)> = vars.into_iter()
                                              .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                                              .collect();
        let lookup = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match vars.iter().find(|(k, _)| k == name) {
                None => Ok(None),
                Some((_, v)) if v.trim().is_empty() => Err(ConfigError::EmptyValue(name)),
                Some((_, v)) => Ok(Some(v.trim().to_string())),
            }
        };

        let mut config = Self::default();
        if let Some(namespace) = lookup(NAMESPACE_VAR)? {
            config.namespace = namespace;
        }
        if let Some(producer) = lookup(PRODUCER_VAR)? {
            config.producer = producer;
        }
        if let Some(transport) = lookup(TRANSPORT_VAR)? {
            config.transport = transport.parse()?;
        }
        config.overrides = overrides_from_vars(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
        Ok(config)
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = LineageConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, LineageConfig::default());
        assert_eq!(config.namespace, "default");
        assert_eq!(config.transport, TransportKind::Console);
    }

    #[test]
    fn transport_parsing_is_case_insensitive() {
        assert_eq!("Memory".parse::<TransportKind>().unwrap(), TransportKind::Memory);
        assert!(matches!("kafka".parse::<TransportKind>(), Err(ConfigError::UnknownTransport(t)) if t == "kafka"));
    }

    #[test]
    fn blank_namespace_is_rejected() {
        let err = LineageConfig::from_vars([(NAMESPACE_VAR, "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(NAMESPACE_VAR)));
    }
}
