//! Lectura de propiedades de operadores y artefactos de finalización.
use lineage_core::{ExtractorError, TaskDescriptor};
use serde_json::Value;

/// Sentencias del operador: `sql` como string o lista de strings.
pub fn sql_statements(task: &TaskDescriptor) -> Result<Vec<String>, ExtractorError> {
    match task.properties.get("sql") {
        None | Some(Value::Null) => Err(ExtractorError::MissingProperty("sql".into())),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items.iter()
                                          .map(|v| {
                                              v.as_str().map(str::to_string).ok_or_else(|| invalid("sql", "list must contain only strings"))
                                          })
                                          .collect(),
        Some(_) => Err(invalid("sql", "expected a string or a list of strings")),
    }
}

/// Campo string de `properties.connection.<key>`.
pub fn connection_str<'a>(task: &'a TaskDescriptor, key: &str) -> Option<&'a str> {
    task.properties.get("connection").and_then(|c| c.get(key)).and_then(Value::as_str)
}

/// Puerto de la conexión; acepta número o string.
pub fn connection_port(task: &TaskDescriptor) -> Option<u16> {
    match task.properties.get("connection").and_then(|c| c.get("port"))? {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn invalid(key: &str, reason: &str) -> ExtractorError {
    ExtractorError::InvalidProperty { key: key.to_string(),
                                      reason: reason.to_string() }
}

pub fn invalid_artifact(key: &str, reason: impl Into<String>) -> ExtractorError {
    ExtractorError::InvalidArtifact { key: key.to_string(),
                                      reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sql_accepts_string_or_list() {
        let t = TaskDescriptor::new("t", "X").with_properties(json!({"sql": "SELECT 1"}));
        assert_eq!(sql_statements(&t).unwrap(), vec!["SELECT 1".to_string()]);
        let t = TaskDescriptor::new("t", "X").with_properties(json!({"sql": ["SELECT 1", "SELECT 2"]}));
        assert_eq!(sql_statements(&t).unwrap().len(), 2);
    }

    #[test]
    fn sql_missing_or_malformed_is_an_error() {
        let t = TaskDescriptor::new("t", "X");
        assert_eq!(sql_statements(&t).unwrap_err(), ExtractorError::MissingProperty("sql".into()));
        let t = TaskDescriptor::new("t", "X").with_properties(json!({"sql": 42}));
        assert!(matches!(sql_statements(&t).unwrap_err(), ExtractorError::InvalidProperty { .. }));
    }

    #[test]
    fn port_accepts_number_or_string() {
        let t = TaskDescriptor::new("t", "X").with_properties(json!({"connection": {"port": "6543"}}));
        assert_eq!(connection_port(&t), Some(6543));
        let t = TaskDescriptor::new("t", "X").with_properties(json!({"connection": {"port": 5432}}));
        assert_eq!(connection_port(&t), Some(5432));
        let t = TaskDescriptor::new("t", "X").with_properties(json!({"connection": {"port": 99999}}));
        assert_eq!(connection_port(&t), None);
    }
}
