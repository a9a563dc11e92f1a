//! `StepMetadata`: hechos de linaje normalizados de una ejecución de task.
//!
//! Es el contrato entre los extractores y el `RunAdapter`:
//! - `name` siempre está poblado con la forma canónica `"<workflow_id>.<task_id>"`.
//! - `inputs`/`outputs` conservan el orden en que el extractor los reporta.
//! - Los facets son JSON libre; el core no los valida contra ningún esquema.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mapa nombre de facet -> payload. Claves únicas; el orden no es semántico.
pub type Facets = BTreeMap<String, Value>;

/// Referencia a un dataset. El core sólo interpreta `namespace` + `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: Facets,
}

impl Dataset {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(),
               name: name.into(),
               facets: Facets::new() }
    }

    /// Agrega (o reemplaza) un facet del dataset.
    pub fn with_facet(mut self, key: impl Into<String>, value: Value) -> Self {
        self.facets.insert(key.into(), value);
        self
    }
}

/// Descripción normalizada de lo que una task leyó y escribió.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMetadata {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Dataset>,
    #[serde(default)]
    pub outputs: Vec<Dataset>,
    #[serde(default)]
    pub run_facets: Facets,
    #[serde(default)]
    pub job_facets: Facets,
}

impl StepMetadata {
    /// Registro "corrió, no tocó datos": sólo nombre, sin datasets ni facets.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               inputs: Vec::new(),
               outputs: Vec::new(),
               run_facets: Facets::new(),
               job_facets: Facets::new() }
    }

    pub fn with_inputs(mut self, inputs: Vec<Dataset>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Dataset>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_run_facet(mut self, key: impl Into<String>, value: Value) -> Self {
        self.run_facets.insert(key.into(), value);
        self
    }

    pub fn with_job_facet(mut self, key: impl Into<String>, value: Value) -> Self {
        self.job_facets.insert(key.into(), value);
        self
    }

    /// true si no reporta datasets (puede tener facets igualmente).
    pub fn is_dataless(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}

/// Nombre canónico del job para una task dentro de un workflow.
pub fn job_name(workflow_id: &str, task_id: &str) -> String {
    format!("{workflow_id}.{task_id}")
}
