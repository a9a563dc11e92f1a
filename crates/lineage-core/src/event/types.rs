//! Eventos de ciclo de vida que se envían al colector de linaje.
//!
//! Rol en el flujo:
//! - Por cada task se emite un par RUNNING -> COMPLETE con el mismo `run_id`.
//! - El colector puede mostrar runs en curso tras el primero y calcular la
//!   duración con la diferencia de `event_time` entre ambos.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Dataset, Facets};

/// Facet de run donde viaja la referencia al run padre.
pub const PARENT_RUN_FACET: &str = "parent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Running,
    Complete,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Running => "RUNNING",
            EventType::Complete => "COMPLETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub run_id: String,
    #[serde(default)]
    pub facets: Facets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub facets: Facets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    pub event_type: EventType,
    pub event_time: DateTime<Utc>,
    pub run: RunInfo,
    pub job: JobInfo,
    #[serde(default)]
    pub inputs: Vec<Dataset>,
    #[serde(default)]
    pub outputs: Vec<Dataset>,
    pub producer: String,
}

impl RunEvent {
    /// Run id del padre, si el evento lleva el facet `parent`.
    pub fn parent_run_id(&self) -> Option<&str> {
        self.run
            .facets
            .get(PARENT_RUN_FACET)
            .and_then(|f| f.pointer("/run/runId"))
            .and_then(|v| v.as_str())
    }
}
