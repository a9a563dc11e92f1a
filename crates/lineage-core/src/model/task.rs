//! Descriptores que el orquestador entrega al completar una task.
//!
//! Son el límite de entrada del core: el orquestador (externo) los construye y
//! `LineageBackendHook::on_task_event` los consume sin modificarlos. El estado
//! interno propio de cada tecnología viaja como JSON opaco (`properties`,
//! `artifacts`) y sólo lo interpreta el extractor correspondiente.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schedule::Schedule;
use super::step_metadata::job_name;

/// Task (operador) tal como la declara el workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub task_id: String,
    /// Nombre de la clase/tipo de la task, p.ej. `"PostgresOperator"`.
    pub task_type: String,
    #[serde(default)]
    pub source_file: Option<String>,
    /// Atributos específicos del operador (sql, conn ids, ...).
    #[serde(default)]
    pub properties: Value,
}

impl TaskDescriptor {
    pub fn new(task_id: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self { task_id: task_id.into(),
               task_type: task_type.into(),
               source_file: None,
               properties: Value::Null }
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_source_file(mut self, path: impl Into<String>) -> Self {
        self.source_file = Some(path.into());
        self
    }

    /// Lee una propiedad string del operador (`None` si falta o no es string).
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// Workflow (DAG) que contiene la task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    pub workflow_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_location: Option<String>,
    #[serde(default)]
    pub schedule: Schedule,
}

impl WorkflowDescriptor {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self { workflow_id: workflow_id.into(),
               description: None,
               file_location: None,
               schedule: Schedule::Manual }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_file_location(mut self, path: impl Into<String>) -> Self {
        self.file_location = Some(path.into());
        self
    }
}

/// Ejecución del workflow (dag run) a la que pertenece la task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunDescriptor {
    pub run_id: String,
    pub execution_date: DateTime<Utc>,
    #[serde(default)]
    pub external_trigger: bool,
}

/// Instancia de la task ya ejecutada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaskInstanceDescriptor {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub try_number: u32,
    /// Artefactos de finalización específicos del extractor (job ids, resultados...).
    #[serde(default)]
    pub artifacts: Value,
}

impl TaskInstanceDescriptor {
    pub fn artifact(&self, key: &str) -> Option<&Value> {
        self.artifacts.get(key).filter(|v| !v.is_null())
    }
}

/// Callback completo de finalización de una task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task: TaskDescriptor,
    pub workflow: WorkflowDescriptor,
    #[serde(default)]
    pub run: Option<WorkflowRunDescriptor>,
    #[serde(default)]
    pub task_instance: Option<TaskInstanceDescriptor>,
}

impl TaskEvent {
    pub fn job_name(&self) -> String {
        job_name(&self.workflow.workflow_id, &self.task.task_id)
    }

    pub fn task_info(&self) -> TaskInfo {
        TaskInfo::new(&self.task, &self.workflow, self.run.as_ref())
    }
}

/// Contexto de diagnóstico: qué task, de qué workflow, en qué run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub task_type: String,
    pub workflow_id: String,
    pub task_id: String,
    pub run_id: Option<String>,
}

impl TaskInfo {
    pub fn new(task: &TaskDescriptor, workflow: &WorkflowDescriptor, run: Option<&WorkflowRunDescriptor>) -> Self {
        Self { task_type: task.task_type.clone(),
               workflow_id: workflow.workflow_id.clone(),
               task_id: task.task_id.clone(),
               run_id: run.map(|r| r.run_id.clone()) }
    }
}

impl fmt::Display for TaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,
               "task_type={} workflow_id={} task_id={} run_id={}",
               self.task_type,
               self.workflow_id,
               self.task_id,
               self.run_id.as_deref().unwrap_or("unknown"))
    }
}
