//! BigQueryExtractor.
//!
//! Antes de ejecutar sólo conoce el SQL; las tablas reales salen de las
//! estadísticas del job, que el host publica en el artefacto `bigquery_job`
//! de la task instance al terminar.
use lineage_core::{job_name, Dataset, Extracted, Extractor, ExtractorError, ExtractorSpec, StepMetadata, TaskDescriptor,
                   TaskInstanceDescriptor, WorkflowDescriptor};
use serde_json::{json, Value};

use crate::props::{invalid_artifact, sql_statements};

pub const BIGQUERY_JOB_ARTIFACT: &str = "bigquery_job";
pub const BIGQUERY_NAMESPACE: &str = "bigquery";
pub const BIGQUERY_JOB_FACET: &str = "bigQuery_job";

#[derive(Debug, Clone)]
pub struct BigQueryExtractor {
    task: TaskDescriptor,
    job_name: String,
}

impl BigQueryExtractor {
    fn base_step(&self) -> Result<StepMetadata, ExtractorError> {
        let query = sql_statements(&self.task)?.join(";\n");
        Ok(StepMetadata::named(self.job_name.clone()).with_job_facet("sql", json!({ "query": query })))
    }
}

/// `{projectId, datasetId, tableId}` -> `project.dataset.table`.
fn table_ref(value: &Value) -> Result<String, ExtractorError> {
    let part = |k: &str| {
        value.get(k)
             .and_then(Value::as_str)
             .ok_or_else(|| invalid_artifact(BIGQUERY_JOB_ARTIFACT, format!("table reference without {k}")))
    };
    Ok(format!("{}.{}.{}", part("projectId")?, part("datasetId")?, part("tableId")?))
}

fn job_stats(job: &Value) -> Value {
    let query = job.pointer("/statistics/query");
    let billed = query.and_then(|q| q.get("totalBytesBilled"))
                      .or_else(|| job.pointer("/statistics/totalBytesBilled"))
                      .and_then(|b| b.as_str().and_then(|s| s.parse::<i64>().ok()).or_else(|| b.as_i64()));
    json!({
        "cached": query.and_then(|q| q.get("cacheHit")).and_then(Value::as_bool).unwrap_or(false),
        "billedBytes": billed,
    })
}

impl Extractor for BigQueryExtractor {
    fn name(&self) -> &str {
        "BigQueryExtractor"
    }

    fn extract(&self) -> Result<Option<Extracted>, ExtractorError> {
        Ok(Some(self.base_step()?.into()))
    }

    fn extract_on_complete(&self, task_instance: &TaskInstanceDescriptor) -> Result<Option<Extracted>, ExtractorError> {
        let Some(job) = task_instance.artifact(BIGQUERY_JOB_ARTIFACT) else {
            return Ok(None);
        };
        if !job.is_object() {
            return Err(invalid_artifact(BIGQUERY_JOB_ARTIFACT, "expected a job object"));
        }
        let referenced = match job.pointer("/statistics/query/referencedTables") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(table_ref).collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(invalid_artifact(BIGQUERY_JOB_ARTIFACT, "referencedTables must be a list")),
        };
        let destination = match job.pointer("/configuration/query/destinationTable") {
            None | Some(Value::Null) => None,
            Some(v) => Some(table_ref(v)?),
        };
        let inputs = referenced.into_iter()
                               .filter(|t| destination.as_ref() != Some(t))
                               .map(|t| Dataset::new(BIGQUERY_NAMESPACE, t))
                               .collect();
        let outputs = destination.into_iter().map(|t| Dataset::new(BIGQUERY_NAMESPACE, t)).collect();
        let step = self.base_step()?
                       .with_inputs(inputs)
                       .with_outputs(outputs)
                       .with_run_facet(BIGQUERY_JOB_FACET, job_stats(job));
        Ok(Some(step.into()))
    }
}

impl ExtractorSpec for BigQueryExtractor {
    const REFERENCE: &'static str = "lineage_extractors::bigquery::BigQueryExtractor";

    fn operator_classnames() -> &'static [&'static str] {
        &["BigQueryOperator", "BigQueryExecuteQueryOperator"]
    }

    fn bind(task: &TaskDescriptor, workflow: &WorkflowDescriptor) -> Self {
        Self { task: task.clone(),
               job_name: job_name(&workflow.workflow_id, &task.task_id) }
    }
}
