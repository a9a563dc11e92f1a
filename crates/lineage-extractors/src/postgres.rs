//! PostgresExtractor: linaje de `PostgresOperator` a partir de su SQL.
//!
//! - namespace: `postgres://<host>:<port>` si la task trae conexión
//!   resuelta, si no `postgres://<postgres_conn_id>`.
//! - tablas sin esquema se califican con `public` y la base de la task.
//! - identificadores sin comillas en minúsculas; los entrecomillados se
//!   respetan.
use lineage_core::{job_name, Dataset, Extracted, Extractor, ExtractorError, ExtractorSpec, StepMetadata, TaskDescriptor,
                   WorkflowDescriptor};
use log::warn;
use serde_json::json;
use sqlparser::dialect::PostgreSqlDialect;

use crate::props::{connection_port, connection_str, sql_statements};
use crate::sql::{parse, qualify_table, IdentCase, SqlMeta, TableRef};

const DEFAULT_CONN_ID: &str = "postgres_default";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, Clone)]
pub struct PostgresExtractor {
    task: TaskDescriptor,
    job_name: String,
}

impl PostgresExtractor {
    fn namespace(&self) -> String {
        match connection_str(&self.task, "host") {
            Some(host) => format!("postgres://{host}:{}", connection_port(&self.task).unwrap_or(DEFAULT_PORT)),
            None => format!("postgres://{}", self.task.property_str("postgres_conn_id").unwrap_or(DEFAULT_CONN_ID)),
        }
    }

    fn database(&self) -> Option<&str> {
        self.task.property_str("database").or_else(|| connection_str(&self.task, "schema"))
    }

    fn datasets(&self, tables: &[TableRef], namespace: &str) -> Vec<Dataset> {
        tables.iter()
              .map(|t| {
                  Dataset::new(namespace,
                               qualify_table(&t.folded(IdentCase::Lower), self.database(), Some(DEFAULT_SCHEMA)))
              })
              .collect()
    }
}

impl Extractor for PostgresExtractor {
    fn name(&self) -> &str {
        "PostgresExtractor"
    }

    fn extract(&self) -> Result<Option<Extracted>, ExtractorError> {
        let query = sql_statements(&self.task)?.join(";\n");
        // SQL que no parsea: el step sigue saliendo, sin datasets.
        let meta = parse(&query, &PostgreSqlDialect {}).unwrap_or_else(|e| {
                                                           warn!("postgres:sql_unparsed job={} err={e}", self.job_name);
                                                           SqlMeta::default()
                                                       });
        let namespace = self.namespace();
        let step = StepMetadata::named(self.job_name.clone()).with_inputs(self.datasets(&meta.in_tables, &namespace))
                                                             .with_outputs(self.datasets(&meta.out_tables, &namespace))
                                                             .with_job_facet("sql", json!({ "query": query }));
        Ok(Some(step.into()))
    }
}

impl ExtractorSpec for PostgresExtractor {
    const REFERENCE: &'static str = "lineage_extractors::postgres::PostgresExtractor";

    fn operator_classnames() -> &'static [&'static str] {
        &["PostgresOperator"]
    }

    fn bind(task: &TaskDescriptor, workflow: &WorkflowDescriptor) -> Self {
        Self { task: task.clone(),
               job_name: job_name(&workflow.workflow_id, &task.task_id) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(props: serde_json::Value) -> PostgresExtractor {
        PostgresExtractor::bind(&TaskDescriptor::new("t1", "PostgresOperator").with_properties(props),
                                &WorkflowDescriptor::new("food_delivery"))
    }

    fn step(e: &PostgresExtractor) -> StepMetadata {
        match e.extract().unwrap() {
            Some(Extracted::Step(s)) => s,
            other => panic!("expected single step, got {other:?}"),
        }
    }

    #[test]
    fn resolved_connection_builds_host_namespace() {
        let e = bound(json!({
            "sql": "INSERT INTO Top_Deliveries SELECT * FROM delivery_times",
            "database": "food",
            "connection": {"host": "pg.internal", "port": 6432}
        }));
        let s = step(&e);
        assert_eq!(s.name, "food_delivery.t1");
        assert_eq!(s.inputs, vec![Dataset::new("postgres://pg.internal:6432", "food.public.delivery_times")]);
        assert_eq!(s.outputs, vec![Dataset::new("postgres://pg.internal:6432", "food.public.top_deliveries")]);
        assert_eq!(s.job_facets["sql"]["query"], json!("INSERT INTO Top_Deliveries SELECT * FROM delivery_times"));
    }

    #[test]
    fn conn_id_namespace_when_connection_unresolved() {
        let e = bound(json!({"sql": "SELECT * FROM sales.orders", "postgres_conn_id": "analytics_db"}));
        let s = step(&e);
        assert_eq!(s.inputs, vec![Dataset::new("postgres://analytics_db", "sales.orders")]);
    }

    #[test]
    fn quoted_identifiers_keep_their_case() {
        let e = bound(json!({"sql": "INSERT INTO \"Reports\".Daily SELECT * FROM \"Sales\".\"Orders\"",
                             "database": "food"}));
        let s = step(&e);
        assert_eq!(s.inputs, vec![Dataset::new("postgres://postgres_default", "food.Sales.Orders")]);
        assert_eq!(s.outputs, vec![Dataset::new("postgres://postgres_default", "food.Reports.daily")]);
    }

    #[test]
    fn unparseable_sql_keeps_the_step_without_datasets() {
        let e = bound(json!({"sql": "SELEC * FORM nowhere"}));
        let s = step(&e);
        assert!(s.inputs.is_empty() && s.outputs.is_empty());
        assert_eq!(s.job_facets["sql"]["query"], json!("SELEC * FORM nowhere"));
    }

    #[test]
    fn missing_sql_is_an_extraction_error() {
        let e = bound(json!({"database": "food"}));
        assert!(e.extract().is_err());
    }
}
