//! SnowflakeExtractor: igual que Postgres pero con identificadores en
//! mayúsculas (salvo los entrecomillados) y namespace por cuenta
//! (`snowflake://<account>`).
use lineage_core::{job_name, Dataset, Extracted, Extractor, ExtractorError, ExtractorSpec, StepMetadata, TaskDescriptor,
                   WorkflowDescriptor};
use log::warn;
use serde_json::json;
use sqlparser::dialect::SnowflakeDialect;

use crate::props::{connection_str, sql_statements};
use crate::sql::{parse, qualify_table, IdentCase, SqlMeta, TableRef};

const DEFAULT_CONN_ID: &str = "snowflake_default";

#[derive(Debug, Clone)]
pub struct SnowflakeExtractor {
    task: TaskDescriptor,
    job_name: String,
}

impl SnowflakeExtractor {
    fn namespace(&self) -> String {
        let account = self.task
                          .property_str("account")
                          .or_else(|| connection_str(&self.task, "account"))
                          .or_else(|| self.task.property_str("snowflake_conn_id"))
                          .unwrap_or(DEFAULT_CONN_ID);
        format!("snowflake://{account}")
    }

    fn upper(&self, key: &str) -> Option<String> {
        self.task
            .property_str(key)
            .or_else(|| connection_str(&self.task, key))
            .map(str::to_uppercase)
    }

    fn datasets(&self, tables: &[TableRef], namespace: &str) -> Vec<Dataset> {
        let database = self.upper("database");
        let schema = self.upper("schema");
        tables.iter()
              .map(|t| Dataset::new(namespace, qualify_table(&t.folded(IdentCase::Upper), database.as_deref(), schema.as_deref())))
              .collect()
    }
}

impl Extractor for SnowflakeExtractor {
    fn name(&self) -> &str {
        "SnowflakeExtractor"
    }

    fn extract(&self) -> Result<Option<Extracted>, ExtractorError> {
        let query = sql_statements(&self.task)?.join(";\n");
        let meta = parse(&query, &SnowflakeDialect {}).unwrap_or_else(|e| {
                                                          warn!("snowflake:sql_unparsed job={} err={e}", self.job_name);
                                                          SqlMeta::default()
                                                      });
        let namespace = self.namespace();
        let step = StepMetadata::named(self.job_name.clone()).with_inputs(self.datasets(&meta.in_tables, &namespace))
                                                             .with_outputs(self.datasets(&meta.out_tables, &namespace))
                                                             .with_job_facet("sql", json!({ "query": query }));
        Ok(Some(step.into()))
    }
}

impl ExtractorSpec for SnowflakeExtractor {
    const REFERENCE: &'static str = "lineage_extractors::snowflake::SnowflakeExtractor";

    fn operator_classnames() -> &'static [&'static str] {
        &["SnowflakeOperator"]
    }

    fn bind(task: &TaskDescriptor, workflow: &WorkflowDescriptor) -> Self {
        Self { task: task.clone(),
               job_name: job_name(&workflow.workflow_id, &task.task_id) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_upper_cased_and_qualified() {
        let task = TaskDescriptor::new("load", "SnowflakeOperator").with_properties(json!({
            "sql": "CREATE TABLE daily_sales AS SELECT * FROM raw.orders",
            "account": "xy12345",
            "database": "analytics",
            "schema": "public"
        }));
        let e = SnowflakeExtractor::bind(&task, &WorkflowDescriptor::new("sales"));
        let Some(Extracted::Step(s)) = e.extract().unwrap() else { panic!("expected single step") };
        assert_eq!(s.inputs, vec![Dataset::new("snowflake://xy12345", "ANALYTICS.RAW.ORDERS")]);
        assert_eq!(s.outputs, vec![Dataset::new("snowflake://xy12345", "ANALYTICS.PUBLIC.DAILY_SALES")]);
    }

    #[test]
    fn quoted_identifier_is_not_upper_cased() {
        let task = TaskDescriptor::new("load", "SnowflakeOperator").with_properties(json!({
            "sql": "INSERT INTO mart.\"dailySales\" SELECT * FROM orders",
            "account": "xy12345",
            "database": "analytics",
            "schema": "raw"
        }));
        let e = SnowflakeExtractor::bind(&task, &WorkflowDescriptor::new("sales"));
        let Some(Extracted::Step(s)) = e.extract().unwrap() else { panic!("expected single step") };
        assert_eq!(s.inputs, vec![Dataset::new("snowflake://xy12345", "ANALYTICS.RAW.ORDERS")]);
        assert_eq!(s.outputs, vec![Dataset::new("snowflake://xy12345", "ANALYTICS.MART.dailySales")]);
    }

    #[test]
    fn namespace_falls_back_to_conn_id() {
        let task = TaskDescriptor::new("load", "SnowflakeOperator").with_properties(json!({
            "sql": "SELECT 1 FROM dual",
            "snowflake_conn_id": "sf_prod"
        }));
        let e = SnowflakeExtractor::bind(&task, &WorkflowDescriptor::new("sales"));
        assert_eq!(e.namespace(), "snowflake://sf_prod");
    }
}
