//! GreatExpectationsExtractor: el asset validado es la entrada del step; el
//! resultado de la validación (artefacto `validation_result`) se adjunta
//! como facets de aserciones sobre ese asset y un resumen en el run.
use lineage_core::{job_name, Dataset, Extracted, Extractor, ExtractorError, ExtractorSpec, StepMetadata, TaskDescriptor,
                   TaskInstanceDescriptor, WorkflowDescriptor};
use serde_json::{json, Value};

use crate::props::invalid_artifact;

pub const VALIDATION_ARTIFACT: &str = "validation_result";
pub const ASSERTIONS_FACET: &str = "greatExpectations_assertions";
pub const VALIDATION_FACET: &str = "greatExpectations_validation";
const DEFAULT_DATASOURCE: &str = "default";

#[derive(Debug, Clone)]
pub struct GreatExpectationsExtractor {
    task: TaskDescriptor,
    job_name: String,
}

impl GreatExpectationsExtractor {
    fn asset(&self) -> Option<Dataset> {
        let name = self.task
                       .property_str("data_asset_name")
                       .or_else(|| self.task.properties.pointer("/batch_kwargs/table").and_then(Value::as_str))?;
        let namespace = self.task.property_str("datasource").unwrap_or(DEFAULT_DATASOURCE);
        Some(Dataset::new(namespace, name))
    }

    fn base_step(&self) -> StepMetadata {
        let mut step = StepMetadata::named(self.job_name.clone()).with_inputs(self.asset().into_iter().collect());
        if let Some(suite) = self.task.property_str("expectation_suite_name") {
            step = step.with_job_facet("expectationSuite", json!({ "name": suite }));
        }
        step
    }
}

/// Aserciones `{assertion, column, success}` de cada resultado.
fn assertions(results: &[Value]) -> Vec<Value> {
    results.iter()
           .map(|r| {
               let config = r.get("expectation_config");
               json!({
                   "assertion": config.and_then(|c| c.get("expectation_type")).and_then(Value::as_str).unwrap_or("unknown"),
                   "column": config.and_then(|c| c.pointer("/kwargs/column")).and_then(Value::as_str),
                   "success": r.get("success").and_then(Value::as_bool).unwrap_or(false),
               })
           })
           .collect()
}

impl Extractor for GreatExpectationsExtractor {
    fn name(&self) -> &str {
        "GreatExpectationsExtractor"
    }

    fn extract(&self) -> Result<Option<Extracted>, ExtractorError> {
        Ok(Some(self.base_step().into()))
    }

    fn extract_on_complete(&self, task_instance: &TaskInstanceDescriptor) -> Result<Option<Extracted>, ExtractorError> {
        let Some(validation) = task_instance.artifact(VALIDATION_ARTIFACT) else {
            return Ok(None);
        };
        let success = validation.get("success")
                                .and_then(Value::as_bool)
                                .ok_or_else(|| invalid_artifact(VALIDATION_ARTIFACT, "missing boolean success"))?;
        let results = match validation.get("results") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => assertions(items),
            Some(_) => return Err(invalid_artifact(VALIDATION_ARTIFACT, "results must be a list")),
        };
        let passed = results.iter().filter(|a| a["success"] == json!(true)).count();

        let mut step = self.base_step();
        let evaluated = results.len();
        step.inputs = step.inputs
                          .into_iter()
                          .map(|d| d.with_facet(ASSERTIONS_FACET, json!({ "assertions": results.clone() })))
                          .collect();
        let step = step.with_run_facet(VALIDATION_FACET,
                                       json!({
                                           "success": success,
                                           "evaluatedExpectations": evaluated,
                                           "successfulExpectations": passed,
                                       }));
        Ok(Some(step.into()))
    }
}

impl ExtractorSpec for GreatExpectationsExtractor {
    const REFERENCE: &'static str = "lineage_extractors::great_expectations::GreatExpectationsExtractor";

    fn operator_classnames() -> &'static [&'static str] {
        &["GreatExpectationsOperator"]
    }

    fn bind(task: &TaskDescriptor, workflow: &WorkflowDescriptor) -> Self {
        Self { task: task.clone(),
               job_name: job_name(&workflow.workflow_id, &task.task_id) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> GreatExpectationsExtractor {
        let task = TaskDescriptor::new("validate_orders", "GreatExpectationsOperator").with_properties(json!({
            "data_asset_name": "public.orders",
            "datasource": "postgres://db:5432",
            "expectation_suite_name": "orders.warning"
        }));
        GreatExpectationsExtractor::bind(&task, &WorkflowDescriptor::new("quality"))
    }

    #[test]
    fn asset_is_the_input() {
        let Some(Extracted::Step(s)) = extractor().extract().unwrap() else { panic!("expected single step") };
        assert_eq!(s.inputs, vec![Dataset::new("postgres://db:5432", "public.orders")]);
        assert_eq!(s.job_facets["expectationSuite"], json!({"name": "orders.warning"}));
    }

    #[test]
    fn validation_result_becomes_facets() {
        let ti = TaskInstanceDescriptor { artifacts: json!({"validation_result": {
                                              "success": false,
                                              "results": [
                                                  {"success": true, "expectation_config": {
                                                      "expectation_type": "expect_column_values_to_not_be_null",
                                                      "kwargs": {"column": "id"}}},
                                                  {"success": false, "expectation_config": {
                                                      "expectation_type": "expect_table_row_count_to_be_between",
                                                      "kwargs": {}}}
                                              ]}}),
                                          ..Default::default() };
        let Some(Extracted::Step(s)) = extractor().extract_on_complete(&ti).unwrap() else { panic!("expected step") };
        assert_eq!(s.run_facets[VALIDATION_FACET],
                   json!({"success": false, "evaluatedExpectations": 2, "successfulExpectations": 1}));
        let assertions = &s.inputs[0].facets[ASSERTIONS_FACET]["assertions"];
        assert_eq!(assertions[0], json!({"assertion": "expect_column_values_to_not_be_null", "column": "id", "success": true}));
        assert_eq!(assertions[1]["column"], Value::Null);
    }

    #[test]
    fn validation_without_success_flag_is_invalid() {
        let ti = TaskInstanceDescriptor { artifacts: json!({"validation_result": {"results": []}}),
                                          ..Default::default() };
        assert!(matches!(extractor().extract_on_complete(&ti), Err(ExtractorError::InvalidArtifact { .. })));
    }
}
