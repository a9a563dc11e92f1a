//! Contrato de extractores.
//!
//! Un extractor convierte el estado interno de una task (opaco para el core)
//! en un `StepMetadata`, en dos puntos posibles del ciclo de vida:
//! - `extract`: antes de ejecutar, sólo con lo declarado en la task.
//! - `extract_on_complete`: al terminar, con artefactos de la instancia.
//!
//! Las variantes concretas viven fuera del core; aquí sólo se define el
//! trait, el handle `ExtractorVariant` y el catálogo de referencias.
mod definition;
mod variant;

pub use definition::{Extracted, Extractor, ExtractorSpec};
pub use variant::{ExtractorCatalog, ExtractorConstructor, ExtractorVariant};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExtractorError;
    use crate::model::{StepMetadata, TaskDescriptor, WorkflowDescriptor};

    #[derive(Debug)]
    struct FixedExtractor {
        name: String,
    }

    impl Extractor for FixedExtractor {
        fn name(&self) -> &str { "FixedExtractor" }
        fn extract(&self) -> Result<Option<Extracted>, ExtractorError> {
            Ok(Some(StepMetadata::named(self.name.clone()).into()))
        }
    }

    impl ExtractorSpec for FixedExtractor {
        const REFERENCE: &'static str = "tests::FixedExtractor";
        fn operator_classnames() -> &'static [&'static str] { &["AOperator", "BOperator"] }
        fn bind(task: &TaskDescriptor, workflow: &WorkflowDescriptor) -> Self {
            Self { name: crate::model::job_name(&workflow.workflow_id, &task.task_id) }
        }
    }

    #[test]
    fn typed_variant_binds_new_instance_per_task() {
        let v = ExtractorVariant::of::<FixedExtractor>();
        assert_eq!(v.reference(), "tests::FixedExtractor");
        assert_eq!(v.operator_classnames(), &["AOperator".to_string(), "BOperator".to_string()]);

        let wf = WorkflowDescriptor::new("d");
        let a = v.instantiate(&TaskDescriptor::new("t1", "AOperator"), &wf);
        let b = v.instantiate(&TaskDescriptor::new("t2", "AOperator"), &wf);
        assert_eq!(a.extract().unwrap(), Some(Extracted::Step(StepMetadata::named("d.t1"))));
        assert_eq!(b.extract().unwrap(), Some(Extracted::Step(StepMetadata::named("d.t2"))));
    }

    #[test]
    fn default_completion_hook_reports_nothing() {
        let v = ExtractorVariant::of::<FixedExtractor>();
        let e = v.instantiate(&TaskDescriptor::new("t1", "AOperator"), &WorkflowDescriptor::new("d"));
        assert_eq!(e.extract_on_complete(&Default::default()).unwrap(), None);
    }

    #[test]
    fn catalog_lookup_ignores_surrounding_whitespace() {
        let cat = ExtractorCatalog::new().with(ExtractorVariant::of::<FixedExtractor>());
        assert!(cat.lookup(" tests::FixedExtractor ").is_some());
        assert!(cat.lookup("tests::Other").is_none());
        assert_eq!(cat.references().collect::<Vec<_>>(), vec!["tests::FixedExtractor"]);
    }

    #[test]
    fn empty_list_is_the_only_empty_result() {
        assert!(Extracted::Steps(vec![]).is_empty());
        assert!(!Extracted::Step(StepMetadata::named("d.t")).is_empty());
        assert!(!Extracted::Steps(vec![StepMetadata::named("d.t")]).is_empty());
    }
}
