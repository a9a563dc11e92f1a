//! Handles explícitos de variantes de extractor y el catálogo de referencias.
//!
//! Un `ExtractorVariant` reemplaza la introspección de clases en runtime: es
//! un valor con su referencia, los tipos de task que declara y un constructor
//! que liga una instancia nueva a una task.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::definition::{Extractor, ExtractorSpec};
use crate::model::{TaskDescriptor, WorkflowDescriptor};

pub type ExtractorConstructor = Arc<dyn Fn(&TaskDescriptor, &WorkflowDescriptor) -> Arc<dyn Extractor> + Send + Sync>;

#[derive(Clone)]
pub struct ExtractorVariant {
    reference: String,
    operator_classnames: Vec<String>,
    constructor: ExtractorConstructor,
}

impl ExtractorVariant {
    pub fn new<F>(reference: impl Into<String>, operator_classnames: &[&str], constructor: F) -> Self
        where F: Fn(&TaskDescriptor, &WorkflowDescriptor) -> Arc<dyn Extractor> + Send + Sync + 'static
    {
        Self { reference: reference.into(),
               operator_classnames: operator_classnames.iter().map(|s| s.to_string()).collect(),
               constructor: Arc::new(constructor) }
    }

    /// Variante de un extractor concreto tipado.
    pub fn of<E: ExtractorSpec>() -> Self {
        Self::new(E::REFERENCE, E::operator_classnames(), |task, workflow| {
            Arc::new(E::bind(task, workflow)) as Arc<dyn Extractor>
        })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn operator_classnames(&self) -> &[String] {
        &self.operator_classnames
    }

    /// Construye una instancia nueva ligada a la task.
    pub fn instantiate(&self, task: &TaskDescriptor, workflow: &WorkflowDescriptor) -> Arc<dyn Extractor> {
        (self.constructor)(task, workflow)
    }
}

/// Dos handles son la misma variante si comparten referencia y tipos soportados.
impl PartialEq for ExtractorVariant {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference && self.operator_classnames == other.operator_classnames
    }
}

impl fmt::Debug for ExtractorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorVariant")
         .field("reference", &self.reference)
         .field("operator_classnames", &self.operator_classnames)
         .finish_non_exhaustive()
    }
}

/// Conjunto de variantes conocidas, indexadas por referencia. Es contra lo
/// que se resuelven los overrides de configuración.
#[derive(Debug, Clone, Default)]
pub struct ExtractorCatalog {
    variants: BTreeMap<String, ExtractorVariant>,
}

impl ExtractorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variant: ExtractorVariant) -> Self {
        self.add(variant);
        self
    }

    pub fn add(&mut self, variant: ExtractorVariant) {
        self.variants.insert(variant.reference.clone(), variant);
    }

    pub fn lookup(&self, reference: &str) -> Option<&ExtractorVariant> {
        self.variants.get(reference.trim())
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }
}
