//! `ExtractorRegistry`: tipo de task -> variante de extractor.
//!
//! Se construye una vez por instancia de backend, en este orden:
//! 1. built-ins, registrados bajo cada classname que declaran;
//! 2. patchers (mapa aparte, lo consulta el host al construir el DAG);
//! 3. overrides de entorno `OPENLINEAGE_EXTRACTOR_<TaskType>=<referencia>`,
//!    resueltos contra un `ExtractorCatalog`.
//!
//! Un registro posterior para la misma clave reemplaza al anterior, así que
//! los overrides siempre ganan sobre los built-ins. La búsqueda es por nombre
//! exacto; no hay matching por herencia.
use std::collections::HashMap;

use log::debug;

use crate::errors::RegistryError;
use crate::extractor::{ExtractorCatalog, ExtractorVariant};

/// Prefijo de las variables de entorno que sobreescriben extractores.
pub const EXTRACTOR_ENV_PREFIX: &str = "OPENLINEAGE_EXTRACTOR_";

/// Override declarativo: ligar `task_type` a la variante `reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorOverride {
    pub task_type: String,
    pub reference: String,
}

impl ExtractorOverride {
    pub fn new(task_type: impl Into<String>, reference: impl Into<String>) -> Self {
        Self { task_type: task_type.into(),
               reference: reference.into() }
    }
}

/// Filtra pares clave/valor estilo entorno y devuelve los overrides, ordenados
/// por tipo de task. Un sufijo vacío (`OPENLINEAGE_EXTRACTOR_=...`) es un
/// error de despliegue.
pub fn overrides_from_vars<I, K, V>(vars: I) -> Result<Vec<ExtractorOverride>, RegistryError>
    where I: IntoIterator<Item = (K, V)>,
          K: AsRef<str>,
          V: AsRef<str>
{
    let mut out = Vec::new();
    for (key, value) in vars {
        let key = key.as_ref();
        let Some(task_type) = key.strip_prefix(EXTRACTOR_ENV_PREFIX) else { continue };
        if task_type.trim().is_empty() {
            return Err(RegistryError::MalformedOverride { key: key.to_string() });
        }
        out.push(ExtractorOverride::new(task_type, value.as_ref().trim()));
    }
    out.sort_by(|a, b| a.task_type.cmp(&b.task_type));
    Ok(out)
}

#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, ExtractorVariant>,
    patchers: HashMap<String, ExtractorVariant>,
}

impl ExtractorRegistry {
    /// Registry vacío.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construcción completa: built-ins, patchers y overrides (en ese orden).
    pub fn build(builtins: &[ExtractorVariant],
                 patchers: &[ExtractorVariant],
                 overrides: &[ExtractorOverride],
                 catalog: &ExtractorCatalog)
                 -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for variant in builtins {
            registry.register_for_classnames(variant);
        }
        for patcher in patchers {
            for classname in patcher.operator_classnames() {
                registry.register_patcher(classname.clone(), patcher.clone());
            }
        }
        registry.apply_overrides(overrides, catalog)?;
        Ok(registry)
    }

    /// Registra la variante bajo todos los classnames que declara.
    pub fn register_for_classnames(&mut self, variant: &ExtractorVariant) {
        for classname in variant.operator_classnames() {
            self.register(classname.clone(), variant.clone());
        }
    }

    /// Inserta o reemplaza el mapeo. Siempre tiene éxito.
    pub fn register(&mut self, task_type: impl Into<String>, variant: ExtractorVariant) {
        let task_type = task_type.into();
        debug!("registry:register task_type={task_type} extractor={}", variant.reference());
        self.extractors.insert(task_type, variant);
    }

    pub fn register_patcher(&mut self, task_type: impl Into<String>, variant: ExtractorVariant) {
        self.patchers.insert(task_type.into(), variant);
    }

    /// Resuelve cada override contra el catálogo. El primero que no resuelva
    /// aborta con error y deja el registry sin tocar.
    pub fn apply_overrides(&mut self, overrides: &[ExtractorOverride], catalog: &ExtractorCatalog) -> Result<(), RegistryError> {
        let mut resolved = Vec::with_capacity(overrides.len());
        for ov in overrides {
            let variant = catalog.lookup(&ov.reference)
                                 .ok_or_else(|| RegistryError::UnresolvedReference { task_type: ov.task_type.clone(),
                                                                                     reference: ov.reference.clone() })?;
            resolved.push((ov.task_type.clone(), variant.clone()));
        }
        for (task_type, variant) in resolved {
            self.register(task_type, variant);
        }
        Ok(())
    }

    pub fn resolve(&self, task_type: &str) -> Option<&ExtractorVariant> {
        self.extractors.get(task_type)
    }

    pub fn resolve_patcher(&self, task_type: &str) -> Option<&ExtractorVariant> {
        self.patchers.get(task_type)
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Tipos de task con extractor, ordenados.
    pub fn task_types(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
