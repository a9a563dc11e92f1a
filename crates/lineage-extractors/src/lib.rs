//! lineage-extractors: extractores concretos para los operadores más comunes
//! y el registry por defecto que los reúne.
//!
//! - `PostgresExtractor`, `SnowflakeExtractor`: SQL declarado -> tablas.
//! - `BigQueryExtractor`: SQL antes de ejecutar, estadísticas del job al
//!   completar.
//! - `GreatExpectationsExtractor`: asset validado + resultado de validación.
//!   Es también el único patcher.
//!
//! Los overrides de entorno se resuelven contra `catalog()`, que conoce
//! todas las variantes de este crate por su referencia.
pub mod bigquery;
pub mod great_expectations;
pub mod postgres;
mod props;
pub mod snowflake;
pub mod sql;

use lineage_core::{overrides_from_vars, ExtractorCatalog, ExtractorOverride, ExtractorRegistry, ExtractorVariant,
                   RegistryError};
use log::info;

pub use bigquery::BigQueryExtractor;
pub use great_expectations::GreatExpectationsExtractor;
pub use postgres::PostgresExtractor;
pub use snowflake::SnowflakeExtractor;

/// Variantes registradas por defecto, en orden de registro.
pub fn builtin_extractors() -> Vec<ExtractorVariant> {
    vec![ExtractorVariant::of::<PostgresExtractor>(),
         ExtractorVariant::of::<BigQueryExtractor>(),
         ExtractorVariant::of::<GreatExpectationsExtractor>(),
         ExtractorVariant::of::<SnowflakeExtractor>()]
}

pub fn builtin_patchers() -> Vec<ExtractorVariant> {
    vec![ExtractorVariant::of::<GreatExpectationsExtractor>()]
}

/// Catálogo de referencias para resolver overrides.
pub fn catalog() -> ExtractorCatalog {
    builtin_extractors().into_iter().fold(ExtractorCatalog::new(), ExtractorCatalog::with)
}

/// Registry con built-ins, patchers y los overrides dados (que ganan).
pub fn default_registry(overrides: &[ExtractorOverride]) -> Result<ExtractorRegistry, RegistryError> {
    let registry = ExtractorRegistry::build(&builtin_extractors(), &builtin_patchers(), overrides, &catalog())?;
    info!("extractors:registry task_types={} overrides={}", registry.len(), overrides.len());
    Ok(registry)
}

/// Igual que `default_registry`, leyendo overrides de pares estilo entorno.
pub fn default_registry_from_vars<I, K, V>(vars: I) -> Result<ExtractorRegistry, RegistryError>
    where I: IntoIterator<Item = (K, V)>,
          K: AsRef<str>,
          V: AsRef<str>
{
    default_registry(&overrides_from_vars(vars)?)
}
