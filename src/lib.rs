//! flowlineage
//!
//! Backend de linaje listo para usar:
//! - `config`: `LineageConfig` desde entorno (.env incluido).
//! - `errors`: errores de arranque.
//! - `build_backend`: registry por defecto + transporte configurado.
//!
//! El motor vive en `lineage-core` y los extractores concretos en
//! `lineage-extractors`.

pub mod backend;
pub mod config;
pub mod errors;

pub use backend::{build_backend, BackendTransport};
pub use config::{LineageConfig, TransportKind};
pub use errors::ConfigError;
