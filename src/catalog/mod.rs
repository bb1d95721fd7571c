//! Element family catalog and adaptor registry
//!
//! Families are declared in TOML manifests and resolved once at startup into
//! an immutable registry of adaptors. Registry construction failures are
//! fatal; nothing here is recoverable at runtime.

pub mod manifest;
pub mod registry;

use thiserror::Error;

pub use manifest::{Behavior, Catalog, FamilyDecl, InternalChildDecl, PackingDecl};
pub use registry::{AdaptorRegistry, FamilySpec};

/// Errors raised while loading catalogs or constructing the registry
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No family declaration services this type identifier
    #[error("unknown element type '{name}'")]
    UnknownType { name: String },

    /// Family extension chain loops back on itself
    #[error("cyclic family graph: {}", chain.join(" -> "))]
    CyclicFamilyGraph { chain: Vec<String> },

    /// Two declarations share one family name
    #[error("duplicate family definition: {name}")]
    DuplicateFamily { name: String },

    /// A declaration is structurally valid TOML but semantically wrong
    #[error("invalid manifest entry for '{family}': {message}")]
    InvalidManifest { family: String, message: String },

    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CatalogError {
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }
}
