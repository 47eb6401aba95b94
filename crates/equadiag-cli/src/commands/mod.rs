pub mod grade;
pub mod init;
pub mod plan;
pub mod questions;
pub mod quiz;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use equadiag_analyzers::EquadiagConfig;
use equadiag_core::catalog::{builtin, load_catalog, Catalog};

/// The `--catalog` path, else the config's `catalog`, else the built-in catalog.
pub fn resolve_catalog(cli_path: Option<&Path>, config: Option<&EquadiagConfig>) -> Result<Catalog> {
    let path = cli_path.or_else(|| config.and_then(|c| c.catalog.as_deref()));
    match path {
        Some(path) => {
            tracing::debug!("loading catalog from {}", path.display());
            load_catalog(path)
        }
        None => Ok(builtin().clone()),
    }
}
