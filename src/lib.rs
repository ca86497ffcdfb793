pub mod catalog;
pub mod chat;
pub mod constants;
pub mod conversation;
pub mod llm_interaction;
pub mod lookup;
pub mod phone;
pub mod provider;
pub mod sentiment;
pub mod transcript;
pub mod web_server;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use crate::catalog::Catalog;
use crate::provider::{CatalogProvider, PhoneRecordProvider, SeriesTableProvider};

/// How phone records are resolved from a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Synthesize a record from the built-in series table.
    Table,
    /// Look the model up in a CSV catalog.
    Catalog,
}

/// Builds the provider for `strategy`, loading the catalog once if needed.
pub fn build_provider(strategy: Strategy, catalog_path: &Path) -> Result<Arc<dyn PhoneRecordProvider>> {
    let provider: Arc<dyn PhoneRecordProvider> = match strategy {
        Strategy::Table => Arc::new(SeriesTableProvider),
        Strategy::Catalog => {
            let catalog = Catalog::load(catalog_path)
                .with_context(|| format!("Failed to load catalog from {}", catalog_path.display()))?;
            Arc::new(CatalogProvider::new(Arc::new(catalog)))
        }
    };
    info!(provider = provider.name(), "Phone record provider ready");
    Ok(provider)
}
