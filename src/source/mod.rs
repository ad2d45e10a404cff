//! Institution sources
//!
//! A run produces institutions from exactly one source, chosen once from the
//! configuration at startup:
//! - `Registry`: region-by-region discovery against the registry search service
//! - `Json`: a pre-collected JSON array for countries without a registry

mod json;

pub use json::{produce_from_reader, JsonInstitutionSource};

use crate::config::Config;
use crate::crawler::{DiscoveryOrchestrator, HttpSearchService};
use crate::output::{InstitutionSink, RunSummary};
use crate::FinderError;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Where a run's institutions come from
#[derive(Debug)]
pub enum InstitutionSource {
    Registry {
        orchestrator: DiscoveryOrchestrator<HttpSearchService>,
        regions: Vec<String>,
    },
    Json(JsonInstitutionSource),
}

impl InstitutionSource {
    /// Selects the source for the configured country
    pub fn from_config(config: &Config) -> Result<Self, FinderError> {
        if config.finder.uses_registry() {
            Ok(Self::Registry {
                orchestrator: DiscoveryOrchestrator::from_config(config)?,
                regions: config.finder.regions.clone(),
            })
        } else {
            Ok(Self::Json(JsonInstitutionSource::new(
                config.finder.json_file(),
            )))
        }
    }

    /// Produces every institution of this source into `sink`
    pub async fn produce_institutions(
        &self,
        sink: Arc<dyn InstitutionSink>,
    ) -> Result<RunSummary, FinderError> {
        match self {
            Self::Registry {
                orchestrator,
                regions,
            } => Ok(orchestrator.run(regions, sink.as_ref()).await),
            Self::Json(source) => {
                let mut summary = RunSummary::start();
                let source = source.clone();
                let count =
                    tokio::task::spawn_blocking(move || source.produce(sink.as_ref()))
                        .await
                        .map_err(|e| FinderError::Io(std::io::Error::other(e)))??;

                summary.record_institutions(count);
                Ok(summary.finish())
            }
        }
    }
}

/// Starts a discovery run on its own task
///
/// Returns immediately; the caller is never blocked on the run. Await the
/// handle to learn how the run went.
pub fn spawn_discovery(
    source: Arc<InstitutionSource>,
    sink: Arc<dyn InstitutionSink>,
) -> JoinHandle<Result<RunSummary, FinderError>> {
    tracing::info!("Received request to begin producing institutions.");

    tokio::spawn(async move {
        let result = source.produce_institutions(sink).await;
        match &result {
            Ok(summary) => summary.log(),
            Err(e) => tracing::error!("An error occurred producing institutions: {}", e),
        }
        result
    })
}
