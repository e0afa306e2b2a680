pub mod catalog;
pub mod config;
pub mod models;
pub mod pipeline;

pub use catalog::{Catalog, CatalogError};
pub use config::EngineConfig;
pub use models::{PatientContext, PositionedToken, Report};
pub use pipeline::processor::{DocumentJob, DocumentProcessor, ProcessingError};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, writing to stderr.
///
/// The filter comes from `LABCANON_LOG` when set, otherwise
/// [`config::default_log_filter`]. Calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(config::LOG_ENV_VAR)
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
