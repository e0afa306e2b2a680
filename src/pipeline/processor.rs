//! Document processing orchestrator.
//!
//! Single entry point that drives the full pipeline for one document:
//! extract → parse → normalize → classify/assemble.
//!
//! The extractor is injected as a trait object so the orchestrator stays
//! testable with mock implementations. Catalog and templates are shared
//! read-only through `Arc`; concurrent documents never contend on them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::catalog::{Catalog, CatalogError};
use crate::config::EngineConfig;
use crate::models::{PatientContext, PositionedToken, Report};
use crate::pipeline::assemble::{assemble, AssemblyError, AssemblyInput};
use crate::pipeline::extraction::{check_reading_order, DocumentExtractor, ExtractionError, PlainTextExtractor};
use crate::pipeline::normalize::Normalizer;
use crate::pipeline::parsing::templates::TemplateRegistry;
use crate::pipeline::parsing::{MeasurementParser, ParserSettings};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort processing of a whole document.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionError),

    #[error("Assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Processing timed out after {0:?}")]
    Timeout(Duration),

    #[error("Processing cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Stable identifier of a document: UUID v5 of its bytes.
pub fn source_id_for(bytes: &[u8]) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, bytes)
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct DocumentProcessor {
    extractor: Arc<dyn DocumentExtractor>,
    parser: MeasurementParser,
    normalizer: Normalizer,
    config: EngineConfig,
}

impl DocumentProcessor {
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        catalog: Arc<Catalog>,
        templates: Arc<TemplateRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            extractor,
            parser: MeasurementParser::new(catalog.clone(), templates, ParserSettings::from(&config)),
            normalizer: Normalizer::new(catalog),
            config,
        }
    }

    /// Plain-text extractor, built-in templates and the catalog named in
    /// `config` (built-in when none is named).
    pub fn from_config(config: EngineConfig) -> Result<Self, CatalogError> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::builtin()?,
        };
        Ok(Self::new(
            Arc::new(PlainTextExtractor),
            Arc::new(catalog),
            Arc::new(TemplateRegistry::builtin()),
            config,
        ))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full pipeline from raw document bytes.
    pub fn process_document(
        &self,
        bytes: &[u8],
        patient: Option<&PatientContext>,
    ) -> Result<Report, ProcessingError> {
        self.run(bytes, patient, &AtomicBool::new(false))
    }

    /// Pipeline from an already extracted token stream.
    pub fn process_tokens(
        &self,
        tokens: &[PositionedToken],
        patient: Option<&PatientContext>,
        source_id: Uuid,
    ) -> Result<Report, ProcessingError> {
        check_reading_order(tokens)?;
        self.process_checked(tokens, patient, source_id, &AtomicBool::new(false))
    }

    /// Run a document on the blocking pool. The returned job can be
    /// awaited under the configured timeout or cancelled.
    pub fn spawn(self: &Arc<Self>, bytes: Vec<u8>, patient: Option<PatientContext>) -> DocumentJob {
        let cancel = Arc::new(AtomicBool::new(false));
        let processor = Arc::clone(self);
        let flag = Arc::clone(&cancel);
        let handle = tokio::task::spawn_blocking(move || processor.run(&bytes, patient.as_ref(), &flag));
        DocumentJob {
            handle,
            cancel,
            timeout: self.config.extraction_timeout(),
        }
    }

    fn run(
        &self,
        bytes: &[u8],
        patient: Option<&PatientContext>,
        cancel: &AtomicBool,
    ) -> Result<Report, ProcessingError> {
        let source_id = source_id_for(bytes);
        tracing::info!(source_id = %source_id, bytes = bytes.len(), "Processing document");

        let tokens = self.extractor.extract(bytes)?;
        check_reading_order(&tokens)?;
        self.process_checked(&tokens, patient, source_id, cancel)
    }

    fn process_checked(
        &self,
        tokens: &[PositionedToken],
        patient: Option<&PatientContext>,
        source_id: Uuid,
        cancel: &AtomicBool,
    ) -> Result<Report, ProcessingError> {
        let extracted_at = Utc::now();
        let patient = patient.copied().unwrap_or_default();
        check_cancel(cancel)?;

        let outcome = self.parser.parse(tokens);
        check_cancel(cancel)?;

        let mut items = Vec::with_capacity(outcome.measurements.len());
        for raw in outcome.measurements {
            items.push(self.normalizer.normalize(raw, outcome.locale, &patient)?);
        }
        check_cancel(cancel)?;

        let report = assemble(
            AssemblyInput {
                source_id,
                extracted_at,
                locale: outcome.locale,
                template_id: outcome.template_id,
                token_count: tokens.len(),
                items,
            },
            self.config.review_threshold,
        )?;

        tracing::info!(
            source_id = %source_id,
            locale = report.locale().as_str(),
            template = report.template_id(),
            measurements = report.measurements().len(),
            unresolved = report.unresolved().len(),
            confidence = report.overall_confidence(),
            "Document processed"
        );
        Ok(report)
    }
}

fn check_cancel(cancel: &AtomicBool) -> Result<(), ProcessingError> {
    if cancel.load(Ordering::Relaxed) {
        return Err(ProcessingError::Cancelled);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// A document being processed on the blocking pool.
pub struct DocumentJob {
    handle: JoinHandle<Result<Report, ProcessingError>>,
    cancel: Arc<AtomicBool>,
    timeout: Duration,
}

impl DocumentJob {
    /// Request cancellation. Takes effect at the next stage boundary, or
    /// immediately if the job has not started yet.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Await the report under the configured timeout.
    pub async fn wait(self) -> Result<Report, ProcessingError> {
        let timeout = self.timeout;
        self.wait_for(timeout).await
    }

    /// Await the report for at most `timeout`. On expiry the job is told to
    /// stop at its next stage boundary.
    pub async fn wait_for(self, timeout: Duration) -> Result<Report, ProcessingError> {
        let cancel = self.cancel;
        match tokio::time::timeout(timeout, self.handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_cancelled() => Err(ProcessingError::Cancelled),
            Ok(Err(e)) => Err(ProcessingError::Worker(e.to_string())),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                tracing::warn!(timeout = ?timeout, "Document processing timed out");
                Err(ProcessingError::Timeout(timeout))
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════
