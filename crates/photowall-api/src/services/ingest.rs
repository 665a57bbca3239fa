//! Upload ingestion: sniff, stage, name, commit, then hand off derivation.

use crate::utils::upload::upload_stream_error;
use photowall_core::models::ImageKind;
use photowall_core::{generate_filename, AppError};
use photowall_processing::{sniff_reader, DerivationPipeline};
use photowall_storage::{LocalAssetStore, StagedFile, StorageError};
use photowall_worker::WorkDispatcher;
use std::time::Instant;
use tokio::io::AsyncRead;

/// Attempts at finding a free name before the upload fails.
const MAX_NAME_ATTEMPTS: u32 = 5;

/// What happens to an original once it is committed.
#[derive(Clone)]
pub enum DerivationStrategy {
    /// Derive before responding.
    Inline(DerivationPipeline),
    /// Enqueue the filename for a worker.
    Queued(WorkDispatcher),
    Disabled,
}

impl DerivationStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            DerivationStrategy::Inline(_) => "inline",
            DerivationStrategy::Queued(_) => "queued",
            DerivationStrategy::Disabled => "disabled",
        }
    }

    /// Never fails the upload; problems are logged by the pipeline or dispatcher.
    async fn apply(&self, filename: &str) {
        match self {
            DerivationStrategy::Inline(pipeline) => {
                pipeline.run(filename).await;
            }
            DerivationStrategy::Queued(dispatcher) => {
                dispatcher.dispatch(filename).await;
            }
            DerivationStrategy::Disabled => {}
        }
    }
}

/// A committed original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub filename: String,
    pub kind: ImageKind,
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct IngestService {
    store: LocalAssetStore,
    strategy: DerivationStrategy,
}

impl IngestService {
    pub fn new(store: LocalAssetStore, strategy: DerivationStrategy) -> Self {
        Self { store, strategy }
    }

    pub fn strategy(&self) -> &DerivationStrategy {
        &self.strategy
    }

    /// Store one upload.
    ///
    /// The content type is decided from the leading bytes; `declared_type` is only
    /// compared and logged. Unrecognized content is rejected before anything touches the
    /// disk. Once the original is committed the call succeeds whatever derivation does.
    #[tracing::instrument(skip(self, reader), fields(derivation = self.strategy.name()))]
    pub async fn ingest<R>(
        &self,
        reader: R,
        original_name: &str,
        declared_type: Option<&str>,
    ) -> Result<StoredUpload, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = Instant::now();

        let (kind, mut reader) = sniff_reader(reader).await.map_err(upload_stream_error)?;

        if let Some(declared) = declared_type {
            if ImageKind::from_mime(declared) != kind {
                tracing::warn!(
                    declared_type = %declared,
                    detected = %kind,
                    "Declared content type does not match upload content"
                );
            }
        }

        if !kind.is_supported() {
            return Err(AppError::Validation(
                "Unsupported image type. Accepted types: JPEG, PNG, GIF, WebP".to_string(),
            ));
        }

        let mut staged = self.store.stage(&mut reader).await.map_err(|e| match e {
            StorageError::SourceFailed(source) => upload_stream_error(source),
            other => AppError::from(other),
        })?;

        let filename = self.commit(&mut staged, original_name, kind).await?;

        tracing::info!(
            filename = %filename,
            kind = %kind,
            size_bytes = staged.size(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload stored"
        );

        self.strategy.apply(&filename).await;

        Ok(StoredUpload {
            filename,
            kind,
            size_bytes: staged.size(),
        })
    }

    /// Give the staged content a fresh name without ever replacing an existing original.
    async fn commit(
        &self,
        staged: &mut StagedFile,
        original_name: &str,
        kind: ImageKind,
    ) -> Result<String, AppError> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let filename = generate_filename(original_name, kind);
            match self.store.persist_staged(staged, &filename, false).await {
                Ok(()) => return Ok(filename),
                Err(StorageError::AlreadyExists(_)) => {
                    tracing::warn!(
                        filename = %filename,
                        attempt = attempt,
                        "Generated filename already taken, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Io(format!(
            "No free filename after {} attempts",
            MAX_NAME_ATTEMPTS
        )))
    }
}
