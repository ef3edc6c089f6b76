//! Per-file staged upload session.
//!
//! Runs validate → negotiate → transfer for one file and registers the
//! staged resource. Each phase must finish before the next starts.

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use assetlift_platform::{PlatformApi, Registration};
use assetlift_protocol::{CreatedResource, FileDescriptor, StagedTarget};
use assetlift_transfer::{Attachment, Boundary, ValidationError};
use assetlift_transport::{Method, Request, Transport};

use crate::error::{UploadError, UploadPhase};
use crate::types::{UploadEvent, UploadRequest, UploaderConfig};

/// Races `fut` against cancellation.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    phase: UploadPhase,
    fut: impl Future<Output = T>,
) -> Result<T, UploadError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UploadError::Cancelled(phase)),
        out = fut => Ok(out),
    }
}

/// Staged upload of a single file.
pub(crate) struct FileSession<'a> {
    pub(crate) platform: &'a dyn PlatformApi,
    pub(crate) storage: &'a dyn Transport,
    pub(crate) config: &'a UploaderConfig,
    pub(crate) cancel: &'a CancellationToken,
    pub(crate) events_tx: &'a mpsc::Sender<UploadEvent>,
    pub(crate) request: &'a UploadRequest,
}

impl FileSession<'_> {
    /// Validates, negotiates and transfers. Returns the registration that
    /// references the transferred resource.
    pub(crate) async fn stage(&self) -> Result<Registration, UploadError> {
        let descriptor = self.validate()?;

        let target = self.negotiate(&descriptor).await?;
        let resource_url = self.transfer(target).await?;

        Ok(Registration {
            origin: resource_url,
            resource_class: descriptor.resource_class,
            alt: self.request.alt.clone(),
        })
    }

    /// Registers a staged resource on its own.
    pub(crate) async fn register(
        &self,
        registration: &Registration,
    ) -> Result<CreatedResource, UploadError> {
        self.begin(UploadPhase::Register)?;
        let created = cancellable(
            self.cancel,
            UploadPhase::Register,
            self.platform.register(registration),
        )
        .await?
        .map_err(UploadError::Registration)?;
        self.finish(UploadPhase::Register);
        Ok(created)
    }

    fn validate(&self) -> Result<FileDescriptor, UploadError> {
        let req = self.request;
        if req.filename.is_empty() {
            return Err(ValidationError::EmptyFilename.into());
        }
        if req.bytes.is_empty() {
            return Err(ValidationError::EmptyAttachment.into());
        }
        Ok(FileDescriptor::new(
            req.filename.clone(),
            req.mime_type.clone(),
            req.bytes.len() as u64,
        ))
    }

    async fn negotiate(&self, descriptor: &FileDescriptor) -> Result<StagedTarget, UploadError> {
        self.begin(UploadPhase::Negotiate)?;
        let target = cancellable(
            self.cancel,
            UploadPhase::Negotiate,
            self.platform.negotiate(descriptor),
        )
        .await?
        .map_err(UploadError::Negotiation)?;
        self.finish(UploadPhase::Negotiate);
        Ok(target)
    }

    /// Posts the multipart body to the storage endpoint. Consumes the
    /// target: a staged target is never reused.
    async fn transfer(&self, target: StagedTarget) -> Result<String, UploadError> {
        self.begin(UploadPhase::Transfer)?;

        let attachment = Attachment {
            bytes: &self.request.bytes,
            filename: &self.request.filename,
            mime_type: &self.request.mime_type,
        };
        let boundary = Boundary::for_payload(&target.parameters, &attachment)?;
        let body = assetlift_transfer::build(&boundary, &target.parameters, &attachment)?;

        debug!(
            filename = %self.request.filename,
            upload_url = %target.upload_url,
            body_bytes = body.len(),
            "transferring to storage endpoint"
        );

        let req = Request::new(Method::Post, &target.upload_url)
            .header("Content-Type", body.content_type())
            .body(body.into_bytes())
            .timeout(self.config.transfer_timeout);

        let resp = cancellable(self.cancel, UploadPhase::Transfer, self.storage.send(req))
            .await?
            .map_err(UploadError::TransferTransport)?;
        if !resp.is_success() {
            return Err(UploadError::Transfer {
                status: resp.status,
                body: resp.text(),
            });
        }

        self.finish(UploadPhase::Transfer);
        Ok(target.resource_url)
    }

    fn begin(&self, phase: UploadPhase) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled(phase));
        }
        self.emit(UploadEvent::PhaseStarted {
            filename: self.request.filename.clone(),
            phase,
        });
        Ok(())
    }

    fn finish(&self, phase: UploadPhase) {
        self.emit(UploadEvent::PhaseCompleted {
            filename: self.request.filename.clone(),
            phase,
        });
    }

    fn emit(&self, event: UploadEvent) {
        // Events are best effort; a full or unobserved channel never blocks an upload.
        let _ = self.events_tx.try_send(event);
    }
}
