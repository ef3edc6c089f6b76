//! Staged upload orchestrator.
//!
//! Drives files through negotiate → transfer → register, aggregates
//! progress events, and supports cancellation.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use assetlift_platform::{PlatformApi, PlatformError, Registration};
use assetlift_protocol::{CreatedResource, ResourceClass};
use assetlift_transfer::{ValidationError, data_uri, detect_content_type};
use assetlift_transport::Transport;

use crate::error::{UploadError, UploadPhase};
use crate::session::{FileSession, cancellable};
use crate::types::{BatchEntry, UploadEvent, UploadRequest, UploaderConfig};

/// Uploads files to the platform through single-use staged targets.
pub struct StagedUploader {
    platform: Arc<dyn PlatformApi>,
    storage: Arc<dyn Transport>,
    config: UploaderConfig,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
}

impl StagedUploader {
    /// Creates an uploader. `storage` carries the multipart transfers and
    /// must not attach platform credentials.
    pub fn new(platform: Arc<dyn PlatformApi>, storage: Arc<dyn Transport>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            platform,
            storage,
            config: UploaderConfig::default(),
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: UploaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns the cancellation token for uploads run by this instance.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads one file and registers it.
    ///
    /// Every call negotiates a fresh staged target. Failures are never
    /// retried; the error names the phase that failed.
    pub async fn upload(&self, request: &UploadRequest) -> Result<CreatedResource, UploadError> {
        let session = self.session(request);
        let result = match session.stage().await {
            Ok(registration) => session.register(&registration).await,
            Err(e) => Err(e),
        };
        self.report(&request.filename, &result);
        result
    }

    /// Uploads several files and registers the successful ones in a single
    /// creation request.
    ///
    /// Returns one entry per input, in input order. A file that fails
    /// before registration is never registered and does not affect the
    /// others.
    pub async fn upload_batch(&self, requests: &[UploadRequest]) -> Vec<BatchEntry> {
        let mut results: Vec<Option<Result<CreatedResource, UploadError>>> =
            requests.iter().map(|_| None).collect();
        let mut staged: Vec<(usize, Registration)> = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            match self.session(request).stage().await {
                Ok(registration) => staged.push((index, registration)),
                Err(e) => results[index] = Some(Err(e)),
            }
        }

        if !staged.is_empty() {
            let registrations: Vec<Registration> =
                staged.iter().map(|(_, r)| r.clone()).collect();
            for (index, _) in &staged {
                self.emit(UploadEvent::PhaseStarted {
                    filename: requests[*index].filename.clone(),
                    phase: UploadPhase::Register,
                });
            }

            let outcome = cancellable(
                &self.cancel,
                UploadPhase::Register,
                self.platform.register_batch(&registrations),
            )
            .await;

            match outcome {
                Ok(Ok(created)) => {
                    let mut created = created.into_iter();
                    for (index, _) in &staged {
                        let entry = created.next().unwrap_or_else(|| {
                            Err(PlatformError::Registration {
                                messages: vec!["no resource returned".into()],
                            })
                        });
                        results[*index] = Some(entry.map_err(UploadError::Registration));
                    }
                }
                Ok(Err(e)) => {
                    warn!(files = staged.len(), error = %e, "batch registration failed");
                    let messages = registration_messages(&e);
                    for (index, _) in &staged {
                        results[*index] = Some(Err(UploadError::Registration(
                            PlatformError::Registration {
                                messages: messages.clone(),
                            },
                        )));
                    }
                }
                Err(cancelled) => {
                    let phase = cancelled.phase();
                    for (index, _) in &staged {
                        results[*index] = Some(Err(UploadError::Cancelled(phase)));
                    }
                }
            }
        }

        let entries: Vec<BatchEntry> = requests
            .iter()
            .zip(results)
            .enumerate()
            .map(|(index, (request, result))| BatchEntry {
                index,
                filename: request.filename.clone(),
                result: result
                    .unwrap_or(Err(UploadError::Cancelled(UploadPhase::Register))),
            })
            .collect();

        for entry in &entries {
            if entry.is_success() {
                self.emit(UploadEvent::PhaseCompleted {
                    filename: entry.filename.clone(),
                    phase: UploadPhase::Register,
                });
            }
            self.report(&entry.filename, &entry.result);
        }
        info!(
            files = entries.len(),
            succeeded = entries.iter().filter(|e| e.is_success()).count(),
            "batch upload finished"
        );
        entries
    }

    /// Reads a file from disk and uploads it. The MIME type is inferred
    /// from the file extension.
    pub async fn upload_path(
        &self,
        path: &Path,
        alt: Option<String>,
    ) -> Result<CreatedResource, UploadError> {
        let bytes = tokio::fs::read(path).await.map_err(ValidationError::Io)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = detect_content_type(&filename);

        let mut request = UploadRequest::new(bytes, filename, mime_type);
        request.alt = alt;
        self.upload(&request).await
    }

    /// Registers a resource from an origin the platform can fetch itself,
    /// such as a public URL. No staged target is negotiated.
    pub async fn import_origin(
        &self,
        origin: &str,
        resource_class: ResourceClass,
        alt: Option<String>,
    ) -> Result<CreatedResource, UploadError> {
        let registration = Registration {
            origin: origin.to_string(),
            resource_class,
            alt,
        };
        let result = cancellable(
            &self.cancel,
            UploadPhase::Register,
            self.platform.register(&registration),
        )
        .await
        .and_then(|r| r.map_err(UploadError::Registration));
        self.report(origin, &result);
        result
    }

    /// Registers small content inline as a `data:` URI.
    pub async fn import_inline(
        &self,
        bytes: &[u8],
        mime_type: &str,
        alt: Option<String>,
    ) -> Result<CreatedResource, UploadError> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyAttachment.into());
        }
        let origin = data_uri(bytes, mime_type);
        self.import_origin(&origin, ResourceClass::from_mime(mime_type), alt)
            .await
    }

    fn session<'a>(&'a self, request: &'a UploadRequest) -> FileSession<'a> {
        FileSession {
            platform: self.platform.as_ref(),
            storage: self.storage.as_ref(),
            config: &self.config,
            cancel: &self.cancel,
            events_tx: &self.events_tx,
            request,
        }
    }

    fn report(&self, filename: &str, result: &Result<CreatedResource, UploadError>) {
        match result {
            Ok(resource) => {
                info!(
                    filename = %filename,
                    resource_id = %resource.id,
                    status = %resource.status,
                    "upload registered"
                );
                self.emit(UploadEvent::Completed {
                    filename: filename.to_string(),
                    resource_id: resource.id.clone(),
                });
            }
            Err(e) => {
                warn!(filename = %filename, phase = %e.phase(), error = %e, "upload failed");
                self.emit(UploadEvent::Failed {
                    filename: filename.to_string(),
                    phase: e.phase(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.try_send(event);
    }
}

fn registration_messages(err: &PlatformError) -> Vec<String> {
    if err.messages().is_empty() {
        vec![err.to_string()]
    } else {
        err.messages().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetlift_platform::{GraphqlPlatform, PlatformConfig};
    use assetlift_protocol::ResourceStatus;
    use assetlift_transport::{BoxFuture, Request, Response, TransportError};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    const GRAPHQL: &str = "https://platform.test/graphql";
    const STORAGE: &str = "https://storage.test/bucket";

    /// Serves both the GraphQL endpoint and the storage endpoint and
    /// records one label per call.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        transfers: Mutex<Vec<Request>>,
        reject_negotiation: Vec<String>,
        reject_transfer: Vec<String>,
        /// Origins answered with an indexed `userErrors` entry.
        reject_registration: Vec<String>,
        /// Replaces the whole `fileCreate` response.
        registration_failure: Option<Response>,
        /// Transfers never complete; `transfer_started` fires instead.
        stall_transfer: bool,
        transfer_started: Notify,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, label: String) {
            self.calls.lock().unwrap().push(label);
        }

        fn handle(&self, request: Request) -> Response {
            if request.url != GRAPHQL {
                let filename = request.url.rsplit('/').next().unwrap().to_string();
                self.record(format!("transfer {filename}"));
                let status = if self.reject_transfer.contains(&filename) {
                    403
                } else {
                    201
                };
                self.transfers.lock().unwrap().push(request);
                return Response::new(status, if status == 403 { "AccessDenied" } else { "" });
            }

            let body: Value = serde_json::from_slice(&request.body).unwrap();
            let query = body["query"].as_str().unwrap();
            if query.contains("stagedUploadsCreate") {
                let input = &body["variables"]["input"][0];
                let filename = input["filename"].as_str().unwrap().to_string();
                self.record(format!("negotiate {filename}"));
                if self.reject_negotiation.contains(&filename) {
                    return json_response(json!({"data": {"stagedUploadsCreate": {
                        "stagedTargets": [],
                        "userErrors": [{"field": ["input", "0", "mimeType"], "message": "unsupported"}]
                    }}}));
                }
                return json_response(json!({"data": {"stagedUploadsCreate": {
                    "stagedTargets": [{
                        "url": format!("{STORAGE}/{filename}"),
                        "resourceUrl": format!("res://{filename}"),
                        "parameters": [
                            {"name": "policy", "value": "p1"},
                            {"name": "signature", "value": "s1"}
                        ]
                    }],
                    "userErrors": []
                }}}));
            }

            let origins: Vec<String> = body["variables"]["files"]
                .as_array()
                .unwrap()
                .iter()
                .map(|f| f["originalSource"].as_str().unwrap().to_string())
                .collect();
            self.record(format!("register {}", origins.join(",")));
            if let Some(failure) = &self.registration_failure {
                return failure.clone();
            }
            let mut files = Vec::new();
            let mut user_errors = Vec::new();
            for (position, origin) in origins.iter().enumerate() {
                if self.reject_registration.contains(origin) {
                    files.push(Value::Null);
                    user_errors.push(json!({
                        "field": ["files", position.to_string(), "alt"],
                        "message": "alt text too long"
                    }));
                } else {
                    files.push(json!({"id": format!("id:{origin}"), "fileStatus": "UPLOADED"}));
                }
            }
            json_response(json!({"data": {"fileCreate": {
                "files": files,
                "userErrors": user_errors
            }}}))
        }
    }

    impl Transport for FakeBackend {
        fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
            Box::pin(async move {
                if self.stall_transfer && request.url != GRAPHQL {
                    let filename = request.url.rsplit('/').next().unwrap_or_default();
                    self.record(format!("transfer {filename}"));
                    self.transfer_started.notify_one();
                    return std::future::pending().await;
                }
                Ok(self.handle(request))
            })
        }
    }

    fn json_response(value: Value) -> Response {
        Response::new(200, value.to_string())
    }

    fn uploader(backend: &Arc<FakeBackend>) -> StagedUploader {
        let platform = GraphqlPlatform::new(backend.clone(), PlatformConfig::new(GRAPHQL));
        StagedUploader::new(Arc::new(platform), backend.clone())
    }

    fn jpeg(name: &str) -> UploadRequest {
        UploadRequest::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3], name, "image/jpeg")
    }

    /// Replays scripted responses in order.
    struct ScriptedTransport {
        responses: Mutex<Vec<Response>>,
        requests: Mutex<Vec<Request>>,
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
            Box::pin(async move {
                self.requests.lock().unwrap().push(request);
                Ok(self.responses.lock().unwrap().remove(0))
            })
        }
    }

    #[tokio::test]
    async fn single_upload_end_to_end() {
        let transport = Arc::new(ScriptedTransport {
            responses: Mutex::new(vec![
                Response::new(
                    200,
                    r#"{"data":{"stagedUploadsCreate":{"stagedTargets":[{"url":"https://storage.test/up",
                        "resourceUrl":"res://abc","parameters":[{"name":"policy","value":"p1"},
                        {"name":"signature","value":"s1"}]}],"userErrors":[]}}}"#,
                ),
                Response::new(201, ""),
                Response::new(
                    200,
                    r#"{"data":{"fileCreate":{"files":[{"id":"R1","fileStatus":"UPLOADED"}],"userErrors":[]}}}"#,
                ),
            ]),
            requests: Mutex::new(Vec::new()),
        });
        let platform = GraphqlPlatform::new(transport.clone(), PlatformConfig::new(GRAPHQL));
        let uploader = StagedUploader::new(Arc::new(platform), transport.clone());

        let request = UploadRequest::new(vec![7u8; 17408], "a.jpg", "image/jpeg");
        let created = uploader.upload(&request).await.unwrap();
        assert_eq!(
            created,
            CreatedResource {
                id: "R1".into(),
                status: ResourceStatus::Uploaded,
                delivery_url: None,
                dimensions: None,
            }
        );

        let requests = transport.requests.lock().unwrap();
        let urls: Vec<&str> = requests.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, [GRAPHQL, "https://storage.test/up", GRAPHQL]);

        let negotiate: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(negotiate["variables"]["input"][0]["fileSize"], "17408");

        let transfer = &requests[1];
        let content_type = transfer.header_value("Content-Type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8_lossy(&transfer.body);
        let policy = body.find("name=\"policy\"").unwrap();
        let signature = body.find("name=\"signature\"").unwrap();
        let file = body.find("name=\"file\"; filename=\"a.jpg\"").unwrap();
        assert!(policy < signature && signature < file);
        assert!(transfer.header_value("Authorization").is_none());

        let register: Value = serde_json::from_slice(&requests[2].body).unwrap();
        assert_eq!(register["variables"]["files"][0]["originalSource"], "res://abc");
        assert_eq!(register["variables"]["files"][0]["contentType"], "IMAGE");
    }

    #[tokio::test]
    async fn phases_run_once_in_order() {
        let backend = Arc::new(FakeBackend::default());
        let uploader = uploader(&backend);

        uploader.upload(&jpeg("a.jpg")).await.unwrap();
        assert_eq!(
            backend.calls(),
            ["negotiate a.jpg", "transfer a.jpg", "register res://a.jpg"]
        );
    }

    #[tokio::test]
    async fn each_upload_negotiates_a_fresh_target() {
        let backend = Arc::new(FakeBackend::default());
        let uploader = uploader(&backend);

        let request = jpeg("a.jpg");
        uploader.upload(&request).await.unwrap();
        uploader.upload(&request).await.unwrap();

        let negotiations = backend
            .calls()
            .iter()
            .filter(|c| c.starts_with("negotiate"))
            .count();
        assert_eq!(negotiations, 2);

        let transfers = backend.transfers.lock().unwrap();
        assert_ne!(
            transfers[0].header_value("Content-Type"),
            transfers[1].header_value("Content-Type")
        );
    }

    #[tokio::test]
    async fn transfer_rejection_skips_registration() {
        let backend = Arc::new(FakeBackend {
            reject_transfer: vec!["a.jpg".into()],
            ..Default::default()
        });
        let uploader = uploader(&backend);

        let err = uploader.upload(&jpeg("a.jpg")).await.unwrap_err();
        match &err {
            UploadError::Transfer { status, body } => {
                assert_eq!(*status, 403);
                assert_eq!(body, "AccessDenied");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.phase(), UploadPhase::Transfer);
        assert_eq!(backend.calls(), ["negotiate a.jpg", "transfer a.jpg"]);
    }

    #[tokio::test]
    async fn negotiation_rejection_is_negotiation_error() {
        let backend = Arc::new(FakeBackend {
            reject_negotiation: vec!["clip.mov".into()],
            ..Default::default()
        });
        let uploader = uploader(&backend);

        let request = UploadRequest::new(vec![1, 2, 3], "clip.mov", "video/quicktime");
        let err = uploader.upload(&request).await.unwrap_err();
        assert!(matches!(err, UploadError::Negotiation(PlatformError::Negotiation { .. })));
        assert_eq!(backend.calls(), ["negotiate clip.mov"]);
    }

    #[tokio::test]
    async fn empty_input_fails_before_any_call() {
        let backend = Arc::new(FakeBackend::default());
        let uploader = uploader(&backend);

        let err = uploader
            .upload(&UploadRequest::new(Vec::new(), "a.jpg", "image/jpeg"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Validation(ValidationError::EmptyAttachment)));

        let err = uploader
            .upload(&UploadRequest::new(vec![1], "", "image/jpeg"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Validation(ValidationError::EmptyFilename)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn batch_isolates_failed_files() {
        let backend = Arc::new(FakeBackend {
            reject_negotiation: vec!["two.jpg".into()],
            ..Default::default()
        });
        let uploader = uploader(&backend);

        let entries = uploader
            .upload_batch(&[jpeg("one.jpg"), jpeg("two.jpg"), jpeg("three.jpg")])
            .await;

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].result.as_ref().unwrap().id, "id:res://one.jpg");
        assert!(matches!(entries[1].result, Err(UploadError::Negotiation(_))));
        assert_eq!(entries[1].failed_phase(), Some(UploadPhase::Negotiate));
        assert_eq!(entries[2].result.as_ref().unwrap().id, "id:res://three.jpg");
        assert_eq!(entries[2].index, 2);
        assert_eq!(entries[2].filename, "three.jpg");

        let calls = backend.calls();
        assert!(!calls.contains(&"transfer two.jpg".to_string()));
        let registers: Vec<&String> = calls.iter().filter(|c| c.starts_with("register")).collect();
        assert_eq!(registers, ["register res://one.jpg,res://three.jpg"]);
    }

    #[tokio::test]
    async fn batch_with_transfer_failure_registers_the_rest() {
        let backend = Arc::new(FakeBackend {
            reject_transfer: vec!["one.jpg".into()],
            ..Default::default()
        });
        let uploader = uploader(&backend);

        let entries = uploader
            .upload_batch(&[jpeg("one.jpg"), jpeg("two.jpg")])
            .await;
        assert_eq!(entries[0].failed_phase(), Some(UploadPhase::Transfer));
        assert!(entries[1].is_success());
        assert_eq!(backend.calls().last().unwrap(), "register res://two.jpg");
    }

    #[tokio::test]
    async fn batch_where_everything_fails_never_registers() {
        let backend = Arc::new(FakeBackend {
            reject_negotiation: vec!["one.jpg".into()],
            ..Default::default()
        });
        let uploader = uploader(&backend);

        let entries = uploader.upload_batch(&[jpeg("one.jpg")]).await;
        assert!(!entries[0].is_success());
        assert!(backend.calls().iter().all(|c| !c.starts_with("register")));
    }

    #[tokio::test]
    async fn cancelled_upload_makes_no_calls() {
        let backend = Arc::new(FakeBackend::default());
        let uploader = uploader(&backend);
        uploader.cancel_token().cancel();

        let err = uploader.upload(&jpeg("a.jpg")).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.phase(), UploadPhase::Negotiate);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn cancel_during_transfer_skips_registration() {
        let backend = Arc::new(FakeBackend {
            stall_transfer: true,
            ..Default::default()
        });
        let uploader = uploader(&backend);
        let cancel = uploader.cancel_token();
        let request = jpeg("a.jpg");

        let (result, ()) = tokio::join!(uploader.upload(&request), async {
            backend.transfer_started.notified().await;
            cancel.cancel();
        });

        let err = result.unwrap_err();
        assert!(matches!(err, UploadError::Cancelled(UploadPhase::Transfer)));
        assert_eq!(backend.calls(), ["negotiate a.jpg", "transfer a.jpg"]);
    }

    #[tokio::test]
    async fn batch_registration_failure_marks_every_staged_file() {
        let backend = Arc::new(FakeBackend {
            reject_negotiation: vec!["two.jpg".into()],
            registration_failure: Some(json_response(json!({
                "data": null,
                "errors": [{"message": "Throttled"}]
            }))),
            ..Default::default()
        });
        let uploader = uploader(&backend);

        let entries = uploader
            .upload_batch(&[jpeg("one.jpg"), jpeg("two.jpg"), jpeg("three.jpg")])
            .await;

        for i in [0, 2] {
            match &entries[i].result {
                Err(UploadError::Registration(PlatformError::Registration { messages })) => {
                    assert_eq!(messages, &["Throttled"]);
                }
                other => panic!("unexpected result for entry {i}: {other:?}"),
            }
            assert_eq!(entries[i].failed_phase(), Some(UploadPhase::Register));
        }
        assert!(matches!(entries[1].result, Err(UploadError::Negotiation(_))));

        let registers: Vec<String> = backend
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("register"))
            .collect();
        assert_eq!(registers, ["register res://one.jpg,res://three.jpg"]);
    }

    #[tokio::test]
    async fn batch_registration_server_error_keeps_status() {
        let backend = Arc::new(FakeBackend {
            registration_failure: Some(Response::new(502, "bad gateway")),
            ..Default::default()
        });
        let uploader = uploader(&backend);

        let entries = uploader
            .upload_batch(&[jpeg("one.jpg"), jpeg("two.jpg")])
            .await;
        for entry in &entries {
            match &entry.result {
                Err(UploadError::Registration(PlatformError::Registration { messages })) => {
                    assert_eq!(messages.len(), 1);
                    assert!(messages[0].contains("502"));
                }
                other => panic!("unexpected result for {}: {other:?}", entry.filename),
            }
        }
    }

    #[tokio::test]
    async fn indexed_registration_error_maps_past_skipped_files() {
        let backend = Arc::new(FakeBackend {
            reject_negotiation: vec!["one.jpg".into()],
            reject_registration: vec!["res://three.jpg".into()],
            ..Default::default()
        });
        let uploader = uploader(&backend);

        let entries = uploader
            .upload_batch(&[jpeg("one.jpg"), jpeg("two.jpg"), jpeg("three.jpg")])
            .await;

        assert_eq!(entries[0].failed_phase(), Some(UploadPhase::Negotiate));
        assert_eq!(entries[1].result.as_ref().unwrap().id, "id:res://two.jpg");
        match &entries[2].result {
            Err(UploadError::Registration(PlatformError::Registration { messages })) => {
                assert_eq!(messages, &["files.1.alt: alt text too long"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(entries[2].filename, "three.jpg");
    }

    #[tokio::test]
    async fn events_follow_the_phases() {
        let backend = Arc::new(FakeBackend::default());
        let mut uploader = uploader(&backend);
        let mut events = uploader.take_events().unwrap();
        assert!(uploader.take_events().is_none());

        uploader.upload(&jpeg("a.jpg")).await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        let phase = |phase| UploadEvent::PhaseStarted {
            filename: "a.jpg".into(),
            phase,
        };
        assert_eq!(seen[0], phase(UploadPhase::Negotiate));
        assert!(seen.contains(&phase(UploadPhase::Transfer)));
        assert!(seen.contains(&phase(UploadPhase::Register)));
        assert_eq!(
            seen.last().unwrap(),
            &UploadEvent::Completed {
                filename: "a.jpg".into(),
                resource_id: "id:res://a.jpg".into(),
            }
        );
    }

    #[tokio::test]
    async fn upload_path_reads_file_and_detects_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nrest").unwrap();

        let backend = Arc::new(FakeBackend::default());
        let uploader = uploader(&backend);
        let created = uploader
            .upload_path(&path, Some("A photo".into()))
            .await
            .unwrap();
        assert_eq!(created.id, "id:res://photo.png");

        let transfers = backend.transfers.lock().unwrap();
        let body = String::from_utf8_lossy(&transfers[0].body);
        assert!(body.contains("Content-Type: image/png"));
    }

    #[tokio::test]
    async fn upload_path_missing_file_is_validation_error() {
        let backend = Arc::new(FakeBackend::default());
        let uploader = uploader(&backend);

        let err = uploader
            .upload_path(Path::new("/nonexistent/assetlift/none.jpg"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Validation(ValidationError::Io(_))));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn import_origin_only_registers() {
        let backend = Arc::new(FakeBackend::default());
        let uploader = uploader(&backend);

        let created = uploader
            .import_origin("https://example.com/a.jpg", ResourceClass::Image, None)
            .await
            .unwrap();
        assert_eq!(created.id, "id:https://example.com/a.jpg");
        assert_eq!(backend.calls(), ["register https://example.com/a.jpg"]);
    }

    #[tokio::test]
    async fn import_inline_registers_data_uri() {
        let backend = Arc::new(FakeBackend::default());
        let uploader = uploader(&backend);

        uploader
            .import_inline(b"hello", "text/plain", None)
            .await
            .unwrap();
        assert_eq!(backend.calls(), ["register data:text/plain;base64,aGVsbG8="]);

        let err = uploader
            .import_inline(b"", "text/plain", None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Validation(ValidationError::EmptyAttachment)));
    }
}
