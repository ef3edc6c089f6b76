//! GraphQL platform client.
//!
//! Posts JSON documents through a [`Transport`]. Authentication headers
//! are the transport's concern.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use assetlift_protocol::constants::{
    FILE_CREATE, REQUEST_TIMEOUT, RESOURCE_BY_ID, STAGED_UPLOADS_CREATE,
};
use assetlift_protocol::graphql::{
    FileCreateData, FileCreateVariables, GraphqlRequest, GraphqlResponse, ResourceByIdData,
    ResourceByIdVariables, StagedUploadsCreateData, StagedUploadsCreateVariables,
};
use assetlift_protocol::{CreatedResource, FileDescriptor, StagedTarget};
use assetlift_transport::{BoxFuture, Method, Request, Transport};

use crate::error::PlatformError;
use crate::negotiate::{staged_input, target_from_payload};
use crate::register::{file_create_inputs, split_results};
use crate::{PlatformApi, Registration};

/// Platform endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl PlatformConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// [`PlatformApi`] over GraphQL.
pub struct GraphqlPlatform {
    transport: Arc<dyn Transport>,
    config: PlatformConfig,
}

impl GraphqlPlatform {
    pub fn new(transport: Arc<dyn Transport>, config: PlatformConfig) -> Self {
        Self { transport, config }
    }

    /// Posts one GraphQL document and decodes its `data`.
    async fn execute<V: Serialize, D: DeserializeOwned>(
        &self,
        query: &str,
        variables: V,
    ) -> Result<D, PlatformError> {
        let body = serde_json::to_vec(&GraphqlRequest { query, variables })?;
        let req = Request::new(Method::Post, &self.config.endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(body)
            .timeout(self.config.request_timeout);

        let resp = self.transport.send(req).await?;
        if !resp.is_success() {
            return Err(PlatformError::Api {
                status: resp.status,
                body: resp.text(),
            });
        }

        let parsed: GraphqlResponse<D> = serde_json::from_slice(&resp.body)?;
        if !parsed.errors.is_empty() {
            return Err(PlatformError::Graphql {
                messages: parsed.errors.into_iter().map(|e| e.message).collect(),
            });
        }
        parsed.data.ok_or(PlatformError::MissingData("data"))
    }

    async fn negotiate_target(&self, descriptor: &FileDescriptor) -> Result<StagedTarget, PlatformError> {
        let variables = StagedUploadsCreateVariables {
            input: vec![staged_input(descriptor)],
        };
        let data: StagedUploadsCreateData = self.execute(STAGED_UPLOADS_CREATE, variables).await?;
        let payload = data
            .staged_uploads_create
            .ok_or(PlatformError::MissingData("stagedUploadsCreate"))?;
        let target = target_from_payload(payload)?;

        info!(
            filename = %descriptor.name,
            resource_url = %target.resource_url,
            parameters = target.parameters.len(),
            "staged target allocated"
        );
        Ok(target)
    }

    async fn create_resources(
        &self,
        registrations: &[Registration],
    ) -> Result<Vec<Result<CreatedResource, PlatformError>>, PlatformError> {
        let variables = FileCreateVariables {
            files: file_create_inputs(registrations),
        };
        let data: FileCreateData = self.execute(FILE_CREATE, variables).await?;
        let payload = data
            .file_create
            .ok_or(PlatformError::MissingData("fileCreate"))?;

        let results = split_results(registrations.len(), payload);
        debug!(
            requested = registrations.len(),
            created = results.iter().filter(|r| r.is_ok()).count(),
            "resource creation finished"
        );
        Ok(results)
    }

    async fn lookup_resource(&self, resource_id: &str) -> Result<Option<CreatedResource>, PlatformError> {
        let variables = ResourceByIdVariables {
            id: resource_id.to_string(),
        };
        let data: ResourceByIdData = self.execute(RESOURCE_BY_ID, variables).await?;
        Ok(data.node.map(|n| n.into_resource()))
    }
}

impl PlatformApi for GraphqlPlatform {
    fn negotiate<'a>(
        &'a self,
        descriptor: &'a FileDescriptor,
    ) -> BoxFuture<'a, Result<StagedTarget, PlatformError>> {
        Box::pin(self.negotiate_target(descriptor))
    }

    fn register_batch<'a>(
        &'a self,
        registrations: &'a [Registration],
    ) -> BoxFuture<'a, Result<Vec<Result<CreatedResource, PlatformError>>, PlatformError>> {
        Box::pin(self.create_resources(registrations))
    }

    fn lookup<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<CreatedResource>, PlatformError>> {
        Box::pin(self.lookup_resource(resource_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetlift_protocol::{ResourceClass, ResourceStatus};
    use assetlift_transport::{Response, TransportError};
    use std::sync::Mutex;

    /// Replays scripted responses and records every request.
    struct ScriptedTransport {
        responses: Mutex<Vec<Response>>,
        requests: Mutex<Vec<Request>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Response>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_json(&self, i: usize) -> serde_json::Value {
            serde_json::from_slice(&self.requests.lock().unwrap()[i].body).unwrap()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
            Box::pin(async move {
                self.requests.lock().unwrap().push(request);
                let mut resps = self.responses.lock().unwrap();
                if resps.is_empty() {
                    Ok(Response::new(500, "no scripted response"))
                } else {
                    Ok(resps.remove(0))
                }
            })
        }
    }

    fn platform(transport: Arc<ScriptedTransport>) -> GraphqlPlatform {
        GraphqlPlatform::new(transport, PlatformConfig::new("https://shop.example/api/graphql"))
    }

    #[tokio::test]
    async fn negotiate_sends_descriptor_and_returns_target() {
        let transport = ScriptedTransport::new(vec![Response::new(
            200,
            r#"{"data":{"stagedUploadsCreate":{"stagedTargets":[{"url":"https://storage.example/up",
                "resourceUrl":"res://abc","parameters":[{"name":"policy","value":"p1"},
                {"name":"signature","value":"s1"}]}],"userErrors":[]}}}"#,
        )]);
        let api = platform(transport.clone());

        let descriptor = FileDescriptor::new("a.jpg", "image/jpeg", 17408);
        let target = api.negotiate(&descriptor).await.unwrap();
        assert_eq!(target.resource_url, "res://abc");
        assert_eq!(target.parameters[0], ("policy".into(), "p1".into()));

        {
            let requests = transport.requests.lock().unwrap();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].method, Method::Post);
            assert_eq!(requests[0].url, "https://shop.example/api/graphql");
            assert_eq!(requests[0].header_value("content-type"), Some("application/json"));
        }

        let body = transport.request_json(0);
        assert!(body["query"].as_str().unwrap().contains("stagedUploadsCreate"));
        let input = &body["variables"]["input"][0];
        assert_eq!(input["filename"], "a.jpg");
        assert_eq!(input["mimeType"], "image/jpeg");
        assert_eq!(input["resource"], "IMAGE");
        assert_eq!(input["fileSize"], "17408");
    }

    #[tokio::test]
    async fn negotiate_surfaces_user_errors() {
        let transport = ScriptedTransport::new(vec![Response::new(
            200,
            r#"{"data":{"stagedUploadsCreate":{"stagedTargets":[],
                "userErrors":[{"field":["input","0","fileSize"],"message":"exceeds limit"}]}}}"#,
        )]);
        let api = platform(transport);

        let err = api
            .negotiate(&FileDescriptor::new("big.mp4", "video/mp4", 1 << 40))
            .await
            .unwrap_err();
        assert_eq!(err.messages(), ["input.0.fileSize: exceeds limit"]);
    }

    #[tokio::test]
    async fn top_level_errors_are_graphql_errors() {
        let transport = ScriptedTransport::new(vec![Response::new(
            200,
            r#"{"errors":[{"message":"Throttled"}]}"#,
        )]);
        let api = platform(transport);

        let err = api
            .negotiate(&FileDescriptor::new("a.jpg", "image/jpeg", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Graphql { .. }));
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let transport = ScriptedTransport::new(vec![Response::new(401, "unauthorized")]);
        let api = platform(transport);

        let err = api.lookup("R1").await.unwrap_err();
        match err {
            PlatformError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn register_single_uses_origin_reference() {
        let transport = ScriptedTransport::new(vec![Response::new(
            200,
            r#"{"data":{"fileCreate":{"files":[{"id":"R1","fileStatus":"UPLOADED","image":null}],"userErrors":[]}}}"#,
        )]);
        let api = platform(transport.clone());

        let reg = Registration {
            origin: "res://abc".into(),
            resource_class: ResourceClass::Image,
            alt: Some("front view".into()),
        };
        let created = api.register(&reg).await.unwrap();
        assert_eq!(created.id, "R1");
        assert_eq!(created.status, ResourceStatus::Uploaded);
        assert!(created.delivery_url.is_none());

        let body = transport.request_json(0);
        let file = &body["variables"]["files"][0];
        assert_eq!(file["originalSource"], "res://abc");
        assert_eq!(file["contentType"], "IMAGE");
        assert_eq!(file["alt"], "front view");
    }

    #[tokio::test]
    async fn register_single_user_error() {
        let transport = ScriptedTransport::new(vec![Response::new(
            200,
            r#"{"data":{"fileCreate":{"files":[],"userErrors":[{"field":["files","0","originalSource"],"message":"not found"}]}}}"#,
        )]);
        let api = platform(transport);

        let reg = Registration {
            origin: "res://missing".into(),
            resource_class: ResourceClass::Image,
            alt: None,
        };
        let err = api.register(&reg).await.unwrap_err();
        assert!(matches!(err, PlatformError::Registration { .. }));
    }

    #[tokio::test]
    async fn lookup_returns_delivery_url() {
        let transport = ScriptedTransport::new(vec![
            Response::new(
                200,
                r#"{"data":{"node":{"id":"R1","fileStatus":"READY","image":{"url":"https://cdn.example/a.jpg?v=9","width":10,"height":20}}}}"#,
            ),
            Response::new(200, r#"{"data":{"node":null}}"#),
        ]);
        let api = platform(transport.clone());

        let found = api.lookup("R1").await.unwrap().unwrap();
        assert_eq!(found.delivery_url.as_deref(), Some("https://cdn.example/a.jpg?v=9"));
        assert_eq!(transport.request_json(0)["variables"]["id"], "R1");

        assert!(api.lookup("R2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_json_error() {
        let transport = ScriptedTransport::new(vec![Response::new(200, "<html>")]);
        let api = platform(transport);
        let err = api.lookup("R1").await.unwrap_err();
        assert!(matches!(err, PlatformError::Json(_)));
    }
}
