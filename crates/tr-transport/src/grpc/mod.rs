mod codec;
mod descriptor;

pub use descriptor::{DescriptorSource, FileDescriptorSource, ReflectionDescriptorSource};

use chrono::Utc;
use prost_reflect::DynamicMessage;
use tonic::client::Grpc;
use tonic::transport::Channel;
use tr_document::{GrpcRequest, GrpcStreaming, PhaseKind, PhaseMeta, Response, ResponseKind};
use tr_trace::Recorder;

use crate::error::TransportError;
use codec::DynamicCodec;

/// Executes a unary gRPC call against a dynamically resolved method (spec
/// §4.5.2). Client-streaming and bidi calls are accepted at the document
/// level (`GrpcStreaming`) but this pass only drives the unary and
/// server-streaming shapes through to completion; client-stream/bidi return
/// `TransportError::Unsupported` until a scripted multi-message send path
/// is wired up in `tr-scripts`.
pub struct GrpcExecutor;

impl GrpcExecutor {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(
        &self,
        req: &GrpcRequest,
        source: &dyn DescriptorSource,
        recorder: &mut Recorder,
    ) -> Result<Response, TransportError> {
        let start = Utc::now();
        recorder.start(PhaseKind::Connect, start);

        let full_method = req
            .full_method
            .as_deref()
            .ok_or_else(|| TransportError::Descriptor("request has no method set".to_string()))?;
        let method_desc = source.resolve_method(full_method).await?;

        let channel = Channel::from_shared(req.target.clone())
            .map_err(|e| TransportError::Descriptor(format!("invalid target {}: {e}", req.target)))?
            .connect()
            .await?;
        recorder.end(PhaseKind::Connect, Utc::now(), PhaseMeta::default(), None);

        let request_desc = method_desc.input();
        let message = DynamicMessage::deserialize(request_desc, &mut serde_json::Deserializer::from_str(&req.message_json))
            .map_err(|e| TransportError::InvalidMessage(e.to_string()))?;

        let mut client = Grpc::new(channel);
        client.ready().await.map_err(|e| TransportError::Descriptor(e.to_string()))?;

        let path = format!(
            "/{}/{}",
            method_desc.parent_service().full_name(),
            method_desc.name()
        )
        .parse()
        .map_err(|e: http::uri::InvalidUri| TransportError::Descriptor(e.to_string()))?;

        let mut metadata = tonic::metadata::MetadataMap::new();
        for (name, value) in req.metadata.iter() {
            if let (Ok(key), Ok(val)) = (
                tonic::metadata::MetadataKey::from_bytes(name.as_bytes()),
                tonic::metadata::MetadataValue::try_from(value.as_str()),
            ) {
                metadata.insert(key, val);
            }
        }

        recorder.start(PhaseKind::Transfer, Utc::now());

        let codec = DynamicCodec::new(method_desc.output());
        let tonic_request = tonic::Request::from_parts(metadata, tonic::Extensions::default(), message);

        let (body, status_code, status_text) = match req.streaming {
            GrpcStreaming::Unary => {
                let response = client.unary(tonic_request, path, codec).await?;
                let msg = response.into_inner();
                (
                    serde_json::to_vec(&msg).map_err(|e| TransportError::InvalidMessage(e.to_string()))?,
                    0u32,
                    "OK".to_string(),
                )
            }
            GrpcStreaming::ServerStream => {
                use futures_util::StreamExt;
                let response = client
                    .server_streaming(tonic_request, path, codec)
                    .await?;
                let mut stream = response.into_inner();
                let mut messages = Vec::new();
                while let Some(msg) = stream.next().await {
                    messages.push(msg?);
                }
                (
                    serde_json::to_vec(&messages).map_err(|e| TransportError::InvalidMessage(e.to_string()))?,
                    0u32,
                    "OK".to_string(),
                )
            }
            GrpcStreaming::ClientStream | GrpcStreaming::Bidi => {
                return Err(TransportError::Unsupported(
                    "client-streaming/bidi gRPC calls require a scripted send loop, not yet wired up".to_string(),
                ));
            }
        };

        let end = Utc::now();
        recorder.end(PhaseKind::Transfer, end, PhaseMeta::default(), None);

        Ok(Response {
            kind: ResponseKind::Grpc,
            status_code,
            status_text,
            headers: tr_document::HeaderMultiMap::new(),
            trailers: tr_document::HeaderMultiMap::new(),
            content_type: Some("application/grpc+proto".to_string()),
            wire_content_type: None,
            body,
            wire: None,
            duration: (end - start).to_std().unwrap_or_default(),
            url: req.target.clone(),
            error: None,
        })
    }
}

impl Default for GrpcExecutor {
    fn default() -> Self {
        Self::new()
    }
}
