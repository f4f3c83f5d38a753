use async_trait::async_trait;
use prost_reflect::{DescriptorPool, MethodDescriptor};

use crate::error::TransportError;

/// Resolves a `package.Service/Method` (or `/Service/Method`) symbol to its
/// `MethodDescriptor`, the same seam grpcurl-core's `DescriptorSource`
/// trait provides so invocation logic doesn't care whether descriptors came
/// from a file or from server reflection.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    async fn resolve_method(&self, full_method: &str) -> Result<MethodDescriptor, TransportError>;
}

fn split_method(full_method: &str) -> Result<(&str, &str), TransportError> {
    let trimmed = full_method.trim_start_matches('/');
    trimmed
        .rsplit_once('/')
        .ok_or_else(|| TransportError::Descriptor(format!("{full_method} is not package.Service/Method")))
}

/// Resolves methods from a `FileDescriptorSet` loaded from disk — the
/// `@grpc-proto` directive's case, where a precompiled descriptor set
/// accompanies the document instead of relying on server reflection.
pub struct FileDescriptorSource {
    pool: DescriptorPool,
}

impl FileDescriptorSource {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        let pool = DescriptorPool::decode(bytes).map_err(|e| TransportError::Descriptor(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn from_file(path: &str) -> Result<Self, TransportError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| TransportError::Descriptor(format!("{path}: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

#[async_trait]
impl DescriptorSource for FileDescriptorSource {
    async fn resolve_method(&self, full_method: &str) -> Result<MethodDescriptor, TransportError> {
        let (service, method) = split_method(full_method)?;
        let svc = self
            .pool
            .get_service_by_name(service)
            .ok_or_else(|| TransportError::Descriptor(format!("unknown service {service}")))?;
        svc.methods()
            .find(|m| m.name() == method)
            .ok_or_else(|| TransportError::Descriptor(format!("unknown method {method} on {service}")))
    }
}

/// Resolves methods via the server's own reflection service (`@grpc-reflection`).
///
/// Not implemented in this pass: a full client needs the
/// `grpc.reflection.v1alpha.ServerReflection` bidi-streaming RPC wired up
/// against `tonic-reflection`'s generated client, which isn't in this
/// crate's dependency set yet. Calling it returns `TransportError::Unsupported`
/// rather than silently falling back to something incorrect.
pub struct ReflectionDescriptorSource;

#[async_trait]
impl DescriptorSource for ReflectionDescriptorSource {
    async fn resolve_method(&self, _full_method: &str) -> Result<MethodDescriptor, TransportError> {
        Err(TransportError::Unsupported(
            "server reflection descriptor resolution is not implemented; supply @grpc-proto instead".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_leading_slash_form() {
        let (service, method) = split_method("/pkg.Greeter/SayHello").unwrap();
        assert_eq!(service, "pkg.Greeter");
        assert_eq!(method, "SayHello");
    }

    #[test]
    fn splits_bare_form() {
        let (service, method) = split_method("pkg.Greeter/SayHello").unwrap();
        assert_eq!(service, "pkg.Greeter");
        assert_eq!(method, "SayHello");
    }

    #[test]
    fn rejects_missing_slash() {
        assert!(split_method("NoSlashHere").is_err());
    }
}
