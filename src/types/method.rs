//! Method names, method descriptors and the per-RPC label tuple.

use super::RpcShape;

/// Service and method label used when a full method name is malformed.
pub const UNKNOWN_NAME: &str = "unknown";

/// Split a full method name (`/pkg.Service/Method`) into service and method.
///
/// The leading slash is optional. Names without a separator map to
/// `("unknown", "unknown")` so that garbage never becomes a label value.
pub fn split_method_name(full_method: &str) -> (&str, &str) {
    let trimmed = full_method.strip_prefix('/').unwrap_or(full_method);
    match trimmed.split_once('/') {
        Some((service, method)) => (service, method),
        None => (UNKNOWN_NAME, UNKNOWN_NAME),
    }
}

/// The label tuple shared by every event of one RPC.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RpcLabels {
    pub shape: RpcShape,
    pub service: String,
    pub method: String,
}

impl RpcLabels {
    pub fn new(shape: RpcShape, full_method: &str) -> Self {
        let (service, method) = split_method_name(full_method);
        Self {
            shape,
            service: service.to_owned(),
            method: method.to_owned(),
        }
    }

    /// Label values for started and message counters, in label order.
    pub(crate) fn values(&self) -> [&str; 3] {
        [self.shape.as_str(), &self.service, &self.method]
    }
}

/// One method of a registered service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// Bare method name, e.g. `SayHello`.
    pub name: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

impl MethodInfo {
    pub fn unary(name: impl Into<String>) -> Self {
        Self::with_flags(name, false, false)
    }

    pub fn client_streaming(name: impl Into<String>) -> Self {
        Self::with_flags(name, true, false)
    }

    pub fn server_streaming(name: impl Into<String>) -> Self {
        Self::with_flags(name, false, true)
    }

    pub fn bidi_streaming(name: impl Into<String>) -> Self {
        Self::with_flags(name, true, true)
    }

    fn with_flags(name: impl Into<String>, client_streaming: bool, server_streaming: bool) -> Self {
        Self {
            name: name.into(),
            client_streaming,
            server_streaming,
        }
    }

    pub fn shape(&self) -> RpcShape {
        RpcShape::from_flags(self.client_streaming, self.server_streaming)
    }
}

/// A registered service and its methods.
///
/// ```rust
/// # use rpcmon::types::ServiceInfo;
/// let service = ServiceInfo::new("pkg.TestService")
///     .unary("PingEmpty")
///     .server_streaming("PingList");
/// assert_eq!(service.methods.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Fully qualified service name, e.g. `pkg.Greeter`.
    pub name: String,
    pub methods: Vec<MethodInfo>,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Add a method descriptor.
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn unary(self, name: impl Into<String>) -> Self {
        self.method(MethodInfo::unary(name))
    }

    pub fn client_streaming(self, name: impl Into<String>) -> Self {
        self.method(MethodInfo::client_streaming(name))
    }

    pub fn server_streaming(self, name: impl Into<String>) -> Self {
        self.method(MethodInfo::server_streaming(name))
    }

    pub fn bidi_streaming(self, name: impl Into<String>) -> Self {
        self.method(MethodInfo::bidi_streaming(name))
    }
}
