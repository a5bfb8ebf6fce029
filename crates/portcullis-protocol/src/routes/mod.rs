//! Internal service routes served under the reserved `__svc/` prefix.

mod log_sink;
mod telemetry;

pub use log_sink::{LogSinkRoute, LOG_SINK_FILES};
pub use telemetry::TelemetryRoute;

use crate::error::ProtocolError;
use crate::request::QueryParams;
use crate::response::ProtocolResponse;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Reserved pathname prefix for service routes.
pub const SERVICE_PREFIX: &str = "__svc/";

/// A route that performs an action instead of returning a file.
#[async_trait]
pub trait ServiceRoute: Send + Sync {
    /// Route name after the prefix (e.g. "telemetry").
    fn name(&self) -> &str;

    async fn handle(&self, query: &QueryParams) -> Result<ProtocolResponse, ProtocolError>;
}

// Compile-time check: ServiceRoute must be object-safe
const _: () = {
    fn _assert_object_safe(_: &dyn ServiceRoute) {}
};

/// Registry of service routes, keyed by name.
#[derive(Clone)]
pub struct RouteRegistry {
    routes: HashMap<String, Arc<dyn ServiceRoute>>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// The two production routes: telemetry sink and log sink.
    pub fn with_defaults(log_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TelemetryRoute));
        registry.register(Arc::new(LogSinkRoute::new(log_dir)));
        registry
    }

    /// Register a route. Replaces any existing route with the same name.
    pub fn register(&mut self, route: Arc<dyn ServiceRoute>) {
        self.routes.insert(route.name().to_string(), route);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ServiceRoute>> {
        self.routes.get(name).cloned()
    }

    /// Dispatch `route` (the pathname with the prefix stripped).
    pub async fn dispatch(
        &self,
        route: &str,
        query: &QueryParams,
    ) -> Result<ProtocolResponse, ProtocolError> {
        let handler = self
            .get(route.trim_end_matches('/'))
            .ok_or_else(|| ProtocolError::NotFound(format!("{SERVICE_PREFIX}{route}")))?;
        handler.handle(query).await
    }
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::new()
    }
}
