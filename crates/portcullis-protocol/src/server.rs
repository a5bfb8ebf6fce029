//! The `app://` resource server.
//!
//! Resolution order:
//! 1. `__svc/` pathnames dispatch to a service route
//! 2. everything else is a file under the output root (legacy `bundle/` prefix stripped)
//!
//! [`ProtocolResourceServer::resolve`] never fails: errors and panics become
//! status responses at this boundary.

use crate::error::ProtocolError;
use crate::path_guard::resolve_contained;
use crate::request::ProtocolRequest;
use crate::response::ProtocolResponse;
use crate::routes::{RouteRegistry, SERVICE_PREFIX};
use futures::FutureExt;
use portcullis_core::{HeaderPolicyEngine, WindowId};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Document served for an empty pathname.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Prefix older builds used for packaged assets.
pub const LEGACY_PREFIX: &str = "bundle/";

/// Stateless, re-entrant resolver for the packaged-resource scheme.
#[derive(Clone)]
pub struct ProtocolResourceServer {
    output_root: PathBuf,
    routes: RouteRegistry,
    headers: Arc<HeaderPolicyEngine>,
}

impl ProtocolResourceServer {
    pub fn new(
        output_root: impl Into<PathBuf>,
        routes: RouteRegistry,
        headers: Arc<HeaderPolicyEngine>,
    ) -> Self {
        Self {
            output_root: output_root.into(),
            routes,
            headers,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Resolve a request URL to a response.
    pub async fn resolve(&self, request_url: &str) -> ProtocolResponse {
        self.resolve_for(None, request_url).await
    }

    /// Resolve on behalf of a window, so development nonces line up with its load.
    pub async fn resolve_for(&self, window: Option<WindowId>, request_url: &str) -> ProtocolResponse {
        let outcome = AssertUnwindSafe(self.try_resolve(request_url))
            .catch_unwind()
            .await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                match err.status() {
                    404 => tracing::warn!(url = request_url, error = %err, "protocol resolution failed"),
                    _ => tracing::debug!(url = request_url, error = %err, "service route rejected request"),
                }
                ProtocolResponse::empty(err.status())
            }
            Err(_) => {
                tracing::error!(url = request_url, "protocol resolver panicked");
                ProtocolResponse::not_found()
            }
        };

        response.with_headers(&self.headers.security_headers(window))
    }

    async fn try_resolve(&self, request_url: &str) -> Result<ProtocolResponse, ProtocolError> {
        let request = ProtocolRequest::parse(request_url)?;

        if let Some(route) = request.pathname.strip_prefix(SERVICE_PREFIX) {
            return self.routes.dispatch(route, &request.query).await;
        }

        let relative = file_relative_path(&request.pathname);
        let path = resolve_contained(relative, &self.output_root).await?;
        let file = tokio::fs::File::open(&path).await?;
        if !file.metadata().await?.is_file() {
            return Err(ProtocolError::NotFound(relative.to_string()));
        }

        tracing::trace!(path = %path.display(), "serving packaged file");
        Ok(ProtocolResponse::file(&path, file))
    }
}

/// Map a pathname to the file path under the output root.
pub fn file_relative_path(pathname: &str) -> &str {
    let trimmed = pathname.trim_start_matches('/');
    let stripped = trimmed
        .strip_prefix(LEGACY_PREFIX)
        .or_else(|| (trimmed == LEGACY_PREFIX.trim_end_matches('/')).then_some(""))
        .unwrap_or(trimmed);
    if stripped.is_empty() {
        DEFAULT_DOCUMENT
    } else {
        stripped
    }
}
