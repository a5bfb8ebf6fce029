//! Security response headers applied to every session response.
//!
//! In development builds a fresh CSP nonce is minted on each main-frame
//! response of a window and reused by that load's subresources, so the header
//! and the nonce injected into dynamically created tags always agree.

use crate::csp::{ContentSecurityPolicy, CONNECT_SRC, IMG_SRC, SCRIPT_SRC, STYLE_SRC};
use crate::predicates::NavigationPolicy;
use crate::security::WindowId;
use crate::subresource::ResourceType;
use base64::Engine;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

pub const CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
pub const CROSS_ORIGIN_OPENER_POLICY: &str = "Cross-Origin-Opener-Policy";
pub const CROSS_ORIGIN_EMBEDDER_POLICY: &str = "Cross-Origin-Embedder-Policy";
pub const CROSS_ORIGIN_RESOURCE_POLICY: &str = "Cross-Origin-Resource-Policy";
pub const PERMISSIONS_POLICY: &str = "Permissions-Policy";

const PERMISSIONS_POLICY_VALUE: &str =
    "geolocation=(), microphone=(), camera=(), notifications=()";

/// Header name to values. Lookups ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, Vec<String>>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_for(&self, name: &str) -> Option<String> {
        self.entries
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Replace every value of `name` (any casing) with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.remove(name);
        self.entries.insert(name.to_string(), vec![value.into()]);
    }

    /// Add a value to `name`, keeping existing ones.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let key = self.key_for(name).unwrap_or_else(|| name.to_string());
        self.entries.entry(key).or_default().push(value.into());
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.key_for(name)
            .and_then(|k| self.entries.get(&k))
            .map(Vec::as_slice)
    }

    /// First value of `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.key_for(name).and_then(|k| self.entries.remove(&k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Flatten into `(name, value)` pairs.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.clone(), v.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of CSP nonces.
pub trait NonceSource: Send + Sync {
    fn generate(&self) -> String;
}

/// 128 random bits from the thread RNG, base64-encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn generate(&self) -> String {
        let bytes: [u8; 16] = rand::random();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }
}

/// Deterministic nonces (`<prefix>0`, `<prefix>1`, ...) for tests.
#[derive(Debug, Default)]
pub struct FixedNonce {
    prefix: String,
    counter: std::sync::atomic::AtomicU64,
}

impl FixedNonce {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

impl NonceSource for FixedNonce {
    fn generate(&self) -> String {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}

/// A response passing through the session.
#[derive(Debug, Clone)]
pub struct ResponseDetails {
    pub url: String,
    pub resource_type: ResourceType,
    pub window_id: Option<WindowId>,
    pub headers: HeaderSet,
}

pub struct HeaderPolicyEngine {
    policy: NavigationPolicy,
    nonce_source: Arc<dyn NonceSource>,
    nonces: Mutex<HashMap<WindowId, String>>,
}

impl HeaderPolicyEngine {
    pub fn new(policy: NavigationPolicy, nonce_source: Arc<dyn NonceSource>) -> Self {
        Self {
            policy,
            nonce_source,
            nonces: Mutex::new(HashMap::new()),
        }
    }

    /// Upstream headers with every security header forced to policy.
    pub fn on_response(&self, details: &ResponseDetails) -> HeaderSet {
        let nonce = if self.policy.mode().is_development() {
            details
                .window_id
                .map(|window| self.nonce_for_load(window, details.resource_type.is_top_level()))
        } else {
            None
        };

        let mut headers = details.headers.clone();
        self.apply(&mut headers, nonce.as_deref());
        headers
    }

    /// Security headers for a response the gateway produces itself.
    pub fn security_headers(&self, window: Option<WindowId>) -> HeaderSet {
        let nonce = if self.policy.mode().is_development() {
            window.and_then(|w| self.nonce_for(w))
        } else {
            None
        };
        let mut headers = HeaderSet::new();
        self.apply(&mut headers, nonce.as_deref());
        headers
    }

    /// Nonce of the window's current load, for tag injection. `None` in production.
    pub fn nonce_for(&self, window: WindowId) -> Option<String> {
        self.lock_nonces().get(&window).cloned()
    }

    /// Drop a closed window's nonce.
    pub fn forget_window(&self, window: WindowId) {
        self.lock_nonces().remove(&window);
    }

    /// The policy string for an optional nonce.
    pub fn content_security_policy(&self, nonce: Option<&str>) -> String {
        let mut csp = ContentSecurityPolicy::baseline();
        if self.policy.mode().is_development() {
            let mut dev_sources: Vec<String> = Vec::new();
            if let Some(nonce) = nonce {
                dev_sources.push(ContentSecurityPolicy::nonce_source(nonce));
            }
            if let Some(origin) = self.policy.dev_origin() {
                dev_sources.push(origin.origin().ascii_serialization());
            }
            let dev_refs: Vec<&str> = dev_sources.iter().map(String::as_str).collect();
            csp.add_sources(SCRIPT_SRC, &dev_refs);
            csp.add_sources(STYLE_SRC, &dev_refs);
            if let Some(origin) = self.policy.dev_origin() {
                let serialized = origin.origin().ascii_serialization();
                csp.add_sources(IMG_SRC, &[serialized.as_str()]);
                csp.add_sources(
                    CONNECT_SRC,
                    &[serialized.as_str(), "ws://localhost:*", "ws://127.0.0.1:*"],
                );
            }
        }
        csp.serialize()
    }

    fn apply(&self, headers: &mut HeaderSet, nonce: Option<&str>) {
        headers.set(CONTENT_SECURITY_POLICY, self.content_security_policy(nonce));
        headers.set(CROSS_ORIGIN_OPENER_POLICY, "same-origin");
        headers.set(CROSS_ORIGIN_EMBEDDER_POLICY, "require-corp");
        headers.set(CROSS_ORIGIN_RESOURCE_POLICY, "same-origin");
        headers.set(PERMISSIONS_POLICY, PERMISSIONS_POLICY_VALUE);
    }

    fn nonce_for_load(&self, window: WindowId, new_load: bool) -> String {
        let mut nonces = self.lock_nonces();
        if !new_load {
            if let Some(existing) = nonces.get(&window) {
                return existing.clone();
            }
        }
        let nonce = self.nonce_source.generate();
        tracing::trace!(%window, "minted csp nonce");
        nonces.insert(window, nonce.clone());
        nonce
    }

    fn lock_nonces(&self) -> std::sync::MutexGuard<'_, HashMap<WindowId, String>> {
        // The map holds plain strings; a poisoned guard is still consistent.
        self.nonces.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for HeaderPolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderPolicyEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
