//! Content Security Policy
//!
//! Ordered CSP construction and serialization.

/// CSP directive names
pub const DEFAULT_SRC: &str = "default-src";
pub const SCRIPT_SRC: &str = "script-src";
pub const STYLE_SRC: &str = "style-src";
pub const IMG_SRC: &str = "img-src";
pub const FONT_SRC: &str = "font-src";
pub const CONNECT_SRC: &str = "connect-src";
pub const MEDIA_SRC: &str = "media-src";
pub const WORKER_SRC: &str = "worker-src";
pub const OBJECT_SRC: &str = "object-src";
pub const FRAME_SRC: &str = "frame-src";
pub const BASE_URI: &str = "base-uri";
pub const FORM_ACTION: &str = "form-action";
pub const FRAME_ANCESTORS: &str = "frame-ancestors";

/// CSP source keywords
pub const SELF: &str = "'self'";
pub const NONE: &str = "'none'";
pub const UNSAFE_INLINE: &str = "'unsafe-inline'";
pub const UNSAFE_EVAL: &str = "'unsafe-eval'";
pub const UNSAFE_HASHES: &str = "'unsafe-hashes'";

/// Keywords that re-enable inline or string-evaluated execution.
pub const INLINE_EXECUTION_KEYWORDS: &[&str] = &[UNSAFE_INLINE, UNSAFE_EVAL, UNSAFE_HASHES];

/// Telemetry ingestion sources granted to `connect-src`.
const TELEMETRY_SOURCES: &[&str] = &["https://*.ingest.sentry.io", "https://*.ingest.us.sentry.io"];

/// A policy as an ordered list of directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSecurityPolicy {
    directives: Vec<(String, Vec<String>)>,
}

impl ContentSecurityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// The strict production policy.
    pub fn baseline() -> Self {
        let mut policy = Self::new();
        policy.set(DEFAULT_SRC, &[SELF]);
        policy.set(SCRIPT_SRC, &[SELF]);
        policy.set(STYLE_SRC, &[SELF]);
        policy.set(IMG_SRC, &[SELF, "data:", "blob:"]);
        policy.set(FONT_SRC, &[SELF, "data:"]);
        policy.set(MEDIA_SRC, &[SELF, "blob:"]);
        policy.set(CONNECT_SRC, &[SELF]);
        policy.add_sources(CONNECT_SRC, TELEMETRY_SOURCES);
        policy.set(WORKER_SRC, &[SELF, "blob:"]);
        policy.set(OBJECT_SRC, &[NONE]);
        policy.set(FRAME_SRC, &[NONE]);
        policy.set(BASE_URI, &[NONE]);
        policy.set(FORM_ACTION, &[NONE]);
        policy.set(FRAME_ANCESTORS, &[NONE]);
        policy
    }

    /// Parse a CSP header value.
    pub fn parse(header: &str) -> Self {
        let mut policy = Self::new();
        for directive_str in header.split(';') {
            let mut parts = directive_str.split_whitespace();
            let Some(name) = parts.next() else {
                continue;
            };
            let values: Vec<&str> = parts.collect();
            policy.set(&name.to_ascii_lowercase(), &values);
        }
        policy
    }

    /// Replace a directive, keeping its position if already present.
    pub fn set(&mut self, directive: &str, sources: &[&str]) {
        let values = sources.iter().map(|s| s.to_string()).collect();
        match self.directives.iter_mut().find(|(name, _)| name == directive) {
            Some((_, existing)) => *existing = values,
            None => self.directives.push((directive.to_string(), values)),
        }
    }

    /// Append sources to a directive, creating it if missing. Duplicates are skipped.
    pub fn add_sources(&mut self, directive: &str, sources: &[&str]) {
        if self.get(directive).is_none() {
            self.set(directive, &[]);
        }
        if let Some((_, existing)) = self.directives.iter_mut().find(|(name, _)| name == directive)
        {
            for source in sources {
                if !existing.iter().any(|s| s == source) {
                    existing.push(source.to_string());
                }
            }
        }
    }

    pub fn get(&self, directive: &str) -> Option<&[String]> {
        self.directives
            .iter()
            .find(|(name, _)| name == directive)
            .map(|(_, values)| values.as_slice())
    }

    /// Whether any directive carries an inline-execution allowance.
    pub fn allows_inline_execution(&self) -> bool {
        self.directives.iter().any(|(_, values)| {
            values
                .iter()
                .any(|v| INLINE_EXECUTION_KEYWORDS.contains(&v.to_ascii_lowercase().as_str()))
        })
    }

    /// Nonce source expression for a raw nonce value.
    pub fn nonce_source(nonce: &str) -> String {
        format!("'nonce-{nonce}'")
    }

    /// Serialize to header
    pub fn serialize(&self) -> String {
        self.directives
            .iter()
            .map(|(name, values)| {
                if values.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, values.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
