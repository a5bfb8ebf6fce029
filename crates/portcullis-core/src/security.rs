//! Runtime security configuration and policy types.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Development origin used when none is configured.
pub const DEFAULT_DEV_ORIGIN: &str = "http://localhost:5173";

/// Build flavour of the running shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    /// Loads from the development server; dev tooling and nonces enabled.
    Development,
    /// Loads packaged content from the `app://` scheme.
    #[default]
    Production,
}

impl BuildMode {
    /// Mode matching how this binary was compiled.
    pub fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// End-to-end harness flavour, appended to the initial load as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum E2eMode {
    Smoke,
    Light,
}

impl E2eMode {
    /// Parse the harness flag value (`smoke` or `light`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "smoke" | "1" | "true" => Some(Self::Smoke),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Query string appended to the start URL.
    pub fn query(self) -> &'static str {
        match self {
            Self::Smoke => "auto-start=1&e2e-smoke=1",
            Self::Light => "auto-start=1&e2e-light=1",
        }
    }
}

/// Identifier of a content window, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Immutable window-creation security flags.
///
/// Fields are private: the only way to obtain a value is [`SecurityPolicyConfig::for_mode`],
/// so no caller-supplied options can flip a critical flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecurityPolicyConfig {
    context_isolation: bool,
    node_integration: bool,
    sandbox: bool,
    web_security: bool,
    allow_running_insecure_content: bool,
    dev_tools: bool,
}

impl SecurityPolicyConfig {
    /// Names of the six flags that requested options may never touch.
    pub const CRITICAL_FLAGS: [&'static str; 6] = [
        "contextIsolation",
        "nodeIntegration",
        "sandbox",
        "webSecurity",
        "allowRunningInsecureContent",
        "devTools",
    ];

    pub fn for_mode(mode: BuildMode) -> Self {
        Self {
            context_isolation: true,
            node_integration: false,
            sandbox: true,
            web_security: true,
            allow_running_insecure_content: false,
            dev_tools: mode.is_development(),
        }
    }

    pub fn context_isolation(&self) -> bool {
        self.context_isolation
    }

    pub fn node_integration(&self) -> bool {
        self.node_integration
    }

    pub fn sandbox(&self) -> bool {
        self.sandbox
    }

    pub fn web_security(&self) -> bool {
        self.web_security
    }

    pub fn allow_running_insecure_content(&self) -> bool {
        self.allow_running_insecure_content
    }

    pub fn dev_tools(&self) -> bool {
        self.dev_tools
    }

    /// Whether `name` is one of the critical flags (case-insensitive, `_`/`-` tolerant).
    pub fn is_critical_flag(name: &str) -> bool {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::CRITICAL_FLAGS
            .iter()
            .any(|flag| flag.to_ascii_lowercase() == normalized)
    }
}

/// Effective runtime options after CLI/config/environment resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Build flavour.
    pub mode: BuildMode,
    /// Development server origin; only honoured in development.
    pub dev_origin: Option<Url>,
    /// CI/test mode: hidden windows and zero-delay timers.
    pub ci: bool,
    /// End-to-end harness flavour.
    pub e2e: Option<E2eMode>,
}

impl GatewaySettings {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            dev_origin: None,
            ci: false,
            e2e: None,
        }
    }

    /// Development origin in effect, falling back to [`DEFAULT_DEV_ORIGIN`].
    ///
    /// Always `None` in production.
    pub fn effective_dev_origin(&self) -> Option<Url> {
        if !self.mode.is_development() {
            return None;
        }
        self.dev_origin
            .clone()
            .or_else(|| Url::parse(DEFAULT_DEV_ORIGIN).ok())
    }
}
