//! CLI argument and command definitions.

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use portcullis_core::config::parse_dev_origin;
use portcullis_core::{BuildMode, Config, E2eMode, GatewayError, GatewaySettings};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "portcullis", version, about = "Security gateway for a desktop content view")]
pub struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run with development policy (dev origin, nonces, dev tools).
    #[arg(long, global = true)]
    pub dev: bool,

    /// Development server origin.
    #[arg(long, global = true, env = "PORTCULLIS_DEV_SERVER_URL")]
    pub dev_origin: Option<String>,

    /// CI mode: hidden windows, zero-delay timers.
    #[arg(long, global = true, env = "CI", value_parser = FalseyValueParser::new())]
    pub ci: bool,

    /// End-to-end harness flavour (`smoke` or `light`).
    #[arg(long, global = true, env = "PORTCULLIS_E2E", value_parser = parse_e2e)]
    pub e2e: Option<E2eMode>,

    /// Packaged output root (defaults to the build-time layout).
    #[arg(long, global = true)]
    pub output_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the navigation or fetch decision for a URL.
    Check {
        url: String,
        #[arg(long, value_enum, default_value_t = IntentKind::TopLevel)]
        kind: IntentKind,
    },

    /// Show whether a permission would be granted.
    Permission {
        name: String,
        #[arg(long, default_value = "app://index.html")]
        origin: String,
    },

    /// Resolve an `app://` URL against the output root.
    Resolve {
        url: String,
        /// Write the response body to stdout instead of a summary.
        #[arg(long)]
        body: bool,
    },

    /// Print the security headers for a main-frame response.
    Headers {
        /// Window the response belongs to (development nonces are per window).
        #[arg(long)]
        window: Option<u32>,
    },

    /// Boot the application on an in-memory host and print what each window loaded.
    Simulate {
        /// Content-initiated navigations to attempt after startup.
        #[arg(long = "navigate")]
        navigate: Vec<String>,
        /// Simulate the main frame landing on the internal error surface.
        #[arg(long)]
        fail_load: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntentKind {
    TopLevel,
    NewWindow,
    Redirect,
    Subresource,
}

fn parse_e2e(value: &str) -> Result<E2eMode, String> {
    E2eMode::parse(value).ok_or_else(|| format!("expected 'smoke' or 'light', got '{value}'"))
}

impl Cli {
    /// Effective settings: flags and environment override the config file.
    pub fn resolve_settings(&self, config: &Config) -> Result<GatewaySettings, GatewayError> {
        let mode = if self.dev {
            BuildMode::Development
        } else {
            config.mode.unwrap_or_else(BuildMode::from_build)
        };

        let mut settings = GatewaySettings::new(mode);
        settings.dev_origin = match self.dev_origin.as_deref() {
            Some(raw) => Some(parse_dev_origin(raw)?),
            None => config.dev_origin_url()?,
        };
        settings.ci = self.ci;
        settings.e2e = self.e2e;
        Ok(settings)
    }
}
