//! Subcommand implementations.

pub mod check;
pub mod headers;
pub mod permission;
pub mod resolve;
pub mod simulate;

use portcullis_core::{Config, ExternalOpener, GatewaySettings, RecordingOpener};
use portcullis_shell::{ApplicationLifecycle, HeadlessHost};
use std::path::PathBuf;
use std::sync::Arc;

/// Inputs shared by every subcommand.
pub struct CommandContext {
    pub settings: GatewaySettings,
    pub config: Config,
    pub output_root: Option<PathBuf>,
}

impl CommandContext {
    /// Lifecycle on an in-memory host. External hand-offs are recorded, never performed.
    pub fn headless_lifecycle(
        &self,
        host: Arc<HeadlessHost>,
        opener: Arc<RecordingOpener>,
    ) -> anyhow::Result<ApplicationLifecycle> {
        let mut builder = ApplicationLifecycle::builder(self.settings.clone());
        if let Some(root) = &self.output_root {
            builder = builder.output_root(root.clone());
        }
        let opener: Arc<dyn ExternalOpener> = opener;
        let lifecycle = builder
            .config(&self.config)
            .opener(opener)
            .build(host)
            .map_err(|e| anyhow::anyhow!("Failed to set up gateway: {e}"))?;
        Ok(lifecycle)
    }
}
