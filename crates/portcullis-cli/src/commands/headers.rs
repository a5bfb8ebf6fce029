use super::CommandContext;
use portcullis_core::{HeaderSet, RecordingOpener, ResourceType, ResponseDetails, WindowId};
use portcullis_shell::{start_url, HeadlessHost};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct HeadersReport {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
    headers: BTreeMap<String, String>,
}

/// Headers the session would attach to a main-frame load of the start URL.
pub fn run(ctx: &CommandContext, window: Option<u32>) -> anyhow::Result<()> {
    let lifecycle = ctx.headless_lifecycle(Arc::new(HeadlessHost::new()), Arc::new(RecordingOpener::new()))?;
    let engine = &lifecycle.handlers().headers;
    let window = WindowId(window.unwrap_or(1));
    let url = start_url(&ctx.settings);

    let headers = engine.on_response(&ResponseDetails {
        url: url.clone(),
        resource_type: ResourceType::MainFrame,
        window_id: Some(window),
        headers: HeaderSet::new(),
    });
    let report = HeadersReport {
        url,
        nonce: engine.nonce_for(window),
        headers: headers.to_pairs().into_iter().collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
