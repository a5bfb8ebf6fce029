use super::CommandContext;
use portcullis_core::RecordingOpener;
use portcullis_shell::HeadlessHost;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct ResolveReport {
    url: String,
    status: u16,
    headers: BTreeMap<String, String>,
    bytes: usize,
}

pub async fn run(ctx: &CommandContext, url: &str, body: bool) -> anyhow::Result<()> {
    let lifecycle = ctx.headless_lifecycle(Arc::new(HeadlessHost::new()), Arc::new(RecordingOpener::new()))?;
    let response = lifecycle.handlers().protocol.resolve(url).await;
    let status = response.status;
    let headers = response.headers.clone();
    let bytes = response.into_bytes().await?;

    if body {
        std::io::stdout().write_all(&bytes)?;
        return Ok(());
    }

    let report = ResolveReport {
        url: url.to_string(),
        status,
        headers: headers.to_pairs().into_iter().collect(),
        bytes: bytes.len(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
