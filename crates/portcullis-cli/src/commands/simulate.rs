use super::CommandContext;
use portcullis_core::{LoadFailure, RecordingOpener};
use portcullis_shell::{ContentWindow, HeadlessHost, RECOVERY_DELAY};
use serde::Serialize;
use std::sync::Arc;

const INTERNAL_ERROR_PAGE: &str = "chrome-error://chromewebdata/";

#[derive(Debug, Serialize)]
struct NavigationRecord {
    url: String,
    allowed: bool,
}

#[derive(Debug, Serialize)]
struct WindowRecord {
    id: String,
    visible: bool,
    loads: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    navigations: Vec<NavigationRecord>,
    windows: Vec<WindowRecord>,
    external: Vec<String>,
}

pub async fn run(ctx: &CommandContext, navigate: &[String], fail_load: bool) -> anyhow::Result<()> {
    let host = Arc::new(HeadlessHost::new());
    let opener = Arc::new(RecordingOpener::new());
    let lifecycle = ctx.headless_lifecycle(host.clone(), opener.clone())?;
    let window = lifecycle
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Startup failed: {e}"))?;

    let navigations = navigate
        .iter()
        .map(|url| NavigationRecord {
            url: url.clone(),
            allowed: window.request_navigation(url),
        })
        .collect();

    if fail_load {
        window.on_did_fail_load(&LoadFailure {
            url: INTERNAL_ERROR_PAGE.to_string(),
            error_code: -2,
            description: "ERR_FAILED".to_string(),
            is_main_frame: true,
        });
        tokio::time::sleep(RECOVERY_DELAY * 2).await;
    }

    let windows = lifecycle
        .windows()
        .iter()
        .filter_map(|w| host.window(w.id()))
        .map(|w| WindowRecord {
            id: w.id().to_string(),
            visible: w.is_visible(),
            loads: w.loads(),
        })
        .collect();

    let report = SimulationReport {
        navigations,
        windows,
        external: opener.opened().iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
