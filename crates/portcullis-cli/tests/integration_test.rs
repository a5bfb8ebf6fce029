//! Integration tests for portcullis.
//!
//! These drive the whole gateway through the in-memory host: lifecycle,
//! session handlers, windows and timers wired together as in production.

use portcullis_core::{
    BuildMode, FetchDecision, FetchRequest, FixedNonce, GatewaySettings, LoadFailure,
    PermissionGate, PermissionRequest, RecordingOpener, ResourceType, WindowOpenResponse,
};
use portcullis_core::csp::INLINE_EXECUTION_KEYWORDS;
use portcullis_shell::{
    ApplicationLifecycle, ContentWindow, HeadlessHost, HostRuntime, BASELINE_DOCUMENT,
    RECOVERY_DELAY,
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    log_dir: std::path::PathBuf,
    host: Arc<HeadlessHost>,
    opener: Arc<RecordingOpener>,
    app: ApplicationLifecycle,
}

fn harness(mode: BuildMode) -> Harness {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("dist");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("index.html"), "<!doctype html><title>app</title>").unwrap();
    fs::write(root.join("preload.js"), "").unwrap();
    let log_dir = dir.path().join("logs");

    let host = Arc::new(HeadlessHost::new());
    let opener = Arc::new(RecordingOpener::new());
    let app = ApplicationLifecycle::builder(GatewaySettings::new(mode))
        .output_root(&root)
        .log_dir(&log_dir)
        .opener(opener.clone())
        .nonce_source(Arc::new(FixedNonce::new("test-nonce-")))
        .build(host.clone())
        .unwrap();

    Harness {
        _dir: dir,
        log_dir,
        host,
        opener,
        app,
    }
}

const HOSTILE_URLS: &[&str] = &[
    "https://example.com/",
    "http://evil.test/phish",
    "https://github.com/owner/repo",
    "javascript:alert(1)",
    "ftp://files.example/x",
    "chrome://settings",
    "about:blank",
    "not a url",
    "",
];

#[tokio::test]
async fn test_disallowed_top_level_navigation_keeps_current_url() {
    let h = harness(BuildMode::Production);
    let window = h.app.start().await.unwrap();
    let content = h.host.window(window.id()).unwrap();

    for url in HOSTILE_URLS {
        assert!(!window.request_navigation(url), "{url}");
        assert!(!window.on_will_redirect(url), "{url}");
        assert_eq!(content.current_url().as_deref(), Some("app://index.html"), "{url}");
    }

    // Only http(s) targets reach the system browser.
    for opened in h.opener.opened() {
        assert!(matches!(opened.scheme(), "http" | "https"), "{opened}");
    }
}

#[tokio::test]
async fn test_development_allows_dev_origin_and_loopback() {
    let h = harness(BuildMode::Development);
    let window = h.app.start().await.unwrap();
    let content = h.host.window(window.id()).unwrap();
    assert_eq!(content.current_url().as_deref(), Some("http://localhost:5173/"));

    assert!(window.request_navigation("http://127.0.0.1:8080/debug"));
    assert!(!window.request_navigation("https://example.com/"));
    assert_eq!(content.current_url().as_deref(), Some("http://127.0.0.1:8080/debug"));
}

#[tokio::test]
async fn test_new_window_never_creates_a_view() {
    let h = harness(BuildMode::Production);
    let window = h.app.start().await.unwrap();
    let before = h.host.window_count();

    for url in HOSTILE_URLS.iter().chain(["app://index.html", "https://discord.gg/invite"].iter()) {
        assert_eq!(window.on_window_open(url), WindowOpenResponse::Deny);
    }
    assert_eq!(h.host.window_count(), before);

    let opened: Vec<String> = h.opener.opened().iter().map(ToString::to_string).collect();
    assert_eq!(
        opened,
        vec!["https://github.com/owner/repo".to_string(), "https://discord.gg/invite".to_string()]
    );
}

#[tokio::test]
async fn test_permissions_default_deny() {
    let h = harness(BuildMode::Production);
    h.app.start().await.unwrap();
    let gate: PermissionGate = h.app.handlers().permissions;

    for name in ["geolocation", "camera", "microphone", "notifications", "clipboard-write", "midi"] {
        for origin in ["app://index.html", "https://github.com", "null"] {
            assert!(!gate.check(name, origin));
            assert!(!gate.request(PermissionRequest::new(name, origin)));
        }
    }
    assert!(gate.check("clipboard-read", "app://index.html"));
    assert!(gate.request(PermissionRequest::new("clipboard-sanitized-write", "app://index.html")));
}

#[tokio::test]
async fn test_production_csp_has_no_inline_execution() {
    let h = harness(BuildMode::Production);
    let window = h.app.start().await.unwrap();

    let response = h.app.handlers().protocol.resolve_for(Some(window.id()), "app://index.html").await;
    let csp = response.headers.first("Content-Security-Policy").unwrap().to_string();
    for keyword in INLINE_EXECUTION_KEYWORDS {
        assert!(!csp.contains(keyword), "{keyword} in {csp}");
    }
    assert!(!csp.contains("'nonce-"));
    assert_eq!(response.headers.first("Cross-Origin-Opener-Policy"), Some("same-origin"));
}

#[tokio::test]
async fn test_subresource_filter_on_session() {
    let h = harness(BuildMode::Production);
    h.app.start().await.unwrap();
    let filter = h.app.handlers().subresources.clone();

    for url in ["https://cdn.example.com/lib.js", "http://localhost:5173/x.js", "wss://evil.test/socket"] {
        assert_eq!(filter.before_fetch(&FetchRequest::new(url, ResourceType::Script)), FetchDecision::Cancel, "{url}");
        assert_eq!(filter.before_fetch(&FetchRequest::new(url, ResourceType::MainFrame)), FetchDecision::Allow, "{url}");
    }
    assert_eq!(
        filter.before_fetch(&FetchRequest::new("app://assets/main.js", ResourceType::Script)),
        FetchDecision::Allow
    );
}

#[tokio::test]
async fn test_legacy_prefix_and_service_routes() {
    let h = harness(BuildMode::Production);
    h.app.start().await.unwrap();
    let protocol = h.app.handlers().protocol.clone();

    let plain = protocol.resolve("app://index.html").await;
    let legacy = protocol.resolve("app://bundle/index.html").await;
    assert_eq!(plain.status, 200);
    assert_eq!(plain.status, legacy.status);
    assert_eq!(plain.headers, legacy.headers);
    assert_eq!(plain.into_bytes().await.unwrap(), legacy.into_bytes().await.unwrap());

    let rejected = protocol.resolve("app://__svc/log?file=unexpected-name&line=x").await;
    assert_eq!(rejected.status, 400);

    let accepted = protocol
        .resolve("app://__svc/log?file=sentry-init-renderer-latest&line=hello")
        .await;
    assert_eq!(accepted.status, 200);
    let log = fs::read_to_string(h.log_dir.join("sentry-init-renderer-latest.log")).unwrap();
    assert_eq!(log, "hello\n");
}

#[tokio::test(start_paused = true)]
async fn test_internal_error_surface_reloads_baseline_once() {
    let h = harness(BuildMode::Production);
    let window = h.app.start().await.unwrap();
    let content = h.host.window(window.id()).unwrap();

    window.on_did_fail_load(&LoadFailure {
        url: "chrome-error://chromewebdata/".to_string(),
        error_code: -2,
        description: "ERR_FAILED".to_string(),
        is_main_frame: true,
    });
    tokio::time::sleep(RECOVERY_DELAY * 4).await;

    let baseline_loads = content
        .loads()
        .iter()
        .skip(1)
        .filter(|url| url.as_str() == BASELINE_DOCUMENT)
        .count();
    assert_eq!(baseline_loads, 1);
    assert_eq!(content.loads().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_close_before_timer_fires_is_safe() {
    let h = harness(BuildMode::Production);
    let window = h.app.start().await.unwrap();
    let content = h.host.window(window.id()).unwrap();
    let dynamic: Arc<dyn ContentWindow> = content.clone();

    h.app
        .timers()
        .schedule(&dynamic, Duration::from_secs(1), |w| w.load_url("app://late.html"));
    drop(dynamic);

    h.host.close_window(window.id());
    h.app.on_window_closed(window.id());
    assert_eq!(h.app.timers().total_pending(), 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(content.loads(), vec!["app://index.html".to_string()]);
    assert!(h.host.has_quit() != h.host.platform().keeps_running_without_windows());
}
