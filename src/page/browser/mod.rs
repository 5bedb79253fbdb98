//! Live feed page driven through Chrome DevTools.
//!
//! Launches a local Chrome (or attaches to a remote one), opens the profile
//! and answers every [`FeedPage`] operation by evaluating small scripts in
//! the tab and decoding their JSON results.

mod scripts;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{FeedPage, RenderedNode, ScrollAction, ScrollMetrics};
use crate::config::BrowserEngineConfig;
use crate::error::PageError;

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

const READY_POLL: Duration = Duration::from_millis(250);

/// A Chrome tab showing a profile feed.
pub struct ChromePage {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    remote: bool,
}

#[derive(Debug, Deserialize)]
struct QueryReply {
    #[serde(default)]
    nodes: Vec<RenderedNode>,
    #[serde(default)]
    error: Option<String>,
}

impl ChromePage {
    /// Launch or connect to a browser and open `address` in a new tab.
    pub async fn open(config: &BrowserEngineConfig, address: &str) -> Result<Self, PageError> {
        let remote = config.remote_url.is_some();
        let (browser, handler) = match config.remote_url.as_deref() {
            Some(url) => connect_remote(url, config).await?,
            None => launch(config).await?,
        };

        info!("Opening {}", address);
        let page = browser
            .new_page(address)
            .await
            .map_err(|e| PageError::Navigation(e.to_string()))?;

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            remote,
        })
    }

    /// Close the tab, and the browser too when it was launched here.
    pub async fn close(self) {
        if let Err(e) = self.page.clone().close().await {
            debug!("Failed to close tab: {}", e);
        }
        if !self.remote {
            let mut browser = self.browser.lock().await;
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
    }

    async fn evaluate<T: DeserializeOwned>(&self, script: String) -> Result<T, PageError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| PageError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| PageError::Script(format!("unexpected script result: {}", e)))
    }
}

#[async_trait]
impl FeedPage for ChromePage {
    async fn current_url(&self) -> Result<String, PageError> {
        self.page
            .url()
            .await
            .map_err(|e| PageError::Script(e.to_string()))?
            .ok_or_else(|| PageError::Unavailable("tab has no URL".to_string()))
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<(), PageError> {
        let poll = async {
            loop {
                match self.evaluate::<String>(scripts::READY_STATE.to_string()).await {
                    Ok(state) if state == "complete" || state == "interactive" => {
                        debug!("Page ready state: {}", state);
                        return;
                    }
                    Ok(state) => debug!("Page ready state: {}", state),
                    Err(e) => debug!("Could not check ready state: {}", e),
                }
                tokio::time::sleep(READY_POLL).await;
            }
        };

        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            PageError::Unavailable(format!("document not ready after {:?}", timeout))
        })
    }

    async fn query(&self, selector: &str) -> Result<Vec<RenderedNode>, PageError> {
        let reply: QueryReply = self.evaluate(scripts::query(selector)?).await?;
        match reply.error {
            Some(reason) => Err(PageError::InvalidSelector {
                selector: selector.to_string(),
                reason,
            }),
            None => Ok(reply.nodes),
        }
    }

    async fn metrics(&self) -> Result<ScrollMetrics, PageError> {
        self.evaluate(scripts::METRICS.to_string()).await
    }

    async fn scroll(&self, action: ScrollAction) -> Result<(), PageError> {
        let script = match action {
            ScrollAction::ToBottom => scripts::SCROLL_TO_BOTTOM.to_string(),
            ScrollAction::Nudge(px) => scripts::scroll_by(px),
        };
        self.page
            .evaluate(script)
            .await
            .map_err(|e| PageError::Script(e.to_string()))?;
        Ok(())
    }
}

/// Find a Chrome executable.
fn find_chrome() -> Result<PathBuf, PageError> {
    for path in CHROME_PATHS {
        let p = Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    // Check if in PATH via `which`
    for cmd in &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    info!("Found Chrome in PATH: {}", path);
                    return Ok(PathBuf::from(path));
                }
            }
        }
    }

    Err(PageError::Unavailable(
        "Chrome/Chromium not found. Install chromium or set browser.remote_url".to_string(),
    ))
}

async fn launch(config: &BrowserEngineConfig) -> Result<(Browser, JoinHandle<()>), PageError> {
    info!("Launching browser (headless={})", config.headless);
    let chrome_path = find_chrome()?;

    let mut builder = BrowserConfig::builder()
        .chrome_executable(chrome_path)
        .request_timeout(Duration::from_secs(config.timeout));

    // with_head means NOT headless
    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(ref proxy) = config.proxy {
        builder = builder.arg(format!("--proxy-server={}", proxy));
    }

    builder = builder
        .arg("--disable-dev-shm-usage")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .arg("--disable-translate")
        .arg("--no-sandbox")
        .arg("--disable-gpu");

    for arg in &config.chrome_args {
        builder = builder.arg(arg);
    }

    let browser_config = builder
        .build()
        .map_err(|e| PageError::Unavailable(format!("Failed to build browser config: {}", e)))?;

    let (browser, handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| PageError::Unavailable(format!("Failed to launch browser: {}", e)))?;

    Ok((browser, spawn_handler(handler)))
}

/// Connect to a remote Chrome instance through its `/json/version` endpoint.
async fn connect_remote(
    url: &str,
    config: &BrowserEngineConfig,
) -> Result<(Browser, JoinHandle<()>), PageError> {
    info!("Connecting to remote browser at {}", url);

    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

    let resp: serde_json::Value = reqwest::Client::new()
        .get(&version_url)
        .send()
        .await
        .map_err(|e| PageError::Unavailable(format!("Failed to reach remote browser: {}", e)))?
        .json()
        .await
        .map_err(|e| PageError::Unavailable(format!("Failed to parse browser version info: {}", e)))?;

    let ws_url = resp
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PageError::Unavailable("No webSocketDebuggerUrl in response".to_string()))?;

    info!("Connecting to WebSocket: {}", ws_url);
    let (browser, handler) = Browser::connect_with_config(ws_url, handler_config(config))
        .await
        .map_err(|e| PageError::Unavailable(format!("Failed to connect to remote browser: {}", e)))?;

    Ok((browser, spawn_handler(handler)))
}

/// Handler settings for an attached browser, which never sees the launch
/// builder's request timeout.
fn handler_config(config: &BrowserEngineConfig) -> HandlerConfig {
    HandlerConfig {
        request_timeout: Duration::from_secs(config.timeout),
        ..Default::default()
    }
}

fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}
