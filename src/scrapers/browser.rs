//! Browser-backed page loading for JS-heavy blogs and search engines.
//!
//! Wraps a single chromiumoxide (CDP) session that is reused for every
//! navigation in a pipeline run. Pages are loaded with a ready-state wait,
//! scrolled to the bottom to force lazy content, and handed back as plain
//! HTML strings; all DOM parsing happens outside the browser.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

use crate::scrapers::http_client::USER_AGENT;

/// Selector whose presence signals an article page has rendered.
/// Waiting for it is best-effort; absence is tolerated.
pub const ARTICLE_READY_SELECTOR: &str = "article, .entry-content, .post-content";

/// How long to wait for a tolerated selector before giving up.
#[cfg(feature = "browser")]
const SELECTOR_WAIT: Duration = Duration::from_secs(5);

/// Browser session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSessionConfig {
    /// Run Chrome without a visible window.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Navigation timeout in seconds before a load fails.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Delay after the lazy-load scroll, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// User agent applied to every page.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra Chrome arguments appended to the launch command.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

fn default_headless() -> bool {
    true
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            navigation_timeout: default_navigation_timeout(),
            settle_ms: default_settle_ms(),
            user_agent: default_user_agent(),
            chrome_args: Vec::new(),
        }
    }
}

impl BrowserSessionConfig {
    /// Default settle delay after the lazy-load scroll.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Per-load overrides.
#[derive(Debug, Clone, Default)]
pub struct PageLoadOptions {
    /// Settle delay override; the config default applies when `None`.
    pub settle: Option<Duration>,
    /// Selector to wait for after settling (best-effort, failure tolerated).
    pub wait_selector: Option<String>,
}

impl PageLoadOptions {
    /// Options for loading an article page.
    pub fn article() -> Self {
        Self {
            settle: None,
            wait_selector: Some(ARTICLE_READY_SELECTOR.to_string()),
        }
    }

    /// Options for loading an article page with a shorter settle.
    pub fn article_quick() -> Self {
        Self {
            settle: Some(Duration::from_millis(1500)),
            wait_selector: Some(ARTICLE_READY_SELECTOR.to_string()),
        }
    }
}

/// A loaded page: the final URL after redirects plus serialized HTML.
#[derive(Debug, Clone)]
pub struct PageView {
    pub url: String,
    pub html: String,
}

/// Navigation failures.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("page did not become ready within {timeout_secs}s: {url}")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or download from: https://www.google.com/chrome/"
    )]
    ChromeNotFound,

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("browser session is closed")]
    SessionClosed,

    #[error("browser support not compiled, rebuild with: cargo build --features browser")]
    Unavailable,
}

/// Evasion scripts applied after each navigation.
/// Search engines block obvious automation; these cover the common probes.
#[cfg(feature = "browser")]
const STEALTH_SCRIPTS: &[&str] = &[
    // Remove the webdriver flag
    r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    "#,
    // Headless Chrome ships without a chrome object
    r#"
    window.chrome = window.chrome || {
        runtime: {},
        loadTimes: function() {},
        app: {}
    };
    "#,
    // Plausible language list
    r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true
    });
    "#,
    // Non-empty plugin list
    r#"
    Object.defineProperty(navigator, 'plugins', {
        get: () => [
            { name: 'Chrome PDF Viewer', filename: 'internal-pdf-viewer', description: 'Portable Document Format' }
        ],
        configurable: true
    });
    "#,
];

#[cfg(feature = "browser")]
const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// A single browser session reused for every navigation in a run.
///
/// Loads take the session lock for their full duration, so navigations
/// are serialized even when the session is shared behind an `Arc`.
#[cfg(feature = "browser")]
pub struct BrowserSession {
    config: BrowserSessionConfig,
    browser: Mutex<Option<Browser>>,
}

#[cfg(feature = "browser")]
impl BrowserSession {
    /// Common Chrome executable paths to check before falling back to PATH.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    /// Launch the browser session.
    pub async fn launch(config: BrowserSessionConfig) -> Result<Self, BrowserError> {
        info!(headless = config.headless, "launching browser");

        let chrome_path = Self::find_chrome()?;

        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox") // Needed for headless in containers
            .arg("--disable-gpu")
            .arg("--disable-software-rasterizer");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            config,
            browser: Mutex::new(Some(browser)),
        })
    }

    fn find_chrome() -> Result<std::path::PathBuf, BrowserError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                info!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(BrowserError::ChromeNotFound)
    }

    /// Load an article page with the default settle delay.
    pub async fn load(&self, url: &str) -> Result<PageView, BrowserError> {
        self.load_with(url, &PageLoadOptions::article()).await
    }

    /// Load a page with per-call overrides.
    ///
    /// Flow: navigate, wait for document readiness (failing with
    /// [`BrowserError::NavigationTimeout`] if it never arrives), apply
    /// evasion scripts, scroll to the bottom to trigger lazy sections,
    /// settle, then optionally wait for a content selector.
    pub async fn load_with(
        &self,
        url: &str,
        options: &PageLoadOptions,
    ) -> Result<PageView, BrowserError> {
        let guard = self.browser.lock().await;
        let browser = guard.as_ref().ok_or(BrowserError::SessionClosed)?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| self.navigation_error(url, e))?;

        // UA must be set before the first navigation
        page.execute(SetUserAgentOverrideParams::new(
            self.config.user_agent.clone(),
        ))
        .await
        .map_err(|e| self.navigation_error(url, e))?;

        debug!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: format!("invalid URL: {e}"),
            })?;
        page.execute(nav_params)
            .await
            .map_err(|e| self.navigation_error(url, e))?;

        self.wait_until_ready(&page, url).await?;

        // Let late scripts run before poking at the page
        tokio::time::sleep(Duration::from_millis(500)).await;

        self.apply_stealth(&page).await;

        // Trigger lazy-loaded sections, then let them materialize
        if let Err(e) = page.evaluate(SCROLL_SCRIPT.to_string()).await {
            debug!("scroll skipped: {}", e);
        }
        let settle = options.settle.unwrap_or_else(|| self.config.settle());
        tokio::time::sleep(settle).await;

        if let Some(ref selector) = options.wait_selector {
            match tokio::time::timeout(SELECTOR_WAIT, page.find_element(selector.as_str())).await {
                Ok(Ok(_)) => debug!("selector present: {}", selector),
                Ok(Err(e)) => debug!("selector not found: {} ({})", selector, e),
                Err(_) => debug!("timeout waiting for selector: {}", selector),
            }
        }

        let final_url = page
            .url()
            .await
            .map_err(|e| self.navigation_error(url, e))?
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());

        let html = page
            .content()
            .await
            .map_err(|e| self.navigation_error(url, e))?;

        if html.contains("Access Denied") {
            warn!("Page may be blocked: {}", url);
        }

        // Close the tab to prevent accumulation across the run
        let _ = page.close().await;

        Ok(PageView {
            url: final_url,
            html,
        })
    }

    /// Wait for the document to reach interactive or complete.
    async fn wait_until_ready(&self, page: &Page, url: &str) -> Result<(), BrowserError> {
        let timeout_secs = self.config.navigation_timeout;
        let script = format!(
            r#"
            new Promise((resolve) => {{
                if (document.readyState === 'complete' || document.readyState === 'interactive') {{
                    resolve(document.readyState);
                }} else {{
                    window.addEventListener('load', () => resolve(document.readyState));
                    setTimeout(() => resolve('timeout'), {});
                }}
            }})
            "#,
            timeout_secs * 1000
        );

        let timed_out = BrowserError::NavigationTimeout {
            url: url.to_string(),
            timeout_secs,
        };

        match tokio::time::timeout(Duration::from_secs(timeout_secs), page.evaluate(script)).await {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
                if state == "timeout" {
                    return Err(timed_out);
                }
                Ok(())
            }
            Ok(Err(e)) => {
                // Evaluation can fail on non-HTML responses; the content
                // fetch downstream will surface anything unusable
                debug!("Could not check ready state: {}", e);
                Ok(())
            }
            Err(_) => Err(timed_out),
        }
    }

    /// Apply evasion scripts, best-effort.
    async fn apply_stealth(&self, page: &Page) {
        for script in STEALTH_SCRIPTS {
            if let Err(e) = page.evaluate(script.to_string()).await {
                debug!("Stealth script injection skipped: {}", e);
            }
        }
    }

    fn navigation_error(&self, url: &str, error: impl std::fmt::Display) -> BrowserError {
        BrowserError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }

    /// Tear down the session. Dropping the browser kills the Chrome
    /// process; repeated calls are no-ops.
    pub async fn close(&self) {
        if self.browser.lock().await.take().is_some() {
            debug!("browser session closed");
        }
    }
}

// Without the browser feature every load fails with Unavailable
#[cfg(not(feature = "browser"))]
pub struct BrowserSession {
    #[allow(dead_code)]
    config: BrowserSessionConfig,
}

#[cfg(not(feature = "browser"))]
impl BrowserSession {
    pub async fn launch(config: BrowserSessionConfig) -> Result<Self, BrowserError> {
        let _ = config;
        Err(BrowserError::Unavailable)
    }

    pub async fn load(&self, _url: &str) -> Result<PageView, BrowserError> {
        Err(BrowserError::Unavailable)
    }

    pub async fn load_with(
        &self,
        _url: &str,
        _options: &PageLoadOptions,
    ) -> Result<PageView, BrowserError> {
        Err(BrowserError::Unavailable)
    }

    pub async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = BrowserSessionConfig::default();
        assert!(config.headless);
        assert_eq!(config.navigation_timeout, 30);
        assert_eq!(config.settle(), Duration::from_millis(3000));
        assert!(!config.user_agent.is_empty());
    }

    #[test]
    fn article_options_tolerate_missing_selector() {
        let options = PageLoadOptions::article();
        assert_eq!(options.wait_selector.as_deref(), Some(ARTICLE_READY_SELECTOR));
        assert!(options.settle.is_none());

        let quick = PageLoadOptions::article_quick();
        assert_eq!(quick.settle, Some(Duration::from_millis(1500)));
    }
}
