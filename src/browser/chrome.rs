// spider_chrome re-exports chromiumoxide API
use super::locator::Locator;
use crate::config::{AppConfig, DEFAULT_ELEMENT_TIMEOUT, DEFAULT_POLL_INTERVAL};
use crate::error::{HarnessError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use chromiumoxide_fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Budget for each of the close and exit-wait steps of [`ChromeDriver::quit`]
pub const QUIT_TIMEOUT: Duration = Duration::from_secs(5);

static LAUNCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A browser session owned by exactly one scenario
///
/// The session is released by [`ChromeDriver::quit`]. Calling it again is a
/// no-op, so teardown hooks can call it unconditionally.
pub struct ChromeDriver {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    temp_dir: Option<PathBuf>,
    element_timeout: Duration,
    poll_interval: Duration,
    quit_timeout: Duration,
}

/// Connection mode for Chrome browser
pub enum ConnectionMode {
    /// Sandboxed mode - launches Chrome using system installation
    Sandboxed {
        chrome_path: Option<String>,
        no_sandbox: bool,
        headless: bool,
    },
    /// Advanced mode - connects to existing Chrome on debug port
    DebugPort(u16),
}

impl ChromeDriver {
    /// Launch Chrome as described by the harness configuration
    ///
    /// Attaches to an already running Chrome instead when a debug port is configured.
    pub async fn launch(config: &AppConfig) -> Result<Self> {
        let mode = match config.debug_port {
            Some(port) => ConnectionMode::DebugPort(port),
            None => ConnectionMode::Sandboxed {
                chrome_path: config.chrome_path.clone(),
                no_sandbox: config.no_sandbox,
                headless: config.headless,
            },
        };
        let driver = Self::new(mode).await?;
        Ok(driver.with_wait_policy(config.element_timeout, config.poll_interval))
    }

    /// Create new ChromeDriver with specified connection mode
    pub async fn new(mode: ConnectionMode) -> Result<Self> {
        let (browser, temp_dir) = match mode {
            ConnectionMode::Sandboxed {
                chrome_path,
                no_sandbox,
                headless,
            } => {
                // Parallel scenarios must never share a profile directory
                let temp_dir = unique_profile_dir();
                std::fs::create_dir_all(&temp_dir).map_err(|e| {
                    HarnessError::LaunchFailed(format!("Failed to create temp directory: {}", e))
                })?;

                let mut config = if headless {
                    BrowserConfig::builder()
                } else {
                    BrowserConfig::builder().with_head()
                };

                config = config.user_data_dir(&temp_dir);

                // Linux AppArmor workaround
                if no_sandbox {
                    config = config.arg("--no-sandbox");
                }

                if let Some(path) = chrome_path {
                    config = config.chrome_executable(path);
                } else {
                    match Self::ensure_chrome_installed().await {
                        Ok(path) => {
                            config = config.chrome_executable(path);
                        }
                        Err(e) => {
                            log::warn!("Chrome auto-download failed ({}), trying system Chrome", e);
                        }
                    }
                }

                let config = config.build().map_err(|e| {
                    HarnessError::LaunchFailed(format!("{}{}", e, LAUNCH_HINT))
                })?;

                let (browser, handler) = Browser::launch(config)
                    .await
                    .map_err(|e| HarnessError::LaunchFailed(format!("{}{}", e, LAUNCH_HINT)))?;

                log::info!(
                    "Launched Chrome (headless: {}, no-sandbox: {})",
                    headless,
                    no_sandbox
                );
                ((browser, handler), Some(temp_dir))
            }
            ConnectionMode::DebugPort(port) => {
                let url = format!("http://localhost:{}", port);
                let connected = Browser::connect(&url).await.map_err(|e| {
                    HarnessError::ConnectionFailed(format!(
                        "Failed to connect to Chrome on port {}. \
                         Make sure Chrome is running with --remote-debugging-port={}: {}",
                        port, port, e
                    ))
                })?;

                log::info!("Connected to Chrome on debug port {}", port);
                (connected, None)
            }
        };

        let (browser, mut handler) = browser;
        let handler = tokio::spawn(async move {
            while (handler.next().await).is_some() {
                // Drain browser events
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            temp_dir,
            element_timeout: DEFAULT_ELEMENT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            quit_timeout: QUIT_TIMEOUT,
        })
    }

    /// Override how long element lookups wait and how often they retry
    pub fn with_wait_policy(mut self, element_timeout: Duration, poll_interval: Duration) -> Self {
        self.element_timeout = element_timeout;
        self.poll_interval = poll_interval;
        self
    }

    /// Override how long [`ChromeDriver::quit`] waits on Chrome before killing it
    pub fn with_quit_timeout(mut self, quit_timeout: Duration) -> Self {
        self.quit_timeout = quit_timeout;
        self
    }

    pub fn element_timeout(&self) -> Duration {
        self.element_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn browser(&self) -> Result<&Browser> {
        self.browser.as_ref().ok_or(HarnessError::SessionClosed)
    }

    /// Helper method to get the current active page, excluding Chrome's new-tab-page
    async fn get_active_page(&self) -> Result<Page> {
        let browser = self.browser()?;
        let pages = browser.pages().await?;

        for page in pages.iter() {
            if let Ok(Some(url)) = page.url().await {
                if !url.starts_with("chrome://") {
                    return Ok(page.clone());
                }
            }
        }

        if let Some(page) = pages.last() {
            return Ok(page.clone());
        }

        browser
            .new_page("about:blank")
            .await
            .map_err(|e| HarnessError::Other(format!("Failed to create page: {}", e)))
    }

    /// Navigate to a URL and wait for the load event
    pub async fn navigate(&self, url: &str) -> Result<()> {
        use chromiumoxide::cdp::browser_protocol::page::{EventLoadEventFired, NavigateParams};

        let url = normalize_url(url);
        log::debug!("Navigating to {}", url);

        let page = self.get_active_page().await?;

        // Subscribe before navigating so a fast load is not missed
        let mut load_events = page.event_listener::<EventLoadEventFired>().await?;

        let params = NavigateParams::builder()
            .url(&url)
            .build()
            .map_err(|e| HarnessError::NavigationFailed(format!("Invalid URL {}: {}", url, e)))?;

        let response = page.execute(params).await.map_err(|e| {
            let error_str = e.to_string();
            if error_str.contains("oneshot canceled") {
                HarnessError::NavigationFailed(
                    "Browser connection lost. The browser may have been closed or crashed."
                        .to_string(),
                )
            } else {
                HarnessError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e))
            }
        })?;

        if let Some(error_text) = &response.result.error_text {
            return Err(HarnessError::NavigationFailed(format!(
                "Navigation to {} failed: {}",
                url, error_text
            )));
        }

        match tokio::time::timeout(NAVIGATION_TIMEOUT, load_events.next()).await {
            Ok(Some(_)) => {
                log::debug!("Load event fired for {}", url);
                Ok(())
            }
            Ok(None) => Err(HarnessError::NavigationFailed(format!(
                "Event stream closed while loading {}",
                url
            ))),
            Err(_) => Err(HarnessError::NavigationFailed(format!(
                "Timed out after {}s waiting for {} to load",
                NAVIGATION_TIMEOUT.as_secs(),
                url
            ))),
        }
    }

    /// Get current URL
    pub async fn current_url(&self) -> Result<String> {
        let page = self.get_active_page().await?;

        page.url()
            .await
            .map_err(|e| HarnessError::Other(e.to_string()))?
            .ok_or(HarnessError::NoPage)
    }

    /// Poll the current URL until it equals `expected` or the element timeout elapses
    ///
    /// Returns the last URL observed; callers decide whether a mismatch is a failure.
    pub async fn wait_for_url(&self, expected: &str) -> Result<String> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            let current = self.current_url().await?;
            if current == expected || Instant::now() >= deadline {
                return Ok(current);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Get page title
    pub async fn title(&self) -> Result<String> {
        let page = self.get_active_page().await?;

        page.get_title()
            .await
            .map_err(|e| HarnessError::Other(e.to_string()))?
            .ok_or(HarnessError::NoPage)
    }

    /// Locate an element, retrying until it appears or the element timeout elapses
    pub async fn find(&self, locator: &Locator) -> Result<Element> {
        let page = self.get_active_page().await?;
        let selector = locator.selector();
        let deadline = Instant::now() + self.element_timeout;

        loop {
            match page.find_element(selector.as_str()).await {
                Ok(element) => return Ok(element),
                Err(e) if Instant::now() >= deadline => {
                    log::debug!("Gave up waiting for {}: {}", locator, e);
                    return Err(HarnessError::ElementNotFound(locator.to_string()));
                }
                Err(_) => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    /// Locate an element once, without waiting
    pub async fn try_find(&self, locator: &Locator) -> Result<Option<Element>> {
        let page = self.get_active_page().await?;
        let mut found = page.find_elements(locator.selector()).await?;
        if found.is_empty() {
            Ok(None)
        } else {
            Ok(Some(found.swap_remove(0)))
        }
    }

    /// Take a screenshot of the current page
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let page = self.get_active_page().await?;

        page.screenshot(chromiumoxide::page::ScreenshotParams::default())
            .await
            .map_err(|e| HarnessError::Other(format!("Failed to take screenshot: {}", e)))
    }

    /// Take a screenshot and save to file
    pub async fn screenshot_to_file(&self, path: &Path) -> Result<()> {
        let screenshot_data = self.screenshot().await?;
        tokio::fs::write(path, screenshot_data).await?;
        Ok(())
    }

    /// Check if the browser is still alive and responsive
    pub async fn is_alive(&self) -> bool {
        let Some(browser) = self.browser.as_ref() else {
            return false;
        };
        match browser.pages().await {
            Ok(pages) => match pages.first() {
                Some(page) => matches!(
                    tokio::time::timeout(Duration::from_secs(2), page.url()).await,
                    Ok(Ok(_))
                ),
                None => true,
            },
            Err(_) => false,
        }
    }

    /// True once [`ChromeDriver::quit`] has released the session
    pub fn is_closed(&self) -> bool {
        self.browser.is_none()
    }

    /// Release the browser session
    ///
    /// Returns `Ok(true)` from the call that released it and `Ok(false)` from
    /// every later call. The handle counts as released even if closing fails.
    /// A Chrome that does not close or exit within the quit timeout is killed,
    /// so this always returns.
    pub async fn quit(&mut self) -> Result<bool> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(false);
        };

        log::info!("Closing browser session");
        let closed = match tokio::time::timeout(self.quit_timeout, browser.close()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(HarnessError::Other(format!("Failed to close browser: {}", e))),
            Err(_) => Err(HarnessError::Other(format!(
                "Browser did not close within {:?}",
                self.quit_timeout
            ))),
        };

        let exited = match &closed {
            Ok(()) => match tokio::time::timeout(self.quit_timeout, browser.wait()).await {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => {
                    log::warn!("Failed waiting for Chrome to exit: {}", e);
                    false
                }
                Err(_) => {
                    log::warn!("Chrome did not exit within {:?}", self.quit_timeout);
                    false
                }
            },
            Err(_) => false,
        };
        if !exited {
            kill_browser(&mut browser, self.quit_timeout).await;
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        self.remove_temp_dir();

        closed?;
        Ok(true)
    }

    fn remove_temp_dir(&mut self) {
        if let Some(temp_dir) = self.temp_dir.take() {
            if temp_dir.exists() {
                let _ = std::fs::remove_dir_all(&temp_dir);
            }
        }
    }

    /// Ensure Chrome is installed, downloading if necessary
    async fn ensure_chrome_installed() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| HarnessError::Other("Cannot determine cache directory".to_string()))?
            .join("storefront-bdd")
            .join("chrome");

        tokio::fs::create_dir_all(&cache_dir).await?;

        let marker = cache_dir.join(".downloaded");
        if marker.exists() {
            if let Some(executable) = Self::find_chrome_in_cache(&cache_dir) {
                return Ok(executable);
            }
        }

        log::info!("Downloading Chrome for Testing into {}", cache_dir.display());
        let fetcher = BrowserFetcher::new(
            BrowserFetcherOptions::builder()
                .with_path(&cache_dir)
                .build()
                .map_err(|e| HarnessError::Other(format!("Fetcher config failed: {}", e)))?,
        );

        let info = fetcher
            .fetch()
            .await
            .map_err(|e| HarnessError::Other(format!("Chrome download failed: {}", e)))?;

        tokio::fs::write(&marker, "downloaded").await?;
        log::info!("Chrome downloaded to {}", info.executable_path.display());

        Ok(info.executable_path)
    }

    fn find_chrome_in_cache(cache_dir: &Path) -> Option<PathBuf> {
        [
            "chrome",
            "chrome.exe",
            "Google Chrome.app/Contents/MacOS/Google Chrome",
            "chrome-linux/chrome",
            "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
            "chrome-win/chrome.exe",
        ]
        .iter()
        .map(|candidate| cache_dir.join(candidate))
        .find(|path| path.exists())
    }
}

impl fmt::Debug for ChromeDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromeDriver")
            .field("closed", &self.is_closed())
            .field("temp_dir", &self.temp_dir)
            .field("element_timeout", &self.element_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("quit_timeout", &self.quit_timeout)
            .finish()
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        if self.browser.is_some() {
            log::warn!("ChromeDriver dropped without quit(); the browser is killed on drop");
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        self.remove_temp_dir();
    }
}

const LAUNCH_HINT: &str = ". \n\n\
    Chrome not found. You can:\n\
    - Install Chrome: https://www.google.com/chrome/\n\
    - Ubuntu/Debian: sudo apt install chromium-browser\n\
    - Fedora: sudo dnf install chromium\n\
    - macOS: brew install --cask google-chrome\n\
    - Or set STOREFRONT_CHROME_PATH=/path/to/chrome\n\
    - Linux sandbox issue? Try: STOREFRONT_NO_SANDBOX=true";

/// Kill a launched Chrome; attached sessions have no child process to kill
async fn kill_browser(browser: &mut Browser, budget: Duration) {
    match tokio::time::timeout(budget, browser.kill()).await {
        Ok(Some(Ok(()))) => log::info!("Killed Chrome after failed shutdown"),
        Ok(Some(Err(e))) => log::warn!("Failed to kill Chrome: {}", e),
        Ok(None) => {}
        Err(_) => log::warn!("Timed out killing Chrome"),
    }
}

fn unique_profile_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let sequence = LAUNCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "storefront-bdd-{}-{}-{}",
        std::process::id(),
        nanos,
        sequence
    ))
}

/// Add `https://` to URLs given without a scheme
pub fn normalize_url(url: &str) -> String {
    const SCHEMES: [&str; 5] = ["http://", "https://", "file://", "about:", "data:"];
    if SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}
