//! CDP-backed page probe.
//!
//! Real page probing over the Chrome DevTools Protocol via chromiumoxide.
//! Selector queries are evaluated as JavaScript expressions rendered by
//! [`Selector`]; verification polls with the bounded wait configured in
//! [`ProbeOptions`] before declaring failure.

use crate::locator::Selector;
use crate::probe::{PageProbe, ProbeOptions};
use crate::result::{SanarError, SanarResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

/// Configuration for launching the CDP probe.
#[derive(Debug, Clone)]
pub struct CdpProbeConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Bounded-wait options for verification
    pub options: ProbeOptions,
}

impl Default for CdpProbeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
            options: ProbeOptions::default(),
        }
    }
}

impl CdpProbeConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set bounded-wait options
    #[must_use]
    pub fn with_options(mut self, options: ProbeOptions) -> Self {
        self.options = options;
        self
    }
}

/// Page probe with a real CDP connection.
pub struct CdpProbe {
    browser: Arc<Mutex<CdpBrowser>>,
    page: Arc<Mutex<CdpPage>>,
    options: ProbeOptions,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for CdpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpProbe")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CdpProbe {
    /// Launch a browser and open a blank page.
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be launched.
    pub async fn launch(config: CdpProbeConfig) -> SanarResult<Self> {
        let mut builder = CdpConfig::builder();

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| SanarError::probe(format!("browser config: {e}")))?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| SanarError::probe(format!("browser launch: {e}")))?;

        // Drive the CDP event loop until the connection drops.
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SanarError::probe(format!("new page: {e}")))?;

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            page: Arc::new(Mutex::new(page)),
            options: config.options,
            handle,
        })
    }

    /// Navigate to a URL and wait for navigation to settle.
    pub async fn goto(&self, url: &str) -> SanarResult<()> {
        let page = self.page.lock().await;
        page.goto(url)
            .await
            .map_err(|e| SanarError::probe(format!("navigation to {url}: {e}")))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| SanarError::probe(format!("navigation to {url}: {e}")))?;
        Ok(())
    }

    /// Current page URL.
    pub async fn current_url(&self) -> SanarResult<String> {
        let page = self.page.lock().await;
        let url = page
            .url()
            .await
            .map_err(|e| SanarError::probe(format!("url: {e}")))?;
        Ok(url.unwrap_or_default())
    }

    /// Close the browser.
    pub async fn close(self) -> SanarResult<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| SanarError::probe(format!("browser close: {e}")))?;
        Ok(())
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: String) -> SanarResult<T> {
        let page = self.page.lock().await;
        let result = page
            .evaluate(expr)
            .await
            .map_err(|e| SanarError::probe(format!("evaluate: {e}")))?;
        result
            .into_value()
            .map_err(|e| SanarError::probe(format!("evaluate result: {e}")))
    }

    async fn visible_count(&self, selector: &Selector) -> SanarResult<u64> {
        self.eval(selector.to_visible_count_query()).await
    }
}

#[async_trait]
impl PageProbe for CdpProbe {
    /// Poll until the selector matches exactly one visible element or the
    /// bounded wait elapses. Overmatched selectors (more than one visible
    /// match) fail immediately: waiting will not disambiguate them.
    async fn verify(&self, selector: &Selector) -> SanarResult<bool> {
        let deadline = Instant::now() + self.options.timeout;
        loop {
            let count = self.visible_count(selector).await?;
            if count == 1 {
                return Ok(true);
            }
            if count > 1 || Instant::now() >= deadline {
                debug!(selector = %selector, count, "verification failed");
                return Ok(false);
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    async fn read_text(&self, selector: &Selector) -> SanarResult<String> {
        let text: Option<String> = self.eval(selector.to_text_query()).await?;
        text.ok_or_else(|| SanarError::probe(format!("no element matches '{selector}'")))
    }

    async fn read_options(&self, selector: &Selector) -> SanarResult<Vec<String>> {
        let options: Option<Vec<String>> = self.eval(selector.to_options_query()).await?;
        options.ok_or_else(|| SanarError::probe(format!("no element matches '{selector}'")))
    }

    async fn click(&self, selector: &Selector) -> SanarResult<()> {
        let clicked: bool = self
            .eval(format!(
                "(() => {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
                selector.to_query()
            ))
            .await?;
        if !clicked {
            return Err(SanarError::probe(format!("nothing to click for '{selector}'")));
        }
        Ok(())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> SanarResult<()> {
        let filled: bool = self
            .eval(format!(
                "(() => {{ const el = {}; if (!el) return false; \
                 el.focus(); el.value = {text:?}; \
                 el.dispatchEvent(new Event('input', {{bubbles: true}})); \
                 el.dispatchEvent(new Event('change', {{bubbles: true}})); \
                 return true; }})()",
                selector.to_query()
            ))
            .await?;
        if !filled {
            return Err(SanarError::probe(format!("nothing to fill for '{selector}'")));
        }
        Ok(())
    }

    async fn capture_markup(&self) -> SanarResult<String> {
        self.eval("document.documentElement.outerHTML".to_string())
            .await
    }

    async fn screenshot(&self) -> SanarResult<Vec<u8>> {
        let page = self.page.lock().await;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = page
            .execute(params)
            .await
            .map_err(|e| SanarError::probe(format!("screenshot: {e}")))?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| SanarError::probe(format!("screenshot decode: {e}")))
    }
}
