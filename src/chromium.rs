//! [`BrowserSession`] backed by a real Chrome/Chromium via chromiumoxide.

use crate::error::{IeeeError, Result};
use crate::scrape::BrowserSession;
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Interval between polls while waiting for an element
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Protocol messages Chrome sends when a selector matches no node
const MISSING_NODE_MESSAGES: &[&str] = &[
    "Could not find node",
    "No node with given id",
    "No node found",
];

/// Browser launch settings
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Explicit Chrome binary; chromiumoxide searches the usual locations otherwise
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
        }
    }
}

/// One browser process with a single page.
pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch a browser and open a blank page.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(IeeeError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| IeeeError::Browser(format!("Failed to launch Chrome: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(IeeeError::Browser(format!("Failed to create page: {}", e)));
            }
        };

        debug!(headless = options.headless, "Browser launched");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| IeeeError::Browser(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            match self.page.find_element(selector).await {
                Ok(_) => return Ok(()),
                Err(e) if is_missing_node(&e) => {}
                Err(e) => {
                    return Err(IeeeError::Browser(format!(
                        "Waiting for '{}' failed: {}",
                        selector, e
                    )))
                }
            }
            if start.elapsed() >= timeout {
                return Err(IeeeError::Timeout {
                    selector: selector.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn count_elements(&self, selector: &str) -> Result<usize> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| IeeeError::Browser(format!("Query '{}' failed: {}", selector, e)))?;
        Ok(elements.len())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| IeeeError::Browser(format!("Element '{}' not found: {}", selector, e)))?;
        element
            .click()
            .await
            .map_err(|e| IeeeError::Browser(format!("Click on '{}' failed: {}", selector, e)))?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| IeeeError::Browser(format!("Failed to read page content: {}", e)))
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser
            .close()
            .await
            .map_err(|e| IeeeError::Browser(format!("Failed to close browser: {}", e)));
        // Reap the child so no Chrome process outlives the call
        let _ = browser.wait().await;
        self.handler.abort();
        closed.map(|_| ())
    }
}

/// Whether a lookup failed only because nothing matched yet.
fn is_missing_node(err: &CdpError) -> bool {
    match err {
        CdpError::Chrome(e) => is_missing_node_message(&e.message),
        _ => false,
    }
}

fn is_missing_node_message(message: &str) -> bool {
    MISSING_NODE_MESSAGES
        .iter()
        .any(|needle| message.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_messages_keep_polling() {
        assert!(is_missing_node_message("Could not find node with given id"));
        assert!(is_missing_node_message("No node with given id found"));
        assert!(is_missing_node_message("No node found for selector"));
    }

    #[test]
    fn test_other_failures_stop_polling() {
        assert!(!is_missing_node_message("Target closed"));
        assert!(!is_missing_node_message("Inspected target navigated or closed"));
        assert!(!is_missing_node(&CdpError::NoResponse));
    }
}
