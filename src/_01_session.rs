//    chromedriver.exe --port=9515
//    (or set WEBDRIVER_URL to point elsewhere)

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::json;
use thirtyfour::prelude::*;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Number of find attempts fitting in `timeout`; at least one always runs.
fn poll_attempts(timeout: Duration) -> usize {
    ((timeout.as_millis() / POLL_INTERVAL.as_millis()) as usize).max(1)
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("webdriver: {0}")]
    WebDriver(#[from] WebDriverError),

    #[error("no element matches `{0}`")]
    NotFound(String),

    #[error("timed out waiting for `{0}`")]
    Timeout(String),
}

//
// ======================================================
// Browser capability seam
// ======================================================
//
// The engine only ever talks to the page through these two traits, so any
// rendering backend honoring them is substitutable (the tests run against an
// in-memory fake).

#[allow(async_fn_in_trait)]
pub trait Elem: Sized {
    async fn find(&self, css: &str) -> Result<Self, SessionError>;
    async fn find_all(&self, css: &str) -> Result<Vec<Self>, SessionError>;
    async fn text(&self) -> Result<String, SessionError>;
    async fn attr(&self, name: &str) -> Result<Option<String>, SessionError>;
    async fn click(&self) -> Result<(), SessionError>;
}

#[allow(async_fn_in_trait)]
pub trait Session {
    type Elem: Elem;

    async fn navigate(&self, url: &str) -> Result<(), SessionError>;
    /// Poll until at least one element matches `css`, bounded by `timeout`.
    async fn wait_for(&self, css: &str, timeout: Duration) -> bool;
    async fn find(&self, css: &str) -> Result<Self::Elem, SessionError>;
    async fn find_all(&self, css: &str) -> Result<Vec<Self::Elem>, SessionError>;
    async fn page_source(&self) -> Result<String, SessionError>;
}

//
// ======================================================
// thirtyfour implementation
// ======================================================
//

impl Elem for WebElement {
    async fn find(&self, css: &str) -> Result<Self, SessionError> {
        WebElement::find(self, By::Css(css))
            .await
            .map_err(|_| SessionError::NotFound(css.to_string()))
    }

    async fn find_all(&self, css: &str) -> Result<Vec<Self>, SessionError> {
        Ok(WebElement::find_all(self, By::Css(css)).await?)
    }

    async fn text(&self) -> Result<String, SessionError> {
        Ok(WebElement::text(self).await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, SessionError> {
        Ok(WebElement::attr(self, name).await?)
    }

    async fn click(&self) -> Result<(), SessionError> {
        Ok(WebElement::click(self).await?)
    }
}

impl Session for WebDriver {
    type Elem = WebElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        Ok(self.handle.goto(url).await?)
    }

    async fn wait_for(&self, css: &str, timeout: Duration) -> bool {
        stream::iter(0..poll_attempts(timeout))
            .then(|_| async {
                match self.handle.find_all(By::Css(css)).await {
                    Ok(elements) if !elements.is_empty() => true,
                    _ => {
                        tokio::time::sleep(POLL_INTERVAL).await;
                        false
                    }
                }
            })
            .any(|found| futures::future::ready(found))
            .await
    }

    async fn find(&self, css: &str) -> Result<Self::Elem, SessionError> {
        self.handle
            .find(By::Css(css))
            .await
            .map_err(|_| SessionError::NotFound(css.to_string()))
    }

    async fn find_all(&self, css: &str) -> Result<Vec<Self::Elem>, SessionError> {
        Ok(self.handle.find_all(By::Css(css)).await?)
    }

    async fn page_source(&self) -> Result<String, SessionError> {
        Ok(self.handle.source().await?)
    }
}

//
// ======================================================
// Chrome driver
// ======================================================
//

pub async fn start_chrome_driver() -> Result<WebDriver, SessionError> {
    let mut caps = DesiredCapabilities::chrome();
    let chrome_options = json!({
        "args": [
            "--headless",
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-blink-features=AutomationControlled",
            "--lang=pt-BR",
            "user-agent=Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/91.0.4472.124"
        ]
    });
    caps.insert_base_capability("goog:chromeOptions".to_string(), chrome_options);

    let server = std::env::var("WEBDRIVER_URL")
        .unwrap_or_else(|_| "http://localhost:9515".to_string());
    let driver = WebDriver::new(&server, caps).await?;
    Ok(driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_is_bounded_by_the_wait_timeout() {
        assert_eq!(poll_attempts(Duration::from_secs(20)), 80);
        assert_eq!(poll_attempts(Duration::from_secs(60)), 240);
        assert_eq!(poll_attempts(Duration::from_secs(10)), 40);
    }

    #[test]
    fn even_a_zero_timeout_probes_once() {
        assert_eq!(poll_attempts(Duration::ZERO), 1);
        assert_eq!(poll_attempts(Duration::from_millis(100)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_stream_short_circuits_on_the_first_hit() {
        use std::cell::Cell;

        let calls = Cell::new(0u32);
        let calls = &calls;
        let found = stream::iter(0..poll_attempts(Duration::from_secs(20)))
            .then(move |_| async move {
                calls.set(calls.get() + 1);
                calls.get() == 3
            })
            .any(|found| futures::future::ready(found))
            .await;

        assert!(found);
        assert_eq!(calls.get(), 3);
    }
}
