use crate::error::PageFault;
use crate::page::HtmlPage;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{info, warn};

/// Hands the engine a ready page for a URL. Navigation, readiness waits and
/// teardown live behind this seam; the engine never drives them.
pub trait PageProvider {
    fn open(&self, url: &str) -> Result<HtmlPage, PageFault>;
}

impl<F> PageProvider for F
where
    F: Fn(&str) -> Result<HtmlPage, PageFault>,
{
    fn open(&self, url: &str) -> Result<HtmlPage, PageFault> {
        self(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpProviderOptions {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    /// One attempt by default; callers wanting navigation retries opt in.
    pub attempts: u8,
    pub backoff_ms: u64,
}

impl Default for HttpProviderOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
            attempts: 1,
            backoff_ms: 500,
        }
    }
}

/// Provider backed by a blocking HTTP client. Suits pages whose markup is
/// complete at document load; a headless-browser provider plugs in behind
/// the same trait when rendering is required.
pub struct HttpProvider {
    client: Client,
    options: HttpProviderOptions,
}

impl HttpProvider {
    pub fn new(options: HttpProviderOptions) -> Result<Self, PageFault> {
        let mut builder = Client::builder().timeout(Duration::from_secs(options.timeout_secs));
        if let Some(user_agent) = &options.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder
            .build()
            .map_err(|err| PageFault::new(format!("failed to build http client: {err}")))?;
        Ok(Self { client, options })
    }
}

impl PageProvider for HttpProvider {
    fn open(&self, url: &str) -> Result<HtmlPage, PageFault> {
        let attempts = self.options.attempts.max(1);

        for attempt in 1..=attempts {
            match self.client.get(url).send() {
                Ok(resp) if resp.status().is_success() => {
                    let body = resp.text().map_err(|err| {
                        PageFault::new(format!("failed to read body of {url}: {err}"))
                    })?;
                    info!(%url, bytes = body.len(), "page fetched");
                    return Ok(HtmlPage::parse(&body));
                }
                Ok(resp) => {
                    let status = resp.status();
                    if attempt == attempts {
                        return Err(PageFault::new(format!(
                            "request to {url} failed with status {status}"
                        )));
                    }
                    warn!(%url, %status, attempt, "request failed; retrying");
                }
                Err(err) => {
                    if attempt == attempts {
                        return Err(PageFault::new(format!("request to {url} failed: {err}")));
                    }
                    warn!(%url, attempt, error = %err, "request errored; retrying");
                }
            }

            std::thread::sleep(Duration::from_millis(self.options.backoff_ms));
        }

        Err(PageFault::new(format!(
            "request to {url} failed after retries"
        )))
    }
}
